use samsoft_domain::RecordId;

use super::ResourceListController;

impl ResourceListController {
    /// Toggles one row. Returns whether it is now selected.
    pub async fn toggle_selected(&self, id: RecordId) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.selected.remove(&id) {
            false
        } else {
            state.selected.insert(id);
            true
        }
    }

    /// Selects every row on the visible page, or clears them if all already are.
    ///
    /// Rows selected on other pages are untouched. Returns the selection size.
    pub async fn toggle_select_all_visible(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let visible = state.visible_ids();
        let all_selected =
            !visible.is_empty() && visible.iter().all(|id| state.selected.contains(id));

        for id in visible {
            if all_selected {
                state.selected.remove(&id);
            } else {
                state.selected.insert(id);
            }
        }

        state.selected.len()
    }

    /// Clears the selection.
    pub async fn clear_selection(&self) {
        self.inner.state.lock().await.selected.clear();
    }
}
