use std::sync::Arc;
use std::time::Duration;

use samsoft_application::{
    ActionOutcome, AuthApi, AuthContext, AuthorizationGuard, DeleteOutcome, DeniedBehavior,
    FetchOutcome, FormMode, GuardDecision, LoginCredentials, Notice, PreviewRegistry,
    ProtectedAction, ResourceApi, ResourceForm, ResourceListController, SubmitOutcome,
};
use samsoft_core::AppResult;
use samsoft_domain::{
    AccessRequirement, FileUploadPolicy, ListQuery, PermissionAction, RecordId, ResourceKind,
    RouteAccess, RouteCatalog,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::command::{Command, FormInput, USAGE};

/// Runs one console command and returns the lines to print.
pub struct Shell {
    auth: AuthContext,
    auth_api: Arc<dyn AuthApi>,
    resources: Arc<dyn ResourceApi>,
    upload_policy: FileUploadPolicy,
    previews: PreviewRegistry,
}

impl Shell {
    pub fn new(
        auth: AuthContext,
        auth_api: Arc<dyn AuthApi>,
        resources: Arc<dyn ResourceApi>,
        upload_policy: FileUploadPolicy,
    ) -> Self {
        Self {
            auth,
            auth_api,
            resources,
            upload_policy,
            previews: PreviewRegistry::new(),
        }
    }

    /// Failures become an error notice line; nothing is returned as `Err`.
    pub async fn run(&self, command: Command) -> Vec<String> {
        self.dispatch(command).await.unwrap_or_else(|error| {
            warn!(error = %error, "console command failed");
            vec![render_notice(&Notice::from_error(&error))]
        })
    }

    async fn dispatch(&self, command: Command) -> AppResult<Vec<String>> {
        match command {
            Command::Help => Ok(USAGE.lines().map(str::to_owned).collect()),
            Command::Login { email, password } => self.login(email, password).await,
            Command::Logout => {
                self.auth.logout(self.auth_api.as_ref()).await?;
                Ok(vec!["Signed out.".to_owned()])
            }
            Command::WhoAmI => Ok(self.whoami()),
            Command::List {
                kind,
                search,
                page,
                page_size,
            } => self.list(kind, search, page, page_size).await,
            Command::Show { kind, id } => self.show(kind, id).await,
            Command::Create { kind, input } => self.create(kind, input).await,
            Command::Update { kind, id, input } => self.update(kind, id, input).await,
            Command::Delete {
                kind,
                id,
                confirmed,
            } => self.delete(kind, id, confirmed).await,
            Command::Routes { path } => Ok(self.routes(path.as_str())),
        }
    }

    async fn login(&self, email: String, password: String) -> AppResult<Vec<String>> {
        let session = self
            .auth
            .login(
                self.auth_api.as_ref(),
                &LoginCredentials { email, password },
            )
            .await?;

        Ok(vec![
            format!(
                "Signed in as {}.",
                session
                    .display_name()
                    .unwrap_or(session.principal_id().as_str())
            ),
            format!("Home: {}", session.home_route()),
        ])
    }

    fn whoami(&self) -> Vec<String> {
        let state = self.auth.state();
        let Some(session) = state.session() else {
            return vec!["Not signed in.".to_owned()];
        };

        let mut lines = vec![
            format!("User id: {}", session.principal_id()),
            format!("Name: {}", session.display_name().unwrap_or("-")),
            format!(
                "Role: {}",
                if session.is_client_admin() {
                    "client admin"
                } else {
                    "member"
                }
            ),
        ];
        let modules: Vec<&str> = session
            .permissions()
            .granted_modules()
            .map(|module| module.as_str())
            .collect();
        if !modules.is_empty() {
            lines.push(format!("Modules: {}", modules.join(", ")));
        }
        lines
    }

    async fn list(
        &self,
        kind: ResourceKind,
        search: String,
        page: u32,
        page_size: u32,
    ) -> AppResult<Vec<String>> {
        if let Some(lines) = self.refuse(&kind.requirement(PermissionAction::View.as_str())) {
            return Ok(lines);
        }

        let controller =
            ResourceListController::with_debounce(kind, Arc::clone(&self.resources), Duration::ZERO);
        let query = ListQuery::new()
            .with_page_size(page_size)
            .with_search(search)
            .with_page(page);
        let outcome = controller.open_with(query).await?;
        let snapshot = controller.snapshot().await;

        if let Some(error) = snapshot.error {
            return Ok(vec![render_notice(&Notice::error(error))]);
        }
        if outcome != FetchOutcome::Applied {
            return Ok(Vec::new());
        }
        if snapshot.result.is_empty() {
            return Ok(vec![format!("No {} records found.", kind.label().to_lowercase())]);
        }

        let mut lines: Vec<String> = snapshot
            .result
            .items
            .iter()
            .map(|record| {
                format!(
                    "{}\t{}",
                    record.id().map(|id| id.to_string()).unwrap_or_default(),
                    record.title().unwrap_or_default()
                )
            })
            .collect();
        lines.push(snapshot.result.pagination.summary());
        Ok(lines)
    }

    async fn show(&self, kind: ResourceKind, id: RecordId) -> AppResult<Vec<String>> {
        if let Some(lines) = self.refuse(&kind.requirement(PermissionAction::View.as_str())) {
            return Ok(lines);
        }

        let record = self.resources.get(kind, &id).await?;
        Ok(record
            .fields()
            .iter()
            .map(|(name, value)| format!("{name}: {}", display_value(value)))
            .collect())
    }

    async fn create(&self, kind: ResourceKind, input: FormInput) -> AppResult<Vec<String>> {
        if let Some(lines) = self.refuse(&kind.requirement(PermissionAction::Create.as_str())) {
            return Ok(lines);
        }

        let form = ResourceForm::new(
            kind,
            FormMode::Create,
            self.upload_policy.clone(),
            self.previews.clone(),
        );
        self.fill_and_submit(form, input).await
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: RecordId,
        input: FormInput,
    ) -> AppResult<Vec<String>> {
        if let Some(lines) = self.refuse(&kind.requirement(PermissionAction::Update.as_str())) {
            return Ok(lines);
        }

        let record = self.resources.get(kind, &id).await?;
        let form = ResourceForm::for_record(
            kind,
            &record,
            self.upload_policy.clone(),
            self.previews.clone(),
        )?;
        self.fill_and_submit(form, input).await
    }

    async fn fill_and_submit(
        &self,
        mut form: ResourceForm,
        input: FormInput,
    ) -> AppResult<Vec<String>> {
        let mut lines = Vec::new();
        for (name, value) in input.fields {
            form.set_field(name, value);
        }

        let mut candidates = Vec::with_capacity(input.attachments.len());
        for path in &input.attachments {
            candidates.push(samsoft_infrastructure::read_attachment(path).await?);
        }
        if !candidates.is_empty() {
            let attached = form.attach(candidates);
            if let Some(notice) = attached.notice() {
                lines.push(render_notice(&notice));
            }
        }

        match form.submit(self.resources.as_ref()).await {
            SubmitOutcome::Submitted {
                notice,
                redirect_to,
            } => {
                lines.push(render_notice(&notice));
                lines.push(format!("Next: {redirect_to}"));
            }
            SubmitOutcome::Rejected { notice } => lines.push(render_notice(&notice)),
        }
        Ok(lines)
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        id: RecordId,
        confirmed: bool,
    ) -> AppResult<Vec<String>> {
        let action = ProtectedAction::new(
            kind.requirement(PermissionAction::Delete.as_str()),
            DeniedBehavior::ShowModal,
        );
        match action.activate(&self.auth.state(), || ()) {
            ActionOutcome::Performed(()) => {}
            ActionOutcome::Denied(denial) => return Ok(vec![render_notice(&denial.notice)]),
            ActionOutcome::Unavailable => {
                return Ok(vec!["Sign in to continue.".to_owned()]);
            }
        }

        let controller =
            ResourceListController::with_debounce(kind, Arc::clone(&self.resources), Duration::ZERO);
        let confirmation = controller.request_delete(id.clone()).await;
        if !confirmed {
            controller.cancel_delete().await;
            return Ok(vec![
                render_notice(&confirmation),
                "Re-run with --yes to delete.".to_owned(),
            ]);
        }

        info!(resource = %kind, id = %id, "delete confirmed from console");
        Ok(match controller.confirm_delete().await {
            DeleteOutcome::Deleted { notice, .. } | DeleteOutcome::Failed { notice } => {
                vec![render_notice(&notice)]
            }
            DeleteOutcome::NothingPending => Vec::new(),
        })
    }

    fn routes(&self, path: &str) -> Vec<String> {
        match RouteCatalog.access_for(path) {
            None => vec![format!("{path}: unknown route")],
            Some(RouteAccess::Public) => vec![format!("{path}: public")],
            Some(RouteAccess::Protected(requirement)) => {
                let decision = AuthorizationGuard::new(requirement).evaluate(&self.auth.state());
                vec![format!("{path}: {}", describe_decision(&decision))]
            }
        }
    }

    /// Lines explaining why the guard refused, or `None` when it renders.
    fn refuse(&self, requirement: &AccessRequirement) -> Option<Vec<String>> {
        let decision = AuthorizationGuard::new(requirement.clone()).evaluate(&self.auth.state());
        match decision {
            GuardDecision::Render => None,
            GuardDecision::Deny(denial) => Some(vec![
                render_notice(&denial.notice),
                format!("Next: {}", denial.dismiss()),
            ]),
            other => Some(vec![describe_decision(&other)]),
        }
    }
}

fn describe_decision(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Suspend => "session still loading".to_owned(),
        GuardDecision::Redirect(route) => format!("sign in required, redirecting to {route}"),
        GuardDecision::Render => "allowed".to_owned(),
        GuardDecision::Deny(denial) => {
            format!("denied, redirecting to {}", denial.redirect_to)
        }
    }
}

fn render_notice(notice: &Notice) -> String {
    format!("[{}] {}", notice.title, notice.message)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_owned(),
        other => other.to_string(),
    }
}
