use samsoft_domain::ResourceKind;

/// Backend routes and field conventions for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEndpoints {
    plural_key: &'static str,
    singular_key: &'static str,
    id_param: &'static str,
    sends_user_id: bool,
}

impl ResourceEndpoints {
    /// Returns the conventions for a resource.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Employee => Self::new("employees", "employee", "employee_id", true),
            ResourceKind::Department => Self::new("departments", "department", "id", false),
            ResourceKind::Designation => Self::new("designations", "designation", "id", false),
            ResourceKind::Shift => Self::new("shifts", "shift", "id", false),
            ResourceKind::CompanyDocument => Self::new("documents", "document", "id", true),
            ResourceKind::CompanyRule => Self::new("rules", "rule", "id", true),
            ResourceKind::JobVacancy => Self::new("vacancies", "vacancy", "id", false),
            ResourceKind::JobApplication => {
                Self::new("applications", "application", "id", false)
            }
            ResourceKind::Ticket => Self::new("tickets", "ticket", "ticket_id", true),
            ResourceKind::Role => Self::new("roles", "role", "id", true),
        }
    }

    const fn new(
        plural_key: &'static str,
        singular_key: &'static str,
        id_param: &'static str,
        sends_user_id: bool,
    ) -> Self {
        Self {
            plural_key,
            singular_key,
            id_param,
            sends_user_id,
        }
    }

    /// Path of the list call.
    #[must_use]
    pub fn list_path(&self) -> String {
        self.path("list")
    }

    /// Path of the single-record call.
    #[must_use]
    pub fn get_path(&self) -> String {
        self.path("get")
    }

    /// Path of the create call.
    #[must_use]
    pub fn create_path(&self) -> String {
        self.path("create")
    }

    /// Path of the update call.
    #[must_use]
    pub fn update_path(&self) -> String {
        self.path("update")
    }

    /// Path of the delete call.
    #[must_use]
    pub fn delete_path(&self) -> String {
        self.path("delete")
    }

    /// Envelope key list endpoints may use instead of `data`.
    #[must_use]
    pub fn plural_key(&self) -> &'static str {
        self.plural_key
    }

    /// Envelope key single-record endpoints may use instead of `data`.
    #[must_use]
    pub fn singular_key(&self) -> &'static str {
        self.singular_key
    }

    /// Body field carrying the record id.
    #[must_use]
    pub fn id_param(&self) -> &'static str {
        self.id_param
    }

    /// Whether the body must carry the current principal as `user_id`.
    #[must_use]
    pub fn sends_user_id(&self) -> bool {
        self.sends_user_id
    }

    fn path(&self, operation: &str) -> String {
        format!("/api/{}/{operation}", self.plural_key)
    }
}
