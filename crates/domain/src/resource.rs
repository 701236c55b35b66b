use std::fmt::{Display, Formatter};
use std::str::FromStr;

use samsoft_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AccessRequirement;

/// Backend resources managed through the admin screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Employee records.
    Employee,
    /// Departments.
    Department,
    /// Job designations.
    Designation,
    /// Work shifts.
    Shift,
    /// Company documents with attachments.
    CompanyDocument,
    /// Company rules and policies.
    CompanyRule,
    /// Open job vacancies.
    JobVacancy,
    /// Applications received for vacancies.
    JobApplication,
    /// Support tickets.
    Ticket,
    /// Permission roles.
    Role,
}

impl ResourceKind {
    /// Returns all resource kinds in sidebar order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceKind] = &[
            ResourceKind::Employee,
            ResourceKind::Department,
            ResourceKind::Designation,
            ResourceKind::Shift,
            ResourceKind::CompanyDocument,
            ResourceKind::CompanyRule,
            ResourceKind::JobVacancy,
            ResourceKind::JobApplication,
            ResourceKind::Ticket,
            ResourceKind::Role,
        ];

        ALL
    }

    /// Returns the stable slug for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Department => "department",
            Self::Designation => "designation",
            Self::Shift => "shift",
            Self::CompanyDocument => "company_document",
            Self::CompanyRule => "company_rule",
            Self::JobVacancy => "job_vacancy",
            Self::JobApplication => "job_application",
            Self::Ticket => "ticket",
            Self::Role => "role",
        }
    }

    /// Returns the permission matrix module guarding this resource.
    #[must_use]
    pub fn permission_module(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Department => "department",
            Self::Designation => "designation",
            Self::Shift => "shift",
            Self::CompanyDocument => "documents",
            Self::CompanyRule => "rules",
            Self::JobVacancy | Self::JobApplication => "recruitment",
            Self::Ticket => "ticket",
            Self::Role => "roles",
        }
    }

    /// Returns the URL segment of the admin list screen.
    #[must_use]
    pub fn route_segment(&self) -> &'static str {
        match self {
            Self::Employee => "employees",
            Self::Department => "departments",
            Self::Designation => "designations",
            Self::Shift => "shifts",
            Self::CompanyDocument => "documents",
            Self::CompanyRule => "rules",
            Self::JobVacancy => "jobs",
            Self::JobApplication => "applications",
            Self::Ticket => "tickets",
            Self::Role => "roles",
        }
    }

    /// Returns the singular label used in notices.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Employee => "Employee",
            Self::Department => "Department",
            Self::Designation => "Designation",
            Self::Shift => "Shift",
            Self::CompanyDocument => "Document",
            Self::CompanyRule => "Rule",
            Self::JobVacancy => "Job vacancy",
            Self::JobApplication => "Job application",
            Self::Ticket => "Ticket",
            Self::Role => "Role",
        }
    }

    /// Returns the plural label used in bulk notices.
    #[must_use]
    pub fn plural_label(&self) -> &'static str {
        match self {
            Self::Employee => "Employees",
            Self::Department => "Departments",
            Self::Designation => "Designations",
            Self::Shift => "Shifts",
            Self::CompanyDocument => "Documents",
            Self::CompanyRule => "Rules",
            Self::JobVacancy => "Job vacancies",
            Self::JobApplication => "Job applications",
            Self::Ticket => "Tickets",
            Self::Role => "Roles",
        }
    }

    /// Returns the requirement for an action on this resource.
    #[must_use]
    pub fn requirement(&self, action: &str) -> AccessRequirement {
        AccessRequirement::module(self.permission_module()).action(action)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|kind| {
                kind.as_str() == normalized || kind.route_segment() == normalized.as_str()
            })
            .ok_or_else(|| AppError::Validation(format!("unknown resource '{value}'")))
    }
}

/// Identifier of a backend record, numeric or textual on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates an id from a non-blank value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(AppError::Validation("record id must not be empty".to_owned()));
        }

        Ok(Self(value))
    }

    /// Reads an id from a JSON string or number.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Self::new(text.as_str()).ok(),
            Value::Number(number) => Some(Self(number.to_string())),
            _ => None,
        }
    }

    /// Returns the id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the id as JSON, numeric when it parses as an integer.
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.0
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(self.0.as_str()))
    }
}

impl Display for RecordId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Backend-defined record treated as an opaque bag of fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRecord {
    fields: Map<String, Value>,
}

const ID_FIELDS: &[&str] = &["id", "_id", "uuid"];
const TITLE_FIELDS: &[&str] = &["name", "title", "subject", "full_name", "email"];

impl ResourceRecord {
    /// Wraps a JSON object. Non-object values are rejected.
    pub fn from_value(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AppError::Validation(format!(
                "expected a JSON object record, got '{other}'"
            ))),
        }
    }

    /// Returns the record id, if one of the id fields holds a value.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        ID_FIELDS
            .iter()
            .filter_map(|field| self.fields.get(*field))
            .find_map(RecordId::from_json)
    }

    /// Returns the best human-readable title for the record.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        if let Some(title) = TITLE_FIELDS
            .iter()
            .filter_map(|field| self.text(field))
            .next()
        {
            return Some(title.to_owned());
        }

        let first = self.text("first_name");
        let last = self.text("last_name");
        match (first, last) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_owned()),
            (None, None) => None,
        }
    }

    /// Returns a non-blank string field.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Returns any field.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns all fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}
