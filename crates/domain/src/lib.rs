//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod file_signature;
mod list_query;
mod pagination;
mod permission;
mod resource;
mod route;
mod session;

pub use file_signature::{DEFAULT_MAX_UPLOAD_BYTES, FileKind, FileUploadPolicy, SIGNATURE_PROBE_LEN};
pub use list_query::{ListQuery, ListResult};
pub use pagination::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS, Pagination, is_offered_page_size};
pub use permission::{
    AccessRequirement, DEFAULT_ACTION, ModuleKey, PermissionAction, PermissionMatrix,
};
pub use resource::{RecordId, ResourceKind, ResourceRecord};
pub use route::{AppRoute, DetailMode, PUBLIC_PATHS, RouteAccess, RouteCatalog};
pub use session::{Session, SessionState};
