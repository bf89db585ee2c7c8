//! Resource Gateway: convention-driven REST resource layer.
//!
//! Entities declare a static [`ResourceDescriptor`] (fields, casts, flags);
//! the registry, validation rules, routes and the response envelope are all
//! derived from it. One generic controller serves every registered resource.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod pagination;
pub mod query;
pub mod registry;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use error::{AppError, ValidationErrors};
pub use pagination::Pagination;
pub use query::{ListQuery, SortDir};
pub use registry::{
    ColumnSpec, FieldCast, FieldDescriptor, PkType, ResourceDescriptor, ResourceRegistry,
    SchemaField,
};
pub use response::{ListContext, Notification, NotificationKind};
pub use routes::{common_routes, common_routes_with_ready, resource_routes};
pub use service::{CrudService, RuleMode};
pub use state::AppState;
