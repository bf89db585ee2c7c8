//! Generic resource services: rule synthesis and CRUD execution.

pub mod crud;
pub mod rules;

pub use crud::CrudService;
pub use rules::{synthesize, validate_body, FieldRules, Rule, RuleMode};
