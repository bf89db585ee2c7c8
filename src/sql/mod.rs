//! SQL generation and parameter binding for the generic CRUD service.

mod builder;
mod params;

pub use builder::{
    count, delete, exists_excluding, insert, select_by_id, select_page, update, QueryBuf,
};
pub use params::BindValue;
