mod bind_parameter;
mod bind_type;
mod query_spec;
mod row;
mod sql_value;

pub use bind_parameter::BindParameter;
pub use bind_type::BindType;
pub use query_spec::QuerySpec;
pub use row::{RawQueryResult, Row};
pub use sql_value::SqlValue;
