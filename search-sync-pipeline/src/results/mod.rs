//! Results module for the search sync pipeline.
//!
//! Wraps a raw search response into mapped records with paging over the
//! hits that were fetched.

mod paginator;
mod result_set;

pub use paginator::{Page, Paginator, DEFAULT_PER_PAGE};
pub use result_set::ResultSet;
