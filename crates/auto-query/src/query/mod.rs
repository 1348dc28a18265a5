//! Query Module - Query sets augmented with projections, joins and prefetches

pub mod prefetch;
pub mod queryset;
pub mod types;

pub use prefetch::Prefetch;
pub use queryset::QuerySet;
pub use types::{OrderDirection, QueryOperator, WhereCondition};
