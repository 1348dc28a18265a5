//! Planner Module - Derives query plans from field trees

pub mod builder;
pub mod joins;

pub use builder::{build_query_plan, QueryPlanBuilder};
pub use joins::query_joins;
