/// Store-agnostic predicates rendered to parameterized SQL.
pub mod predicate;

/// Seed and recursive step of the mention closure.
pub mod closure;

pub use closure::{ClosureQuery, ClosureQueryBuilder, CountQuery};
pub use predicate::{Predicate, SqlValue};
