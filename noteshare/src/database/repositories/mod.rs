//! Repository layer for database access.
//!
//! Each repository is an `async_trait` seam with a sqlx implementation so the
//! sharing workflow and HTTP handlers can be exercised against test doubles.

pub mod note;
pub mod share;
pub mod user;

pub use note::*;
pub use share::*;
pub use user::*;

use sqlx::{QueryBuilder, Sqlite};

/// Append `(?, ?, ...)` with one bound parameter per id.
pub(crate) fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    builder.push("(");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
