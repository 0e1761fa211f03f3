//! SQLite implementations of the store traits in `mealweek-core`.

use mealweek_core::StoreError;

pub mod history;
pub mod recipes;
pub mod shopping;

pub use history::SqlHistoryStore;
pub use recipes::SqlRecipeStore;
pub use shopping::SqlShoppingListStore;

pub(crate) fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

pub(crate) fn decode_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Decode(err.to_string())
}

/// `?, ?, ...` placeholder list for a dynamic `IN` clause.
pub(crate) fn placeholders(count: usize) -> String {
    let mut out = String::with_capacity(count * 3);
    for index in 0..count {
        if index > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out
}
