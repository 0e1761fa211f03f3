pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod stores;

pub use connection::{connect_with_settings, DbPool};
pub use fixtures::{SeedDataset, SeedResult};
pub use stores::{SqlHistoryStore, SqlRecipeStore, SqlShoppingListStore};
