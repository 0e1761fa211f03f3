use async_trait::async_trait;
use sqlx::Row;

use mealweek_core::{CheckedItemsStore, StoreError, UserId};

use super::{db_error, decode_error};
use crate::DbPool;

pub struct SqlShoppingListStore {
    pool: DbPool,
}

impl SqlShoppingListStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckedItemsStore for SqlShoppingListStore {
    async fn checked_ingredient_names(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT DISTINCT LOWER(i.name) AS name
             FROM shopping_list_items s
             JOIN ingredients i ON i.id = s.ingredient_id
             WHERE s.user_id = ? AND s.checked = 1
             ORDER BY name
             LIMIT ?",
        )
        .bind(user.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(|row| row.try_get("name").map_err(decode_error)).collect()
    }
}

#[cfg(test)]
mod tests {
    use mealweek_core::{CheckedItemsStore, UserId};

    use super::SqlShoppingListStore;
    use crate::stores::testing;

    #[tokio::test]
    async fn returns_lowercased_checked_names_only() {
        let pool = testing::memory_pool().await;
        testing::insert_ingredient(&pool, 1, "Tomate", None, &[]).await;
        testing::insert_ingredient(&pool, 2, "Courgette", None, &[]).await;
        testing::insert_ingredient(&pool, 3, "Oignon", None, &[]).await;
        testing::insert_shopping_item(&pool, 7, 1, true).await;
        testing::insert_shopping_item(&pool, 7, 2, false).await;
        testing::insert_shopping_item(&pool, 7, 3, true).await;
        testing::insert_shopping_item(&pool, 8, 2, true).await;

        let store = SqlShoppingListStore::new(pool);
        let names = store.checked_ingredient_names(UserId(7), 50).await.expect("load");

        assert_eq!(names, vec!["oignon".to_string(), "tomate".to_string()]);
    }

    #[tokio::test]
    async fn deduplicates_and_bounds_the_result() {
        let pool = testing::memory_pool().await;
        testing::insert_ingredient(&pool, 1, "Tomate", None, &[]).await;
        testing::insert_ingredient(&pool, 2, "Courgette", None, &[]).await;
        testing::insert_shopping_item(&pool, 7, 1, true).await;
        testing::insert_shopping_item(&pool, 7, 1, true).await;
        testing::insert_shopping_item(&pool, 7, 2, true).await;

        let store = SqlShoppingListStore::new(pool);
        let names = store.checked_ingredient_names(UserId(7), 1).await.expect("load");

        assert_eq!(names.len(), 1);
    }
}
