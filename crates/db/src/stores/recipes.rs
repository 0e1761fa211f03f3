use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::Row;

use mealweek_core::{Recipe, RecipeId, RecipeIngredient, RecipeStore, StoreError, UserId};

use super::{db_error, decode_error, placeholders};
use crate::DbPool;

pub struct SqlRecipeStore {
    pool: DbPool,
}

impl SqlRecipeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn attach_ingredients(
        &self,
        headers: Vec<RecipeHeader>,
        ingredient_limit: Option<u32>,
    ) -> Result<Vec<Recipe>, StoreError> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i64> = headers.iter().map(|header| header.id).collect();
        let sql = format!(
            "SELECT ri.recipe_id, ri.ingredient_id, ri.quantity, ri.unit,
                    i.name, i.english_name
             FROM recipe_ingredients ri
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id IN ({})
             ORDER BY ri.recipe_id, ri.id",
            placeholders(recipe_ids.len()),
        );
        let mut query = sqlx::query(&sql);
        for id in &recipe_ids {
            query = query.bind(id);
        }
        let ingredient_rows = query.fetch_all(&self.pool).await.map_err(db_error)?;

        let mut ingredient_ids: BTreeSet<i64> = BTreeSet::new();
        for row in &ingredient_rows {
            ingredient_ids.insert(row.try_get("ingredient_id").map_err(decode_error)?);
        }

        let mut seasons: HashMap<i64, BTreeSet<u32>> = HashMap::new();
        if !ingredient_ids.is_empty() {
            let sql = format!(
                "SELECT ingredient_id, month FROM ingredient_seasons
                 WHERE ingredient_id IN ({})",
                placeholders(ingredient_ids.len()),
            );
            let mut query = sqlx::query(&sql);
            for id in &ingredient_ids {
                query = query.bind(id);
            }
            for row in query.fetch_all(&self.pool).await.map_err(db_error)? {
                let ingredient_id: i64 = row.try_get("ingredient_id").map_err(decode_error)?;
                let month: u32 = row.try_get("month").map_err(decode_error)?;
                seasons.entry(ingredient_id).or_default().insert(month);
            }
        }

        let mut by_recipe: HashMap<i64, Vec<RecipeIngredient>> = HashMap::new();
        for row in &ingredient_rows {
            let recipe_id: i64 = row.try_get("recipe_id").map_err(decode_error)?;
            let ingredient_id: i64 = row.try_get("ingredient_id").map_err(decode_error)?;
            by_recipe.entry(recipe_id).or_default().push(RecipeIngredient {
                name: row.try_get("name").map_err(decode_error)?,
                english_name: row.try_get("english_name").map_err(decode_error)?,
                quantity: row.try_get("quantity").map_err(decode_error)?,
                unit: row.try_get("unit").map_err(decode_error)?,
                season_months: seasons.get(&ingredient_id).cloned().unwrap_or_default(),
            });
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let mut ingredients = by_recipe.remove(&header.id).unwrap_or_default();
                if let Some(limit) = ingredient_limit {
                    ingredients.truncate(limit as usize);
                }
                Recipe {
                    id: RecipeId(header.id),
                    title: header.title,
                    description: header.description,
                    url: header.url,
                    image: header.image,
                    starred: header.starred,
                    ingredients,
                }
            })
            .collect())
    }
}

struct RecipeHeader {
    id: i64,
    title: String,
    description: String,
    url: String,
    image: Option<String>,
    starred: bool,
}

fn row_to_header(row: &sqlx::sqlite::SqliteRow) -> Result<RecipeHeader, StoreError> {
    Ok(RecipeHeader {
        id: row.try_get("id").map_err(decode_error)?,
        title: row.try_get("title").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        url: row.try_get("url").map_err(decode_error)?,
        image: row.try_get("image").map_err(decode_error)?,
        starred: row.try_get("starred").map_err(decode_error)?,
    })
}

#[async_trait]
impl RecipeStore for SqlRecipeStore {
    async fn recipes_for_user(
        &self,
        user: UserId,
        limit: Option<u32>,
        ingredient_limit: Option<u32>,
    ) -> Result<Vec<Recipe>, StoreError> {
        let rows = match limit {
            Some(limit) => sqlx::query(
                "SELECT id, title, description, url, image, starred
                 FROM recipes
                 WHERE user_id = ?
                 ORDER BY starred DESC, created_at DESC, id DESC
                 LIMIT ?",
            )
            .bind(user.0)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?,
            None => sqlx::query(
                "SELECT id, title, description, url, image, starred
                 FROM recipes
                 WHERE user_id = ?
                 ORDER BY starred DESC, created_at DESC, id DESC",
            )
            .bind(user.0)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?,
        };

        let headers =
            rows.iter().map(row_to_header).collect::<Result<Vec<_>, StoreError>>()?;
        self.attach_ingredients(headers, ingredient_limit).await
    }

    async fn recipes_by_ids(
        &self,
        ids: &[RecipeId],
        user: UserId,
    ) -> Result<Vec<Recipe>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, title, description, url, image, starred
             FROM recipes
             WHERE user_id = ? AND id IN ({})",
            placeholders(ids.len()),
        );
        let mut query = sqlx::query(&sql).bind(user.0);
        for id in ids {
            query = query.bind(id.0);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;

        let headers =
            rows.iter().map(row_to_header).collect::<Result<Vec<_>, StoreError>>()?;
        self.attach_ingredients(headers, None).await
    }
}
