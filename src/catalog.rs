use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::movie;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct MovieCatalog {
    db: DatabaseConnection,
}

impl MovieCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All movies in stored order.
    pub async fn list(&self) -> AppResult<Vec<movie::Model>> {
        Ok(movie::Entity::find().all(&self.db).await?)
    }

    /// Inserts a movie. No duplicate checking.
    pub async fn add(
        &self,
        title: &str,
        director: &str,
        release_year: i32,
    ) -> AppResult<movie::Model> {
        let new_movie = movie::ActiveModel {
            title: Set(title.to_string()),
            director: Set(director.to_string()),
            release_year: Set(release_year),
            ..Default::default()
        };

        Ok(new_movie.insert(&self.db).await?)
    }

    pub async fn get(&self, movie_id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(movie_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".into()))
    }
}
