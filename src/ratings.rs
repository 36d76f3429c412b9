use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::access::{self, Role};
use crate::entities::{movie, rating, user};
use crate::error::{AppError, AppResult};

/// Rating submissions, one row per submission event. Submissions are not
/// deduplicated per (user, movie); repeated submission appends a new row.
#[derive(Clone)]
pub struct RatingLedger {
    db: DatabaseConnection,
}

impl RatingLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn submit(
        &self,
        username: &str,
        movie_id: i32,
        value: i32,
    ) -> AppResult<rating::Model> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let new_rating = rating::ActiveModel {
            user_id: Set(user.id),
            movie_id: Set(movie_id),
            rating: Set(value),
            username: Set(username.to_string()),
            ..Default::default()
        };

        Ok(new_rating.insert(&self.db).await?)
    }

    /// All ratings joined with their movie. An empty join result is
    /// reported as not-found rather than an empty list.
    pub async fn list(&self) -> AppResult<Vec<(rating::Model, movie::Model)>> {
        let rows: Vec<(rating::Model, movie::Model)> = rating::Entity::find()
            .find_also_related(movie::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(r, m)| m.map(|m| (r, m)))
            .collect();

        if rows.is_empty() {
            return Err(AppError::NotFound("No ratings found".into()));
        }

        Ok(rows)
    }

    pub async fn for_movie(&self, movie_id: i32) -> AppResult<Vec<rating::Model>> {
        Ok(rating::Entity::find()
            .filter(rating::Column::MovieId.eq(movie_id))
            .all(&self.db)
            .await?)
    }

    /// Updates the requester's rating rows for a movie, matched by
    /// (username, movie_id) rather than by rating id.
    pub async fn update(&self, username: &str, movie_id: i32, new_value: i32) -> AppResult<()> {
        let result = rating::Entity::update_many()
            .set(rating::ActiveModel { rating: Set(new_value), ..Default::default() })
            .filter(rating::Column::Username.eq(username))
            .filter(rating::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("No existing rating found for this movie".into()));
        }

        Ok(())
    }

    /// Admins delete any row; other users only their own. A missing row and
    /// a foreign row are deliberately the same not-found answer.
    pub async fn delete(&self, rating_id: i32, requester: &str) -> AppResult<()> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(requester))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let role = Role::parse(&user.role).unwrap_or(Role::User);

        let rating = rating::Entity::find_by_id(rating_id).one(&self.db).await?;
        let owns = rating.as_ref().is_some_and(|r| r.username == requester);

        if !access::may_delete_rating(role, owns) {
            return Err(AppError::NotFound("No rating found or unauthorized to delete".into()));
        }

        rating::Entity::delete_by_id(rating_id).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

    use super::*;
    use crate::db::test_db;

    async fn seed_user(db: &DatabaseConnection, username: &str, role: &str) {
        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set("hash".to_string()),
            role: Set(role.to_string()),
            created_at: Set(0),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    async fn seed_movie(db: &DatabaseConnection, title: &str) -> i32 {
        movie::ActiveModel {
            title: Set(title.to_string()),
            director: Set("someone".to_string()),
            release_year: Set(2000),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn submit_resolves_user_and_denormalizes_username() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        let row = ledger.submit("alice", movie_id, 9).await.unwrap();

        assert_eq!(row.username, "alice");
        assert_eq!(row.movie_id, movie_id);
        assert_eq!(row.rating, 9);
    }

    #[tokio::test]
    async fn submit_for_unknown_user_is_not_found() {
        let db = test_db().await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        assert!(matches!(ledger.submit("ghost", movie_id, 5).await, Err(AppError::NotFound(_))));
    }

    // Current behavior, possibly unintended upstream: resubmitting for the
    // same (user, movie) appends a second row instead of upserting.
    #[tokio::test]
    async fn repeated_submission_creates_duplicate_rows() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db.clone());
        ledger.submit("alice", movie_id, 7).await.unwrap();
        ledger.submit("alice", movie_id, 8).await.unwrap();

        let rows = ledger.for_movie(movie_id).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn empty_ledger_lists_as_not_found() {
        let ledger = RatingLedger::new(test_db().await);
        assert!(matches!(ledger.list().await, Err(AppError::NotFound(_))));
    }

    // Ratings whose movie join comes back empty must not count toward the
    // emptiness check. Orphans cannot appear through the API (the foreign
    // key rejects them), so one is forced in with enforcement off.
    #[tokio::test]
    async fn rating_without_movie_lists_as_not_found() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;

        db.execute(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA foreign_keys=OFF".to_string(),
        ))
        .await
        .unwrap();

        db.execute(Statement::from_string(
            db.get_database_backend(),
            "INSERT INTO ratings (user_id, movie_id, rating, username) \
             VALUES (1, 999, 5, 'alice')"
                .to_string(),
        ))
        .await
        .unwrap();

        let ledger = RatingLedger::new(db);
        assert!(matches!(ledger.list().await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_joins_movie_metadata() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        ledger.submit("alice", movie_id, 9).await.unwrap();

        let rows = ledger.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0.username, "alice");
        assert_eq!(rows[0].1.title, "Up");
    }

    #[tokio::test]
    async fn update_matches_by_username_and_movie() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        ledger.submit("alice", movie_id, 3).await.unwrap();
        ledger.update("alice", movie_id, 10).await.unwrap();

        let rows = ledger.for_movie(movie_id).await.unwrap();
        assert_eq!(rows[0].rating, 10);
    }

    #[tokio::test]
    async fn update_without_existing_rating_is_not_found() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        assert!(matches!(ledger.update("alice", movie_id, 5).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn owner_can_delete_own_rating() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        let row = ledger.submit("alice", movie_id, 9).await.unwrap();

        ledger.delete(row.id, "alice").await.unwrap();
        assert!(ledger.for_movie(movie_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_admin_cannot_delete_foreign_rating() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        seed_user(&db, "bob", "user").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        let row = ledger.submit("alice", movie_id, 9).await.unwrap();

        assert!(matches!(ledger.delete(row.id, "bob").await, Err(AppError::NotFound(_))));
        assert_eq!(ledger.for_movie(movie_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_deletes_any_rating() {
        let db = test_db().await;
        seed_user(&db, "alice", "user").await;
        seed_user(&db, "root", "admin").await;
        let movie_id = seed_movie(&db, "Up").await;

        let ledger = RatingLedger::new(db);
        let row = ledger.submit("alice", movie_id, 9).await.unwrap();

        ledger.delete(row.id, "root").await.unwrap();
        assert!(ledger.for_movie(movie_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_unknown_requester_is_not_found() {
        let db = test_db().await;
        let ledger = RatingLedger::new(db);
        assert!(matches!(ledger.delete(1, "ghost").await, Err(AppError::NotFound(_))));
    }
}
