//! PostgreSQL store.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)

use super::{CastingStore, StoreError};
use crate::models::{Actor, ActorChanges, Movie, MovieChanges, NewActor, NewMovie};
use crate::observability::metrics;
use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Instant;
use tracing::instrument;

/// Run a query, recording its duration and outcome.
async fn timed<T, F>(operation: &'static str, query: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_db_query(operation, status, start.elapsed());
    result.map_err(StoreError::from)
}

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgCastingStore {
    pool: PgPool,
}

impl PgCastingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl CastingStore for PgCastingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        timed("ping", async {
            sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
        })
        .await
    }

    #[instrument(skip_all, name = "casting.repo.list_actors")]
    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        timed(
            "list_actors",
            sqlx::query_as::<_, Actor>("SELECT id, name, age, gender FROM actors ORDER BY id")
                .fetch_all(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.get_actor", fields(actor_id = id))]
    async fn get_actor(&self, id: i32) -> Result<Option<Actor>, StoreError> {
        timed(
            "get_actor",
            sqlx::query_as::<_, Actor>("SELECT id, name, age, gender FROM actors WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.insert_actor")]
    async fn insert_actor(&self, actor: NewActor) -> Result<Actor, StoreError> {
        timed(
            "insert_actor",
            sqlx::query_as::<_, Actor>(
                r#"
                INSERT INTO actors (name, age, gender)
                VALUES ($1, $2, $3)
                RETURNING id, name, age, gender
                "#,
            )
            .bind(&actor.name) // $1
            .bind(actor.age) // $2
            .bind(&actor.gender) // $3
            .fetch_one(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.update_actor", fields(actor_id = id))]
    async fn update_actor(
        &self,
        id: i32,
        changes: ActorChanges,
    ) -> Result<Option<Actor>, StoreError> {
        timed(
            "update_actor",
            sqlx::query_as::<_, Actor>(
                r#"
                UPDATE actors
                SET name = COALESCE($2, name),
                    age = COALESCE($3, age),
                    gender = COALESCE($4, gender)
                WHERE id = $1
                RETURNING id, name, age, gender
                "#,
            )
            .bind(id) // $1
            .bind(changes.name) // $2
            .bind(changes.age) // $3
            .bind(changes.gender) // $4
            .fetch_optional(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.delete_actor", fields(actor_id = id))]
    async fn delete_actor(&self, id: i32) -> Result<bool, StoreError> {
        let result = timed(
            "delete_actor",
            sqlx::query("DELETE FROM actors WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, name = "casting.repo.list_movies")]
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        timed(
            "list_movies",
            sqlx::query_as::<_, Movie>("SELECT id, title, release_date FROM movies ORDER BY id")
                .fetch_all(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.get_movie", fields(movie_id = id))]
    async fn get_movie(&self, id: i32) -> Result<Option<Movie>, StoreError> {
        timed(
            "get_movie",
            sqlx::query_as::<_, Movie>("SELECT id, title, release_date FROM movies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.insert_movie")]
    async fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        timed(
            "insert_movie",
            sqlx::query_as::<_, Movie>(
                r#"
                INSERT INTO movies (title, release_date)
                VALUES ($1, $2)
                RETURNING id, title, release_date
                "#,
            )
            .bind(&movie.title) // $1
            .bind(movie.release_date) // $2
            .fetch_one(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.update_movie", fields(movie_id = id))]
    async fn update_movie(
        &self,
        id: i32,
        changes: MovieChanges,
    ) -> Result<Option<Movie>, StoreError> {
        timed(
            "update_movie",
            sqlx::query_as::<_, Movie>(
                r#"
                UPDATE movies
                SET title = COALESCE($2, title),
                    release_date = COALESCE($3, release_date)
                WHERE id = $1
                RETURNING id, title, release_date
                "#,
            )
            .bind(id) // $1
            .bind(changes.title) // $2
            .bind(changes.release_date) // $3
            .fetch_optional(&self.pool),
        )
        .await
    }

    #[instrument(skip_all, name = "casting.repo.delete_movie", fields(movie_id = id))]
    async fn delete_movie(&self, id: i32) -> Result<bool, StoreError> {
        let result = timed(
            "delete_movie",
            sqlx::query("DELETE FROM movies WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
