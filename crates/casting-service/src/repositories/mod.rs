//! Persistence for actors and movies.
//!
//! Handlers talk to a [`CastingStore`] through an `Arc<dyn CastingStore>`
//! held in `AppState`. Two implementations:
//!
//! - [`PgCastingStore`] - PostgreSQL via sqlx (production)
//! - [`InMemoryCastingStore`] - `RwLock`-guarded maps (tests, local runs)
//!
//! Each operation is atomic on its own; there are no cross-record
//! transactions.

mod memory;
mod postgres;
mod seed;

pub use memory::InMemoryCastingStore;
pub use postgres::PgCastingStore;
pub use seed::{seed_initial_data, SeedError};

use crate::models::{Actor, ActorChanges, Movie, MovieChanges, NewActor, NewMovie};
use async_trait::async_trait;
use thiserror::Error;

/// Store failure. Always surfaces to clients as a generic 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Record store for the casting API.
#[async_trait]
pub trait CastingStore: Send + Sync {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError>;

    async fn get_actor(&self, id: i32) -> Result<Option<Actor>, StoreError>;

    async fn insert_actor(&self, actor: NewActor) -> Result<Actor, StoreError>;

    /// Returns `None` if no actor has this id.
    async fn update_actor(&self, id: i32, changes: ActorChanges)
        -> Result<Option<Actor>, StoreError>;

    /// Returns `false` if no actor has this id.
    async fn delete_actor(&self, id: i32) -> Result<bool, StoreError>;

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    async fn get_movie(&self, id: i32) -> Result<Option<Movie>, StoreError>;

    async fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError>;

    /// Returns `None` if no movie has this id.
    async fn update_movie(&self, id: i32, changes: MovieChanges)
        -> Result<Option<Movie>, StoreError>;

    /// Returns `false` if no movie has this id.
    async fn delete_movie(&self, id: i32) -> Result<bool, StoreError>;
}
