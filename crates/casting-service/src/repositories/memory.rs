//! In-memory store for tests and local runs without PostgreSQL.

use super::{CastingStore, StoreError};
use crate::models::{Actor, ActorChanges, Movie, MovieChanges, NewActor, NewMovie};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// One table: rows keyed by id plus the next id to hand out.
///
/// Ids are never reused after a delete, matching a SERIAL column.
/// `next_id` is `None` once `i32::MAX` has been handed out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: Option<i32>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: Some(1),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> Result<i32, StoreError> {
        let id = self
            .next_id
            .ok_or_else(|| StoreError::Unavailable("id sequence exhausted".to_string()))?;
        self.next_id = id.checked_add(1);
        Ok(id)
    }
}

/// `CastingStore` backed by two `RwLock`-guarded maps.
#[derive(Debug, Default)]
pub struct InMemoryCastingStore {
    actors: RwLock<Table<Actor>>,
    movies: RwLock<Table<Movie>>,
    unavailable: AtomicBool,
}

impl InMemoryCastingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CastingStore for InMemoryCastingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn list_actors(&self) -> Result<Vec<Actor>, StoreError> {
        self.check_available()?;
        Ok(self.actors.read().await.rows.values().cloned().collect())
    }

    async fn get_actor(&self, id: i32) -> Result<Option<Actor>, StoreError> {
        self.check_available()?;
        Ok(self.actors.read().await.rows.get(&id).cloned())
    }

    async fn insert_actor(&self, actor: NewActor) -> Result<Actor, StoreError> {
        self.check_available()?;
        let mut table = self.actors.write().await;
        let record = Actor {
            id: table.allocate_id()?,
            name: actor.name,
            age: actor.age,
            gender: actor.gender,
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_actor(
        &self,
        id: i32,
        changes: ActorChanges,
    ) -> Result<Option<Actor>, StoreError> {
        self.check_available()?;
        let mut table = self.actors.write().await;
        Ok(table.rows.get_mut(&id).map(|actor| {
            actor.apply(changes);
            actor.clone()
        }))
    }

    async fn delete_actor(&self, id: i32) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.actors.write().await.rows.remove(&id).is_some())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        self.check_available()?;
        Ok(self.movies.read().await.rows.values().cloned().collect())
    }

    async fn get_movie(&self, id: i32) -> Result<Option<Movie>, StoreError> {
        self.check_available()?;
        Ok(self.movies.read().await.rows.get(&id).cloned())
    }

    async fn insert_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        self.check_available()?;
        let mut table = self.movies.write().await;
        let record = Movie {
            id: table.allocate_id()?,
            title: movie.title,
            release_date: movie.release_date,
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_movie(
        &self,
        id: i32,
        changes: MovieChanges,
    ) -> Result<Option<Movie>, StoreError> {
        self.check_available()?;
        let mut table = self.movies.write().await;
        Ok(table.rows.get_mut(&id).map(|movie| {
            movie.apply(changes);
            movie.clone()
        }))
    }

    async fn delete_movie(&self, id: i32) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.movies.write().await.rows.remove(&id).is_some())
    }
}
