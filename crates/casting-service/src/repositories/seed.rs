//! Sample records loaded at startup when `SEED_DATA` is set.

use super::{CastingStore, StoreError};
use crate::models::{NewActor, NewMovie, RELEASE_DATE_FORMAT};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::instrument;

const SEED_ACTORS: [(&str, i32, &str); 3] = [
    ("actor 1", 46, "Male"),
    ("actor 2", 57, "Male"),
    ("actor 3", 39, "Female"),
];

const SEED_MOVIES: [(&str, &str); 3] = [
    ("movie1", "2010-07-16"),
    ("movie2", "1999-03-31"),
    ("movie3", "2014-11-07"),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed insert failed: {0}")]
    Store(#[from] StoreError),

    #[error("seed release date is malformed: {0}")]
    Date(#[from] chrono::ParseError),
}

/// Insert three sample actors and three sample movies.
///
/// Not idempotent: every call inserts fresh rows with new ids.
///
/// # Errors
///
/// Stops at the first failed insert; rows already inserted are kept.
#[instrument(skip_all, name = "casting.repo.seed")]
pub async fn seed_initial_data(store: &dyn CastingStore) -> Result<(), SeedError> {
    for (name, age, gender) in SEED_ACTORS {
        store
            .insert_actor(NewActor {
                name: name.to_string(),
                age,
                gender: gender.to_string(),
            })
            .await?;
    }

    for (title, release_date) in SEED_MOVIES {
        store
            .insert_movie(NewMovie {
                title: title.to_string(),
                release_date: NaiveDate::parse_from_str(release_date, RELEASE_DATE_FORMAT)?,
            })
            .await?;
    }

    tracing::info!(
        target: "casting.repo",
        actors = SEED_ACTORS.len(),
        movies = SEED_MOVIES.len(),
        "Seeded initial data"
    );

    Ok(())
}
