//! Casting Service models.
//!
//! Records, partial-change structs, response bodies and the request body
//! validation that turns raw JSON into them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum gender length (matches the `VARCHAR(10)` column).
pub const MAX_GENDER_CHARS: usize = 10;

/// Wire format for `release_date`.
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Records
// ============================================================================

/// Actor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

/// Movie record. `release_date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub release_date: NaiveDate,
}

/// Fields for a new actor; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActor {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

/// Partial actor update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

/// Fields for a new movie; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: NaiveDate,
}

/// Partial movie update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl Actor {
    /// Apply a partial update in place.
    pub fn apply(&mut self, changes: ActorChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(age) = changes.age {
            self.age = age;
        }
        if let Some(gender) = changes.gender {
            self.gender = gender;
        }
    }
}

impl Movie {
    /// Apply a partial update in place.
    pub fn apply(&mut self, changes: MovieChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(release_date) = changes.release_date {
            self.release_date = release_date;
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ActorListResponse {
    pub success: bool,
    pub actors: Vec<Actor>,
}

#[derive(Debug, Serialize)]
pub struct ActorResponse {
    pub success: bool,
    pub actor: Actor,
}

#[derive(Debug, Serialize)]
pub struct ActorCreatedResponse {
    pub success: bool,
    pub created: i32,
    pub actor: Actor,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub success: bool,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub success: bool,
    pub movie: Movie,
}

#[derive(Debug, Serialize)]
pub struct MovieCreatedResponse {
    pub success: bool,
    pub created: i32,
    pub movie: Movie,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: i32,
}

/// Liveness response for `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
}

/// Readiness response for `/ready`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub success: bool,

    /// "ready" or "not_ready".
    pub status: &'static str,

    /// "healthy" or "unhealthy".
    pub database: &'static str,
}

// ============================================================================
// Request body validation
// ============================================================================

/// Why a request body was refused.
///
/// `Missing` maps to 400, `Invalid` to 422.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("required field missing or empty: {0}")]
    Missing(&'static str),

    #[error("invalid value for field: {0}")]
    Invalid(&'static str),
}

/// Empty in the sense of a JSON "falsy" value.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or(ValidationError::NotAnObject)
}

/// Required-on-create lookup: absent or blank is `Missing`.
fn required<'a>(body: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ValidationError> {
    match body.get(field) {
        Some(value) if !is_blank(value) => Ok(value),
        _ => Err(ValidationError::Missing(field)),
    }
}

/// Optional-on-update lookup: absent is `None`, present-but-blank is `Invalid`.
fn provided<'a>(
    body: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a Value>, ValidationError> {
    match body.get(field) {
        None => Ok(None),
        Some(value) if value.is_null() => Err(ValidationError::Invalid(field)),
        Some(value) => Ok(Some(value)),
    }
}

fn parse_text(value: &Value, field: &'static str) -> Result<String, ValidationError> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ValidationError::Invalid(field)),
    }
}

fn parse_age(value: &Value) -> Result<i32, ValidationError> {
    value
        .as_i64()
        .filter(|age| *age >= 0)
        .and_then(|age| i32::try_from(age).ok())
        .ok_or(ValidationError::Invalid("age"))
}

fn parse_gender(value: &Value) -> Result<String, ValidationError> {
    let gender = parse_text(value, "gender")?;
    if gender.chars().count() > MAX_GENDER_CHARS {
        return Err(ValidationError::Invalid("gender"));
    }
    Ok(gender)
}

fn parse_release_date(value: &Value) -> Result<NaiveDate, ValidationError> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, RELEASE_DATE_FORMAT).ok())
        .ok_or(ValidationError::Invalid("release_date"))
}

impl NewActor {
    /// Validate a create-actor body. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let body = as_object(body)?;

        // Presence first, so a body missing any field is a 400 even if
        // another field is malformed
        let name = required(body, "name")?;
        let age = required(body, "age")?;
        let gender = required(body, "gender")?;

        Ok(Self {
            name: parse_text(name, "name")?,
            age: parse_age(age)?,
            gender: parse_gender(gender)?,
        })
    }
}

impl ActorChanges {
    /// Validate an update-actor body. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let body = as_object(body)?;

        Ok(Self {
            name: provided(body, "name")?
                .map(|v| parse_text(v, "name"))
                .transpose()?,
            age: provided(body, "age")?.map(parse_age).transpose()?,
            gender: provided(body, "gender")?.map(parse_gender).transpose()?,
        })
    }
}

impl NewMovie {
    /// Validate a create-movie body. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let body = as_object(body)?;

        let title = required(body, "title")?;
        let release_date = required(body, "release_date")?;

        Ok(Self {
            title: parse_text(title, "title")?,
            release_date: parse_release_date(release_date)?,
        })
    }
}

impl MovieChanges {
    /// Validate an update-movie body. Unknown keys are ignored.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let body = as_object(body)?;

        Ok(Self {
            title: provided(body, "title")?
                .map(|v| parse_text(v, "title"))
                .transpose()?,
            release_date: provided(body, "release_date")?
                .map(parse_release_date)
                .transpose()?,
        })
    }
}
