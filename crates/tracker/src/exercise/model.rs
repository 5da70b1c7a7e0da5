use crate::coerce::{parse_limit, parse_optional_date};
use crate::{TrackerError, TrackerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const RECORD_ID_LEN: usize = 24;

/// Opaque identifier assigned to users and exercises when they are created.
///
/// Ids are 24 lowercase hex characters: a big-endian seconds timestamp
/// followed by eight random bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        let secs = Utc::now().timestamp() as u32;
        let random: [u8; 8] = rand::random();

        let mut id = String::with_capacity(RECORD_ID_LEN);
        for byte in secs.to_be_bytes().iter().chain(random.iter()) {
            id.push_str(&format!("{:02x}", byte));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == RECORD_ID_LEN && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(TrackerError::MalformedId(s.to_string()))
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: RecordId,
    pub username: String,
}

impl User {
    pub fn new(username: String) -> Self {
        Self {
            id: RecordId::generate(),
            username,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Exercise {
    pub id: RecordId,
    pub user_id: RecordId,
    pub description: String,
    // None when the submitted duration was not a number
    pub duration: Option<i64>,
    pub date: DateTime<Utc>,
}

/// An exercise that has been validated but not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExercise {
    pub user_id: RecordId,
    pub description: String,
    pub duration: Option<i64>,
    pub date: DateTime<Utc>,
}

/// Filter applied when reading back a user's exercise log.
///
/// Both date bounds are inclusive. `limit` is always a positive count when set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Exercise fields exactly as a client submitted them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ExerciseFields {
    pub description: Option<String>,
    pub duration: Option<String>,
    pub date: Option<String>,
}

/// Log filter exactly as a client submitted it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct LogFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
}

impl LogFilter {
    /// Fails with `InvalidDate` when either bound is not a date.
    pub fn to_query(&self) -> TrackerResult<LogQuery> {
        Ok(LogQuery {
            from: parse_optional_date(self.from.as_deref())?,
            to: parse_optional_date(self.to.as_deref())?,
            limit: self.limit.as_deref().and_then(parse_limit),
        })
    }
}
