use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate, Error, QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};
use tracker::repository::{ExerciseRepository, UserRepository};
use tracker::RepositoryError::{ConnectionError, ItemNotFoundError, PersistenceError, QueryError};
use tracker::{Exercise, LogQuery, NewExercise, RecordId, RepositoryResult, User};

#[derive(Clone, Debug)]
pub enum DBType<'a> {
    InMemory,
    File(&'a Path),
    Url(&'a str),
}

/// Users and exercises kept in one SQLite database.
///
/// Dates are stored as milliseconds since the Unix epoch so that range
/// filters and ordering happen in SQL.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    #[instrument]
    pub async fn new(dbtype: DBType<'_>) -> RepositoryResult<Self> {
        let in_memory = match dbtype {
            DBType::InMemory => true,
            DBType::File(_) => false,
            DBType::Url(url) => url.contains(":memory:"),
        };

        let opts = match dbtype {
            DBType::InMemory => SqliteConnectOptions::from_str("sqlite::memory:"),
            DBType::File(f) => {
                SqliteConnectOptions::from_str(format!("sqlite://{}", f.display()).as_str())
            }
            DBType::Url(url) => SqliteConnectOptions::from_str(url),
        }
        .map_err(|e| ConnectionError(e.to_string()))?
        .create_if_missing(true);

        // an in-memory database is dropped once its last connection closes
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(opts)
            .await
            .map_err(|e| ConnectionError(e.to_string()))?;

        migrate!("db/migrations/tracker")
            .run(&pool)
            .await
            .map_err(|e| ConnectionError(e.to_string()))?;

        debug!("sqlite store ready");
        Ok(Self { pool })
    }

    fn process_user(row: &SqliteRow) -> RepositoryResult<User> {
        let id: String = row.try_get("id").map_err(|e| QueryError(e.to_string()))?;
        Ok(User {
            id: parse_id(&id)?,
            username: row
                .try_get("username")
                .map_err(|e| QueryError(e.to_string()))?,
        })
    }

    fn process_exercise(row: &SqliteRow) -> RepositoryResult<Exercise> {
        let get_err = |e: Error| QueryError(e.to_string());
        let id: String = row.try_get("id").map_err(get_err)?;
        let user_id: String = row.try_get("user_id").map_err(get_err)?;
        let date: i64 = row.try_get("date").map_err(get_err)?;

        Ok(Exercise {
            id: parse_id(&id)?,
            user_id: parse_id(&user_id)?,
            description: row.try_get("description").map_err(get_err)?,
            duration: row.try_get("duration").map_err(get_err)?,
            date: from_millis(date)?,
        })
    }
}

fn parse_id(id: &str) -> RepositoryResult<RecordId> {
    id.parse().map_err(|_| QueryError(format!("stored id {} is malformed", id)))
}

fn from_millis(ms: i64) -> RepositoryResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| QueryError(format!("stored date {} is out of range", ms)))
}

#[async_trait]
impl UserRepository for SqliteStore {
    #[instrument(skip(self), fields(id = %user.id))]
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let query_result = sqlx::query(
            r#"
                INSERT INTO USERS (id, username) VALUES (?1, ?2)
                "#,
        )
        .bind(user.id.as_str())
        .bind(&user.username)
        .execute(&self.pool)
        .await;

        match query_result {
            Ok(_) => Ok(()),
            Err(e) => Err(PersistenceError(e.to_string())),
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn query_by_id(&self, id: &RecordId) -> RepositoryResult<User> {
        let query_result = sqlx::query(
            r#"
                SELECT id, username FROM USERS WHERE id = ?1
                "#,
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await;

        match query_result {
            Ok(row) => Self::process_user(&row),
            Err(Error::RowNotFound) => Err(ItemNotFoundError),
            Err(e) => Err(QueryError(e.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<User>> {
        let query_result = sqlx::query(
            r#"
            SELECT id, username FROM USERS ORDER BY seq;
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        match query_result {
            Ok(rows) => rows.iter().map(Self::process_user).collect(),
            Err(err) => Err(QueryError(err.to_string())),
        }
    }
}

#[async_trait]
impl ExerciseRepository for SqliteStore {
    #[instrument(skip(self), fields(user_id = %exercise.user_id))]
    async fn create(&self, exercise: &NewExercise) -> RepositoryResult<Exercise> {
        let id = RecordId::generate();
        let date = from_millis(exercise.date.timestamp_millis())?;

        let query_result = sqlx::query(
            r#"
                INSERT INTO EXERCISES (id, user_id, description, duration, date)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
        )
        .bind(id.as_str())
        .bind(exercise.user_id.as_str())
        .bind(&exercise.description)
        .bind(exercise.duration)
        .bind(date.timestamp_millis())
        .execute(&self.pool)
        .await;

        match query_result {
            Ok(_) => Ok(Exercise {
                id,
                user_id: exercise.user_id.clone(),
                description: exercise.description.clone(),
                duration: exercise.duration,
                date,
            }),
            Err(e) => Err(PersistenceError(e.to_string())),
        }
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn query_log(
        &self,
        user_id: &RecordId,
        query: &LogQuery,
    ) -> RepositoryResult<Vec<Exercise>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, user_id, description, duration, date FROM EXERCISES WHERE user_id = ",
        );
        builder.push_bind(user_id.as_str());
        if let Some(from) = query.from {
            builder.push(" AND date >= ").push_bind(from.timestamp_millis());
        }
        if let Some(to) = query.to {
            builder.push(" AND date <= ").push_bind(to.timestamp_millis());
        }
        builder.push(" ORDER BY date ASC, seq ASC");
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let query_result = builder.build().fetch_all(&self.pool).await;
        match query_result {
            Ok(rows) => rows.iter().map(Self::process_exercise).collect(),
            Err(err) => Err(QueryError(err.to_string())),
        }
    }
}
