use crate::exercise::error;
use crate::coerce::{parse_duration, parse_optional_date};
use crate::repository::{ExerciseRepository, UserRepository};
use crate::{
    Exercise, ExerciseFields, LogFilter, NewExercise, RecordId, RepositoryError, TrackerError,
    User,
};
use async_trait::async_trait;
use chrono::Utc;
use error::TrackerResult;
use tracing::{debug, error, instrument};

/// A user together with the slice of their exercise log that matched a query.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseLog {
    pub user: User,
    pub exercises: Vec<Exercise>,
}

impl ExerciseLog {
    /// Number of entries returned, not the number of entries stored.
    pub fn count(&self) -> usize {
        self.exercises.len()
    }
}

#[async_trait]
pub trait ExerciseTracking {
    async fn create_user(&self, username: String) -> TrackerResult<User>;

    async fn list_users(&self) -> TrackerResult<Vec<User>>;

    async fn add_exercise(
        &self,
        user_id: &RecordId,
        fields: ExerciseFields,
    ) -> TrackerResult<(User, Exercise)>;

    async fn exercise_log(&self, user_id: &RecordId, filter: LogFilter)
        -> TrackerResult<ExerciseLog>;
}

#[derive(Clone, Debug)]
pub struct ExerciseTracker<'a, U: UserRepository, E: ExerciseRepository> {
    users: &'a U,
    exercises: &'a E,
}

impl<'a, U: UserRepository, E: ExerciseRepository> ExerciseTracker<'a, U, E> {
    pub fn new(users: &'a U, exercises: &'a E) -> Self {
        Self { users, exercises }
    }

    async fn find_user(&self, id: &RecordId) -> TrackerResult<User> {
        match self.users.query_by_id(id).await {
            Ok(user) => Ok(user),
            Err(err) => match err {
                RepositoryError::ItemNotFoundError => {
                    debug!("user {} not found", id);
                    Err(TrackerError::UserNotFound)
                }
                e => {
                    error!("{}", e.to_string());
                    Err(TrackerError::LookupError)
                }
            },
        }
    }
}

fn save_error(err: RepositoryError) -> TrackerError {
    match err {
        RepositoryError::PersistenceError(e) => {
            error!("{}", e);
            TrackerError::SaveFailed
        }
        e => {
            error!("{}", e.to_string());
            TrackerError::UnknownError
        }
    }
}

#[async_trait]
impl<U, E> ExerciseTracking for ExerciseTracker<'_, U, E>
where
    U: UserRepository + Sync + std::fmt::Debug,
    E: ExerciseRepository + Sync + std::fmt::Debug,
{
    /// Creates a new user. Usernames are not required to be unique.
    #[instrument(skip(self))]
    async fn create_user(&self, username: String) -> TrackerResult<User> {
        let user = User::new(username);
        self.users.create(&user).await.map_err(save_error)?;
        debug!("created user {}", user.id);
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> TrackerResult<Vec<User>> {
        match self.users.list().await {
            Ok(users) => Ok(users),
            Err(err) => {
                error!("{}", err.to_string());
                Err(TrackerError::LookupError)
            }
        }
    }

    ///Logs an exercise against an existing user. The fields are only coerced
    ///once the user is known to exist, and a missing date means now.
    ///
    ///# Returns
    ///* [`Ok`] with the owning user and the stored exercise
    ///* [`TrackerError::UserNotFound`] if no user has the given id
    ///* [`TrackerError::InvalidDate`] if the date is not a date
    ///* [`TrackerError::SaveFailed`] if the repository could not store the exercise
    #[instrument(skip(self, fields), fields(user_id = %user_id))]
    async fn add_exercise(
        &self,
        user_id: &RecordId,
        fields: ExerciseFields,
    ) -> TrackerResult<(User, Exercise)> {
        let user = self.find_user(user_id).await?;

        let date = parse_optional_date(fields.date.as_deref())?;
        let new_exercise = NewExercise {
            user_id: user_id.clone(),
            description: fields.description.unwrap_or_default(),
            duration: fields.duration.as_deref().and_then(parse_duration),
            date: date.unwrap_or_else(Utc::now),
        };

        let exercise = self
            .exercises
            .create(&new_exercise)
            .await
            .map_err(save_error)?;
        debug!("stored exercise {}", exercise.id);
        Ok((user, exercise))
    }

    ///Retrieves the exercises a user has logged, filtered by `filter`
    ///
    ///# Returns
    ///* [`Ok`] with the user and the matching exercises, oldest first
    ///* [`TrackerError::UserNotFound`] if no user has the given id
    ///* [`TrackerError::InvalidDate`] if either bound is not a date
    ///* [`TrackerError::LookupError`] if the repository query fails
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn exercise_log(&self, user_id: &RecordId, filter: LogFilter) -> TrackerResult<ExerciseLog> {
        let user = self.find_user(user_id).await?;
        let query = filter.to_query()?;

        match self.exercises.query_log(user_id, &query).await {
            Ok(exercises) => {
                debug!("found {} exercises", exercises.len());
                Ok(ExerciseLog { user, exercises })
            }
            Err(err) => {
                error!("{}", err.to_string());
                Err(TrackerError::LookupError)
            }
        }
    }
}
