use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::RepositoryResult;
use crate::{Exercise, LogQuery, NewExercise, RecordId, User};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository {
    /// Persists a user under the id it already carries.
    /// RepositoryError will be a PersistenceError
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    // Will return an ItemNotFoundError if the user does not exist
    async fn query_by_id(&self, id: &RecordId) -> RepositoryResult<User>;

    // Users come back in the order they were created
    async fn list(&self) -> RepositoryResult<Vec<User>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExerciseRepository {
    /// Persists an exercise and returns it with its repository assigned id.
    /// RepositoryError will be a PersistenceError
    async fn create(&self, exercise: &NewExercise) -> RepositoryResult<Exercise>;

    /// Exercises belonging to `user_id` that fall inside the query's date
    /// bounds, oldest first, truncated to the query's limit.
    async fn query_log(&self, user_id: &RecordId, query: &LogQuery)
        -> RepositoryResult<Vec<Exercise>>;
}
