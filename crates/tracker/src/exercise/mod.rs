pub mod api;
pub mod coerce;
mod error;
mod model;
pub mod repository;

pub use self::error::*;
pub use crate::exercise::api::*;
pub use crate::exercise::model::*;
pub use crate::exercise::repository::*;
