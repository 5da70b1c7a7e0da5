pub mod exercise;

pub use exercise::*;
