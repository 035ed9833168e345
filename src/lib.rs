pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod fixtures;
pub mod git;
pub mod interpreter;
pub mod scenario;
pub mod ui;
pub mod validate;

pub use error::{FixtureError, Result};
