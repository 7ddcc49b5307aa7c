pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod store;

pub use error::{Error, Result};
