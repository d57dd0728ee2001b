pub mod api_connection;
pub mod cli;
pub mod client;
pub mod completion;
pub mod config;
pub mod error;
pub mod nutrition;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod vocab;

pub use error::{Error, Result};
