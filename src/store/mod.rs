pub mod gateway;
pub mod queries;
pub mod results;

pub use gateway::StoreGateway;
pub use queries::ResourceName;
pub use results::{Row, TabularResult, Term};
