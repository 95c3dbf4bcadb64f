pub mod descriptor;
pub mod error;
pub mod executor;
pub mod tables;

pub use descriptor::{GatewayOutcome, OperationDescriptor};
pub use error::GatewayError;
pub use executor::QueryGateway;
pub use tables::TableRegistry;
