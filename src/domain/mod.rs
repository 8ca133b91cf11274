//! Domain layer - models and contracts independent of transports

pub mod abi;
pub mod error;
pub mod governance;

pub use error::{GovernanceError, GovernanceResult};
