pub mod manifest;
pub mod naming;
pub mod scheduler;
pub mod service;
pub mod status;

pub use self::service::{DeployConfig, DeployService};
