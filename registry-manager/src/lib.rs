pub mod auth;
pub mod build_cache;
pub mod config;
pub mod contract;
pub mod deployer;
pub mod error;
pub mod helpers;
pub mod membership;
pub mod transaction;

pub use crate::config::ManagerConfig;
pub use crate::deployer::DeploymentOrchestrator;
pub use crate::error::{ManagerError, ManagerResult};
