pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod io;
pub mod logging;
pub mod storage;

pub use application::{TransferEngine, TransferOrchestrator};
pub use config::EngineConfig;
pub use domain::*;
pub use storage::{AccountStore, InMemoryAccountStore};
