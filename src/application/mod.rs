// Application layer - the transfer core
// - engine: pairwise-locked balance mutation
// - orchestrator: engine + notifications + error classification
// - response: classification for request handlers

pub mod engine;
pub mod error;
pub mod locks;
pub mod notify;
pub mod orchestrator;
pub mod response;

pub use engine::*;
pub use error::*;
pub use locks::*;
pub use notify::*;
pub use orchestrator::*;
pub use response::*;
