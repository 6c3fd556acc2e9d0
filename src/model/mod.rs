pub mod task;
pub mod document;
pub mod project;
pub mod config;

pub use task::*;
pub use document::*;
pub use project::*;
pub use config::*;
