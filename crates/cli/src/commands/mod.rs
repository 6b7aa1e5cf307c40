//! Command handlers for the navigator CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod build_index;
pub mod init;
pub mod output;
pub mod recommend;
pub mod search;
pub mod wizard;

// Re-export command types for convenience
pub use build_index::BuildIndexCommand;
pub use init::InitCommand;
pub use recommend::RecommendCommand;
pub use search::SearchCommand;
pub use wizard::WizardCommand;
