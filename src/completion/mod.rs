//! Tab completion.
//!
//! - [`scanner`] lists and caches directory contents
//! - [`bridge`] asks bash's programmable completion
//! - [`engine`] combines both with command discovery and fuzzy matching

pub mod bridge;
pub mod commands;
pub mod engine;
pub mod fuzzy;
pub mod metadata;
pub mod scanner;

pub use bridge::{CompletionProtocolBridge, CompletionRegistration, RegistrationKind};
pub use engine::{parse_input, Candidate, CompletionContext, CompletionEngine, CompletionKind};
pub use fuzzy::fuzzy_match;
pub use scanner::{DirectoryListing, FileSystemScanner, PathEntry};
