//! redpen-providers: remote assessment sources.
//!
//! Implements the `AssessmentSource` trait for OpenAI-compatible
//! chat-completions endpoints, loads the redpen configuration file and wires
//! both into an `AssessmentService`.

pub mod config;
pub mod error;
pub mod mock;
pub mod remote;

pub use config::{
    build_service, create_remote_source, load_config, load_config_from, RedpenConfig, RemoteConfig,
};
pub use error::SourceError;
pub use remote::RemoteSource;
