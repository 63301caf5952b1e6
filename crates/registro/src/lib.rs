//! Registro: per-test context for artifacts, variables and templates
//!
//! A [`RegistroContext`] belongs to one test execution. It resolves
//! `{key}` template strings against explicit and built-in variables, writes
//! artifacts under its own directory, and notifies subscribers of every
//! artifact it writes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     RegistroContext                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────────┐   ┌────────────────┐   ┌───────────────┐   │
//! │   │ Variable       │──►│ Template       │──►│ Artifact      │   │
//! │   │ Registry       │   │ Resolver       │   │ Store         │   │
//! │   └───────▲────────┘   └────────────────┘   └──────┬────────┘   │
//! │           │                                       │            │
//! │   ┌───────┴────────┐                      ┌───────▼────────┐   │
//! │   │ BuiltIn        │                      │ Artifact       │   │
//! │   │ Variables      │                      │ Subscribers    │   │
//! │   └────────────────┘                      └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use registro::{RegistroContext, TestTracker};
//!
//! # fn main() -> registro::RegistroResult<()> {
//! let tracker = TestTracker::new();
//! let mut context = RegistroContext::builder()
//!     .with_artifacts_root("target/artifacts")
//!     .with_tracker(tracker.clone())
//!     .build()?;
//!
//! tracker.start("Sign in succeeds", Some("LoginTests"));
//! context.set_variable("env", "staging");
//! let path = context.fill_template_string("{env}/{test-name-sanitized}.log")?;
//! context.add_artifact(&path, "log line", Some("Log"), None)?;
//!
//! context.artifacts().directory("staging").should().exist()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod artifacts;
mod config;
mod context;
mod events;
mod result;
mod subject;

/// Template string parsing and resolution
pub mod template;

/// Variable registry and built-in variables
pub mod variables;

pub use artifacts::{
    Artifact, ArtifactContent, ArtifactRequest, ArtifactStore, FileContentWithExtension,
    ARTIFACTS_PROVIDER_NAME,
};
pub use config::{ContextConfig, DEFAULT_ARTIFACTS_PATH_TEMPLATE, DEFAULT_ARTIFACTS_ROOT};
pub use context::{
    ContextBuilder, RegistroContext, ARTIFACTS_PATH_VARIABLE, ARTIFACTS_ROOT_VARIABLE,
};
pub use events::{ArtifactAddedEvent, ArtifactSubscribers, SubscriptionId};
pub use result::{ErrorKind, RegistroError, RegistroResult};
pub use subject::{DirectoryAssertion, DirectorySubject, FileAssertion, FileSubject};
pub use template::TemplateResolver;
pub use variables::{
    sanitize_file_name, BuiltInVariables, TestInfo, TestTracker, VariableProvider,
    VariableRegistry, VariableValue,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::artifacts::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::events::*;
    pub use super::result::*;
    pub use super::subject::*;
    pub use super::template::TemplateResolver;
    pub use super::variables::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_exposes_context_workflow() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tracker = TestTracker::new();
        let mut context = RegistroContext::builder()
            .with_artifacts_root(temp_dir.path())
            .with_artifacts_path_template("{artifacts-root}/run")
            .with_tracker(tracker.clone())
            .build()
            .unwrap();

        tracker.start("Sign in succeeds", Some("LoginTests"));
        context.set_variable("env", "staging");
        let path = context
            .fill_template_string("{env}/{test-name-sanitized}.log")
            .unwrap();
        let _ = context
            .add_artifact(&path, "log line", Some("Log"), None)
            .unwrap();

        context
            .artifacts()
            .directory("staging")
            .should()
            .contain_file("Sign in succeeds.log")
            .unwrap();
    }
}
