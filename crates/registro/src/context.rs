//! Test execution context.
//!
//! One [`RegistroContext`] belongs to one test execution. It owns the
//! variable registry and the artifact store; parallel tests each build their
//! own context instead of sharing one.

use crate::artifacts::{
    Artifact, ArtifactContent, ArtifactRequest, ArtifactStore, FileContentWithExtension,
};
use crate::config::ContextConfig;
use crate::events::{ArtifactAddedEvent, SubscriptionId};
use crate::result::RegistroResult;
use crate::subject::DirectorySubject;
use crate::template::TemplateResolver;
use crate::variables::{
    BuiltInVariables, TestTracker, VariableProvider, VariableRegistry, VariableValue,
};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Variable holding the configured artifacts base directory
pub const ARTIFACTS_ROOT_VARIABLE: &str = "artifacts-root";
/// Variable holding this context's resolved artifacts directory
pub const ARTIFACTS_PATH_VARIABLE: &str = "artifacts-path";

/// Builder for [`RegistroContext`]
#[derive(Default)]
pub struct ContextBuilder {
    config: ContextConfig,
    tracker: TestTracker,
    build_start: Option<DateTime<Local>>,
    providers: Vec<Box<dyn VariableProvider>>,
}

impl fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("config", &self.config)
            .field("tracker", &self.tracker)
            .field("build_start", &self.build_start)
            .field("provider_count", &self.providers.len())
            .finish()
    }
}

impl ContextBuilder {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration
    #[must_use]
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Read the current test from this tracker
    #[must_use]
    pub fn with_tracker(mut self, tracker: TestTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Fix the `{build-start}` time
    #[must_use]
    pub const fn with_build_start(mut self, build_start: DateTime<Local>) -> Self {
        self.build_start = Some(build_start);
        self
    }

    /// Add a fallback provider, consulted after the built-in variables
    #[must_use]
    pub fn with_provider(mut self, provider: impl VariableProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Set artifacts base directory
    #[must_use]
    pub fn with_artifacts_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_artifacts_root(root);
        self
    }

    /// Set artifacts path template
    #[must_use]
    pub fn with_artifacts_path_template(mut self, template: impl Into<String>) -> Self {
        self.config = self.config.with_artifacts_path_template(template);
        self
    }

    /// Add an initial variable
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.with_variable(key, value);
        self
    }

    /// Build the context, resolving the artifacts path template.
    ///
    /// The artifacts directory itself is created on first write.
    pub fn build(self) -> RegistroResult<RegistroContext> {
        let Self {
            config,
            tracker,
            build_start,
            providers,
        } = self;
        config.validate()?;

        let mut built_ins = BuiltInVariables::new(tracker.clone());
        if let Some(build_start) = build_start {
            built_ins = built_ins.with_build_start(build_start);
        }

        let mut variables = VariableRegistry::new();
        variables.extend(config.variables.clone());
        variables.add_provider(built_ins);
        for provider in providers {
            variables.add_boxed_provider(provider);
        }
        variables.add_provider(single_variable(
            ARTIFACTS_ROOT_VARIABLE,
            config.artifacts_root.to_string_lossy().into_owned(),
        ));

        let resolved = TemplateResolver::new(&variables).resolve(&config.artifacts_path_template)?;
        let artifacts_path = PathBuf::from(resolved);
        variables.add_provider(single_variable(
            ARTIFACTS_PATH_VARIABLE,
            artifacts_path.to_string_lossy().into_owned(),
        ));

        info!(artifacts_path = %artifacts_path.display(), "Created context");

        Ok(RegistroContext {
            config,
            tracker,
            variables,
            store: ArtifactStore::new(artifacts_path),
        })
    }
}

fn single_variable(key: &str, value: String) -> BTreeMap<String, VariableValue> {
    BTreeMap::from([(key.to_string(), VariableValue::Text(value))])
}

/// Per-test context owning variables and artifacts
#[derive(Debug)]
pub struct RegistroContext {
    config: ContextConfig,
    tracker: TestTracker,
    variables: VariableRegistry,
    store: ArtifactStore,
}

impl RegistroContext {
    /// Start building a context
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Configuration the context was built with
    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Tracker the built-in test variables are read from
    #[must_use]
    pub const fn tracker(&self) -> &TestTracker {
        &self.tracker
    }

    /// Variables
    #[must_use]
    pub const fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    /// Variables, mutably
    pub fn variables_mut(&mut self) -> &mut VariableRegistry {
        &mut self.variables
    }

    /// Set an explicit variable
    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<VariableValue>) {
        self.variables.set(key, value);
    }

    /// Resolve `{key}` placeholders against this context's variables
    pub fn fill_template_string(&self, template: &str) -> RegistroResult<String> {
        TemplateResolver::new(&self.variables).resolve(template)
    }

    /// Artifacts directory of this context
    #[must_use]
    pub fn artifacts_path(&self) -> &Path {
        self.store.root_path()
    }

    /// Root artifacts subject, labelled `Artifacts`
    #[must_use]
    pub fn artifacts(&self) -> DirectorySubject {
        self.store.root()
    }

    /// Artifact store
    #[must_use]
    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Write an artifact; see [`ArtifactStore::add_artifact`]
    pub fn add_artifact(
        &mut self,
        relative_file_path: &str,
        content: impl Into<ArtifactContent>,
        artifact_type: Option<&str>,
        artifact_title: Option<&str>,
    ) -> RegistroResult<ArtifactAddedEvent> {
        self.store
            .add_artifact(relative_file_path, content, artifact_type, artifact_title)
    }

    /// Write an artifact, appending the content's extension when the path has none
    pub fn add_file_content(
        &mut self,
        relative_file_path: &str,
        file_content: FileContentWithExtension,
        artifact_type: Option<&str>,
        artifact_title: Option<&str>,
    ) -> RegistroResult<ArtifactAddedEvent> {
        self.store
            .add_file_content(relative_file_path, file_content, artifact_type, artifact_title)
    }

    /// Write the artifact described by `request`
    pub fn add(&mut self, request: ArtifactRequest) -> RegistroResult<ArtifactAddedEvent> {
        self.store.add(request)
    }

    /// Artifacts written through this context, in order
    #[must_use]
    pub fn added_artifacts(&self) -> &[Artifact] {
        self.store.added()
    }

    /// Register an artifact-added handler
    pub fn subscribe_artifact_added<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ArtifactAddedEvent) -> RegistroResult<()> + 'static,
    {
        self.store.subscribe(handler)
    }

    /// Remove an artifact-added handler
    pub fn unsubscribe_artifact_added(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
