//! Artifact storage under a per-context root directory.
//!
//! Artifacts are written synchronously under the root; the root itself is
//! created on the first write and never removed here.

use crate::events::{ArtifactAddedEvent, ArtifactSubscribers, SubscriptionId};
use crate::result::{RegistroError, RegistroResult};
use crate::subject::{DirectorySubject, FileSubject};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Provider name of the artifacts root subject
pub const ARTIFACTS_PROVIDER_NAME: &str = "Artifacts";

const SEPARATORS: &[char] = &['/', '\\'];

/// Content of an artifact
pub enum ArtifactContent {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Readable stream, copied to the file until EOF
    Stream(Box<dyn Read>),
}

impl ArtifactContent {
    /// Text content
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Byte content
    #[must_use]
    pub fn bytes(content: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(content.into())
    }

    /// Stream content
    #[must_use]
    pub fn stream(reader: impl Read + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Pretty-printed JSON content
    pub fn json<T: Serialize>(value: &T) -> RegistroResult<Self> {
        Ok(Self::Text(serde_json::to_string_pretty(value)?))
    }

    fn write_to(self, writer: &mut impl Write) -> io::Result<u64> {
        match self {
            Self::Text(text) => {
                writer.write_all(text.as_bytes())?;
                Ok(text.len() as u64)
            }
            Self::Bytes(bytes) => {
                writer.write_all(&bytes)?;
                Ok(bytes.len() as u64)
            }
            Self::Stream(mut reader) => io::copy(&mut reader, writer),
        }
    }
}

impl fmt::Debug for ArtifactContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<String> for ArtifactContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ArtifactContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for ArtifactContent {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for ArtifactContent {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Box<dyn Read>> for ArtifactContent {
    fn from(value: Box<dyn Read>) -> Self {
        Self::Stream(value)
    }
}

/// Content paired with the extension its file should carry.
///
/// The extension is appended to the relative path only when the path's file
/// name has none.
#[derive(Debug)]
pub struct FileContentWithExtension {
    /// Content
    pub content: ArtifactContent,
    /// Extension, with or without leading dot
    pub extension: String,
}

impl FileContentWithExtension {
    /// Pair content with an extension
    #[must_use]
    pub fn new(content: impl Into<ArtifactContent>, extension: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extension: extension.into(),
        }
    }

    /// Apply the extension to `relative_file_path` if it has none
    #[must_use]
    pub fn apply_to(&self, relative_file_path: &str) -> String {
        with_extension(relative_file_path, &self.extension)
    }
}

fn with_extension(relative_file_path: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    let file_name = relative_file_path
        .rsplit(SEPARATORS)
        .next()
        .unwrap_or(relative_file_path);
    if extension.is_empty() || file_name.contains('.') {
        relative_file_path.to_string()
    } else {
        format!("{relative_file_path}.{extension}")
    }
}

/// Builder for an artifact addition
#[derive(Debug, Default)]
pub struct ArtifactRequest {
    relative_file_path: Option<String>,
    content: Option<ArtifactContent>,
    extension: Option<String>,
    artifact_type: Option<String>,
    artifact_title: Option<String>,
}

impl ArtifactRequest {
    /// Create an empty request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set relative file path
    #[must_use]
    pub fn path(mut self, relative_file_path: impl Into<String>) -> Self {
        self.relative_file_path = Some(relative_file_path.into());
        self
    }

    /// Set content
    #[must_use]
    pub fn content(mut self, content: impl Into<ArtifactContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set text content
    #[must_use]
    pub fn text(self, content: impl Into<String>) -> Self {
        self.content(ArtifactContent::text(content))
    }

    /// Set byte content
    #[must_use]
    pub fn bytes(self, content: impl Into<Vec<u8>>) -> Self {
        self.content(ArtifactContent::bytes(content))
    }

    /// Set stream content
    #[must_use]
    pub fn stream(self, reader: impl Read + 'static) -> Self {
        self.content(ArtifactContent::stream(reader))
    }

    /// Set content together with the extension the file should carry
    #[must_use]
    pub fn file_content(mut self, file_content: FileContentWithExtension) -> Self {
        self.extension = Some(file_content.extension);
        self.content = Some(file_content.content);
        self
    }

    /// Set artifact type
    #[must_use]
    pub fn artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    /// Set artifact title
    #[must_use]
    pub fn title(mut self, artifact_title: impl Into<String>) -> Self {
        self.artifact_title = Some(artifact_title.into());
        self
    }
}

/// Record of an artifact written by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Path relative to the artifacts root, as given by the caller
    pub relative_file_path: String,
    /// Absolute path of the written file
    pub absolute_file_path: PathBuf,
    /// Optional artifact type
    pub artifact_type: Option<String>,
    /// Optional title
    pub artifact_title: Option<String>,
    /// Bytes written
    pub size: u64,
}

/// Strip a leading separator and split on `/` or `\`.
///
/// Rejects empty paths and `..` segments.
fn normalize_segments(relative_path: &str) -> RegistroResult<Vec<&str>> {
    let trimmed = relative_path.trim_start_matches(SEPARATORS);
    let segments: Vec<&str> = trimmed
        .split(SEPARATORS)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments.is_empty() {
        return Err(RegistroError::MissingArgument {
            argument: "relative_file_path",
        });
    }
    if segments.contains(&"..") {
        return Err(RegistroError::InvalidArgument {
            argument: "relative_file_path",
            message: format!("\"{relative_path}\" must not leave the artifacts directory"),
        });
    }
    Ok(segments)
}

/// Like [`normalize_segments`], and the last segment must name a file.
fn file_segments(relative_file_path: &str) -> RegistroResult<Vec<&str>> {
    let segments = normalize_segments(relative_file_path)?;
    let last = relative_file_path.rsplit(SEPARATORS).next().unwrap_or_default();
    if last.is_empty() || last == "." {
        return Err(RegistroError::InvalidArgument {
            argument: "relative_file_path",
            message: format!("\"{relative_file_path}\" names a directory, not a file"),
        });
    }
    Ok(segments)
}

/// Artifact store rooted at one directory
pub struct ArtifactStore {
    root: PathBuf,
    root_created: OnceCell<()>,
    subscribers: ArtifactSubscribers,
    added: Vec<Artifact>,
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("root", &self.root)
            .field("root_created", &self.root_created.get().is_some())
            .field("subscribers", &self.subscribers)
            .field("added", &self.added.len())
            .finish()
    }
}

impl ArtifactStore {
    /// Create a store; the root directory is not created until first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            root_created: OnceCell::new(),
            subscribers: ArtifactSubscribers::new(),
            added: Vec::new(),
        }
    }

    /// Root directory path
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if this store has not done so yet
    pub fn ensure_root(&self) -> RegistroResult<&Path> {
        self.root_created.get_or_try_init(|| {
            fs::create_dir_all(&self.root)?;
            info!(path = %self.root.display(), "Created artifacts directory");
            Ok::<(), RegistroError>(())
        })?;
        Ok(&self.root)
    }

    /// Root directory subject, labelled `Artifacts`
    #[must_use]
    pub fn root(&self) -> DirectorySubject {
        DirectorySubject::new(&self.root, ARTIFACTS_PROVIDER_NAME)
    }

    /// Subject for a directory directly under the root
    #[must_use]
    pub fn directory(&self, name: &str) -> DirectorySubject {
        self.root().directory(name)
    }

    /// Subject for a file directly under the root
    #[must_use]
    pub fn file(&self, name: &str) -> FileSubject {
        self.root().file(name)
    }

    /// Absolute path an artifact at `relative_file_path` would be written to
    pub fn resolve_path(&self, relative_file_path: &str) -> RegistroResult<PathBuf> {
        let segments = file_segments(relative_file_path)?;
        Ok(segments
            .into_iter()
            .fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    /// File subject for a relative path, validated like [`Self::add`] paths
    pub fn locate_file(&self, relative_file_path: &str) -> RegistroResult<FileSubject> {
        let segments = file_segments(relative_file_path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or(RegistroError::MissingArgument {
                argument: "relative_file_path",
            })?;
        let parent = parents
            .iter()
            .fold(self.root(), |dir, segment| dir.directory(segment));
        Ok(parent.file(last))
    }

    /// Directory subject for a relative path; `..` segments are rejected
    pub fn locate_directory(&self, relative_path: &str) -> RegistroResult<DirectorySubject> {
        let segments = normalize_segments(relative_path)?;
        Ok(segments
            .iter()
            .fold(self.root(), |dir, segment| dir.directory(segment)))
    }

    /// Register an artifact-added handler
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&ArtifactAddedEvent) -> RegistroResult<()> + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    /// Remove an artifact-added handler
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Artifacts written so far, in order
    #[must_use]
    pub fn added(&self) -> &[Artifact] {
        &self.added
    }

    /// Write an artifact and publish [`ArtifactAddedEvent`].
    ///
    /// An empty or separator-only path is a missing argument.
    pub fn add_artifact(
        &mut self,
        relative_file_path: &str,
        content: impl Into<ArtifactContent>,
        artifact_type: Option<&str>,
        artifact_title: Option<&str>,
    ) -> RegistroResult<ArtifactAddedEvent> {
        let mut request = ArtifactRequest::new()
            .path(relative_file_path)
            .content(content);
        request.artifact_type = artifact_type.map(str::to_string);
        request.artifact_title = artifact_title.map(str::to_string);
        self.add(request)
    }

    /// Write an artifact whose file gets `file_content`'s extension if it has none
    pub fn add_file_content(
        &mut self,
        relative_file_path: &str,
        file_content: FileContentWithExtension,
        artifact_type: Option<&str>,
        artifact_title: Option<&str>,
    ) -> RegistroResult<ArtifactAddedEvent> {
        let mut request = ArtifactRequest::new()
            .path(relative_file_path)
            .file_content(file_content);
        request.artifact_type = artifact_type.map(str::to_string);
        request.artifact_title = artifact_title.map(str::to_string);
        self.add(request)
    }

    /// Write the artifact described by `request` and publish the event.
    ///
    /// # Errors
    ///
    /// - [`RegistroError::MissingArgument`] when path or content is unset,
    ///   before any filesystem access
    /// - [`RegistroError::InvalidArgument`] for paths with `..` segments or a
    ///   trailing separator
    /// - [`RegistroError::Io`] from the write, unmodified
    /// - any error returned by a subscriber
    pub fn add(&mut self, request: ArtifactRequest) -> RegistroResult<ArtifactAddedEvent> {
        let ArtifactRequest {
            relative_file_path,
            content,
            extension,
            artifact_type,
            artifact_title,
        } = request;

        let relative_file_path = relative_file_path.ok_or(RegistroError::MissingArgument {
            argument: "relative_file_path",
        })?;
        let content = content.ok_or(RegistroError::MissingArgument {
            argument: "content",
        })?;
        let _ = file_segments(&relative_file_path)?;
        let relative_file_path = match extension {
            Some(extension) => with_extension(&relative_file_path, &extension),
            None => relative_file_path,
        };
        let absolute_file_path = self.resolve_path(&relative_file_path)?;

        self.ensure_root()?;
        if let Some(parent) = absolute_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&absolute_file_path)?;
        let size = content.write_to(&mut file)?;
        file.sync_all()?;
        drop(file);

        debug!(
            relative_file_path = %relative_file_path,
            size,
            artifact_type = artifact_type.as_deref().unwrap_or(""),
            "Wrote artifact"
        );

        self.added.push(Artifact {
            relative_file_path: relative_file_path.clone(),
            absolute_file_path: absolute_file_path.clone(),
            artifact_type: artifact_type.clone(),
            artifact_title: artifact_title.clone(),
            size,
        });

        let event = ArtifactAddedEvent {
            relative_file_path,
            absolute_file_path,
            artifact_type,
            artifact_title,
        };
        self.subscribers.publish(&event)?;
        Ok(event)
    }
}
