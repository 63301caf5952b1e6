//! Lazy filesystem subjects with fluent existence assertions.
//!
//! A subject is only a path plus a provider name describing how it was
//! reached, e.g. `Artifacts.Directories["dir1"].Files["file.txt"]`. Nothing
//! touches the disk until a query or assertion runs.

use crate::result::{RegistroError, RegistroResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn child_name(parent: &str, collection: &str, key: &str) -> String {
    format!("{parent}.{collection}[\"{key}\"]")
}

fn not_found_to_empty(err: io::Error) -> RegistroResult<Vec<String>> {
    if err.kind() == io::ErrorKind::NotFound {
        Ok(Vec::new())
    } else {
        Err(err.into())
    }
}

/// Lazy view over a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySubject {
    path: PathBuf,
    provider_name: String,
}

impl DirectorySubject {
    /// Create a subject for `path` labelled `provider_name`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, provider_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            provider_name: provider_name.into(),
        }
    }

    /// Filesystem path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostic access-chain label
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Directory name (last path component)
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Child directory subject
    #[must_use]
    pub fn directory(&self, name: &str) -> Self {
        Self {
            path: self.path.join(name),
            provider_name: child_name(&self.provider_name, "Directories", name),
        }
    }

    /// Child file subject
    #[must_use]
    pub fn file(&self, name: &str) -> FileSubject {
        FileSubject {
            path: self.path.join(name),
            provider_name: child_name(&self.provider_name, "Files", name),
        }
    }

    /// Check if the directory exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Names of the files directly inside, sorted.
    ///
    /// A directory that does not exist has no files.
    pub fn file_names(&self) -> RegistroResult<Vec<String>> {
        self.entry_names(|file_type| file_type.is_file())
    }

    /// Names of the directories directly inside, sorted.
    ///
    /// A directory that does not exist has no subdirectories.
    pub fn directory_names(&self) -> RegistroResult<Vec<String>> {
        self.entry_names(|file_type| file_type.is_dir())
    }

    fn entry_names(&self, keep: impl Fn(&fs::FileType) -> bool) -> RegistroResult<Vec<String>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(err) => return not_found_to_empty(err),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if keep(&entry.file_type()?) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Start a fluent assertion
    #[must_use]
    pub const fn should(&self) -> DirectoryAssertion<'_> {
        DirectoryAssertion { subject: self }
    }
}

/// Lazy view over a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSubject {
    path: PathBuf,
    provider_name: String,
}

impl FileSubject {
    /// Create a subject for `path` labelled `provider_name`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, provider_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            provider_name: provider_name.into(),
        }
    }

    /// Filesystem path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Diagnostic access-chain label
    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// File name including extension
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Extension without the leading dot
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }

    /// Check if the file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// File size in bytes
    pub fn len(&self) -> RegistroResult<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    /// Check if the file is empty
    pub fn is_empty(&self) -> RegistroResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Read the whole file as UTF-8 text
    pub fn read_to_string(&self) -> RegistroResult<String> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Read the whole file
    pub fn read_bytes(&self) -> RegistroResult<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    /// Start a fluent assertion
    #[must_use]
    pub const fn should(&self) -> FileAssertion<'_> {
        FileAssertion { subject: self }
    }
}

/// Fluent assertions over a [`DirectorySubject`]
#[derive(Debug, Clone, Copy)]
pub struct DirectoryAssertion<'a> {
    subject: &'a DirectorySubject,
}

impl DirectoryAssertion<'_> {
    /// Assert the directory exists
    pub fn exist(self) -> RegistroResult<Self> {
        if self.subject.exists() {
            Ok(self)
        } else {
            Err(RegistroError::assertion(format!(
                "Expected {} to exist, but it does not exist",
                self.subject.provider_name
            )))
        }
    }

    /// Assert the directory does not exist
    pub fn not_exist(self) -> RegistroResult<Self> {
        if self.subject.exists() {
            Err(RegistroError::assertion(format!(
                "Expected {} not to exist, but it exists",
                self.subject.provider_name
            )))
        } else {
            Ok(self)
        }
    }

    /// Assert a file with this name exists directly inside
    pub fn contain_file(self, name: &str) -> RegistroResult<Self> {
        let file = self.subject.file(name);
        if file.exists() {
            Ok(self)
        } else {
            Err(RegistroError::assertion(format!(
                "Expected {} to exist, but it does not exist",
                file.provider_name
            )))
        }
    }

    /// Assert a directory with this name exists directly inside
    pub fn contain_directory(self, name: &str) -> RegistroResult<Self> {
        let directory = self.subject.directory(name);
        if directory.exists() {
            Ok(self)
        } else {
            Err(RegistroError::assertion(format!(
                "Expected {} to exist, but it does not exist",
                directory.provider_name
            )))
        }
    }
}

/// Fluent assertions over a [`FileSubject`]
#[derive(Debug, Clone, Copy)]
pub struct FileAssertion<'a> {
    subject: &'a FileSubject,
}

impl FileAssertion<'_> {
    /// Assert the file exists
    pub fn exist(self) -> RegistroResult<Self> {
        if self.subject.exists() {
            Ok(self)
        } else {
            Err(RegistroError::assertion(format!(
                "Expected {} to exist, but it does not exist",
                self.subject.provider_name
            )))
        }
    }

    /// Assert the file does not exist
    pub fn not_exist(self) -> RegistroResult<Self> {
        if self.subject.exists() {
            Err(RegistroError::assertion(format!(
                "Expected {} not to exist, but it exists",
                self.subject.provider_name
            )))
        } else {
            Ok(self)
        }
    }

    /// Assert the file's text content equals `expected`
    pub fn have_content(self, expected: &str) -> RegistroResult<Self> {
        let actual = self.exist()?.subject.read_to_string()?;
        if actual == expected {
            Ok(self)
        } else {
            Err(RegistroError::assertion(format!(
                "Expected {} to have content {expected:?}, but was {actual:?}",
                self.subject.provider_name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod naming_tests {
        use super::*;

        #[test]
        fn test_directory_provider_name() {
            let root = DirectorySubject::new("/nonexistent/root", "Artifacts");
            assert_eq!(
                root.directory("dir1").provider_name(),
                r#"Artifacts.Directories["dir1"]"#
            );
        }

        #[test]
        fn test_nested_file_provider_name() {
            let root = DirectorySubject::new("/nonexistent/root", "Artifacts");
            let file = root.directory("dir1").file("file.txt");
            assert_eq!(
                file.provider_name(),
                r#"Artifacts.Directories["dir1"].Files["file.txt"]"#
            );
            assert_eq!(file.path(), Path::new("/nonexistent/root/dir1/file.txt"));
            assert_eq!(file.name(), "file.txt");
            assert_eq!(file.extension().as_deref(), Some("txt"));
        }

        #[test]
        fn test_building_subjects_does_not_touch_disk() {
            let temp_dir = tempfile::tempdir().unwrap();
            let root = DirectorySubject::new(temp_dir.path().join("lazy"), "Artifacts");
            let _file = root.directory("a").directory("b").file("c.txt");
            assert!(!temp_dir.path().join("lazy").exists());
        }
    }

    mod existence_tests {
        use super::*;

        #[test]
        fn test_missing_paths_report_not_existing() {
            let temp_dir = tempfile::tempdir().unwrap();
            let root = DirectorySubject::new(temp_dir.path(), "Artifacts");
            assert!(!root.directory("dir1").exists());
            assert!(!root.directory("dir1").file("file.txt").exists());
        }

        #[test]
        fn test_should_exist_failure_message() {
            let temp_dir = tempfile::tempdir().unwrap();
            let root = DirectorySubject::new(temp_dir.path(), "Artifacts");
            let err = root.directory("dir1").should().exist().unwrap_err();
            assert_eq!(
                err.to_string(),
                r#"Assertion failed: Expected Artifacts.Directories["dir1"] to exist, but it does not exist"#
            );
        }

        #[test]
        fn test_chained_assertions() {
            let temp_dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(temp_dir.path().join("dir1/sub")).unwrap();
            fs::write(temp_dir.path().join("dir1/file.txt"), "hello").unwrap();

            let root = DirectorySubject::new(temp_dir.path(), "Artifacts");
            let dir = root.directory("dir1");
            dir.should()
                .exist()
                .unwrap()
                .contain_file("file.txt")
                .unwrap()
                .contain_directory("sub")
                .unwrap();
            dir.file("file.txt")
                .should()
                .exist()
                .unwrap()
                .have_content("hello")
                .unwrap();
            dir.file("other.txt").should().not_exist().unwrap();
        }

        #[test]
        fn test_contain_file_failure_names_child() {
            let temp_dir = tempfile::tempdir().unwrap();
            let root = DirectorySubject::new(temp_dir.path(), "Artifacts");
            let err = root.should().contain_file("missing.log").unwrap_err();
            assert!(err.to_string().contains(r#"Artifacts.Files["missing.log"]"#));
        }

        #[test]
        fn test_have_content_mismatch() {
            let temp_dir = tempfile::tempdir().unwrap();
            fs::write(temp_dir.path().join("a.txt"), "actual").unwrap();
            let file = DirectorySubject::new(temp_dir.path(), "Artifacts").file("a.txt");
            let err = file.should().have_content("expected").unwrap_err();
            assert!(err.to_string().contains("\"actual\""));
        }
    }

    mod listing_tests {
        use super::*;

        #[test]
        fn test_entry_names_sorted_and_split() {
            let temp_dir = tempfile::tempdir().unwrap();
            fs::write(temp_dir.path().join("b.txt"), "").unwrap();
            fs::write(temp_dir.path().join("a.txt"), "").unwrap();
            fs::create_dir(temp_dir.path().join("logs")).unwrap();

            let root = DirectorySubject::new(temp_dir.path(), "Artifacts");
            assert_eq!(root.file_names().unwrap(), vec!["a.txt", "b.txt"]);
            assert_eq!(root.directory_names().unwrap(), vec!["logs"]);
        }

        #[test]
        fn test_missing_directory_lists_nothing() {
            let root = DirectorySubject::new("/nonexistent/registro/root", "Artifacts");
            assert!(root.file_names().unwrap().is_empty());
            assert!(root.directory_names().unwrap().is_empty());
        }

        #[test]
        fn test_file_len_and_bytes() {
            let temp_dir = tempfile::tempdir().unwrap();
            fs::write(temp_dir.path().join("data.bin"), [1_u8, 2, 3]).unwrap();
            let file = DirectorySubject::new(temp_dir.path(), "Artifacts").file("data.bin");
            assert_eq!(file.len().unwrap(), 3);
            assert!(!file.is_empty().unwrap());
            assert_eq!(file.read_bytes().unwrap(), vec![1, 2, 3]);
        }
    }
}
