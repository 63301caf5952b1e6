//! Variable registry with built-in dynamic variables.
//!
//! Explicitly set variables always win. Keys that were never set fall back to
//! the registered [`VariableProvider`]s, which compute their values at lookup
//! time so that the current test's identity is never stale.

use crate::result::{RegistroError, RegistroResult};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default rendering of date/time variables without a format specifier
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H_%M_%S";

static INVALID_FILE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("valid file name pattern"));

/// Replace characters that are not allowed in file names with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    INVALID_FILE_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// Value of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Plain text
    Text(String),
    /// Local date/time, rendered with a strftime format
    DateTime(DateTime<Local>),
}

impl VariableValue {
    /// Get the text value, if this is text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::DateTime(_) => None,
        }
    }

    /// Check if the value renders as an empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DEFAULT_DATE_TIME_FORMAT)),
        }
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DateTime<Local>> for VariableValue {
    fn from(value: DateTime<Local>) -> Self {
        Self::DateTime(value)
    }
}

/// Source of fallback variables consulted beneath explicit entries.
pub trait VariableProvider {
    /// Compute the value for `key`, or `None` if this provider does not know it.
    fn variable(&self, key: &str) -> Option<VariableValue>;

    /// Keys this provider can answer, for diagnostics.
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<F> VariableProvider for F
where
    F: Fn(&str) -> Option<VariableValue>,
{
    fn variable(&self, key: &str) -> Option<VariableValue> {
        self(key)
    }
}

impl VariableProvider for BTreeMap<String, VariableValue> {
    fn variable(&self, key: &str) -> Option<VariableValue> {
        self.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }
}

/// Identity of the currently executing test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestInfo {
    /// Test display name
    pub name: Option<String>,
    /// Test suite (fixture/module) name
    pub suite_name: Option<String>,
    /// When the test started
    pub start: Option<DateTime<Local>>,
}

impl TestInfo {
    /// Create test info for a named test
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            suite_name: None,
            start: None,
        }
    }

    /// Set suite name
    #[must_use]
    pub fn with_suite(mut self, suite_name: impl Into<String>) -> Self {
        self.suite_name = Some(suite_name.into());
        self
    }

    /// Set start time
    #[must_use]
    pub const fn with_start(mut self, start: DateTime<Local>) -> Self {
        self.start = Some(start);
        self
    }
}

/// Shared handle to the current test's identity.
///
/// Clones share state: the hosting test runner keeps one clone and updates it
/// between tests while the context reads through another.
#[derive(Debug, Clone, Default)]
pub struct TestTracker {
    current: Arc<Mutex<TestInfo>>,
}

impl TestTracker {
    /// Create a tracker with no running test
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker already pointing at a test
    #[must_use]
    pub fn with_test(info: TestInfo) -> Self {
        Self {
            current: Arc::new(Mutex::new(info)),
        }
    }

    /// Mark a test as started now
    pub fn start(&self, name: impl Into<String>, suite_name: Option<&str>) {
        let mut info = TestInfo::new(name).with_start(Local::now());
        info.suite_name = suite_name.map(str::to_string);
        self.set(info);
    }

    /// Replace the current test info
    pub fn set(&self, info: TestInfo) {
        *self.lock() = info;
    }

    /// Clear the current test
    pub fn finish(&self) {
        self.set(TestInfo::default());
    }

    /// Snapshot of the current test info
    #[must_use]
    pub fn current(&self) -> TestInfo {
        self.lock().clone()
    }

    // Poisoning is ignored: the guarded value is always a whole TestInfo.
    fn lock(&self) -> MutexGuard<'_, TestInfo> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Built-in variables derived from the running test and the build.
#[derive(Debug, Clone)]
pub struct BuiltInVariables {
    tracker: TestTracker,
    build_start: DateTime<Local>,
}

impl BuiltInVariables {
    /// Current test name
    pub const TEST_NAME: &'static str = "test-name";
    /// Current test name with invalid file name characters replaced
    pub const TEST_NAME_SANITIZED: &'static str = "test-name-sanitized";
    /// Current suite name
    pub const TEST_SUITE_NAME: &'static str = "test-suite-name";
    /// Current suite name with invalid file name characters replaced
    pub const TEST_SUITE_NAME_SANITIZED: &'static str = "test-suite-name-sanitized";
    /// Current test start time
    pub const TEST_START: &'static str = "test-start";
    /// Build (process) start time
    pub const BUILD_START: &'static str = "build-start";

    /// Create built-ins over a tracker, with the build start set to now
    #[must_use]
    pub fn new(tracker: TestTracker) -> Self {
        Self {
            tracker,
            build_start: Local::now(),
        }
    }

    /// Override the build start time
    #[must_use]
    pub const fn with_build_start(mut self, build_start: DateTime<Local>) -> Self {
        self.build_start = build_start;
        self
    }

    /// Build start time
    #[must_use]
    pub const fn build_start(&self) -> DateTime<Local> {
        self.build_start
    }
}

impl VariableProvider for BuiltInVariables {
    fn variable(&self, key: &str) -> Option<VariableValue> {
        let text = |value: Option<String>| Some(VariableValue::Text(value.unwrap_or_default()));

        match key {
            Self::TEST_NAME => text(self.tracker.current().name),
            Self::TEST_NAME_SANITIZED => {
                text(self.tracker.current().name.map(|n| sanitize_file_name(&n)))
            }
            Self::TEST_SUITE_NAME => text(self.tracker.current().suite_name),
            Self::TEST_SUITE_NAME_SANITIZED => text(
                self.tracker
                    .current()
                    .suite_name
                    .map(|n| sanitize_file_name(&n)),
            ),
            Self::TEST_START => self.tracker.current().start.map(VariableValue::DateTime),
            Self::BUILD_START => Some(VariableValue::DateTime(self.build_start)),
            _ => None,
        }
    }

    fn keys(&self) -> Vec<String> {
        [
            Self::TEST_NAME,
            Self::TEST_NAME_SANITIZED,
            Self::TEST_SUITE_NAME,
            Self::TEST_SUITE_NAME_SANITIZED,
            Self::TEST_START,
            Self::BUILD_START,
        ]
        .iter()
        .map(|k| (*k).to_string())
        .collect()
    }
}

/// Case-sensitive variable store with provider fallback.
#[derive(Default)]
pub struct VariableRegistry {
    explicit: HashMap<String, VariableValue>,
    providers: Vec<Box<dyn VariableProvider>>,
}

impl fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableRegistry")
            .field("explicit", &self.explicit)
            .field("provider_count", &self.providers.len())
            .finish()
    }
}

impl VariableRegistry {
    /// Create an empty registry with no providers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fallback provider; providers are consulted in registration order
    #[must_use]
    pub fn with_provider(mut self, provider: impl VariableProvider + 'static) -> Self {
        self.add_provider(provider);
        self
    }

    /// Add a fallback provider
    pub fn add_provider(&mut self, provider: impl VariableProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    /// Add an already boxed fallback provider
    pub fn add_boxed_provider(&mut self, provider: Box<dyn VariableProvider>) {
        self.providers.push(provider);
    }

    /// Set an explicit variable, overwriting any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<VariableValue>) {
        let _ = self.explicit.insert(key.into(), value.into());
    }

    /// Set many explicit variables
    pub fn extend<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<VariableValue>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Remove an explicit variable, returning its value
    pub fn remove(&mut self, key: &str) -> Option<VariableValue> {
        self.explicit.remove(key)
    }

    /// Look up a variable: explicit entries first, then providers
    #[must_use]
    pub fn try_get(&self, key: &str) -> Option<VariableValue> {
        if let Some(value) = self.explicit.get(key) {
            return Some(value.clone());
        }
        self.providers.iter().find_map(|p| p.variable(key))
    }

    /// Look up a variable, failing if no entry or provider knows the key
    pub fn get(&self, key: &str) -> RegistroResult<VariableValue> {
        self.try_get(key)
            .ok_or_else(|| RegistroError::VariableNotFound {
                key: key.to_string(),
            })
    }

    /// Check if a key resolves
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.try_get(key).is_some()
    }

    /// Check if a key was set explicitly
    #[must_use]
    pub fn is_explicit(&self, key: &str) -> bool {
        self.explicit.contains_key(key)
    }

    /// Explicit entries, sorted by key
    #[must_use]
    pub fn explicit_entries(&self) -> BTreeMap<&str, &VariableValue> {
        self.explicit.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    /// All keys known to the registry (explicit and provided), sorted
    #[must_use]
    pub fn known_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.explicit.keys().cloned().collect();
        keys.extend(self.providers.iter().flat_map(|p| p.keys()));
        keys.sort();
        keys.dedup();
        keys
    }

    /// Number of explicit entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.explicit.len()
    }

    /// Check if there are no explicit entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    mod registry_tests {
        use super::*;

        #[test]
        fn test_set_and_get() {
            let mut registry = VariableRegistry::new();
            registry.set("key1", "val1");
            assert_eq!(
                registry.get("key1").unwrap(),
                VariableValue::Text("val1".to_string())
            );
        }

        #[test]
        fn test_later_write_overwrites() {
            let mut registry = VariableRegistry::new();
            registry.set("key1", "a");
            registry.set("key1", "b");
            assert_eq!(registry.get("key1").unwrap().to_string(), "b");
            assert_eq!(registry.len(), 1);
        }

        #[test]
        fn test_keys_are_case_sensitive() {
            let mut registry = VariableRegistry::new();
            registry.set("Key", "upper");
            assert!(registry.contains_key("Key"));
            assert!(!registry.contains_key("key"));
        }

        #[test]
        fn test_missing_key() {
            let registry = VariableRegistry::new();
            let err = registry.get("nope").unwrap_err();
            assert!(matches!(err, RegistroError::VariableNotFound { ref key } if key == "nope"));
        }

        #[test]
        fn test_explicit_overrides_provider() {
            let tracker = TestTracker::with_test(TestInfo::new("Real name"));
            let mut registry = VariableRegistry::new().with_provider(BuiltInVariables::new(tracker));
            assert_eq!(registry.get("test-name").unwrap().to_string(), "Real name");

            registry.set("test-name", "Overridden");
            assert_eq!(registry.get("test-name").unwrap().to_string(), "Overridden");

            let _ = registry.remove("test-name");
            assert_eq!(registry.get("test-name").unwrap().to_string(), "Real name");
        }

        #[test]
        fn test_providers_in_registration_order() {
            let first = |key: &str| (key == "shared").then(|| VariableValue::from("first"));
            let second = |key: &str| match key {
                "shared" => Some(VariableValue::from("second")),
                "only-second" => Some(VariableValue::from("2")),
                _ => None,
            };
            let registry = VariableRegistry::new()
                .with_provider(first)
                .with_provider(second);
            assert_eq!(registry.get("shared").unwrap().to_string(), "first");
            assert_eq!(registry.get("only-second").unwrap().to_string(), "2");
        }

        #[test]
        fn test_known_keys_merges_sources() {
            let mut registry =
                VariableRegistry::new().with_provider(BuiltInVariables::new(TestTracker::new()));
            registry.set("custom", "1");
            let keys = registry.known_keys();
            assert!(keys.contains(&"custom".to_string()));
            assert!(keys.contains(&"test-name".to_string()));
            assert!(keys.contains(&"build-start".to_string()));
        }
    }

    mod built_in_tests {
        use super::*;

        #[test]
        fn test_test_name_is_read_at_lookup_time() {
            let tracker = TestTracker::new();
            let registry =
                VariableRegistry::new().with_provider(BuiltInVariables::new(tracker.clone()));

            tracker.start("First test", None);
            assert_eq!(registry.get("test-name").unwrap().to_string(), "First test");

            tracker.start("Second test", Some("Suite"));
            assert_eq!(registry.get("test-name").unwrap().to_string(), "Second test");
            assert_eq!(registry.get("test-suite-name").unwrap().to_string(), "Suite");
        }

        #[test]
        fn test_no_running_test_renders_empty() {
            let registry =
                VariableRegistry::new().with_provider(BuiltInVariables::new(TestTracker::new()));
            assert!(registry.get("test-name").unwrap().is_empty());
            assert!(registry.try_get("test-start").is_none());
        }

        #[test]
        fn test_sanitized_names() {
            let tracker =
                TestTracker::with_test(TestInfo::new("Adds <item>: a/b").with_suite("Cart|Tests"));
            let built_ins = BuiltInVariables::new(tracker);
            assert_eq!(
                built_ins.variable("test-name-sanitized").unwrap().to_string(),
                "Adds _item__ a_b"
            );
            assert_eq!(
                built_ins
                    .variable("test-suite-name-sanitized")
                    .unwrap()
                    .to_string(),
                "Cart_Tests"
            );
        }

        #[test]
        fn test_build_start_is_fixed() {
            let start = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
            let built_ins = BuiltInVariables::new(TestTracker::new()).with_build_start(start);
            assert_eq!(
                built_ins.variable("build-start"),
                Some(VariableValue::DateTime(start))
            );
            assert_eq!(
                built_ins.variable("build-start").unwrap().to_string(),
                "2024-03-05 14_07_09"
            );
        }

        #[test]
        fn test_updates_survive_poisoned_lock() {
            let tracker = TestTracker::new();
            let shared = tracker.clone();
            let result = std::thread::spawn(move || {
                let _guard = shared.current.lock().unwrap();
                panic!("test panicked while holding the tracker");
            })
            .join();
            assert!(result.is_err());
            assert!(tracker.current.is_poisoned());

            tracker.start("After panic", None);
            assert_eq!(tracker.current().name.as_deref(), Some("After panic"));
        }

        #[test]
        fn test_finish_clears_test() {
            let tracker = TestTracker::new();
            tracker.start("Running", None);
            tracker.finish();
            assert_eq!(tracker.current(), TestInfo::default());
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("plain name.txt"), "plain name.txt");
        assert_eq!(sanitize_file_name(r#"a\b"c?*"#), "a_b_c__");
    }
}
