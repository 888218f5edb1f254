// src/executor/languages.rs

use std::collections::HashMap;

/// One supported language: Piston version string plus the source filename
/// the remote sandbox expects.
#[derive(Debug, Clone)]
pub struct LanguageSpec {
    pub display_name: String,
    pub version: String,
    pub filename: String,
}

/// Registry of languages the platform may execute. Any key absent from here
/// is rejected before a network call is attempted.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageSpec>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            languages: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: &str, display_name: &str, version: &str, filename: &str) {
        self.languages.insert(
            key.to_string(),
            LanguageSpec {
                display_name: display_name.to_string(),
                version: version.to_string(),
                filename: filename.to_string(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&LanguageSpec> {
        self.languages.get(key)
    }

    pub fn is_supported(&self, key: &str) -> bool {
        self.languages.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for LanguageRegistry {
    /// The stock language set: Python, C and Java.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("python", "Python", "3.10", "main.py");
        registry.register("c", "C", "gcc-11.2.0", "main.c");
        registry.register("java", "Java", "17", "Main.java");
        registry
    }
}
