//! Extension-based file classification.
//!
//! Maps file extensions to category directory names. User-defined rules are
//! consulted before the built-in groupings, and anything unmatched falls back
//! to the `Others` category.
//!
//! # Examples
//!
//! ```
//! use refile::category::Classifier;
//! use std::collections::BTreeMap;
//!
//! let classifier = Classifier::default();
//! let rules = BTreeMap::new();
//! assert_eq!(classifier.classify(".jpg", &rules), "Images");
//! assert_eq!(classifier.classify(".xyz", &rules), "Others");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Category assigned to extensions no rule covers.
pub const FALLBACK_CATEGORY: &str = "Others";

/// Built-in extension groups, one category per group.
const EXTENSION_GROUPS: &[(&[&str], &str)] = &[
    (
        &[".stl", ".obj", ".fbx", ".blend", ".dae", ".3ds", ".ply"],
        "3DModels",
    ),
    (
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".heic", ".webp",
        ],
        "Images",
    ),
    (
        &[
            ".mp4", ".mkv", ".mov", ".avi", ".wmv", ".flv", ".webm", ".mpeg",
        ],
        "Videos",
    ),
    (
        &[
            ".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a", ".wma", ".aiff",
        ],
        "Audio",
    ),
    (
        &[
            ".doc", ".docx", ".pdf", ".txt", ".rtf", ".odt", ".tex", ".md",
        ],
        "Documents",
    ),
    (&[".xlsx", ".xls", ".csv", ".ods"], "Spreadsheets"),
    (&[".ppt", ".pptx", ".key", ".odp"], "Presentations"),
    (
        &[
            ".py", ".java", ".cpp", ".c", ".cs", ".js", ".ts", ".html", ".css", ".php", ".rb",
            ".swift", ".go", ".rs",
        ],
        "Code",
    ),
    (
        &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"],
        "Archives",
    ),
    (
        &[".exe", ".msi", ".sh", ".bat", ".apk", ".dmg"],
        "Executables",
    ),
    (&[".ttf", ".otf", ".woff", ".woff2"], "Fonts"),
    (&[".epub", ".mobi", ".azw", ".azw3"], "Ebooks"),
    (&[".dwg", ".dxf"], "CAD"),
    (&[".iso", ".img"], "DiskImages"),
    (&[".sln", ".log", ".cfg", ".ini", ".bak"], "Others"),
];

/// Maps file extensions to category directory names.
///
/// The grouped table is flattened into a single extension map at
/// construction, so per-file lookups are one hash probe instead of a scan
/// over every group.
#[derive(Debug, Clone)]
pub struct Classifier {
    builtin: HashMap<String, &'static str>,
}

impl Classifier {
    /// Creates a classifier with the built-in extension groupings.
    pub fn new() -> Self {
        let mut builtin = HashMap::new();
        for (extensions, category) in EXTENSION_GROUPS {
            for ext in *extensions {
                builtin.insert((*ext).to_string(), *category);
            }
        }
        Self { builtin }
    }

    /// Resolves the category for an extension (leading dot included).
    ///
    /// Custom rules win over the built-in table; extensions compare
    /// case-insensitively. Total over all input strings: anything unmatched
    /// resolves to [`FALLBACK_CATEGORY`].
    pub fn classify(&self, extension: &str, custom_rules: &BTreeMap<String, String>) -> String {
        let ext = extension.to_lowercase();
        if let Some(category) = custom_rules.get(&ext) {
            return category.clone();
        }
        self.builtin
            .get(ext.as_str())
            .map(|category| (*category).to_string())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
    }

    /// Resolves the category for a path from its extension.
    ///
    /// Files without an extension resolve to [`FALLBACK_CATEGORY`].
    pub fn classify_path(&self, path: &Path, custom_rules: &BTreeMap<String, String>) -> String {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.classify(&format!(".{ext}"), custom_rules),
            None => FALLBACK_CATEGORY.to_string(),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Durable store of user-defined extension-to-category overrides.
///
/// Backed by a single JSON object mapping extension to category name. The
/// whole file is loaded before any rule-dependent operation and rewritten
/// after every mutation; callers are responsible for single-writer
/// discipline.
#[derive(Debug, Clone)]
pub struct RuleBook {
    path: PathBuf,
}

impl RuleBook {
    /// Creates a rule book backed by the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default store location: `~/.config/refile/rules.json`, or
    /// `refile_rules.json` in the working directory when `HOME` is unset.
    pub fn default_path() -> PathBuf {
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home)
                .join(".config")
                .join("refile")
                .join("rules.json"),
            Err(_) => PathBuf::from("refile_rules.json"),
        }
    }

    /// Path of the backing store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every custom rule. A missing store is an empty rule set; an
    /// unreadable or unparsable one is a persistence error.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: format!("JSON parse error: {e}"),
        })
    }

    /// Adds or replaces a rule and rewrites the store.
    ///
    /// The extension is normalized to lowercase with a leading dot.
    pub fn add(&self, extension: &str, category: &str) -> Result<()> {
        let mut ext = extension.to_lowercase();
        if !ext.starts_with('.') {
            ext.insert(0, '.');
        }
        let mut rules = self.load()?;
        rules.insert(ext, category.to_string());
        self.persist(&rules)
    }

    /// Deletes the store, restoring built-in behavior.
    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| Error::Persistence {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn persist(&self, rules: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::Persistence {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        }
        let json = serde_json::to_string_pretty(rules).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_rules() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_builtin_classification() {
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(".jpg", &no_rules()), "Images");
        assert_eq!(classifier.classify(".txt", &no_rules()), "Documents");
        assert_eq!(classifier.classify(".zip", &no_rules()), "Archives");
        assert_eq!(classifier.classify(".rs", &no_rules()), "Code");
        assert_eq!(classifier.classify(".stl", &no_rules()), "3DModels");
    }

    #[test]
    fn test_unmatched_extension_falls_back_to_others() {
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(".xyz", &no_rules()), FALLBACK_CATEGORY);
        assert_eq!(classifier.classify("", &no_rules()), FALLBACK_CATEGORY);
        assert_eq!(
            classifier.classify("not-an-extension", &no_rules()),
            FALLBACK_CATEGORY
        );
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let classifier = Classifier::new();
        assert_eq!(classifier.classify(".JPG", &no_rules()), "Images");
        assert_eq!(classifier.classify(".Pdf", &no_rules()), "Documents");
    }

    #[test]
    fn test_custom_rule_overrides_builtin() {
        let classifier = Classifier::new();
        let mut rules = no_rules();
        rules.insert(".jpg".to_string(), "Wallpapers".to_string());

        assert_eq!(classifier.classify(".jpg", &rules), "Wallpapers");
        // Other extensions are unaffected.
        assert_eq!(classifier.classify(".png", &rules), "Images");
    }

    #[test]
    fn test_custom_rule_for_unknown_extension() {
        let classifier = Classifier::new();
        let mut rules = no_rules();
        rules.insert(".xyz".to_string(), "Widgets".to_string());

        assert_eq!(classifier.classify(".xyz", &rules), "Widgets");
    }

    #[test]
    fn test_classify_path() {
        let classifier = Classifier::new();
        assert_eq!(
            classifier.classify_path(Path::new("/tmp/photo.JPEG"), &no_rules()),
            "Images"
        );
        assert_eq!(
            classifier.classify_path(Path::new("/tmp/README"), &no_rules()),
            FALLBACK_CATEGORY
        );
    }

    #[test]
    fn test_rule_book_round_trip() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let book = RuleBook::new(dir.path().join("rules.json"));

        assert!(book.load().expect("load empty").is_empty());

        book.add(".xyz", "Widgets").expect("add rule");
        book.add("RAW", "Photos").expect("add rule without dot");

        let rules = book.load().expect("load rules");
        assert_eq!(rules.get(".xyz"), Some(&"Widgets".to_string()));
        assert_eq!(rules.get(".raw"), Some(&"Photos".to_string()));
    }

    #[test]
    fn test_rule_book_reset() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let book = RuleBook::new(dir.path().join("rules.json"));

        book.add(".xyz", "Widgets").expect("add rule");
        book.reset().expect("reset");

        assert!(!book.path().exists());
        assert!(book.load().expect("load after reset").is_empty());
        // Resetting an already-empty store is fine.
        book.reset().expect("reset again");
    }

    #[test]
    fn test_rule_book_corrupted_store_is_persistence_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("rules.json");
        fs::write(&path, "not json at all").expect("write garbage");

        let book = RuleBook::new(path);
        assert!(matches!(book.load(), Err(Error::Persistence { .. })));
    }
}
