use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::{PipelineError, ValidationFailure};

/// Suffixes (lower-case, without the dot) accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv"];

/// Whether `filename` ends in an accepted suffix, compared case-insensitively.
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Reduce a client-supplied filename to a flat, ASCII-only storage key.
///
/// The name is NFKD-normalized first so accented letters keep their base
/// letter (`fïsh` → `fish`, `ﬁle` → `file`). Path separators become `_`,
/// characters outside `[A-Za-z0-9_.-]` are dropped, and leading/trailing dots
/// and underscores are trimmed, so `../../etc/passwd` becomes `etc_passwd`.
/// May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

// ---------------------------------------------------------------------------
// UploadStore
// ---------------------------------------------------------------------------

/// The fixed directory uploaded files are written to, keyed by sanitized name.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it is missing.
    pub fn ensure_dir(&self) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| PipelineError::storage(&self.dir, e))
    }

    /// Validate and sanitize `filename`, returning the storage key.
    pub fn key_for(filename: &str) -> Result<String, ValidationFailure> {
        if filename.is_empty() {
            return Err(ValidationFailure::EmptyFilename);
        }
        if !allowed_file(filename) {
            return Err(ValidationFailure::DisallowedExtension(filename.to_string()));
        }
        let key = secure_filename(filename);
        if key.is_empty() {
            return Err(ValidationFailure::UnsafeFilename(filename.to_string()));
        }
        Ok(key)
    }

    /// Write `bytes` under `key`, replacing whatever was there.
    pub fn save(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, PipelineError> {
        self.ensure_dir()?;
        let path = self.dir.join(key);
        std::fs::write(&path, bytes).map_err(|e| PipelineError::storage(&path, e))?;
        Ok(path)
    }

    /// Path of a previously stored file. Keys that are not already in
    /// sanitized form never resolve, so a key cannot escape the directory.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, PipelineError> {
        if key.is_empty() || secure_filename(key) != key {
            return Err(PipelineError::storage(
                self.dir.join(key),
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            ));
        }
        Ok(self.dir.join(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_check_is_case_insensitive() {
        assert!(allowed_file("data.csv"));
        assert!(allowed_file("DATA.CSV"));
        assert!(allowed_file("archive.tar.csv"));
        assert!(!allowed_file("data.csv.exe"));
        assert!(!allowed_file("data.txt"));
        assert!(!allowed_file("csv"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn sanitizes_like_a_flat_key() {
        assert_eq!(secure_filename("data.csv"), "data.csv");
        assert_eq!(secure_filename("My Fish Data.csv"), "My_Fish_Data.csv");
        assert_eq!(secure_filename("../../etc/passwd.csv"), "etc_passwd.csv");
        assert_eq!(secure_filename("C:\\Users\\me\\fish.csv"), "C_Users_me_fish.csv");
        assert_eq!(secure_filename("fïsh$@.csv"), "fish.csv");
        assert_eq!(secure_filename("ﬁle.csv"), "file.csv");
        assert_eq!(secure_filename("Ångström données.csv"), "Angstrom_donnees.csv");
        assert_eq!(secure_filename("鱼.csv"), "csv");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn key_for_rejects_bad_names() {
        assert_eq!(UploadStore::key_for(""), Err(ValidationFailure::EmptyFilename));
        assert!(matches!(
            UploadStore::key_for("model.pkl"),
            Err(ValidationFailure::DisallowedExtension(_))
        ));
        assert_eq!(UploadStore::key_for("/.csv").unwrap(), "csv");
        assert_eq!(UploadStore::key_for("data.csv").unwrap(), "data.csv");
    }

    #[test]
    fn save_creates_dir_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().join("uploads"));

        let path = store.save("data.csv", b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        store.save("data.csv", b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn resolve_refuses_traversal() {
        let store = UploadStore::new("uploads");
        assert!(store.resolve("data.csv").is_ok());
        assert!(matches!(
            store.resolve("../secret.csv"),
            Err(PipelineError::Storage { .. })
        ));
        assert!(store.resolve("").is_err());
    }
}
