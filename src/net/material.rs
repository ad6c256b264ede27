//! Key and trust material resolution.
//!
//! Material is looked up by logical name (`keystoreName`, `truststoreName`)
//! and returned as bytes, independent of where it is stored.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves key material by logical name.
pub trait MaterialSource: Send + Sync {
    fn load(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// Looks a name up in a list of directories, first match wins.
///
/// Absolute names are read directly.
#[derive(Debug, Clone)]
pub struct FileMaterialSource {
    dirs: Vec<PathBuf>,
}

impl FileMaterialSource {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }
}

impl MaterialSource for FileMaterialSource {
    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        let path = Path::new(name);
        if path.is_absolute() {
            return fs::read(path);
        }

        for dir in &self.dirs {
            let candidate = dir.join(path);
            if candidate.is_file() {
                tracing::debug!(name, path = %candidate.display(), "Resolved key material");
                return fs::read(candidate);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{}' not found in {:?}", name, self.dirs),
        ))
    }
}

/// In-memory material, keyed by name. Used for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryMaterialSource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryMaterialSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(name.into(), bytes.into());
        self
    }
}

impl MaterialSource for MemoryMaterialSource {
    fn load(&self, name: &str) -> io::Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("'{}' not found", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    #[test]
    fn searches_directories_in_order() {
        let source = FileMaterialSource::new([PathBuf::from("/nonexistent"), fixtures()]);
        let bytes = source.load("truststore.pem").unwrap();
        assert!(bytes.starts_with(b"-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn absolute_names_bypass_search() {
        let source = FileMaterialSource::new(Vec::<PathBuf>::new());
        let path = fixtures().join("keystore.pem");
        assert!(source.load(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn missing_names_are_not_found() {
        let source = FileMaterialSource::new([fixtures()]);
        let err = source.load("missing.pem").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("missing.pem"));
    }

    #[test]
    fn memory_source_returns_registered_bytes() {
        let source = MemoryMaterialSource::new().with("a.pem", b"abc".to_vec());
        assert_eq!(source.load("a.pem").unwrap(), b"abc");
        assert!(source.load("b.pem").is_err());
    }
}
