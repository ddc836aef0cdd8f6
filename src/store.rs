use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::error::OuidexError;
use crate::registry::RegistryName;

pub const ETAGS_FILE: &str = "etags.json";
pub const LOOKUP_FILE: &str = "lookup.bin";

/// Cache directory layout: one mirrored CSV per registry, the ETag store and
/// the serialized lookup trie, all under a single root.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, OuidexError> {
        let cache_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("ouidex")).ok()
            })
            .ok_or_else(|| {
                OuidexError::Filesystem("unable to resolve cache directory".to_string())
            })?;

        Ok(Self { cache_root })
    }

    pub fn with_root(cache_root: Utf8PathBuf) -> Self {
        Self { cache_root }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn csv_path(&self, registry: RegistryName) -> Utf8PathBuf {
        self.cache_root.join(format!("{registry}.csv"))
    }

    pub fn etags_path(&self) -> Utf8PathBuf {
        self.cache_root.join(ETAGS_FILE)
    }

    pub fn lookup_path(&self) -> Utf8PathBuf {
        self.cache_root.join(LOOKUP_FILE)
    }

    pub fn ensure_cache_root(&self) -> Result<(), OuidexError> {
        fs::create_dir_all(self.cache_root.as_std_path())
            .map_err(|err| OuidexError::Filesystem(err.to_string()))
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), OuidexError> {
        let parent = path
            .parent()
            .ok_or_else(|| OuidexError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| OuidexError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("ouidex")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| OuidexError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| OuidexError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| OuidexError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::with_root(Utf8PathBuf::from("/tmp/ouidex-test"));

        assert_eq!(
            store.csv_path(RegistryName::MaL),
            Utf8PathBuf::from("/tmp/ouidex-test/MA-L.csv")
        );
        assert_eq!(
            store.csv_path(RegistryName::Cid),
            Utf8PathBuf::from("/tmp/ouidex-test/CID.csv")
        );
        assert!(store.etags_path().ends_with(ETAGS_FILE));
        assert!(store.lookup_path().ends_with(LOOKUP_FILE));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("blob.bin")).unwrap();

        Store::write_bytes_atomic(&path, b"first").unwrap();
        assert_eq!(fs::read(path.as_std_path()).unwrap(), b"first");

        Store::write_bytes_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(path.as_std_path()).unwrap(), b"second");
    }
}
