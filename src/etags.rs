use std::collections::HashMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::OuidexError;
use crate::store::Store;

pub type EtagMap = HashMap<String, String>;

/// Persisted mapping from source URL to its last-seen entity tag. Loaded
/// before a fetch batch; rewritten wholesale (never patched) only after a
/// fully successful batch.
#[derive(Debug, Clone)]
pub struct EtagStore {
    path: Utf8PathBuf,
}

impl EtagStore {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// A missing file is not an error; it loads as an empty map.
    pub fn load(&self) -> Result<EtagMap, OuidexError> {
        let data = match fs::read(self.path.as_std_path()) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(EtagMap::new()),
            Err(err) => {
                return Err(OuidexError::Filesystem(format!(
                    "reading {}: {err}",
                    self.path
                )));
            }
        };
        serde_json::from_slice(&data)
            .map_err(|err| OuidexError::Filesystem(format!("parsing {}: {err}", self.path)))
    }

    pub fn save(&self, tags: &EtagMap) -> Result<(), OuidexError> {
        let content = serde_json::to_vec_pretty(tags)
            .map_err(|err| OuidexError::Filesystem(err.to_string()))?;
        Store::write_bytes_atomic(&self.path, &content)
    }
}
