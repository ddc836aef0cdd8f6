use std::fs;
use std::io::{self, BufReader};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::OuidexError;
use crate::fetcher::{Fetcher, Source, default_sources};
use crate::hwaddr;
use crate::registry::{Record, parse_records};
use crate::store::Store;
use crate::trie::Trie;

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Bypass conditional caching and re-download every source.
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    pub sources: usize,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub items: Vec<LookupItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupItem {
    pub position: usize,
    pub input: String,
    pub outcome: LookupOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LookupOutcome {
    Matches { records: Vec<Record> },
    NoMatch,
    Invalid { error: String },
}

/// Façade over the refresh and query paths: `update` rebuilds the local
/// mirror and the lookup artifact, `lookup` answers queries against a
/// previously persisted artifact.
#[derive(Debug, Clone)]
pub struct App {
    store: Store,
    sources: Vec<Source>,
}

impl App {
    pub fn new(store: Store) -> Self {
        Self::with_sources(store, default_sources())
    }

    pub fn with_sources(store: Store, sources: Vec<Source>) -> Self {
        Self { store, sources }
    }

    /// Refreshes every source, re-parses the mirror files and rebuilds the
    /// persisted lookup trie from scratch.
    pub async fn update(&self, options: UpdateOptions) -> Result<UpdateResult, OuidexError> {
        let fetcher = Fetcher::new(self.sources.clone(), self.store.clone())?;
        fetcher
            .refresh(!options.force, CancellationToken::new())
            .await?;
        debug!("prepared all registry files");

        let mut trie = Trie::new();
        let mut records = 0;
        for source in &self.sources {
            let path = self.store.csv_path(source.registry);
            let file = fs::File::open(path.as_std_path())
                .map_err(|err| OuidexError::Filesystem(format!("opening {path}: {err}")))?;
            let parsed =
                parse_records(BufReader::new(file)).map_err(|err| OuidexError::ParseFile {
                    path,
                    source: Box::new(err),
                })?;
            records += parsed.len();
            trie.insert_many(parsed);
        }
        debug!(records, "prepared lookup data structure");

        let mut blob = Vec::new();
        trie.encode(&mut blob)?;
        Store::write_bytes_atomic(&self.store.lookup_path(), &blob)?;
        info!(path = %self.store.lookup_path(), records, "lookup data rebuilt");

        Ok(UpdateResult {
            sources: self.sources.len(),
            records,
        })
    }

    /// Loads the persisted trie. A corrupt artifact surfaces as a decode
    /// error; the caller is expected to run an update to regenerate it.
    pub fn load_trie(&self) -> Result<Trie, OuidexError> {
        let path = self.store.lookup_path();
        let file = match fs::File::open(path.as_std_path()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(OuidexError::LookupArtifactMissing(path));
            }
            Err(err) => return Err(OuidexError::Filesystem(format!("opening {path}: {err}"))),
        };
        Trie::decode(BufReader::new(file))
    }

    /// Resolves a batch of hardware-address strings. Malformed inputs are
    /// reported per item, with their 1-based position, without aborting the
    /// rest of the batch.
    pub fn lookup(&self, inputs: &[String]) -> Result<LookupResult, OuidexError> {
        let trie = self.load_trie()?;

        let items = inputs
            .iter()
            .enumerate()
            .map(|(idx, input)| {
                let outcome = match hwaddr::parse_addr(input) {
                    Ok(addr) => {
                        let records = trie.longest_prefix_match(&hwaddr::hex_key(&addr));
                        if records.is_empty() {
                            LookupOutcome::NoMatch
                        } else {
                            LookupOutcome::Matches {
                                records: records.to_vec(),
                            }
                        }
                    }
                    Err(err) => LookupOutcome::Invalid {
                        error: err.to_string(),
                    },
                };
                LookupItem {
                    position: idx + 1,
                    input: input.clone(),
                    outcome,
                }
            })
            .collect();

        Ok(LookupResult { items })
    }
}
