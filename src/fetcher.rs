use std::time::Duration;

use camino::Utf8Path;
use reqwest::StatusCode;
use reqwest::header::{ETAG, HeaderMap, HeaderValue, IF_NONE_MATCH, USER_AGENT};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::OuidexError;
use crate::etags::{EtagMap, EtagStore};
use crate::registry::RegistryName;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Source {
    pub url: String,
    pub registry: RegistryName,
}

pub fn default_sources() -> Vec<Source> {
    vec![
        Source {
            url: "https://standards-oui.ieee.org/oui/oui.csv".to_string(),
            registry: RegistryName::MaL,
        },
        Source {
            url: "https://standards-oui.ieee.org/oui28/mam.csv".to_string(),
            registry: RegistryName::MaM,
        },
        Source {
            url: "https://standards-oui.ieee.org/oui36/oui36.csv".to_string(),
            registry: RegistryName::MaS,
        },
        Source {
            url: "https://standards-oui.ieee.org/cid/cid.csv".to_string(),
            registry: RegistryName::Cid,
        },
    ]
}

/// What a finished source task contributes to the new ETag store.
#[derive(Debug)]
enum TagReport {
    /// Fresh body written; the server's tag, when it sent one.
    Fresh(Option<String>),
    /// 304: mirror untouched, the previously stored tag stays valid.
    NotModified,
}

/// Downloads every configured source concurrently, skipping bodies the
/// server proves unchanged via If-None-Match. One task per source; the
/// first failure cancels the rest, and the on-disk ETag store is replaced
/// only when the whole batch succeeded.
pub struct Fetcher {
    sources: Vec<Source>,
    store: Store,
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(sources: Vec<Source>, store: Store) -> Result<Self, OuidexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ouidex/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OuidexError::Client(err.to_string()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| OuidexError::Client(err.to_string()))?;

        Ok(Self {
            sources,
            store,
            client,
        })
    }

    /// Refreshes all sources. `use_etags = false` bypasses conditional
    /// requests and re-downloads everything. Cancelling `cancel` aborts
    /// in-flight requests; the call still waits for every task to settle.
    pub async fn refresh(
        &self,
        use_etags: bool,
        cancel: CancellationToken,
    ) -> Result<(), OuidexError> {
        let etag_store = EtagStore::new(self.store.etags_path());
        let stored_tags = etag_store.load()?;
        self.store.ensure_cache_root()?;

        let cancel = cancel.child_token();
        // Capacity equal to the number of tasks, so senders never block and
        // the channel can be drained after all tasks have been joined.
        let (tag_tx, mut tag_rx) =
            mpsc::channel::<(String, TagReport)>(self.sources.len().max(1));

        let mut tasks: JoinSet<Result<(), OuidexError>> = JoinSet::new();
        for source in self.sources.clone() {
            let client = self.client.clone();
            let path = self.store.csv_path(source.registry);
            let stored_tag = stored_tags.get(&source.url).cloned();
            let cancel = cancel.clone();
            let tag_tx = tag_tx.clone();

            tasks.spawn(async move {
                match fetch_source(&client, &source, &path, stored_tag, use_etags, &cancel).await {
                    Ok(report) => {
                        let _ = tag_tx.send((source.url, report)).await;
                        Ok(())
                    }
                    Err(err) => {
                        cancel.cancel();
                        Err(err)
                    }
                }
            });
        }
        drop(tag_tx);

        // Wait for every task, whether it succeeded, failed or was
        // cancelled; keep the most telling error.
        let mut first_err: Option<OuidexError> = None;
        while let Some(joined) = tasks.join_next().await {
            let err = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(err) => OuidexError::Task(err.to_string()),
            };
            match &first_err {
                None => first_err = Some(err),
                Some(OuidexError::Cancelled { .. })
                    if !matches!(err, OuidexError::Cancelled { .. }) =>
                {
                    first_err = Some(err);
                }
                Some(_) => {}
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }

        // Single consumer of the fan-in channel; no locking on the map.
        let mut new_tags = EtagMap::new();
        while let Some((url, report)) = tag_rx.recv().await {
            match report {
                TagReport::Fresh(Some(tag)) => {
                    new_tags.insert(url, tag);
                }
                TagReport::Fresh(None) => {}
                TagReport::NotModified => {
                    if let Some(tag) = stored_tags.get(&url) {
                        new_tags.insert(url, tag.clone());
                    }
                }
            }
        }

        etag_store.save(&new_tags)?;
        debug!(path = %etag_store.path(), "saved etags");
        Ok(())
    }
}

async fn fetch_source(
    client: &reqwest::Client,
    source: &Source,
    path: &Utf8Path,
    stored_tag: Option<String>,
    use_etags: bool,
    cancel: &CancellationToken,
) -> Result<TagReport, OuidexError> {
    if cancel.is_cancelled() {
        return Err(OuidexError::Cancelled {
            url: source.url.clone(),
        });
    }

    let mirror_exists = path.as_std_path().exists();
    let mut request = client.get(&source.url);
    if mirror_exists
        && use_etags
        && let Some(tag) = stored_tag
    {
        request = request.header(IF_NONE_MATCH, tag);
    }

    info!(url = %source.url, registry = %source.registry, "fetching");
    let response = tokio::select! {
        () = cancel.cancelled() => {
            return Err(OuidexError::Cancelled { url: source.url.clone() });
        }
        result = request.send() => result.map_err(|err| OuidexError::Network {
            url: source.url.clone(),
            message: err.to_string(),
        })?,
    };
    debug!(url = %source.url, status = response.status().as_u16(), "response");

    match response.status() {
        StatusCode::OK => {
            let etag = response
                .headers()
                .get(ETAG)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let written = write_body(response, source, path, cancel).await?;
            info!(url = %source.url, bytes = written, "finished download");
            Ok(TagReport::Fresh(etag))
        }
        StatusCode::NOT_MODIFIED => {
            info!(url = %source.url, "mirror is current, omitting download");
            Ok(TagReport::NotModified)
        }
        status => Err(OuidexError::UnexpectedStatus {
            url: source.url.clone(),
            status: status.as_u16(),
        }),
    }
}

async fn write_body(
    mut response: reqwest::Response,
    source: &Source,
    path: &Utf8Path,
    cancel: &CancellationToken,
) -> Result<u64, OuidexError> {
    let mut file = tokio::fs::File::create(path.as_std_path())
        .await
        .map_err(|err| OuidexError::Filesystem(format!("creating {path}: {err}")))?;

    let mut written = 0u64;
    loop {
        let chunk = tokio::select! {
            () = cancel.cancelled() => {
                return Err(OuidexError::Cancelled { url: source.url.clone() });
            }
            chunk = response.chunk() => chunk.map_err(|err| OuidexError::Network {
                url: source.url.clone(),
                message: err.to_string(),
            })?,
        };
        let Some(chunk) = chunk else { break };
        written += chunk.len() as u64;
        file.write_all(&chunk)
            .await
            .map_err(|err| OuidexError::Filesystem(format!("writing {path}: {err}")))?;
    }
    file.flush()
        .await
        .map_err(|err| OuidexError::Filesystem(format!("writing {path}: {err}")))?;

    Ok(written)
}
