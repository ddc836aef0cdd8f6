use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OuidexError {
    #[error("fetching {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned unexpected status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("fetching {url} was cancelled")]
    Cancelled { url: String },

    #[error("fetch task failed: {0}")]
    Task(String),

    #[error("building HTTP client failed: {0}")]
    Client(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("row {row}: {message}")]
    Parse { row: u64, message: String },

    #[error("parsing {path}: {source}")]
    ParseFile {
        path: Utf8PathBuf,
        #[source]
        source: Box<OuidexError>,
    },

    #[error("unknown registry name: {0}")]
    UnknownRegistry(String),

    #[error("encoding lookup data failed: {0}")]
    Encode(String),

    #[error("decoding lookup data failed: {0} (run `ouidex update` to rebuild it)")]
    Decode(String),

    #[error("lookup data not found at {0} (run `ouidex update` first)")]
    LookupArtifactMissing(Utf8PathBuf),

    #[error("invalid hardware address {input:?}: input is too short")]
    AddrTooShort { input: String },

    #[error("invalid hardware address {input:?}: input is too long")]
    AddrTooLong { input: String },

    #[error("invalid hardware address {input:?}: separators are unbalanced")]
    AddrUnbalanced { input: String },

    #[error("invalid hardware address {input:?}: unexpected number of bytes")]
    AddrUnexpectedLength { input: String },

    #[error("invalid hardware address {input:?}: {message}")]
    AddrNotHex { input: String, message: String },
}
