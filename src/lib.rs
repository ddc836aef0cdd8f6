//! Local mirror of the IEEE OUI registries with longest-prefix vendor
//! lookups over a persisted trie.

pub mod app;
pub mod error;
pub mod etags;
pub mod fetcher;
pub mod hwaddr;
pub mod output;
pub mod registry;
pub mod store;
pub mod trie;
