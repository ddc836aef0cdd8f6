use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::OuidexError;
use crate::registry::Record;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TrieNode {
    children: HashMap<u8, TrieNode>,
    records: Vec<Record>,
}

/// Prefix trie over assignment strings, keyed by their uppercase hex
/// characters. Built once per refresh, then treated as read-only; records
/// live exactly at the node their full assignment spells out.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the assignment path, creating nodes as needed, and appends the
    /// record at the terminal node. Duplicates are kept as-is. An empty
    /// assignment lands on the root.
    pub fn insert(&mut self, record: Record) {
        let key = record.assignment.clone().into_bytes();
        let mut node = &mut self.root;
        for b in key {
            node = node.children.entry(b).or_default();
        }
        node.records.push(record);
    }

    pub fn insert_many(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Records stored at exactly `key`, without considering ancestors.
    /// Empty when the path does not fully exist.
    pub fn lookup_exact(&self, key: &str) -> &[Record] {
        let mut node = &self.root;
        for b in key.bytes() {
            match node.children.get(&b) {
                Some(child) => node = child,
                None => return &[],
            }
        }
        &node.records
    }

    /// Records of the deepest stored prefix that is an ancestor of, or equal
    /// to, `query`. Running past the deepest stored prefix is expected and
    /// simply stops the walk. The result is possibly empty, never absent.
    pub fn longest_prefix_match(&self, query: &str) -> &[Record] {
        let mut node = &self.root;
        let mut best: &[Record] = &node.records;
        for b in query.bytes() {
            match node.children.get(&b) {
                Some(child) => node = child,
                None => break,
            }
            if !node.records.is_empty() {
                best = &node.records;
            }
        }
        best
    }

    /// Every stored record, in unspecified order. Callers needing
    /// deterministic output must sort by [`Record::sort_key`].
    pub fn traverse(&self) -> Vec<Record> {
        let mut all = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            all.extend(node.records.iter().cloned());
            stack.extend(node.children.values());
        }
        all
    }

    pub fn encode<W: Write>(&self, mut writer: W) -> Result<(), OuidexError> {
        rmp_serde::encode::write(&mut writer, self)
            .map_err(|err| OuidexError::Encode(err.to_string()))
    }

    pub fn decode<R: Read>(reader: R) -> Result<Self, OuidexError> {
        rmp_serde::decode::from_read(reader).map_err(|err| OuidexError::Decode(err.to_string()))
    }
}
