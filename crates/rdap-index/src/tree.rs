// crates/rdap-index/src/tree.rs
//
// RangeIndex: a forest of nested ranges per namespace.
//
// Every node's children are pairwise disjoint and sorted by start, so the
// only child that can contain a query is the last one starting at or before
// the query start. Lookups descend from the roots with one binary search per
// level. Nodes live in a flat arena and refer to children by position.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use rdap_core::range::{Namespace, RangeEntry, ResourceRange};

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) entry: RangeEntry,
    pub(crate) children: Vec<usize>,
}

/// Immutable snapshot of all indexed address and AS blocks.
#[derive(Debug, Clone)]
pub struct RangeIndex {
    pub(crate) nodes: Vec<Node>,
    pub(crate) roots: BTreeMap<Namespace, Vec<usize>>,
    generation: u64,
    built_at: DateTime<Utc>,
}

impl RangeIndex {
    /// An index with no entries. Every lookup misses.
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), BTreeMap::new())
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, roots: BTreeMap<Namespace, Vec<usize>>) -> Self {
        Self {
            nodes,
            roots,
            generation: 0,
            built_at: Utc::now(),
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Publication counter; 0 for an index that was never published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of entries in one namespace.
    pub fn len_in(&self, namespace: Namespace) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.entry.range.namespace == namespace)
            .count()
    }

    /// Find an entry for `query`.
    ///
    /// With `want_exact`, only an entry with identical bounds is returned,
    /// even if a larger entry contains the query. Otherwise the smallest
    /// entry containing the query is returned.
    pub fn lookup(&self, query: &ResourceRange, want_exact: bool) -> Option<&RangeEntry> {
        let deepest = self.path(query).last().map(|&i| &self.nodes[i].entry)?;
        if want_exact && deepest.range != *query {
            return None;
        }
        Some(deepest)
    }

    /// All entries containing `query`, most specific first.
    pub fn ancestors(&self, query: &ResourceRange) -> Vec<&RangeEntry> {
        self.path(query)
            .into_iter()
            .rev()
            .map(|i| &self.nodes[i].entry)
            .collect()
    }

    /// The most specific entry strictly larger than `query`.
    pub fn less_specific(&self, query: &ResourceRange) -> Option<&RangeEntry> {
        self.ancestors(query)
            .into_iter()
            .find(|entry| entry.range != *query)
    }

    /// Entries directly below `query`: the children of its exact entry, or,
    /// when `query` is not indexed, the top-most entries inside it. Entries
    /// that straddle the query boundary are descended into.
    pub fn more_specifics(&self, query: &ResourceRange) -> Vec<&RangeEntry> {
        let path = self.path(query);
        let level: &[usize] = match path.last() {
            Some(&i) => &self.nodes[i].children,
            None => match self.roots.get(&query.namespace) {
                Some(roots) => roots,
                None => return Vec::new(),
            },
        };
        let mut found = Vec::new();
        self.collect_inside(level, query, &mut found);
        found
    }

    fn collect_inside<'a>(
        &'a self,
        level: &[usize],
        query: &ResourceRange,
        found: &mut Vec<&'a RangeEntry>,
    ) {
        for &i in level {
            let entry = &self.nodes[i].entry;
            if entry.range.end() < query.start() {
                continue;
            }
            if entry.range.start() > query.end() {
                break;
            }
            if query.contains(&entry.range) {
                found.push(entry);
            } else {
                self.collect_inside(&self.nodes[i].children, query, found);
            }
        }
    }

    /// Node positions from the root down to the deepest entry containing
    /// `query`.
    fn path(&self, query: &ResourceRange) -> Vec<usize> {
        let mut path = Vec::new();
        let mut level = match self.roots.get(&query.namespace) {
            Some(roots) => roots.as_slice(),
            None => return path,
        };

        while let Some(i) = self.containing_child(level, query) {
            path.push(i);
            level = &self.nodes[i].children;
        }
        path
    }

    fn containing_child(&self, level: &[usize], query: &ResourceRange) -> Option<usize> {
        let after = level.partition_point(|&i| self.nodes[i].entry.range.start() <= query.start());
        if after == 0 {
            return None;
        }
        let candidate = level[after - 1];
        if self.nodes[candidate].entry.range.contains(query) {
            Some(candidate)
        } else {
            None
        }
    }
}

impl Default for RangeIndex {
    fn default() -> Self {
        Self::empty()
    }
}
