// crates/rdap-index/src/builder.rs
//
// IndexBuilder: turn a full scan of current range records into a RangeIndex.
//
// Entries are sorted by (namespace, start ascending, end descending), which
// puts every range right after its closest container. A single pass with a
// stack of open ranges then attaches each entry to its parent:
//
//   - top ends before the entry starts   -> pop, try the next one up
//   - top contains the entry             -> entry becomes a child of top
//   - anything else                      -> partial overlap, build fails
//
// Children are pushed in start order, so sibling lists come out sorted.

use std::collections::BTreeMap;

use rdap_core::error::RdapError;
use rdap_core::object::RpslObject;
use rdap_core::range::{RangeEntry, ResourceRange};

use crate::tree::{Node, RangeIndex};

/// Builds immutable `RangeIndex` snapshots.
pub struct IndexBuilder;

impl IndexBuilder {
    /// Build an index from every current address and AS block.
    ///
    /// Fails with `IndexBuild` on a partial overlap or an identical
    /// duplicate, naming both entries.
    pub fn build(mut entries: Vec<RangeEntry>) -> Result<RangeIndex, RdapError> {
        entries.sort_by(|a, b| {
            a.range
                .namespace
                .cmp(&b.range.namespace)
                .then(a.range.start().cmp(&b.range.start()))
                .then(b.range.end().cmp(&a.range.end()))
        });

        let mut nodes: Vec<Node> = Vec::with_capacity(entries.len());
        let mut roots: BTreeMap<_, Vec<usize>> = BTreeMap::new();
        let mut open: Vec<usize> = Vec::new();

        for entry in entries {
            if let Some(&top) = open.last() {
                if nodes[top].entry.range.namespace != entry.range.namespace {
                    open.clear();
                }
            }

            while let Some(&top) = open.last() {
                if nodes[top].entry.range.end() < entry.range.start() {
                    open.pop();
                } else {
                    break;
                }
            }

            let position = nodes.len();
            match open.last() {
                Some(&parent) => {
                    let parent_entry = &nodes[parent].entry;
                    if parent_entry.range == entry.range {
                        return Err(RdapError::IndexBuild(format!(
                            "Duplicate range {}: {} '{}' ({}) and {} '{}' ({})",
                            entry.range,
                            parent_entry.object_type,
                            parent_entry.key,
                            parent_entry.source,
                            entry.object_type,
                            entry.key,
                            entry.source
                        )));
                    }
                    if parent_entry.range.end() < entry.range.end() {
                        return Err(RdapError::IndexBuild(format!(
                            "Partial overlap between {} '{}' ({}) and {} '{}' ({})",
                            parent_entry.object_type,
                            parent_entry.key,
                            parent_entry.source,
                            entry.object_type,
                            entry.key,
                            entry.source
                        )));
                    }
                    nodes[parent].children.push(position);
                }
                None => roots.entry(entry.range.namespace).or_default().push(position),
            }

            nodes.push(Node {
                entry,
                children: Vec::new(),
            });
            open.push(position);
        }

        Ok(RangeIndex::from_parts(nodes, roots))
    }

    /// Derive entries from RPSL objects and build. Non-range object types
    /// are skipped; a range object whose key cannot be parsed fails the build.
    pub fn from_objects(objects: &[RpslObject]) -> Result<RangeIndex, RdapError> {
        let mut entries = Vec::with_capacity(objects.len());
        for object in objects.iter().filter(|o| o.object_type().is_range()) {
            let range = ResourceRange::parse_key(object.object_type(), object.key()).map_err(|e| {
                RdapError::IndexBuild(format!(
                    "Cannot index {} '{}' ({}): {}",
                    object.object_type(),
                    object.key(),
                    object.source(),
                    e
                ))
            })?;
            entries.push(RangeEntry::new(
                range,
                object.object_type(),
                &object.object_type().normalize_key(object.key()),
                object.source().clone(),
            ));
        }
        Self::build(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdap_core::object::{ObjectType, Source};
    use rdap_core::range::Namespace;

    fn entry(range: &str, source: &str) -> RangeEntry {
        let r = ResourceRange::parse_ip(range).unwrap();
        RangeEntry::new(r, ObjectType::Inetnum, &r.to_string(), Source::new(source))
    }

    #[test]
    fn test_build_nested_and_disjoint() {
        let index = IndexBuilder::build(vec![
            entry("192.0.2.0/25", "TEST"),
            entry("192.0.0.0/8", "TEST"),
            entry("192.0.2.0/24", "TEST"),
            entry("192.0.2.128/25", "TEST"),
            entry("10.0.0.0/8", "TEST"),
        ])
        .unwrap();

        assert_eq!(index.len(), 5);
        let point = ResourceRange::parse_ip("192.0.2.200").unwrap();
        assert_eq!(index.lookup(&point, false).unwrap().key, "192.0.2.128 - 192.0.2.255");
        assert_eq!(index.ancestors(&point).len(), 3);
    }

    #[test]
    fn test_partial_overlap_rejected() {
        let err = IndexBuilder::build(vec![
            entry("192.0.2.0 - 192.0.2.200", "TEST"),
            entry("192.0.2.100 - 192.0.2.255", "OTHER"),
        ])
        .unwrap_err();
        match err {
            RdapError::IndexBuild(msg) => {
                assert!(msg.contains("192.0.2.0 - 192.0.2.200"));
                assert!(msg.contains("192.0.2.100 - 192.0.2.255"));
            }
            other => panic!("expected IndexBuild, got {:?}", other),
        }
    }

    #[test]
    fn test_identical_duplicate_rejected() {
        let err = IndexBuilder::build(vec![
            entry("192.0.2.0/24", "TEST"),
            entry("192.0.2.0 - 192.0.2.255", "OTHER"),
        ])
        .unwrap_err();
        assert!(matches!(err, RdapError::IndexBuild(_)));
    }

    #[test]
    fn test_overlap_after_sibling_closes_detected() {
        // The nested /26 is popped before the straddling entry is checked
        // against its real container.
        let err = IndexBuilder::build(vec![
            entry("192.0.2.0/24", "TEST"),
            entry("192.0.2.0/26", "TEST"),
            entry("192.0.2.128 - 192.0.3.10", "TEST"),
        ])
        .unwrap_err();
        assert!(matches!(err, RdapError::IndexBuild(_)));
    }

    #[test]
    fn test_same_bounds_in_different_namespaces() {
        let v4 = ResourceRange::new(Namespace::Ipv4, 100, 200).unwrap();
        let asn = ResourceRange::new(Namespace::Asn, 100, 200).unwrap();
        let index = IndexBuilder::build(vec![
            RangeEntry::new(v4, ObjectType::Inetnum, &v4.to_string(), Source::new("TEST")),
            RangeEntry::new(asn, ObjectType::AsBlock, &asn.to_string(), Source::new("TEST")),
        ])
        .unwrap();
        assert_eq!(index.len_in(Namespace::Ipv4), 1);
        assert_eq!(index.len_in(Namespace::Asn), 1);
        let hit = index.lookup(&ResourceRange::parse_asn("AS150").unwrap(), false).unwrap();
        assert_eq!(hit.object_type, ObjectType::AsBlock);
    }

    #[test]
    fn test_from_objects_skips_non_range_types() {
        let objects = vec![
            RpslObject::from_pairs(&[
                ("inetnum", "192.0.2.0/24"),
                ("netname", "TEST-NET"),
                ("source", "TEST"),
            ])
            .unwrap(),
            RpslObject::from_pairs(&[("aut-num", "AS123"), ("source", "TEST")]).unwrap(),
            RpslObject::from_pairs(&[("mntner", "OWNER-MNT"), ("source", "TEST")]).unwrap(),
        ];
        let index = IndexBuilder::from_objects(&objects).unwrap();
        assert_eq!(index.len(), 2);

        let hit = index.lookup(&ResourceRange::parse_ip("192.0.2.1").unwrap(), false).unwrap();
        assert_eq!(hit.key, "192.0.2.0 - 192.0.2.255");
        assert_eq!(hit.source, Source::new("TEST"));
    }

    #[test]
    fn test_from_objects_bad_key_fails_build() {
        let objects = vec![RpslObject::from_pairs(&[
            ("inetnum", "2001:db8::/32"),
            ("source", "TEST"),
        ])
        .unwrap()];
        assert!(matches!(
            IndexBuilder::from_objects(&objects),
            Err(RdapError::IndexBuild(_))
        ));
    }
}
