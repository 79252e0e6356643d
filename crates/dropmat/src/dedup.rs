//! Grouping of manifest entries by blob identity.

use std::collections::HashMap;

use dropmat_manifest::ManifestEntry;

/// Entries sharing one blob id. The first member is the primary, which is
/// fetched; the rest are replicas, copied from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupGroup<'a> {
    blob_id: &'a str,
    members: Vec<&'a ManifestEntry>,
}

impl<'a> DedupGroup<'a> {
    pub fn blob_id(&self) -> &'a str { self.blob_id }

    pub fn primary(&self) -> &'a ManifestEntry { self.members[0] }

    pub fn replicas(&self) -> &[&'a ManifestEntry] { &self.members[1..] }

    pub fn members(&self) -> &[&'a ManifestEntry] { &self.members }

    pub fn len(&self) -> usize { self.members.len() }

    /// Groups are never empty; kept for symmetry with [`DedupGroup::len`].
    pub fn is_empty(&self) -> bool { self.members.is_empty() }
}

/// Group `entries` by `blob.id`.
///
/// Groups come out in order of first appearance of their id and keep their
/// members in manifest order. Every entry lands in exactly one group.
pub fn group_by_blob(entries: &[ManifestEntry]) -> Vec<DedupGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DedupGroup<'_>> = Vec::new();

    for entry in entries {
        let id = entry.blob.id.as_str();
        match index.get(id) {
            Some(&slot) => groups[slot].members.push(entry),
            None => {
                index.insert(id, groups.len());
                groups.push(DedupGroup {
                    blob_id: id,
                    members: vec![entry],
                });
            }
        }
    }

    groups
}
