//! Size-ordered candidate store.
//!
//! # Overview
//!
//! [`CandidateStore`] owns every [`CandidateRecord`] of a run. Records live in
//! an arena and are addressed by a stable [`RecordId`]; a doubly linked list
//! threaded through the arena keeps the live records in non-decreasing size
//! order, so records of equal size always form one contiguous *size group*.
//!
//! Removing a record is O(1) and relinks its neighbors. An ordered index from
//! size to the last record of that size makes insertion O(log n), which lets
//! the traversal insert records in discovery order while the ordering
//! invariant holds at all times.
//!
//! # Example
//!
//! ```
//! use dupsift::duplicates::{CandidateRecord, CandidateStore};
//! use std::path::PathBuf;
//!
//! let mut store = CandidateStore::new();
//! for (name, size) in [("a", 10), ("b", 20), ("c", 10), ("d", 30)] {
//!     store.insert(CandidateRecord::new(PathBuf::from(name), size));
//! }
//!
//! let sizes: Vec<u64> = store.iter().map(|(_, r)| r.size).collect();
//! assert_eq!(sizes, vec![10, 10, 20, 30]);
//! ```

use std::collections::BTreeMap;

use super::record::CandidateRecord;
use crate::scanner::hardlink::HardlinkTracker;

/// Stable handle to a record inside a [`CandidateStore`].
///
/// Ids are never reused; the id of a removed record stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

#[derive(Debug)]
struct Slot {
    record: CandidateRecord,
    prev: Option<RecordId>,
    next: Option<RecordId>,
}

/// Arena of candidate records kept in ascending size order.
#[derive(Debug, Default)]
pub struct CandidateStore {
    slots: Vec<Option<Slot>>,
    head: Option<RecordId>,
    tail: Option<RecordId>,
    len: usize,
    /// Last live record of every size present.
    size_tails: BTreeMap<u64, RecordId>,
}

impl CandidateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Insert a record after every live record of smaller or equal size.
    pub fn insert(&mut self, record: CandidateRecord) -> RecordId {
        let id = RecordId(self.slots.len());
        let size = record.size;

        let prev = self
            .size_tails
            .range(..=size)
            .next_back()
            .map(|(_, &tail)| tail);
        let next = match prev {
            Some(p) => self.slot(p).next,
            None => self.head,
        };

        self.slots.push(Some(Slot { record, prev, next }));

        match prev {
            Some(p) => self.slot_mut(p).next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.slot_mut(n).prev = Some(id),
            None => self.tail = Some(id),
        }

        self.size_tails.insert(size, id);
        self.len += 1;
        id
    }

    /// Detach and drop a record, returning the next live record.
    ///
    /// Removing an id that is already dead is a no-op returning `None`.
    pub fn remove(&mut self, id: RecordId) -> Option<RecordId> {
        let slot = self.slots.get_mut(id.0)?.take()?;
        let Slot { record, prev, next } = slot;

        match prev {
            Some(p) => self.slot_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slot_mut(n).prev = prev,
            None => self.tail = prev,
        }

        if self.size_tails.get(&record.size) == Some(&id) {
            match prev.filter(|&p| self.slot(p).record.size == record.size) {
                Some(p) => {
                    self.size_tails.insert(record.size, p);
                }
                None => {
                    self.size_tails.remove(&record.size);
                }
            }
        }

        self.len -= 1;
        next
    }

    /// First (smallest) live record.
    #[must_use]
    pub fn first(&self) -> Option<RecordId> {
        self.head
    }

    /// Last (largest) live record.
    #[must_use]
    pub fn last(&self) -> Option<RecordId> {
        self.tail
    }

    /// Successor of a live record.
    #[must_use]
    pub fn next(&self, id: RecordId) -> Option<RecordId> {
        self.live(id).and_then(|s| s.next)
    }

    /// Predecessor of a live record.
    #[must_use]
    pub fn prev(&self, id: RecordId) -> Option<RecordId> {
        self.live(id).and_then(|s| s.prev)
    }

    /// Borrow a live record.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&CandidateRecord> {
        self.live(id).map(|s| &s.record)
    }

    /// Mutably borrow a live record.
    ///
    /// Only the record's data is reachable; its position cannot change.
    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut CandidateRecord> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|s| &mut s.record)
    }

    /// Whether `id` refers to a live record.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.live(id).is_some()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no live records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live records in ascending size order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
        }
    }

    /// Snapshot of live ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Ids of the size group starting at `start`.
    ///
    /// Walks forward from `start` while the size stays the same; `start`
    /// should be the first record of its group.
    #[must_use]
    pub fn size_group(&self, start: RecordId) -> Vec<RecordId> {
        let Some(size) = self.get(start).map(|r| r.size) else {
            return Vec::new();
        };

        let mut group = Vec::new();
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let slot = self.slot(id);
            if slot.record.size != size {
                break;
            }
            group.push(id);
            cursor = slot.next;
        }
        group
    }

    /// Remove every record whose `(dev, ino)` was already seen earlier in
    /// the store, then drop boundary records left without an equal-size
    /// neighbor.
    ///
    /// Returns the number of path-doubles removed. Records without an inode
    /// identity are never treated as path-doubles.
    pub fn collapse_hardlinks(&mut self) -> usize {
        let mut tracker = HardlinkTracker::with_capacity(self.len);
        let mut removed = 0;

        let mut cursor = self.head;
        while let Some(id) = cursor {
            let key = self.slot(id).record.inode_key();
            match key {
                Some(key) if tracker.is_path_double(key) => {
                    log::debug!("Path-double: {}", self.slot(id).record.path.display());
                    removed += 1;
                    cursor = self.remove(id);
                }
                _ => cursor = self.slot(id).next,
            }
        }

        self.drop_unmatched_boundaries();
        removed
    }

    /// Drop the first and the last record if their single neighbor has a
    /// different size (or they have no neighbor at all).
    ///
    /// Returns how many records were dropped.
    pub fn drop_unmatched_boundaries(&mut self) -> usize {
        let mut dropped = 0;

        if let Some(tail) = self.tail {
            if !self.has_equal_neighbor(tail, self.slot(tail).prev) {
                self.remove(tail);
                dropped += 1;
            }
        }
        if let Some(head) = self.head {
            if !self.has_equal_neighbor(head, self.slot(head).next) {
                self.remove(head);
                dropped += 1;
            }
        }
        dropped
    }

    /// Whether `neighbor` exists and shares `id`'s size.
    pub(crate) fn has_equal_neighbor(&self, id: RecordId, neighbor: Option<RecordId>) -> bool {
        neighbor.is_some_and(|n| self.slot(n).record.size == self.slot(id).record.size)
    }

    /// Consume the store, returning live records in order.
    #[must_use]
    pub fn into_records(mut self) -> Vec<CandidateRecord> {
        let mut records = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let slot = self.slots[id.0]
                .take()
                .unwrap_or_else(|| unreachable!("linked id {id:?} has no slot"));
            cursor = slot.next;
            records.push(slot.record);
        }
        records
    }

    /// Check every structural invariant: ascending order, symmetric links,
    /// consistent head/tail, length and size index.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut count = 0;
        let mut prev: Option<RecordId> = None;
        let mut cursor = self.head;

        while let Some(id) = cursor {
            let Some(slot) = self.live(id) else {
                return false;
            };
            if slot.prev != prev {
                return false;
            }
            if let Some(p) = prev {
                let p_size = self.slot(p).record.size;
                if p_size > slot.record.size {
                    return false;
                }
            }
            let is_size_tail = slot
                .next
                .map_or(true, |n| self.slot(n).record.size != slot.record.size);
            if is_size_tail != (self.size_tails.get(&slot.record.size) == Some(&id)) {
                return false;
            }
            count += 1;
            prev = cursor;
            cursor = slot.next;
        }

        prev == self.tail
            && count == self.len
            && self.size_tails.len() <= self.len
            && self.slots.iter().flatten().count() == self.len
    }

    fn live(&self, id: RecordId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Borrow a slot that the list structure guarantees is live.
    fn slot(&self, id: RecordId) -> &Slot {
        self.live(id)
            .unwrap_or_else(|| unreachable!("linked id {id:?} has no slot"))
    }

    fn slot_mut(&mut self, id: RecordId) -> &mut Slot {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| unreachable!("linked id {id:?} has no slot"))
    }
}

impl FromIterator<CandidateRecord> for CandidateStore {
    fn from_iter<I: IntoIterator<Item = CandidateRecord>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

/// Iterator over live records, see [`CandidateStore::iter`].
pub struct Iter<'a> {
    store: &'a CandidateStore,
    cursor: Option<RecordId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (RecordId, &'a CandidateRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let slot = self.store.slot(id);
        self.cursor = slot.next;
        Some((id, &slot.record))
    }
}
