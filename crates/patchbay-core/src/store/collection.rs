// ── Generic reactive entity collection ──
//
// Id-keyed storage with push-based change notification. Snapshots preserve
// insertion order so lists and saved documents render stably across runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntityId;

struct Entry<T> {
    /// Insertion rank; survives in-place replacement so updates don't
    /// reshuffle the snapshot.
    seq: u64,
    value: Arc<T>,
}

/// Collection for a single entity type, keyed by `EntityId`.
///
/// Every mutation rebuilds the ordered snapshot and broadcasts it to
/// subscribers through a `watch` channel.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Entry<T>>,
    next_seq: AtomicU64,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            next_seq: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Insert or replace an entity. A replacement keeps the original
    /// insertion rank.
    pub(crate) fn upsert(&self, id: EntityId, entity: T) {
        let seq = match self.by_id.get(&id) {
            Some(existing) => existing.seq,
            None => self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.by_id.insert(
            id,
            Entry {
                seq,
                value: Arc::new(entity),
            },
        );
        self.rebuild_snapshot();
    }

    /// Remove an entity, returning it if it existed.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, entry)| entry.value);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|entry| Arc::clone(&entry.value))
    }

    /// Replace the full contents (bulk load). Resets insertion order to the
    /// order given.
    pub(crate) fn replace_all(&self, entries: impl IntoIterator<Item = (EntityId, T)>) {
        self.by_id.clear();
        self.next_seq.store(0, Ordering::Relaxed);
        for (id, entity) in entries {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            self.by_id.insert(
                id,
                Entry {
                    seq,
                    value: Arc::new(entity),
                },
            );
        }
        self.rebuild_snapshot();
    }

    /// Current snapshot in insertion order (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(u64, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (r.value().seq, Arc::clone(&r.value().value)))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        let values: Vec<Arc<T>> = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
