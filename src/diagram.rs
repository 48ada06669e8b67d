//! Canonical in-memory state of one whiteboard room.
//!
//! Shapes live in a sharded concurrent map, so operations on different ids
//! never contend. Whole-diagram operations (`clear`, `replay`) take the
//! `epoch` lock exclusively while per-key operations share it, which keeps a
//! snapshot from observing half of a clear.
//!
//! Mutations take an `announce` callback that runs while the mutation's locks
//! are still held. Announcing only enqueues onto outboxes, so the order peers
//! see events in is the order the store applied them. `announce` must not
//! call back into the diagram. No lock here is ever held across an `.await`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::{Background, Shape, ShapeId};

#[derive(Debug, Clone)]
struct Slot {
    // First-insertion sequence number, gives replay a stable order
    seq: u64,
    shape: Shape,
}

/// Point-in-time copy of the diagram, used to replay state to a joining connection
#[derive(Debug, Clone, Default)]
pub struct DiagramSnapshot {
    /// Shapes in first-insertion order
    pub shapes: Vec<(ShapeId, Shape)>,
    pub background: Option<Arc<Background>>,
}

#[derive(Default)]
pub struct Diagram {
    shapes: DashMap<ShapeId, Slot>,
    background: Mutex<Option<Arc<Background>>>,
    users: Mutex<usize>,
    next_seq: AtomicU64,
    epoch: RwLock<()>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `shape` under `id`, replacing any existing shape wholesale.
    /// A replaced shape keeps its replay position.
    pub fn upsert<A>(&self, id: &str, shape: Shape, announce: A)
    where
        A: FnOnce(),
    {
        let _epoch = self.epoch.read();
        match self.shapes.entry(id.to_string()) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().shape = shape;
                announce();
            }
            Entry::Vacant(vacant) => {
                let _slot = vacant.insert(Slot {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    shape,
                });
                announce();
            }
        }
    }

    /// Apply `f` to the shape stored at `id` while holding its entry lock.
    /// Returns `None`, without calling `f`, when no such shape exists.
    pub fn mutate_existing<F, R>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Shape) -> R,
    {
        let _epoch = self.epoch.read();
        let mut slot = self.shapes.get_mut(id)?;
        Some(f(&mut slot.shape))
    }

    /// Append points to an existing shape. No-op, and no announcement, if `id` is unknown.
    pub fn append_points<A>(&self, id: &str, points: &[i64], announce: A) -> bool
    where
        A: FnOnce(),
    {
        self.mutate_existing(id, |shape| {
            shape.data.extend_from_slice(points);
            announce();
        })
        .is_some()
    }

    /// Remove the shape at `id`; returns whether one was present.
    /// `announce` runs either way.
    pub fn remove<A>(&self, id: &str, announce: A) -> bool
    where
        A: FnOnce(),
    {
        let _epoch = self.epoch.read();
        match self.shapes.entry(id.to_string()) {
            Entry::Occupied(slot) => {
                announce();
                slot.remove();
                true
            }
            Entry::Vacant(_vacant) => {
                announce();
                false
            }
        }
    }

    /// Empty all shapes and drop the background
    pub fn clear<A>(&self, announce: A)
    where
        A: FnOnce(),
    {
        let _epoch = self.epoch.write();
        self.shapes.clear();
        *self.background.lock() = None;
        announce();
    }

    /// Hand a consistent snapshot to `replay` and hold off every mutation until
    /// it returns. Whatever `replay` enqueues is ordered before the
    /// announcement of any later mutation.
    pub fn replay<F, R>(&self, replay: F) -> R
    where
        F: FnOnce(DiagramSnapshot) -> R,
    {
        let _epoch = self.epoch.write();
        let mut slots: Vec<(ShapeId, Slot)> = self
            .shapes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        slots.sort_by_key(|(_, slot)| slot.seq);

        replay(DiagramSnapshot {
            shapes: slots.into_iter().map(|(id, slot)| (id, slot.shape)).collect(),
            background: self.background.lock().clone(),
        })
    }

    pub fn snapshot_all(&self) -> DiagramSnapshot {
        self.replay(|snapshot| snapshot)
    }

    pub fn get(&self, id: &str) -> Option<Shape> {
        self.shapes.get(id).map(|slot| slot.shape.clone())
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn set_background<A>(&self, background: Background, announce: A) -> Arc<Background>
    where
        A: FnOnce(&Background),
    {
        let _epoch = self.epoch.read();
        let background = Arc::new(background);
        let mut current = self.background.lock();
        *current = Some(background.clone());
        announce(&background);
        background
    }

    pub fn background(&self) -> Option<Arc<Background>> {
        self.background.lock().clone()
    }

    /// Register a joined user and announce the new count before any other
    /// count change can happen. Returns the new count.
    pub fn increment_users<A>(&self, announce: A) -> usize
    where
        A: FnOnce(usize),
    {
        let mut users = self.users.lock();
        *users += 1;
        announce(*users);
        *users
    }

    /// Unregister a user, announcing and returning the new count. Saturates at zero.
    pub fn decrement_users<A>(&self, announce: A) -> usize
    where
        A: FnOnce(usize),
    {
        let mut users = self.users.lock();
        *users = users.saturating_sub(1);
        announce(*users);
        *users
    }

    pub fn user_count(&self) -> usize {
        *self.users.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polyline(data: &[i64]) -> Shape {
        Shape::new("polyline", data.to_vec())
    }

    fn background(id: &str) -> Background {
        Background {
            id: id.to_string(),
            content_type: "image/png".to_string(),
            content: vec![0x89, 0x50],
        }
    }

    #[test]
    fn patch_appends_to_existing_shape() {
        let diagram = Diagram::new();
        diagram.upsert("s1", polyline(&[1, 2]), || {});

        assert!(diagram.append_points("s1", &[3, 4], || {}));
        assert_eq!(diagram.get("s1").unwrap().data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn patch_on_missing_shape_is_noop() {
        let diagram = Diagram::new();
        diagram.upsert("s1", polyline(&[1]), || {});

        assert!(!diagram.append_points("nope", &[9], || {}));
        assert!(diagram.get("nope").is_none());
        assert_eq!(diagram.shape_count(), 1);
    }

    #[test]
    fn upsert_replaces_but_keeps_replay_position() {
        let diagram = Diagram::new();
        diagram.upsert("a", polyline(&[1]), || {});
        diagram.upsert("b", polyline(&[2]), || {});
        diagram.upsert("a", Shape::new("rect", vec![7, 7]), || {});

        let snapshot = diagram.snapshot_all();
        let ids: Vec<&str> = snapshot.shapes.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.shapes[0].1, Shape::new("rect", vec![7, 7]));
    }

    #[test]
    fn remove_missing_is_noop() {
        let diagram = Diagram::new();
        assert!(!diagram.remove("ghost", || {}));
        diagram.upsert("s", polyline(&[]), || {});
        assert!(diagram.remove("s", || {}));
        assert_eq!(diagram.shape_count(), 0);
    }

    #[test]
    fn clear_drops_shapes_and_background() {
        let diagram = Diagram::new();
        diagram.upsert("a", polyline(&[1]), || {});
        diagram.set_background(background("bg"), |_| {});

        diagram.clear(|| {});

        let snapshot = diagram.snapshot_all();
        assert!(snapshot.shapes.is_empty());
        assert!(snapshot.background.is_none());
    }

    #[test]
    fn user_count_never_goes_negative() {
        let diagram = Diagram::new();
        assert_eq!(diagram.decrement_users(|_| {}), 0);
        assert_eq!(diagram.increment_users(|_| {}), 1);
        assert_eq!(diagram.increment_users(|_| {}), 2);
        assert_eq!(diagram.decrement_users(|_| {}), 1);
        assert_eq!(diagram.decrement_users(|_| {}), 0);
        assert_eq!(diagram.decrement_users(|_| {}), 0);
        assert_eq!(diagram.user_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_patches_are_not_lost() {
        let diagram = Arc::new(Diagram::new());
        for i in 0..8 {
            diagram.upsert(&format!("s{i}"), polyline(&[]), || {});
        }

        let mut tasks = Vec::new();
        for i in 0..8 {
            for round in 0..50 {
                let diagram = diagram.clone();
                tasks.push(tokio::spawn(async move {
                    diagram.append_points(&format!("s{i}"), &[round, round], || {});
                }));
            }
        }
        for task in tasks {
            task.await.unwrap();
        }

        for i in 0..8 {
            let data = diagram.get(&format!("s{i}")).unwrap().data;
            assert_eq!(data.len(), 100);
            // Each patch landed as an unbroken pair
            for pair in data.chunks(2) {
                assert_eq!(pair[0], pair[1]);
            }
        }
    }
}
