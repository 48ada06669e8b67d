use tracing::{debug, info};

use super::{require_id, DrawHub, HubError, PendingWrite};
use crate::models::{ServerEvent, Shape, ShapeId};

/// Kind recorded for points appended by a patch
const PATCH_KIND: &str = "polyline";

impl DrawHub {
    /// Append points to an existing shape.
    ///
    /// A patch for an unknown shape is dropped entirely: nothing is stored,
    /// broadcast or recorded.
    pub fn patch_shape(
        &self,
        from: &str,
        id: ShapeId,
        data: Vec<i64>,
    ) -> Result<Option<PendingWrite>, HubError> {
        require_id("PatchShape", &id)?;

        let applied = self.diagram.append_points(&id, &data, || {
            self.dispatcher.to_all_except(
                from,
                ServerEvent::ShapePatched {
                    id: id.clone(),
                    data: data.clone(),
                },
            );
        });
        if !applied {
            debug!("Dropping patch from {} for unknown shape {}", from, id);
            return Ok(None);
        }

        let writer = self.writer.clone();
        Ok(Some(self.record(format!("patch of shape {id}"), async move {
            writer.append_shape_points(&id, PATCH_KIND, &data).await
        })))
    }

    /// Create a shape or replace it wholesale
    pub fn update_shape(
        &self,
        from: &str,
        id: ShapeId,
        shape: Shape,
    ) -> Result<Option<PendingWrite>, HubError> {
        require_id("UpdateShape", &id)?;

        self.diagram.upsert(&id, shape.clone(), || {
            self.dispatcher.to_all_except(
                from,
                ServerEvent::ShapeUpdated {
                    id: id.clone(),
                    shape: shape.clone(),
                },
            );
        });

        let writer = self.writer.clone();
        Ok(Some(self.record(format!("update of shape {id}"), async move {
            writer.append_shape_points(&id, &shape.kind, &shape.data).await
        })))
    }

    /// Delete a shape. Peers are told even if the shape was already gone.
    pub fn remove_shape(&self, from: &str, id: ShapeId) -> Result<(), HubError> {
        require_id("RemoveShape", &id)?;

        let present = self.diagram.remove(&id, || {
            self.dispatcher
                .to_all_except(from, ServerEvent::ShapeRemoved { id: id.clone() });
        });
        if !present {
            debug!("Shape {} removed by {} was not present", id, from);
        }
        Ok(())
    }

    /// Wipe every shape and the background
    pub fn clear(&self, from: &str) {
        self.diagram.clear(|| {
            self.dispatcher.to_all_except(from, ServerEvent::Clear);
        });
        info!("Diagram cleared by {}", from);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{connect, drain, room};
    use crate::models::{ClientInvocation, ServerEvent, Shape};
    use crate::persistence::{Row, Table};
    use crate::hub::HubError;
    use std::sync::Arc;

    #[tokio::test]
    async fn patch_scenario_updates_store_peers_and_storage() {
        let room = room();
        let hub = &room.hub;
        hub.diagram().upsert("s1", Shape::new("polyline", vec![1, 2]), || {});
        let mut sender = connect(hub, "c1");
        let mut peer = connect(hub, "c2");

        let pending = hub
            .patch_shape("c1", "s1".into(), vec![3, 4])
            .unwrap()
            .expect("patch should be recorded");
        assert_eq!(pending.await.unwrap().unwrap(), 2);

        assert_eq!(hub.diagram().get("s1").unwrap().data, vec![1, 2, 3, 4]);
        assert!(drain(&mut sender).is_empty());
        assert_eq!(
            drain(&mut peer),
            vec![ServerEvent::ShapePatched { id: "s1".into(), data: vec![3, 4] }]
        );
        let points: Vec<i64> = room
            .store
            .rows(Table::ShapesInfo)
            .into_iter()
            .map(|row| match row {
                Row::ShapePoint { point, kind, .. } => {
                    assert_eq!(kind, "polyline");
                    point
                }
                other => panic!("unexpected row {other:?}"),
            })
            .collect();
        assert_eq!(points, vec![3, 4]);
    }

    #[tokio::test]
    async fn patch_on_unknown_shape_does_nothing() {
        let room = room();
        let hub = &room.hub;
        let mut peer = connect(hub, "c2");

        let pending = hub.patch_shape("c1", "ghost".into(), vec![1]).unwrap();

        assert!(pending.is_none());
        assert_eq!(hub.diagram().shape_count(), 0);
        assert!(drain(&mut peer).is_empty());
        assert!(room.store.rows(Table::ShapesInfo).is_empty());
    }

    #[tokio::test]
    async fn update_replaces_and_records_shape_kind() {
        let room = room();
        let hub = &room.hub;
        let mut peer = connect(hub, "c2");
        hub.diagram().upsert("s1", Shape::new("polyline", vec![1, 1, 1]), || {});

        let shape = Shape::new("rect", vec![10, 20]);
        let pending = hub.update_shape("c1", "s1".into(), shape.clone()).unwrap().unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(hub.diagram().get("s1"), Some(shape.clone()));
        assert_eq!(
            drain(&mut peer),
            vec![ServerEvent::ShapeUpdated { id: "s1".into(), shape }]
        );
        let rows = room.store.rows(Table::ShapesInfo);
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|row| matches!(row, Row::ShapePoint { kind, shape_id, .. } if kind == "rect" && shape_id == "s1")));
    }

    #[tokio::test]
    async fn remove_and_clear_are_not_recorded() {
        let room = room();
        let hub = &room.hub;
        let mut peer = connect(hub, "c2");
        hub.diagram().upsert("a", Shape::new("polyline", vec![1]), || {});
        hub.diagram().upsert("b", Shape::new("polyline", vec![2]), || {});

        assert!(hub.invoke("c1", ClientInvocation::RemoveShape { id: "a".into() }).unwrap().is_none());
        assert!(hub.invoke("c1", ClientInvocation::Clear).unwrap().is_none());

        assert_eq!(hub.diagram().shape_count(), 0);
        assert_eq!(
            drain(&mut peer),
            vec![ServerEvent::ShapeRemoved { id: "a".into() }, ServerEvent::Clear]
        );
        assert!(room.store.rows(Table::ShapesInfo).is_empty());
    }

    #[tokio::test]
    async fn empty_shape_id_is_rejected() {
        let room = room();
        let err = room
            .hub
            .invoke("c1", ClientInvocation::PatchShape { id: String::new(), data: vec![1] })
            .unwrap_err();
        assert_eq!(err, HubError::EmptyShapeId { method: "PatchShape" });

        let mut peer = connect(&room.hub, "c2");
        let err = room
            .hub
            .invoke(
                "c1",
                ClientInvocation::UpdateShape { id: String::new(), shape: Shape::new("rect", vec![1]) },
            )
            .unwrap_err();
        assert_eq!(err, HubError::EmptyShapeId { method: "UpdateShape" });
        assert!(room.hub.remove_shape("c1", String::new()).is_err());
        assert_eq!(room.hub.diagram().shape_count(), 0);
        assert!(drain(&mut peer).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_operations_on_distinct_ids_serialize() {
        let room = room();
        let hub = Arc::new(room.hub.clone());
        let mut tasks = Vec::new();
        for i in 0..16 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                let id = format!("s{i}");
                let conn = format!("c{i}");
                hub.update_shape(&conn, id.clone(), Shape::new("polyline", vec![i]))
                    .unwrap();
                for p in 0..10 {
                    hub.patch_shape(&conn, id.clone(), vec![p]).unwrap();
                }
                if i % 4 == 0 {
                    hub.remove_shape(&conn, id).unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = hub.diagram().snapshot_all();
        assert_eq!(snapshot.shapes.len(), 12);
        for (id, shape) in snapshot.shapes {
            let i: i64 = id[1..].parse().unwrap();
            let mut expected = vec![i];
            expected.extend(0..10);
            assert_eq!(shape.data, expected);
        }
    }
}
