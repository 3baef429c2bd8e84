//! The widget surface: a stateless projection of the persisted snapshot
//!
//! `refresh` is a pure function from (persisted state) to (rendered output,
//! armed click regions), so tests drive it directly without simulating the
//! host shell.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use gbridge_core::prelude::*;
use gbridge_core::{ActionCode, StateSnapshot, SurfaceId};
use gbridge_store::SnapshotReader;

use crate::dispatcher::{ActionDispatcher, ActionHandle};

/// One armed clickable region on the widget layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickRegion {
    pub code: ActionCode,
    pub handle: ActionHandle,
}

/// The fixed widget layout, rendered from one snapshot.
///
/// Equality covers both the projected labels and the armed region handles,
/// so two equal `RenderedSurface` values share their pending-action record
/// identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSurface {
    pub surface_id: SurfaceId,
    pub user_name: String,
    pub guardian_label: String,
    pub status_label: String,
    pub regions: Vec<ClickRegion>,
}

impl RenderedSurface {
    /// The region bound to an action code, if armed
    pub fn region(&self, code: ActionCode) -> Option<&ClickRegion> {
        self.regions.iter().find(|region| region.code == code)
    }
}

/// Stateless renderer for the home-screen widget surface.
///
/// On each update trigger it reads the snapshot keys through
/// [`SnapshotReader`] (never failing; defaults cover missing state) and
/// re-arms the two clickable regions through the dispatcher.
pub struct WidgetSurface {
    reader: SnapshotReader,
    dispatcher: Arc<ActionDispatcher>,
    provisioned: RwLock<BTreeSet<SurfaceId>>,
}

impl WidgetSurface {
    pub fn new(reader: SnapshotReader, dispatcher: Arc<ActionDispatcher>) -> Self {
        Self {
            reader,
            dispatcher,
            provisioned: RwLock::new(BTreeSet::new()),
        }
    }

    /// Render one widget instance from the current snapshot.
    ///
    /// Idempotent: with an unchanged snapshot, a second refresh produces an
    /// equal [`RenderedSurface`] with the same pending-action identities
    /// (arming is an upsert, not an append).
    pub fn refresh(&self, surface_id: SurfaceId) -> RenderedSurface {
        let snapshot = self.reader.load();
        debug!("refreshing {surface_id} from snapshot {snapshot:?}");

        let sos = self.dispatcher.arm(surface_id, ActionCode::TriggerSos);
        let open = self.dispatcher.arm(surface_id, ActionCode::OpenApp);

        RenderedSurface {
            surface_id,
            user_name: snapshot.user_name.clone(),
            guardian_label: Self::guardian_label(&snapshot),
            status_label: snapshot.safety_status.to_string(),
            regions: vec![
                ClickRegion {
                    code: ActionCode::TriggerSos,
                    handle: sos,
                },
                ClickRegion {
                    code: ActionCode::OpenApp,
                    handle: open,
                },
            ],
        }
    }

    /// Refresh every provisioned instance
    pub fn refresh_all(&self) -> Vec<RenderedSurface> {
        let ids: Vec<SurfaceId> = self
            .provisioned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();

        ids.into_iter().map(|id| self.refresh(id)).collect()
    }

    /// Host hook: one widget instance was placed on the shell
    pub fn on_provisioned(&self, surface_id: SurfaceId) -> RenderedSurface {
        info!("{surface_id} provisioned");
        self.provisioned
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(surface_id);
        self.refresh(surface_id)
    }

    /// Host hook: the last widget instance was removed from the shell
    pub fn on_all_removed(&self) {
        info!("all surfaces removed");
        let ids: Vec<SurfaceId> = {
            let mut provisioned = self
                .provisioned
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let ids = provisioned.iter().copied().collect();
            provisioned.clear();
            ids
        };
        for id in ids {
            self.dispatcher.drop_surface(id);
        }
    }

    /// Provisioned instance ids, in placement order
    pub fn provisioned(&self) -> Vec<SurfaceId> {
        self.provisioned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    fn guardian_label(snapshot: &StateSnapshot) -> String {
        format!("{} Guardians", snapshot.guardian_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ActivationTarget;
    use gbridge_core::{ActivationFlags, SafetyStatus};
    use gbridge_store::{
        MemoryStore, SnapshotWriter, StateStore, KEY_GUARDIAN_COUNT, KEY_SAFETY_STATUS,
    };
    use serde_json::json;

    mockall::mock! {
        Target {}

        impl ActivationTarget for Target {
            fn activate(&self, flags: ActivationFlags) -> Result<()>;
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        surface: WidgetSurface,
        dispatcher: Arc<ActionDispatcher>,
    }

    fn fixture(target: MockTarget) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(ActionDispatcher::new(Arc::new(target)));
        let surface = WidgetSurface::new(
            SnapshotReader::new(Arc::clone(&store) as Arc<dyn StateStore>),
            Arc::clone(&dispatcher),
        );
        Fixture {
            store,
            surface,
            dispatcher,
        }
    }

    fn quiet_target() -> MockTarget {
        MockTarget::new()
    }

    #[test]
    fn test_empty_store_renders_defaults() {
        let fx = fixture(quiet_target());
        let rendered = fx.surface.refresh(SurfaceId(1));

        assert_eq!(rendered.user_name, "User");
        assert_eq!(rendered.guardian_label, "0 Guardians");
        assert_eq!(rendered.status_label, "Safe");
        assert_eq!(rendered.regions.len(), 2);
    }

    #[test]
    fn test_populated_snapshot_renders_values() {
        let fx = fixture(quiet_target());
        let writer = SnapshotWriter::new(Arc::clone(&fx.store) as Arc<dyn StateStore>);
        writer.set_user_name("Asha").unwrap();
        writer.set_guardian_count(3).unwrap();
        writer.set_safety_status(SafetyStatus::Alert).unwrap();

        let rendered = fx.surface.refresh(SurfaceId(1));
        assert_eq!(rendered.user_name, "Asha");
        assert_eq!(rendered.guardian_label, "3 Guardians");
        assert_eq!(rendered.status_label, "Alert");
    }

    #[test]
    fn test_malformed_fields_render_defaults() {
        let fx = fixture(quiet_target());
        fx.store.set(KEY_GUARDIAN_COUNT, json!("many")).unwrap();
        fx.store.set(KEY_SAFETY_STATUS, json!(1)).unwrap();

        let rendered = fx.surface.refresh(SurfaceId(1));
        assert_eq!(rendered.guardian_label, "0 Guardians");
        assert_eq!(rendered.status_label, "Safe");
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let fx = fixture(quiet_target());

        let first = fx.surface.refresh(SurfaceId(1));
        let second = fx.surface.refresh(SurfaceId(1));

        // Same rendered output, same pending-action record identity
        assert_eq!(first, second);
        assert_eq!(fx.dispatcher.pending_count(), 2);
    }

    #[test]
    fn test_refresh_arms_distinct_records_per_instance() {
        let fx = fixture(quiet_target());

        let one = fx.surface.refresh(SurfaceId(1));
        let two = fx.surface.refresh(SurfaceId(2));

        assert_ne!(
            one.region(ActionCode::TriggerSos).unwrap().handle,
            two.region(ActionCode::TriggerSos).unwrap().handle,
        );
        assert_eq!(fx.dispatcher.pending_count(), 4);
    }

    #[test]
    fn test_tap_on_sos_region_activates_target() {
        let mut target = MockTarget::new();
        target
            .expect_activate()
            .withf(|flags| flags.trigger_sos)
            .times(1)
            .returning(|_| Ok(()));
        let fx = fixture(target);

        let rendered = fx.surface.refresh(SurfaceId(1));
        let region = rendered.region(ActionCode::TriggerSos).unwrap();
        fx.dispatcher.deliver(region.handle).unwrap();
    }

    #[test]
    fn test_on_provisioned_tracks_and_renders() {
        let fx = fixture(quiet_target());

        let rendered = fx.surface.on_provisioned(SurfaceId(7));
        assert_eq!(rendered.surface_id, SurfaceId(7));
        assert_eq!(fx.surface.provisioned(), vec![SurfaceId(7)]);
    }

    #[test]
    fn test_refresh_all_covers_provisioned_instances() {
        let fx = fixture(quiet_target());
        fx.surface.on_provisioned(SurfaceId(1));
        fx.surface.on_provisioned(SurfaceId(2));

        let rendered = fx.surface.refresh_all();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].surface_id, SurfaceId(1));
        assert_eq!(rendered[1].surface_id, SurfaceId(2));
    }

    #[test]
    fn test_on_all_removed_drops_pending_records() {
        let fx = fixture(quiet_target());
        fx.surface.on_provisioned(SurfaceId(1));
        fx.surface.on_provisioned(SurfaceId(2));
        assert_eq!(fx.dispatcher.pending_count(), 4);

        fx.surface.on_all_removed();
        assert_eq!(fx.dispatcher.pending_count(), 0);
        assert!(fx.surface.provisioned().is_empty());
    }

    #[test]
    fn test_snapshot_change_keeps_record_identity() {
        let fx = fixture(quiet_target());
        let writer = SnapshotWriter::new(Arc::clone(&fx.store) as Arc<dyn StateStore>);

        let before = fx.surface.refresh(SurfaceId(1));
        writer.set_safety_status(SafetyStatus::Alert).unwrap();
        let after = fx.surface.refresh(SurfaceId(1));

        assert_ne!(before.status_label, after.status_label);
        assert_eq!(
            before.region(ActionCode::TriggerSos).unwrap().handle,
            after.region(ActionCode::TriggerSos).unwrap().handle,
        );
    }
}
