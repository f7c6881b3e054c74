//! The coupling-data registry.
//!
//! The scheme owns every exchanged datum; measures and the accelerator
//! borrow them through the registry for the duration of one cycle.
//! Exchange iteration always happens in ascending ID order so both
//! participants produce the same wire order independent of registration
//! order.

use indexmap::IndexMap;

use tether_core::data::{CouplingData, DataDirection, DataSpec};
use tether_core::DataId;

use crate::error::SchemeError;

#[derive(Default)]
pub(crate) struct DataRegistry {
    data: IndexMap<DataId, CouplingData>,
}

impl DataRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a datum, or return the existing one for a repeated ID.
    ///
    /// A repeated registration must agree on the direction; a datum can
    /// never be both sent and received.
    pub(crate) fn add(&mut self, spec: DataSpec) -> Result<DataId, SchemeError> {
        if let Some(existing) = self.data.get(&spec.id) {
            if existing.direction() != spec.direction {
                return Err(SchemeError::ConflictingDirection {
                    data: spec.name.clone(),
                });
            }
            debug_assert_eq!(existing.size(), spec.size, "re-registered with a new size");
            return Ok(spec.id);
        }
        let id = spec.id;
        self.data.insert(id, CouplingData::new(spec));
        Ok(id)
    }

    pub(crate) fn get(&self, id: DataId) -> Option<&CouplingData> {
        self.data.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: DataId) -> Option<&mut CouplingData> {
        self.data.get_mut(&id)
    }

    fn ids_by_direction(&self, direction: Option<DataDirection>) -> Vec<DataId> {
        let mut ids: Vec<DataId> = self
            .data
            .values()
            .filter(|d| direction.map_or(true, |dir| d.direction() == dir))
            .map(|d| d.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// All registered IDs, ascending.
    pub(crate) fn all_ids(&self) -> Vec<DataId> {
        self.ids_by_direction(None)
    }

    /// IDs of send data, ascending.
    pub(crate) fn send_ids(&self) -> Vec<DataId> {
        self.ids_by_direction(Some(DataDirection::Send))
    }

    /// IDs of receive data, ascending.
    pub(crate) fn receive_ids(&self) -> Vec<DataId> {
        self.ids_by_direction(Some(DataDirection::Receive))
    }

    /// True iff any send datum exchanges its sub-step trajectory.
    pub(crate) fn requires_substeps(&self) -> bool {
        self.data
            .values()
            .any(|d| d.direction() == DataDirection::Send && d.exchange_substeps())
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut CouplingData> {
        self.data.values_mut()
    }

    /// Mutable borrows of the data in `ids`, for handing to the
    /// accelerator in one call.
    pub(crate) fn data_views_mut(&mut self, ids: &[DataId]) -> Vec<&mut CouplingData> {
        let mut views: Vec<&mut CouplingData> = self
            .data
            .values_mut()
            .filter(|d| ids.contains(&d.id()))
            .collect();
        views.sort_by_key(|d| d.id());
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: u32, direction: DataDirection, substeps: bool) -> DataSpec {
        DataSpec {
            id: DataId(id),
            name: format!("data-{id}"),
            size: 1,
            mesh_dimensions: 2,
            has_gradient: false,
            requires_initialization: false,
            exchange_substeps: substeps,
            direction,
        }
    }

    #[test]
    fn conflicting_direction_is_rejected() {
        let mut registry = DataRegistry::new();
        registry.add(spec(0, DataDirection::Send, false)).unwrap();
        let err = registry
            .add(spec(0, DataDirection::Receive, false))
            .unwrap_err();
        assert!(matches!(err, SchemeError::ConflictingDirection { .. }));
    }

    #[test]
    fn repeated_registration_with_same_direction_is_reuse() {
        let mut registry = DataRegistry::new();
        registry.add(spec(3, DataDirection::Send, false)).unwrap();
        let id = registry.add(spec(3, DataDirection::Send, false)).unwrap();
        assert_eq!(id, DataId(3));
        assert_eq!(registry.all_ids(), vec![DataId(3)]);
    }

    #[test]
    fn ids_are_sorted_regardless_of_registration_order() {
        let mut registry = DataRegistry::new();
        registry.add(spec(5, DataDirection::Send, false)).unwrap();
        registry.add(spec(1, DataDirection::Receive, false)).unwrap();
        registry.add(spec(3, DataDirection::Send, false)).unwrap();
        assert_eq!(registry.all_ids(), vec![DataId(1), DataId(3), DataId(5)]);
        assert_eq!(registry.send_ids(), vec![DataId(3), DataId(5)]);
        assert_eq!(registry.receive_ids(), vec![DataId(1)]);
    }

    #[test]
    fn substeps_toggle_only_counts_send_data() {
        let mut registry = DataRegistry::new();
        registry.add(spec(0, DataDirection::Receive, true)).unwrap();
        assert!(!registry.requires_substeps());
        registry.add(spec(1, DataDirection::Send, true)).unwrap();
        assert!(registry.requires_substeps());
    }

    #[test]
    fn data_views_cover_exactly_the_requested_ids() {
        let mut registry = DataRegistry::new();
        registry.add(spec(0, DataDirection::Send, false)).unwrap();
        registry.add(spec(1, DataDirection::Receive, false)).unwrap();
        registry.add(spec(2, DataDirection::Receive, false)).unwrap();
        let views = registry.data_views_mut(&[DataId(0), DataId(2)]);
        let ids: Vec<DataId> = views.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec![DataId(0), DataId(2)]);
    }
}
