use geo::MultiPolygon;
use smallvec::SmallVec;

use crate::catalog::{DistrictId, RowId};

/// Per-geolevel simplified geometry; most bodies declare only a handful of
/// geolevels, so this stays inline rather than heap-allocating.
pub type SimplifiedGeoms = SmallVec<[MultiPolygon<f64>; 4]>;

/// A copy-on-write district record (spec §3 "District"). Immutable once a
/// newer row exists for the same `(plan, district_id)` — mutation always
/// produces a fresh `DistrictRow` rather than editing one in place.
#[derive(Debug, Clone)]
pub struct DistrictRow {
    pub row_id: RowId,
    pub plan_id: u64,
    pub district_id: DistrictId,
    pub version: u64,
    pub name: String,
    pub num_members: u32,
    pub is_locked: bool,
    pub geom: MultiPolygon<f64>,
    /// Simplified geometry, one entry per geolevel index (spec §3).
    pub simple: SimplifiedGeoms,
}

impl DistrictRow {
    pub fn new(plan_id: u64, district_id: DistrictId, version: u64, name: impl Into<String>, num_members: u32, geom: MultiPolygon<f64>, num_geolevels: usize) -> Self {
        Self {
            row_id: RowId(0),
            plan_id,
            district_id,
            version,
            name: name.into(),
            num_members: num_members.max(1),
            is_locked: false,
            geom,
            simple: SmallVec::from_elem(MultiPolygon::new(Vec::new()), num_geolevels),
        }
    }

    /// A copy-on-write clone of `self` at `new_version`, with a fresh
    /// (as-yet-unassigned) `row_id` — the caller inserts it into a
    /// [`crate::plan::PlanStore`] to obtain the real id.
    pub fn clone_forward(&self, new_version: u64) -> Self {
        Self { row_id: RowId(0), version: new_version, ..self.clone() }
    }
}
