use geo::{MultiPolygon, Point};

use crate::catalog::{GeolevelIndex, PortableId, UnitId};

/// An atomic areal feature at some geolevel.
///
/// Invariant (spec §3): for any non-base unit `U`, the union of base-level
/// descendants of `U` equals `U`'s geometry up to topological tolerance.
/// The catalog is bootstrapped from a pre-ingested source and does not
/// verify this invariant itself.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub portable_id: PortableId,
    pub parent: Option<UnitId>,
    pub geom: MultiPolygon<f64>,
    pub centroid: Point<f64>,
    pub level: GeolevelIndex,
}

impl Unit {
    pub fn new(
        id: UnitId,
        portable_id: PortableId,
        parent: Option<UnitId>,
        geom: MultiPolygon<f64>,
        centroid: Point<f64>,
        level: GeolevelIndex,
    ) -> Self {
        Self { id, portable_id, parent, geom, centroid, level }
    }
}
