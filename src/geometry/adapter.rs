use geo::{
    BooleanOps, Centroid, Contains, Intersects, MultiPolygon, Point, Relate, SimplifyVwPreserve,
};

use crate::error::{EngineError, Result};

/// Thin wrapper over the `geo` crate fulfilling the Geometry kernel API
/// named in spec §6: `union`, `difference`, `intersection`, a zero-buffer
/// repair, `simplify`, `centroid`, `within`, `intersects`, `relate`,
/// `empty?`, `geom_type`, and `cascaded_union`.
///
/// Stateless by design — the catalog and mutation engine call these as free
/// functions rather than through an object so that geometry-heavy loops
/// don't pay for indirection.
pub struct GeometryAdapter;

impl GeometryAdapter {
    /// Normalize any geometry produced by a boolean op back into a
    /// well-formed `MultiPolygon`, dropping degenerate artifacts (stray
    /// points/lines a boolean op can leave behind at tangencies).
    pub fn enforce_multi(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(mp.0.into_iter().filter(|p| !p.exterior().0.is_empty()).collect())
    }

    pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        Self::enforce_multi(a.union(b))
    }

    pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        Self::enforce_multi(a.difference(b))
    }

    pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        Self::enforce_multi(a.intersection(b))
    }

    /// Union of many geometries at once; the empty multipolygon if `shapes` is empty.
    pub fn cascaded_union(shapes: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
        shapes
            .iter()
            .cloned()
            .reduce(|a, b| Self::union(&a, &b))
            .unwrap_or_else(|| MultiPolygon::new(Vec::new()))
    }

    /// Re-nodes a polygon via self-union, the standard stand-in for a
    /// kernel's `buffer(0)` repair when invalid topology (self-intersecting
    /// rings) would otherwise make a boolean op panic or misbehave.
    ///
    /// Used by `assign`'s auto-recovery policy (spec §7) and by step 3 of
    /// `assign` (spec §4.F.1), which normalizes `locked_geom` before
    /// subtracting it.
    pub fn buffer_zero(mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        Self::union(mp, &MultiPolygon::new(Vec::new()))
    }

    /// Visvalingam-Whyatt simplification with topology preservation
    /// (spec §6: `simplify(tolerance, preserve_topology=true)`).
    pub fn simplify(mp: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
        if tolerance <= 0.0 {
            return mp.clone();
        }
        mp.simplify_vw_preserve(&tolerance)
    }

    pub fn centroid(mp: &MultiPolygon<f64>) -> Option<Point<f64>> {
        mp.centroid()
    }

    pub fn within(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
        b.contains(a)
    }

    pub fn intersects(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
        a.intersects(b)
    }

    /// Boundary-exclusive: a point exactly on `mp`'s edge returns `false`.
    pub fn point_within(p: &Point<f64>, mp: &MultiPolygon<f64>) -> bool {
        mp.contains(p)
    }

    /// Boundary-inclusive: a point exactly on `mp`'s edge returns `true`.
    /// Base-level centroid selection uses this one (spec §4.C's tie-break
    /// treats an on-edge centroid as inside).
    pub fn point_intersects(p: &Point<f64>, mp: &MultiPolygon<f64>) -> bool {
        mp.intersects(p)
    }

    /// Strips every interior ring (hole) from each polygon in `mp`, keeping
    /// only the exterior rings. Spec §4.F.4's hole-fill test is against a
    /// district's exterior ring, not its full geometry — a district shaped
    /// like a donut must still be found as the host for a fragment sitting
    /// in its hole, which `contains` alone would miss (the hole is outside
    /// the polygon under DE-9IM).
    pub fn exterior_rings_only(mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        MultiPolygon::new(mp.0.iter().map(|p| geo::Polygon::new(p.exterior().clone(), Vec::new())).collect())
    }

    /// Tests the DE-9IM `pattern` (e.g. `"T********"` for interior-interior
    /// intersection, used by `assign` step 6) against `a` relative to `b`.
    pub fn relate(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, pattern: &str) -> Result<bool> {
        let matrix = a.relate(b);
        matrix
            .matches(pattern)
            .map_err(|e| EngineError::GeometryError(format!("invalid DE-9IM pattern '{pattern}': {e}")))
    }

    pub fn is_empty(mp: &MultiPolygon<f64>) -> bool {
        mp.0.is_empty() || mp.0.iter().all(|p| p.exterior().0.is_empty())
    }

    pub fn geom_type(mp: &MultiPolygon<f64>) -> &'static str {
        match mp.0.len() {
            0 => "Empty",
            1 => "Polygon",
            _ => "MultiPolygon",
        }
    }
}
