use geo::MultiPolygon;

use crate::catalog::Body;
use crate::config::Config;
use crate::error::Result;
use crate::geometry::GeometryAdapter;
use crate::plan::SimplifiedGeoms;

/// Per-geolevel simplified copies of `geom`, indexed the same way as
/// `body.geolevels()` (spec §3 `District.simple`).
pub(crate) fn simplified_per_level(body: &Body, config: &Config, geom: &MultiPolygon<f64>) -> SimplifiedGeoms {
    body.geolevels()
        .iter()
        .map(|level| {
            let tolerance = if level.simplify_tolerance > 0.0 { level.simplify_tolerance } else { config.simplify_threshold_default };
            GeometryAdapter::simplify(geom, tolerance)
        })
        .collect()
}

/// Tests interior-interior intersection (spec §4.F.1 step 6's `T********`
/// relate pattern), retrying once after a zero-buffer topology repair if
/// the kernel rejects the inputs (spec §7's auto-recovery policy).
pub(crate) fn intersects_interior(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<bool> {
    match GeometryAdapter::relate(a, b, "T********") {
        Ok(hit) => Ok(hit),
        Err(err) => {
            log::warn!(target: "distmander::mutate", "relate failed ({err}), retrying after buffer-zero repair");
            let a = GeometryAdapter::buffer_zero(a);
            let b = GeometryAdapter::buffer_zero(b);
            GeometryAdapter::relate(&a, &b, "T********")
        }
    }
}
