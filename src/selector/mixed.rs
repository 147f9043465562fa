use geo::MultiPolygon;

use crate::catalog::{Catalog, GeolevelIndex, PredicateKind, UnitId};
use crate::geometry::GeometryAdapter;

/// The hierarchical geographic unit selector (spec §4.C): given a target
/// boundary and a set of units at `source_level`, returns the largest
/// possible units — of possibly mixed geolevels — that tile
/// `U(unit_ids) ∩ boundary` (`inside = true`) or `U(unit_ids) \ boundary`
/// (`inside = false`).
///
/// Walks the geolevel hierarchy from `source_level` toward the base level,
/// accepting whole units where they fit entirely and descending into the
/// remainder otherwise. This avoids testing every base unit individually,
/// which is what makes interactive editing viable on large catalogs.
pub fn mixed_geounits(
    catalog: &Catalog,
    unit_ids: &[UnitId],
    source_level: GeolevelIndex,
    boundary: Option<&MultiPolygon<f64>>,
    inside: bool,
) -> Vec<UnitId> {
    if boundary.is_none() && inside {
        return Vec::new();
    }
    let empty = MultiPolygon::new(Vec::new());
    let boundary = boundary.unwrap_or(&empty);

    let body = catalog.body();
    let source_units = catalog.units_by_ids(unit_ids);
    let universe = GeometryAdapter::cascaded_union(
        &source_units.iter().map(|u| u.geom.clone()).collect::<Vec<_>>(),
    );

    let mut result = Vec::new();
    let mut accepted = MultiPolygon::new(Vec::new());

    let mut level = source_level;
    for unit in &source_units {
        let keep = if body.is_base_level(level) {
            let inside_boundary = GeometryAdapter::point_intersects(&unit.centroid, boundary);
            inside_boundary == inside
        } else if inside {
            GeometryAdapter::within(&unit.geom, boundary)
        } else {
            !GeometryAdapter::intersects(&unit.geom, boundary)
        };

        if keep {
            result.push(unit.id);
            accepted = GeometryAdapter::union(&accepted, &unit.geom);
        }
    }

    while !body.is_base_level(level) {
        let Some(next) = body.finer(level) else { break };
        level = next;

        let remaining_universe = GeometryAdapter::difference(&universe, &accepted);
        let remainder = if inside {
            GeometryAdapter::intersection(boundary, &remaining_universe)
        } else {
            let outside_boundary = GeometryAdapter::difference(&universe, boundary);
            GeometryAdapter::intersection(&outside_boundary, &remaining_universe)
        };

        if GeometryAdapter::is_empty(&remainder) {
            break;
        }

        let kind = if body.is_base_level(level) { PredicateKind::CentroidWithin } else { PredicateKind::WithinPolygon };
        for unit in catalog.units_in(level, &remainder, kind) {
            result.push(unit.id);
            accepted = GeometryAdapter::union(&accepted, &unit.geom);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Body, CatalogBuilder, Geolevel, PortableId, Unit};
    use geo::{polygon, Point};

    fn square(id: u64, x0: f64, y0: f64, x1: f64, y1: f64, level: u16, parent: Option<u64>) -> Unit {
        let geom = MultiPolygon::new(vec![polygon![
            (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
        ]]);
        let centroid = Point::new((x0 + x1) / 2.0, (y0 + y1) / 2.0);
        Unit::new(UnitId(id), PortableId::new(format!("u{id}")), parent.map(UnitId), geom, centroid, GeolevelIndex(level))
    }

    // County X (id 100, level 0) made of 4 tracts X1..X4 (ids 1..4, level 1, base).
    fn county_and_tracts() -> Catalog {
        let body = Body::new("test", 5, None, vec![Geolevel::new("county", 0.0, 0.0), Geolevel::new("tract", 0.0, 0.0)], "{name}").unwrap();
        let county = square(100, 0.0, 0.0, 2.0, 2.0, 0, None);
        let x1 = square(1, 0.0, 0.0, 1.0, 1.0, 1, Some(100));
        let x2 = square(2, 1.0, 0.0, 2.0, 1.0, 1, Some(100));
        let x3 = square(3, 0.0, 1.0, 1.0, 2.0, 1, Some(100));
        let x4 = square(4, 1.0, 1.0, 2.0, 2.0, 1, Some(100));
        CatalogBuilder::new().with_units(vec![county, x1, x2, x3, x4]).build(body).unwrap()
    }

    #[test]
    fn mixed_level_selection_picks_finer_units_when_county_not_wholly_within() {
        // Scenario 3 from spec §8: boundary = X1 ∪ X2, selecting county X at L0
        // should NOT return the county (it isn't wholly within boundary) but
        // descend to return exactly {X1, X2}.
        let catalog = county_and_tracts();
        let boundary = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);

        let mut selected = mixed_geounits(&catalog, &[UnitId(100)], GeolevelIndex(0), Some(&boundary), true);
        selected.sort_by_key(|id| id.0);

        assert_eq!(selected, vec![UnitId(1), UnitId(2)]);
    }

    #[test]
    fn county_wholly_within_boundary_is_selected_directly() {
        let catalog = county_and_tracts();
        let boundary = MultiPolygon::new(vec![polygon![
            (x: -1.0, y: -1.0), (x: 3.0, y: -1.0), (x: 3.0, y: 3.0), (x: -1.0, y: 3.0), (x: -1.0, y: -1.0),
        ]]);

        let selected = mixed_geounits(&catalog, &[UnitId(100)], GeolevelIndex(0), Some(&boundary), true);
        assert_eq!(selected, vec![UnitId(100)]);
    }

    #[test]
    fn absent_boundary_inside_is_empty() {
        let catalog = county_and_tracts();
        let selected = mixed_geounits(&catalog, &[UnitId(100)], GeolevelIndex(0), None, true);
        assert!(selected.is_empty());
    }

    #[test]
    fn absent_boundary_outside_returns_everything_at_source_level() {
        let catalog = county_and_tracts();
        let selected = mixed_geounits(&catalog, &[UnitId(100)], GeolevelIndex(0), None, false);
        assert_eq!(selected, vec![UnitId(100)]);
    }

    #[test]
    fn outside_branch_descends_for_partial_overlap() {
        let catalog = county_and_tracts();
        // Boundary covers only X1; "outside" selection of county X should
        // descend and return the three tracts not covered by boundary.
        let boundary = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        let mut selected = mixed_geounits(&catalog, &[UnitId(100)], GeolevelIndex(0), Some(&boundary), false);
        selected.sort_by_key(|id| id.0);
        assert_eq!(selected, vec![UnitId(2), UnitId(3), UnitId(4)]);
    }
}
