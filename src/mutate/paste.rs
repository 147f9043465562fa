use std::collections::{HashMap, HashSet};

use geo::MultiPolygon;

use crate::catalog::{DistrictId, PredicateKind, RowId, UnitId};
use crate::error::{EngineError, Result};
use crate::geometry::GeometryAdapter;
use crate::mutate::helpers::simplified_per_level;
use crate::mutate::MutationEngine;
use crate::plan::{DistrictRow, Plan, PlanStore};
use crate::stats;

/// A district shape imported from elsewhere (spec §4.F.2): not yet a row in
/// this plan, so it carries its own name/member count rather than a
/// `district_id`.
#[derive(Debug, Clone)]
pub struct PastedDistrict {
    pub name: String,
    pub num_members: u32,
    pub geom: MultiPolygon<f64>,
}

impl<'a> MutationEngine<'a> {
    /// `paste(plan, sources, base_version) -> new_ids` (spec §4.F.2).
    /// Imports each source district in order, carving its area out of
    /// whatever it overlaps; a source entirely consumed by locked
    /// districts is dropped (`None` in the result).
    ///
    /// No row is ever deleted here, only superseded, so — unlike `assign`
    /// — there is nothing for the score cache to evict (spec §4.H: a
    /// district row is eternally valid once superseded).
    pub fn paste(&self, store: &mut dyn PlanStore, plan: &mut Plan, sources: Vec<PastedDistrict>, base_version: u64, now: u64) -> Result<Vec<Option<DistrictId>>> {
        if base_version > plan.version || base_version < plan.min_version {
            return Err(EngineError::VersionMismatch { requested: base_version, min: plan.min_version, max: plan.version });
        }
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let body = self.catalog.body();
        let new_version = base_version + 1;
        let mut districts = store.districts_latest_at(plan.id, base_version);
        districts.sort_by_key(|d| d.district_id);

        let mut cloned_this_batch: HashMap<DistrictId, RowId> = HashMap::new();
        let mut results = Vec::with_capacity(sources.len());

        for source in sources {
            let assigned_count = districts.iter().filter(|d| !d.district_id.is_unassigned() && !GeometryAdapter::is_empty(&d.geom)).count();
            if assigned_count + 1 > body.max_districts as usize + 1 {
                return Err(EngineError::CapacityExceeded(format!(
                    "plan already has {assigned_count} assigned districts (max {})",
                    body.max_districts
                )));
            }

            let occupied: HashSet<DistrictId> = districts.iter().filter(|d| !GeometryAdapter::is_empty(&d.geom)).map(|d| d.district_id).collect();
            let Some(new_id) = (1..=body.max_districts).map(DistrictId).find(|id| !occupied.contains(id)) else {
                return Err(EngineError::CapacityExceeded("no free district slot".to_string()));
            };

            let mut pasted_geom = source.geom;
            for existing in districts.iter_mut() {
                if existing.district_id == new_id {
                    continue;
                }
                let overlap = GeometryAdapter::intersection(&existing.geom, &pasted_geom);
                if GeometryAdapter::is_empty(&overlap) {
                    continue;
                }
                let covered_ids: Vec<UnitId> = self.catalog.units_in(body.base_level(), &overlap, PredicateKind::CentroidWithin).iter().map(|u| u.id).collect();

                if existing.is_locked {
                    pasted_geom = GeometryAdapter::difference(&pasted_geom, &existing.geom);
                } else {
                    let row_id = *cloned_this_batch.entry(existing.district_id).or_insert_with(|| {
                        let clone = existing.clone_forward(new_version);
                        let row_id = store.insert_row(clone);
                        store.clone_computed(existing.row_id, row_id);
                        row_id
                    });
                    let mut row = store.row(row_id).expect("row just inserted");
                    row.geom = GeometryAdapter::difference(&row.geom, &pasted_geom);
                    row.simple = simplified_per_level(body, self.config, &row.geom);
                    store.replace_row(row);
                    stats::delta(store, self.catalog, row_id, &covered_ids, false)?;
                    existing.geom = GeometryAdapter::difference(&existing.geom, &pasted_geom);
                }
            }

            if GeometryAdapter::is_empty(&pasted_geom) {
                results.push(None);
                continue;
            }

            let mut pasted_row = DistrictRow::new(plan.id, new_id, new_version, source.name, source.num_members, pasted_geom.clone(), body.geolevels().len());
            pasted_row.simple = simplified_per_level(body, self.config, &pasted_geom);
            let pasted_row_id = store.insert_row(pasted_row);
            let covered_ids: Vec<UnitId> = self.catalog.units_in(body.base_level(), &pasted_geom, PredicateKind::CentroidWithin).iter().map(|u| u.id).collect();
            stats::delta(store, self.catalog, pasted_row_id, &covered_ids, true)?;

            let mut tracking = DistrictRow::new(plan.id, new_id, new_version, String::new(), 1, pasted_geom, 0);
            tracking.row_id = pasted_row_id;
            districts.push(tracking);

            results.push(Some(new_id));
        }

        plan.version = new_version;
        plan.touch(now);
        store.save_plan(plan);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Body, CatalogBuilder, Geolevel, GeolevelIndex, PortableId, Subject, SubjectId, Unit};
    use crate::config::Config;
    use crate::plan::MemPlanStore;
    use geo::{polygon, Point};
    use rust_decimal::Decimal;

    fn square(id: u64, x0: f64, y0: f64, x1: f64, y1: f64) -> Unit {
        let geom = MultiPolygon::new(vec![polygon![
            (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
        ]]);
        Unit::new(UnitId(id), PortableId::new(format!("u{id}")), None, geom, Point::new((x0 + x1) / 2.0, (y0 + y1) / 2.0), GeolevelIndex(0))
    }

    fn catalog_and_plan() -> (crate::catalog::Catalog, MemPlanStore, Plan) {
        let body = Body::new("Test", 3, None, vec![Geolevel::new("block", 0.0, 0.0)], "{name}").unwrap();
        let a = square(1, 0.0, 0.0, 1.0, 1.0);
        let b = square(2, 1.0, 0.0, 2.0, 1.0);
        let catalog = CatalogBuilder::new()
            .with_units(vec![a, b])
            .with_subjects(vec![Subject::new(SubjectId(0), "totpop", None)])
            .with_characteristic(UnitId(1), SubjectId(0), Decimal::new(10, 0))
            .with_characteristic(UnitId(2), SubjectId(0), Decimal::new(20, 0))
            .build(body)
            .unwrap();

        let mut store = MemPlanStore::new();
        let plan = Plan::new(1, "Test", 0);
        let all = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        store.insert_row(DistrictRow::new(plan.id, DistrictId::UNASSIGNED, 0, "Unassigned", 1, all, 1));
        (catalog, store, plan)
    }

    #[test]
    fn paste_allocates_lowest_free_id_and_shrinks_unassigned() {
        let (catalog, mut store, mut plan) = catalog_and_plan();
        let config = Config::default();
        let engine = MutationEngine::new(&catalog, &config);

        let source = PastedDistrict {
            name: "Imported".to_string(),
            num_members: 1,
            geom: MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)]]),
        };

        let ids = engine.paste(&mut store, &mut plan, vec![source], 0, 100).unwrap();
        assert_eq!(ids, vec![Some(DistrictId(1))]);
        assert_eq!(plan.version, 1);

        let pasted = store.district_latest_at(1, DistrictId(1), 1).unwrap();
        assert_eq!(store.computed(pasted.row_id, SubjectId(0)).number, Decimal::new(10, 0));

        let unassigned = store.district_latest_at(1, DistrictId::UNASSIGNED, 1).unwrap();
        assert_eq!(store.computed(unassigned.row_id, SubjectId(0)).number, Decimal::new(20, 0));
    }

    #[test]
    fn paste_fully_overlapping_a_locked_district_is_dropped() {
        let (catalog, mut store, mut plan) = catalog_and_plan();
        let config = Config::default();
        let engine = MutationEngine::new(&catalog, &config);

        let mut locked = DistrictRow::new(1, DistrictId(1), 0, "Locked", 1, MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)]]), 1);
        locked.is_locked = true;
        store.insert_row(locked);

        let source = PastedDistrict {
            name: "Imported".to_string(),
            num_members: 1,
            geom: MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)]]),
        };

        let ids = engine.paste(&mut store, &mut plan, vec![source], 0, 100).unwrap();
        assert_eq!(ids, vec![None]);
    }
}
