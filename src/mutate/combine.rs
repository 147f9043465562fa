use crate::cache::ScoreCache;
use crate::catalog::DistrictId;
use crate::error::{EngineError, Result};
use crate::geometry::GeometryAdapter;
use crate::mutate::helpers::simplified_per_level;
use crate::mutate::MutationEngine;
use crate::plan::{Plan, PlanStore};
use crate::stats;

impl<'a> MutationEngine<'a> {
    /// `combine(plan, target_id, component_ids, base_version) -> ()` (spec
    /// §4.F.3). The target absorbs every component's geometry and stats;
    /// each component persists at the new version as an empty-geometry row
    /// so its `district_id` stays resolvable, just with nothing left in it.
    pub fn combine(
        &self,
        store: &mut dyn PlanStore,
        cache: &mut ScoreCache,
        plan: &mut Plan,
        target_id: DistrictId,
        component_ids: &[DistrictId],
        base_version: u64,
        now: u64,
    ) -> Result<()> {
        if base_version > plan.version || base_version < plan.min_version {
            return Err(EngineError::VersionMismatch { requested: base_version, min: plan.min_version, max: plan.version });
        }
        if component_ids.is_empty() {
            return Ok(());
        }

        let body = self.catalog.body();
        let new_version = base_version + 1;
        let districts = store.districts_latest_at(plan.id, base_version);

        let target_existing = districts
            .iter()
            .find(|d| d.district_id == target_id)
            .ok_or_else(|| EngineError::InvariantViolation(format!("combine target {target_id:?} has no row at version {base_version}")))?;
        if target_existing.is_locked {
            return Err(EngineError::LockedTarget);
        }

        let mut components = Vec::with_capacity(component_ids.len());
        for &id in component_ids {
            let row = districts
                .iter()
                .find(|d| d.district_id == id)
                .ok_or_else(|| EngineError::InvariantViolation(format!("combine component {id:?} has no row at version {base_version}")))?;
            if row.is_locked {
                return Err(EngineError::LockedTarget);
            }
            components.push(row.clone());
        }

        let mut combined_geom = target_existing.geom.clone();
        for component in &components {
            combined_geom = GeometryAdapter::union(&combined_geom, &component.geom);
        }

        let mut target_row = target_existing.clone_forward(new_version);
        target_row.geom = combined_geom;
        target_row.simple = simplified_per_level(body, self.config, &target_row.geom);
        let target_row_id = store.insert_row(target_row);
        store.clone_computed(target_existing.row_id, target_row_id);

        for subject_id in self.catalog.subjects_in_dependency_order()? {
            let mut sum = store.computed(target_row_id, subject_id);
            for component in &components {
                let component_value = store.computed(component.row_id, subject_id);
                sum.number += component_value.number;
            }
            if let Some(subject) = self.catalog.subject(subject_id) {
                if let Some(denom_id) = subject.percentage_denominator {
                    let denom = store.computed(target_row_id, denom_id);
                    sum.percentage = Some(if denom.number > rust_decimal::Decimal::ZERO {
                        sum.number / denom.number
                    } else {
                        rust_decimal::Decimal::ZERO
                    });
                }
            }
            store.set_computed(target_row_id, subject_id, sum);
        }

        for component in &components {
            let mut emptied = component.clone_forward(new_version);
            emptied.geom = GeometryAdapter::cascaded_union(&[]);
            emptied.simple = simplified_per_level(body, self.config, &emptied.geom);
            let row_id = store.insert_row(emptied);
            stats::reset(store, self.catalog, row_id);
            cache.evict_district_row(component.row_id);
        }

        plan.version = new_version;
        plan.touch(now);
        store.save_plan(plan);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ScoreCache;
    use crate::catalog::{Body, CatalogBuilder, Geolevel, GeolevelIndex, PortableId, SubjectId, Unit, UnitId};
    use crate::config::Config;
    use crate::plan::{DistrictRow, MemPlanStore};
    use geo::{polygon, MultiPolygon, Point};
    use rust_decimal::Decimal;

    fn square(id: u64, x0: f64, y0: f64, x1: f64, y1: f64) -> Unit {
        let geom = MultiPolygon::new(vec![polygon![
            (x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0),
        ]]);
        Unit::new(UnitId(id), PortableId::new(format!("u{id}")), None, geom, Point::new((x0 + x1) / 2.0, (y0 + y1) / 2.0), GeolevelIndex(0))
    }

    fn setup() -> (crate::catalog::Catalog, MemPlanStore, Plan) {
        let body = Body::new("Test", 5, None, vec![Geolevel::new("block", 0.0, 0.0)], "{name}").unwrap();
        let a = square(1, 0.0, 0.0, 1.0, 1.0);
        let b = square(2, 1.0, 0.0, 2.0, 1.0);
        let catalog = CatalogBuilder::new()
            .with_units(vec![a, b])
            .with_subjects(vec![crate::catalog::Subject::new(SubjectId(0), "totpop", None)])
            .with_characteristic(UnitId(1), SubjectId(0), Decimal::new(100, 0))
            .with_characteristic(UnitId(2), SubjectId(0), Decimal::new(150, 0))
            .build(body)
            .unwrap();

        let mut store = MemPlanStore::new();
        let plan = Plan::new(1, "Test", 0);

        let geom1 = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)]]);
        let geom2 = MultiPolygon::new(vec![polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)]]);

        let d1 = store.insert_row(DistrictRow::new(plan.id, DistrictId(1), 0, "District 1", 1, geom1, 1));
        let d2 = store.insert_row(DistrictRow::new(plan.id, DistrictId(2), 0, "District 2", 1, geom2, 1));
        store.set_computed(d1, SubjectId(0), crate::stats::ComputedCharacteristic { number: Decimal::new(100, 0), percentage: None });
        store.set_computed(d2, SubjectId(0), crate::stats::ComputedCharacteristic { number: Decimal::new(150, 0), percentage: None });

        (catalog, store, plan)
    }

    #[test]
    fn combine_merges_geometry_and_sums_stats() {
        let (catalog, mut store, mut plan) = setup();
        let config = Config::default();
        let mut cache = ScoreCache::new();
        let engine = MutationEngine::new(&catalog, &config);

        engine.combine(&mut store, &mut cache, &mut plan, DistrictId(1), &[DistrictId(2)], 0, 100).unwrap();
        assert_eq!(plan.version, 1);

        let target = store.district_latest_at(1, DistrictId(1), 1).unwrap();
        assert!(!GeometryAdapter::is_empty(&target.geom));
        assert_eq!(store.computed(target.row_id, SubjectId(0)).number, Decimal::new(250, 0));

        let component = store.district_latest_at(1, DistrictId(2), 1).unwrap();
        assert!(GeometryAdapter::is_empty(&component.geom));
        assert_eq!(store.computed(component.row_id, SubjectId(0)).number, Decimal::ZERO);
        assert_eq!(component.district_id, DistrictId(2));
    }

    #[test]
    fn combine_into_locked_target_is_rejected() {
        let (catalog, mut store, mut plan) = setup();
        let config = Config::default();
        let mut cache = ScoreCache::new();
        let engine = MutationEngine::new(&catalog, &config);

        let mut target = store.district_latest_at(1, DistrictId(1), 0).unwrap();
        target.is_locked = true;
        store.replace_row(target);

        let result = engine.combine(&mut store, &mut cache, &mut plan, DistrictId(1), &[DistrictId(2)], 0, 100);
        assert!(matches!(result, Err(EngineError::LockedTarget)));
    }
}
