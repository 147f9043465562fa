use geo::MultiPolygon;

use crate::cache::ScoreCache;
use crate::catalog::{DistrictId, GeolevelIndex, UnitId};
use crate::error::{EngineError, Result};
use crate::geometry::GeometryAdapter;
use crate::mutate::helpers::{intersects_interior, simplified_per_level};
use crate::mutate::MutationEngine;
use crate::plan::{DistrictRow, Plan, PlanStore};
use crate::selector::mixed_geounits;
use crate::stats;
use crate::version::{PurgeMode, VersionManager};

impl<'a> MutationEngine<'a> {
    /// `assign(plan, target_id, unit_ids, level, base_version) -> changed`
    /// (spec §4.F.1). Either every described effect happens and
    /// `plan.version` advances by one, or nothing changes.
    pub fn assign(
        &self,
        store: &mut dyn PlanStore,
        cache: &mut ScoreCache,
        plan: &mut Plan,
        target_id: DistrictId,
        unit_ids: &[UnitId],
        level: GeolevelIndex,
        base_version: u64,
        now: u64,
    ) -> Result<bool> {
        if unit_ids.is_empty() {
            return Ok(false);
        }
        if base_version > plan.version || base_version < plan.min_version {
            return Err(EngineError::VersionMismatch { requested: base_version, min: plan.min_version, max: plan.version });
        }

        let body = self.catalog.body();
        let selected_units = self.catalog.units_by_ids(unit_ids);
        let union_of_selected =
            GeometryAdapter::cascaded_union(&selected_units.iter().map(|u| u.geom.clone()).collect::<Vec<_>>());

        let districts = store.districts_latest_at(plan.id, base_version);
        let target_existing = districts.iter().find(|d| d.district_id == target_id).cloned();
        if target_existing.as_ref().is_some_and(|t| t.is_locked) {
            return Ok(false);
        }

        let locked_geom = GeometryAdapter::buffer_zero(&GeometryAdapter::cascaded_union(
            &districts.iter().filter(|d| d.is_locked).map(|d| d.geom.clone()).collect::<Vec<_>>(),
        ));
        let incremental = GeometryAdapter::difference(&union_of_selected, &locked_geom);
        if GeometryAdapter::is_empty(&incremental) {
            log::debug!(target: "distmander::mutate::assign", "selection fully consumed by locked districts, no-op");
            return Ok(false);
        }

        let deleted = VersionManager::purge(store, plan, PurgeMode::After(base_version));
        deleted.into_iter().for_each(|row_id| cache.evict_district_row(row_id));
        plan.version = base_version;
        let new_version = VersionManager::allocate(plan);

        for district in &districts {
            if district.district_id == target_id {
                continue;
            }
            let unaffected = GeometryAdapter::is_empty(&district.geom) || !intersects_interior(&district.geom, &incremental)?;
            if unaffected {
                let clone = district.clone_forward(new_version);
                let row_id = store.insert_row(clone);
                store.clone_computed(district.row_id, row_id);
                continue;
            }

            let taken = mixed_geounits(self.catalog, unit_ids, level, Some(&district.geom), true);
            let mut shrunk = district.clone_forward(new_version);
            shrunk.geom = GeometryAdapter::difference(&district.geom, &incremental);
            shrunk.simple = simplified_per_level(body, self.config, &shrunk.geom);
            let row_id = store.insert_row(shrunk);
            store.clone_computed(district.row_id, row_id);
            stats::delta(store, self.catalog, row_id, &taken, false)?;
        }

        let target_geom_before = target_existing.as_ref().map(|t| t.geom.clone()).unwrap_or_else(|| MultiPolygon::new(Vec::new()));
        let bounds = if GeometryAdapter::is_empty(&target_geom_before) {
            locked_geom
        } else {
            GeometryAdapter::union(&target_geom_before, &locked_geom)
        };
        let added = mixed_geounits(self.catalog, unit_ids, level, Some(&bounds), false);

        let mut target_row = match &target_existing {
            Some(existing) => existing.clone_forward(new_version),
            None => DistrictRow::new(
                plan.id,
                target_id,
                new_version,
                format!("District {}", target_id.0),
                1,
                MultiPolygon::new(Vec::new()),
                body.geolevels().len(),
            ),
        };
        target_row.geom = GeometryAdapter::union(&target_geom_before, &incremental);
        target_row.simple = simplified_per_level(body, self.config, &target_row.geom);
        let target_row_id = store.insert_row(target_row);
        if let Some(existing) = &target_existing {
            store.clone_computed(existing.row_id, target_row_id);
        }
        stats::delta(store, self.catalog, target_row_id, &added, true)?;

        plan.version = new_version;
        plan.touch(now);
        store.save_plan(plan);

        let purged = VersionManager::purge_beyond(store, plan, self.config.max_undos_during_edit);
        purged.into_iter().for_each(|row_id| cache.evict_district_row(row_id));

        Ok(true)
    }
}
