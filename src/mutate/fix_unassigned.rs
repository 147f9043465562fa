use std::collections::HashMap;

use geo::MultiPolygon;
use rust_decimal::Decimal;

use crate::cache::ScoreCache;
use crate::catalog::{DistrictId, GeolevelIndex, PredicateKind, SubjectId, UnitId};
use crate::error::{EngineError, Result};
use crate::geometry::GeometryAdapter;
use crate::mutate::MutationEngine;
use crate::plan::{DistrictRow, Plan, PlanStore};

impl<'a> MutationEngine<'a> {
    /// `fix_unassigned(plan, base_version) -> (changed, message)` (spec
    /// §4.F.4). Always runs the hole-fill pass (fully enclosed fragments of
    /// Unassigned are absorbed by whatever surrounds them regardless of
    /// `fix_unassigned_min_percent`); only runs the adjacency pass once
    /// enough of the body is already assigned. Internally this issues many
    /// `assign` calls, each bumping `plan.version`, then compacts the whole
    /// run down to a single undoable step.
    pub fn fix_unassigned(&self, store: &mut dyn PlanStore, cache: &mut ScoreCache, plan: &mut Plan, base_version: u64, now: u64) -> Result<(bool, String)> {
        if base_version > plan.version || base_version < plan.min_version {
            return Err(EngineError::VersionMismatch { requested: base_version, min: plan.min_version, max: plan.version });
        }

        let body = self.catalog.body();
        let base_level = body.base_level();
        let total_units = self.catalog.units_at_level(base_level).len();
        if total_units == 0 {
            return Ok((false, "no base units in catalog".to_string()));
        }

        plan.version = base_version;
        let mut fixed_units = 0usize;

        // Hole-fill: any fragment of Unassigned wholly inside a single
        // district's exterior ring is absorbed into it, no threshold check.
        // Tested against the exterior ring rather than the full geometry so
        // a donut-shaped district still finds the fragment sitting in its
        // own hole.
        let Some(unassigned) = store.district_latest_at(plan.id, DistrictId::UNASSIGNED, plan.version) else {
            return Ok((false, "plan has no Unassigned district".to_string()));
        };
        for fragment in unassigned.geom.0.iter().cloned() {
            let fragment = MultiPolygon::new(vec![fragment]);
            let districts = store.districts_latest_at(plan.id, plan.version);
            let Some(host) = districts.iter().find(|d| {
                !d.district_id.is_unassigned()
                    && !GeometryAdapter::is_empty(&d.geom)
                    && GeometryAdapter::within(&fragment, &GeometryAdapter::exterior_rings_only(&d.geom))
            }) else {
                continue;
            };
            let unit_ids: Vec<UnitId> = self
                .catalog
                .units_in(base_level, &fragment, PredicateKind::CentroidWithin)
                .iter()
                .map(|u| u.id)
                .collect();
            if unit_ids.is_empty() {
                continue;
            }
            let host_id = host.district_id;
            let current_version = plan.version;
            if self.assign(store, cache, plan, host_id, &unit_ids, base_level, current_version, now)? {
                fixed_units += unit_ids.len();
            }
        }

        // Adjacency pass, gated on how much of the body is already assigned.
        let plan_id = plan.id;
        let unassigned_now = self.remaining_unassigned_units(store, plan_id, base_level, plan.version);
        let assigned_fraction = Decimal::from(total_units - unassigned_now.len()) / Decimal::from(total_units);
        let threshold = Decimal::from(self.config.fix_unassigned_min_percent) / Decimal::from(100u32);

        if !unassigned_now.is_empty() && assigned_fraction >= threshold {
            let comparator = self.catalog.subject_by_name(&self.config.fix_unassigned_comparator_subject).map(|s| s.id);

            loop {
                let unassigned_units = self.remaining_unassigned_units(store, plan_id, base_level, plan.version);
                if unassigned_units.is_empty() {
                    break;
                }
                let districts = store.districts_latest_at(plan.id, plan.version);
                let mut groups: HashMap<DistrictId, Vec<UnitId>> = HashMap::new();

                for unit_id in &unassigned_units {
                    let Some(unit) = self.catalog.unit(*unit_id) else { continue };
                    let target = best_neighbor(store, &districts, unit, comparator);
                    if let Some(target_id) = target {
                        groups.entry(target_id).or_default().push(*unit_id);
                    }
                }

                if groups.is_empty() {
                    break;
                }

                let mut progressed = false;
                for (target_id, unit_ids) in groups {
                    let base_version = plan.version;
                    if self.assign(store, cache, plan, target_id, &unit_ids, base_level, base_version, now)? {
                        fixed_units += unit_ids.len();
                        progressed = true;
                    }
                }
                if !progressed {
                    break;
                }
            }
        }

        if fixed_units == 0 {
            plan.version = base_version;
            return Ok((false, "no unassigned area could be fixed".to_string()));
        }

        // Every intermediate `assign` call clones every district forward, so
        // the row at `post_fix_version` already holds each district's final
        // state; everything strictly between it and `base_version` is
        // disposable scratch. Collapsing it leaves exactly one undo step.
        let post_fix_version = plan.version;
        if post_fix_version > base_version + 1 {
            let deleted = store.delete_version_range(plan.id, base_version + 1, post_fix_version);
            deleted.into_iter().for_each(|row_id| cache.evict_district_row(row_id));
        }
        plan.touch(now);
        store.save_plan(plan);

        Ok((true, format!("fixed {fixed_units} unassigned unit(s)")))
    }

    fn remaining_unassigned_units(&self, store: &dyn PlanStore, plan_id: u64, base_level: GeolevelIndex, version: u64) -> Vec<UnitId> {
        store
            .district_latest_at(plan_id, DistrictId::UNASSIGNED, version)
            .map(|row| self.catalog.units_in(base_level, &row.geom, PredicateKind::CentroidWithin).iter().map(|u| u.id).collect())
            .unwrap_or_default()
    }
}

/// Among unlocked, non-empty, non-Unassigned districts adjacent to `unit`,
/// picks the one with the smallest `comparator` value, breaking ties by
/// lower `DistrictId` (spec §4.F.4's adjacency tie-break rule).
fn best_neighbor(store: &dyn PlanStore, districts: &[DistrictRow], unit: &crate::catalog::Unit, comparator: Option<SubjectId>) -> Option<DistrictId> {
    let mut best: Option<(DistrictId, Decimal)> = None;
    for candidate in districts {
        if candidate.district_id.is_unassigned() || candidate.is_locked || GeometryAdapter::is_empty(&candidate.geom) {
            continue;
        }
        if !GeometryAdapter::intersects(&unit.geom, &candidate.geom) {
            continue;
        }
        let value = comparator.map(|s| store.computed(candidate.row_id, s).number).unwrap_or(Decimal::ZERO);
        best = match best {
            None => Some((candidate.district_id, value)),
            Some((cur_id, cur_val)) if value < cur_val || (value == cur_val && candidate.district_id < cur_id) => Some((candidate.district_id, value)),
            other => other,
        };
    }
    best.map(|(id, _)| id)
}
