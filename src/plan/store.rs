use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::catalog::{DistrictId, RowId, SubjectId};
use crate::plan::{DistrictRow, Plan};
use crate::stats::ComputedCharacteristic;

/// Plan Store (spec §4.D / §6 Store API): persists district rows keyed by
/// `(plan, district_id, version)` and supplies version-at-most queries.
///
/// Out of scope per spec §1: the relational store and its spatial index are
/// external collaborators. This trait is the seam a real backing store
/// implements; [`MemPlanStore`] is the in-memory reference implementation
/// used to exercise the engine and its tests.
pub trait PlanStore {
    /// Assigns a fresh `row_id` to `row` (overwriting whatever was set) and
    /// persists it.
    fn insert_row(&mut self, row: DistrictRow) -> RowId;

    /// Overwrites the row at `row.row_id` in place, keeping the same
    /// primary key (used when a batch of edits mutates one already-cloned
    /// row repeatedly, e.g. `paste`'s "only clone on the first paste" rule).
    fn replace_row(&mut self, row: DistrictRow);

    fn row(&self, row_id: RowId) -> Option<DistrictRow>;

    /// `districts_latest_at(plan, version) -> rows` (spec §6): the row with
    /// the greatest stored version `<= version`, for every district_id that
    /// has one.
    fn districts_latest_at(&self, plan_id: u64, version: u64) -> Vec<DistrictRow>;

    fn district_latest_at(&self, plan_id: u64, district_id: DistrictId, version: u64) -> Option<DistrictRow>;

    /// Every distinct stored version for `plan_id`, descending.
    fn versions_desc(&self, plan_id: u64) -> Vec<u64>;

    /// `version > after` is deleted (spec §4.G `purge(after=V)`). Returns
    /// the row ids removed so callers can cascade-evict dependents (e.g.
    /// the score cache) that this store doesn't itself know about.
    fn purge_after(&mut self, plan_id: u64, after: u64) -> Vec<RowId>;

    /// Collapses history strictly before `before`, keeping one as-of
    /// snapshot per `district_id` at `before` (spec §4.G `purge(before=V)`).
    /// Rows below `floor` (the plan's current `min_version`) are untouched
    /// — they were already purged.
    fn purge_before(&mut self, plan_id: u64, before: u64, floor: u64) -> Vec<RowId>;

    /// Unconditionally deletes every row with version in `[from, to)` — no
    /// as-of snapshot is kept. Used by `fix_unassigned`'s batch compaction
    /// (spec §4.F.4), where the row at `to` already holds every district's
    /// final state and the intermediate rows are pure scratch.
    fn delete_version_range(&mut self, plan_id: u64, from: u64, to: u64) -> Vec<RowId>;

    fn computed(&self, row_id: RowId, subject: SubjectId) -> ComputedCharacteristic;

    fn set_computed(&mut self, row_id: RowId, subject: SubjectId, value: ComputedCharacteristic);

    /// Copies every subject's computed aggregate from `from` to `to` (used
    /// by `combine`'s cascading clone, spec §4.F.3).
    fn clone_computed(&mut self, from: RowId, to: RowId);

    fn load_plan(&self, plan_id: u64) -> Option<Plan>;

    fn save_plan(&mut self, plan: &Plan);
}

/// In-memory [`PlanStore`], `BTreeMap`-backed so `districts_latest_at` and
/// the purge range scans can walk version order directly rather than
/// sorting on every call.
#[derive(Default)]
pub struct MemPlanStore {
    next_row_id: u64,
    // (plan_id, district_id, version) -> row
    rows: BTreeMap<(u64, DistrictId, u64), DistrictRow>,
    row_index: AHashMap<RowId, (u64, DistrictId, u64)>,
    computed: AHashMap<(RowId, SubjectId), ComputedCharacteristic>,
    plans: AHashMap<u64, Plan>,
}

impl MemPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn district_ids(&self, plan_id: u64) -> Vec<DistrictId> {
        let mut ids: Vec<DistrictId> = self
            .rows
            .keys()
            .filter(|(p, _, _)| *p == plan_id)
            .map(|(_, d, _)| *d)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn cascade_delete(&mut self, key: (u64, DistrictId, u64)) -> Option<RowId> {
        let row = self.rows.remove(&key)?;
        self.row_index.remove(&row.row_id);
        self.computed.retain(|(row_id, _), _| *row_id != row.row_id);
        Some(row.row_id)
    }
}

impl PlanStore for MemPlanStore {
    fn insert_row(&mut self, mut row: DistrictRow) -> RowId {
        self.next_row_id += 1;
        let row_id = RowId(self.next_row_id);
        row.row_id = row_id;
        let key = (row.plan_id, row.district_id, row.version);
        self.row_index.insert(row_id, key);
        self.rows.insert(key, row);
        row_id
    }

    fn replace_row(&mut self, row: DistrictRow) {
        if let Some(old_key) = self.row_index.get(&row.row_id).copied() {
            if old_key != (row.plan_id, row.district_id, row.version) {
                self.rows.remove(&old_key);
            }
        }
        let key = (row.plan_id, row.district_id, row.version);
        self.row_index.insert(row.row_id, key);
        self.rows.insert(key, row);
    }

    fn row(&self, row_id: RowId) -> Option<DistrictRow> {
        self.row_index.get(&row_id).and_then(|key| self.rows.get(key)).cloned()
    }

    fn districts_latest_at(&self, plan_id: u64, version: u64) -> Vec<DistrictRow> {
        self.district_ids(plan_id)
            .into_iter()
            .filter_map(|district_id| self.district_latest_at(plan_id, district_id, version))
            .collect()
    }

    fn district_latest_at(&self, plan_id: u64, district_id: DistrictId, version: u64) -> Option<DistrictRow> {
        self.rows
            .range((plan_id, district_id, 0)..=(plan_id, district_id, version))
            .next_back()
            .map(|(_, row)| row.clone())
    }

    fn versions_desc(&self, plan_id: u64) -> Vec<u64> {
        let mut versions: Vec<u64> = self.rows.keys().filter(|(p, _, _)| *p == plan_id).map(|(_, _, v)| *v).collect();
        versions.sort_unstable();
        versions.dedup();
        versions.reverse();
        versions
    }

    fn purge_after(&mut self, plan_id: u64, after: u64) -> Vec<RowId> {
        let keys: Vec<_> = self
            .rows
            .keys()
            .filter(|(p, _, v)| *p == plan_id && *v > after)
            .cloned()
            .collect();
        keys.into_iter().filter_map(|k| self.cascade_delete(k)).collect()
    }

    fn purge_before(&mut self, plan_id: u64, before: u64, floor: u64) -> Vec<RowId> {
        let mut deleted = Vec::new();
        for district_id in self.district_ids(plan_id) {
            let keys: Vec<_> = self
                .rows
                .keys()
                .filter(|(p, d, v)| *p == plan_id && *d == district_id && *v >= floor && *v < before)
                .cloned()
                .collect();
            // Keep the single greatest version < before (the as-of snapshot);
            // delete every other row in [floor, before).
            if let Some(keep) = keys.iter().max_by_key(|(_, _, v)| *v).cloned() {
                for key in keys {
                    if key != keep {
                        if let Some(id) = self.cascade_delete(key) {
                            deleted.push(id);
                        }
                    }
                }
            }
        }
        deleted
    }

    fn delete_version_range(&mut self, plan_id: u64, from: u64, to: u64) -> Vec<RowId> {
        let keys: Vec<_> = self.rows.keys().filter(|(p, _, v)| *p == plan_id && *v >= from && *v < to).cloned().collect();
        keys.into_iter().filter_map(|k| self.cascade_delete(k)).collect()
    }

    fn computed(&self, row_id: RowId, subject: SubjectId) -> ComputedCharacteristic {
        self.computed.get(&(row_id, subject)).copied().unwrap_or_default()
    }

    fn set_computed(&mut self, row_id: RowId, subject: SubjectId, value: ComputedCharacteristic) {
        self.computed.insert((row_id, subject), value);
    }

    fn clone_computed(&mut self, from: RowId, to: RowId) {
        let values: Vec<_> = self.computed.iter().filter(|((row_id, _), _)| *row_id == from).map(|((_, s), v)| (*s, *v)).collect();
        for (subject, value) in values {
            self.computed.insert((to, subject), value);
        }
    }

    fn load_plan(&self, plan_id: u64) -> Option<Plan> {
        self.plans.get(&plan_id).cloned()
    }

    fn save_plan(&mut self, plan: &Plan) {
        self.plans.insert(plan.id, plan.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    fn row(plan_id: u64, district_id: u32, version: u64) -> DistrictRow {
        DistrictRow::new(plan_id, DistrictId(district_id), version, format!("D{district_id}"), 1, MultiPolygon::new(Vec::new()), 1)
    }

    #[test]
    fn district_latest_at_picks_greatest_version_leq() {
        let mut store = MemPlanStore::new();
        store.insert_row(row(1, 1, 1));
        store.insert_row(row(1, 1, 3));
        store.insert_row(row(1, 1, 5));

        let at4 = store.district_latest_at(1, DistrictId(1), 4).unwrap();
        assert_eq!(at4.version, 3);
        let at0 = store.district_latest_at(1, DistrictId(1), 0);
        assert!(at0.is_none());
    }

    #[test]
    fn purge_after_removes_rows_past_cutoff() {
        let mut store = MemPlanStore::new();
        store.insert_row(row(1, 1, 1));
        store.insert_row(row(1, 1, 2));
        store.insert_row(row(1, 1, 3));

        let deleted = store.purge_after(1, 1);
        assert_eq!(deleted.len(), 2);
        assert!(store.district_latest_at(1, DistrictId(1), 10).is_none() || store.district_latest_at(1, DistrictId(1), 10).unwrap().version == 1);
    }

    #[test]
    fn purge_before_keeps_one_as_of_snapshot() {
        // Scenario 4 from spec §8: rows at versions {1,2,4,5}, purge(before=4)
        // removes 1 and 2, keeps 4 as the as-of snapshot, leaves 5 untouched.
        let mut store = MemPlanStore::new();
        store.insert_row(row(1, 1, 1));
        store.insert_row(row(1, 1, 2));
        store.insert_row(row(1, 1, 4));
        store.insert_row(row(1, 1, 5));

        let deleted = store.purge_before(1, 4, 0);
        assert_eq!(deleted.len(), 2);

        let mut versions = store.versions_desc(1);
        versions.sort_unstable();
        assert_eq!(versions, vec![4, 5]);
    }

    #[test]
    fn replace_row_keeps_same_row_id() {
        let mut store = MemPlanStore::new();
        let id = store.insert_row(row(1, 1, 1));
        let mut updated = store.row(id).unwrap();
        updated.name = "Renamed".to_string();
        store.replace_row(updated);

        let fetched = store.row(id).unwrap();
        assert_eq!(fetched.row_id, id);
        assert_eq!(fetched.name, "Renamed");
    }

    #[test]
    fn clone_computed_copies_every_subject() {
        let mut store = MemPlanStore::new();
        store.set_computed(RowId(1), SubjectId(0), ComputedCharacteristic { number: rust_decimal::Decimal::new(100, 0), percentage: None });
        store.clone_computed(RowId(1), RowId(2));
        assert_eq!(store.computed(RowId(2), SubjectId(0)).number, rust_decimal::Decimal::new(100, 0));
    }
}
