//! Version Manager (spec §4.G): version allocation, purge before/after, and
//! the bounded undo window.

use crate::catalog::RowId;
use crate::plan::{Plan, PlanStore};

/// Which side of a cutoff version [`VersionManager::purge`] removes.
#[derive(Debug, Clone, Copy)]
pub enum PurgeMode {
    /// Delete all district rows with `version > v`.
    After(u64),
    /// Collapse history before `v`, keeping one as-of snapshot per district_id.
    Before(u64),
}

pub struct VersionManager;

impl VersionManager {
    #[inline]
    pub fn allocate(plan: &Plan) -> u64 {
        plan.version + 1
    }

    /// Enumerates distinct stored versions of any district, descending,
    /// and returns the `n`-th, or `0` if there are fewer than `n + 1`
    /// (spec §4.G: "always valid" — `0` predates any plan's history).
    pub fn nth_previous(store: &dyn PlanStore, plan_id: u64, n: u32) -> u64 {
        store.versions_desc(plan_id).into_iter().nth(n as usize).unwrap_or(0)
    }

    /// Runs `mode` against `plan`'s district rows and cascade-deletes their
    /// dependents. Returns the row ids removed so the caller can also evict
    /// score-cache entries keyed on those rows.
    pub fn purge(store: &mut dyn PlanStore, plan: &Plan, mode: PurgeMode) -> Vec<RowId> {
        match mode {
            PurgeMode::After(v) => store.purge_after(plan.id, v),
            PurgeMode::Before(v) => store.purge_before(plan.id, v, plan.min_version),
        }
    }

    /// Computes the version `steps` undo-steps back; if it is further back
    /// than the plan's current `min_version`, purges everything before it
    /// and advances `min_version` (spec §4.G `purge_beyond`).
    pub fn purge_beyond(store: &mut dyn PlanStore, plan: &mut Plan, steps: u32) -> Vec<RowId> {
        let target = Self::nth_previous(store, plan.id, steps);
        if target > plan.min_version {
            let deleted = store.purge_before(plan.id, target, plan.min_version);
            plan.min_version = target;
            deleted
        } else {
            Vec::new()
        }
    }
}
