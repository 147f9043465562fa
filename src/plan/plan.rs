/// Identity, ownership flags, and version bookkeeping for a districting
/// plan (spec §3 "Plan").
///
/// Invariants (enforced by the components that mutate a `Plan`, not by this
/// struct itself): for every version `V` in `[min_version, version]` there
/// exists at least one district row; `version` strictly increases on every
/// mutation that is not a pure purge.
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: u64,
    pub body_name: String,
    pub is_template: bool,
    pub is_shared: bool,
    pub is_pending: bool,
    pub version: u64,
    pub min_version: u64,
    /// `false` after any mutation that has not yet been re-scored; callers
    /// observe this to know the score cache may be stale for this plan.
    pub is_valid: bool,
    pub created_at: u64,
    pub edited_at: u64,
}

impl Plan {
    pub fn new(id: u64, body_name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id,
            body_name: body_name.into(),
            is_template: false,
            is_shared: false,
            is_pending: false,
            version: 0,
            min_version: 0,
            is_valid: true,
            created_at,
            edited_at: created_at,
        }
    }

    /// Records that a mutation touched this plan at `now`; callers own the
    /// clock since this engine performs no wall-clock I/O of its own.
    pub fn touch(&mut self, now: u64) {
        self.is_valid = false;
        self.edited_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_plan_starts_at_version_zero_and_valid() {
        let plan = Plan::new(1, "Test Body", 1_000);
        assert_eq!(plan.version, 0);
        assert_eq!(plan.min_version, 0);
        assert!(plan.is_valid);
    }

    #[test]
    fn touch_invalidates_and_stamps_edited_at() {
        let mut plan = Plan::new(1, "Test Body", 1_000);
        plan.touch(2_000);
        assert!(!plan.is_valid);
        assert_eq!(plan.edited_at, 2_000);
    }
}
