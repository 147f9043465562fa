/// Engine-wide configuration, per spec §6 "Configuration keys".
#[derive(Debug, Clone)]
pub struct Config {
    /// Non-negative; `0` disables the bounded-undo purge entirely.
    pub max_undos_during_edit: u32,
    /// `0..=100`; below this threshold `fix_unassigned` performs hole-fills only.
    pub fix_unassigned_min_percent: u8,
    /// Subject name used to break ties during the adjacency phase of `fix_unassigned`.
    pub fix_unassigned_comparator_subject: String,
    /// Default simplification tolerance, in projection units, for geolevels that don't specify one.
    pub simplify_threshold_default: f64,
    /// Default SRID assumed when a unit's geometry carries none.
    pub default_srid: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_undos_during_edit: 50,
            fix_unassigned_min_percent: 99,
            fix_unassigned_comparator_subject: "totpop".to_string(),
            simplify_threshold_default: 100.0,
            default_srid: 3785,
        }
    }
}

impl Config {
    /// Clamp out-of-range values rather than reject them; a library boundary
    /// should not panic on caller-supplied tuning knobs.
    pub fn new(
        max_undos_during_edit: u32,
        fix_unassigned_min_percent: u8,
        fix_unassigned_comparator_subject: impl Into<String>,
        simplify_threshold_default: f64,
        default_srid: i32,
    ) -> Self {
        Self {
            max_undos_during_edit,
            fix_unassigned_min_percent: fix_unassigned_min_percent.min(100),
            fix_unassigned_comparator_subject: fix_unassigned_comparator_subject.into(),
            simplify_threshold_default,
            default_srid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.max_undos_during_edit, 50);
        assert_eq!(config.fix_unassigned_min_percent, 99);
        assert_eq!(config.fix_unassigned_comparator_subject, "totpop");
    }

    #[test]
    fn fix_unassigned_min_percent_clamps_to_100() {
        let config = Config::new(10, 250, "totpop", 100.0, 3785);
        assert_eq!(config.fix_unassigned_min_percent, 100);
    }
}
