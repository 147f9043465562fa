//! Mutation Engine (spec §4.F): transactional `assign`, `paste`, `combine`,
//! and `fix_unassigned`, each driving the Mixed-Selector, the Statistics
//! Engine, and the Version Manager in turn.

mod assign;
mod combine;
mod fix_unassigned;
mod helpers;
mod paste;

use crate::catalog::Catalog;
use crate::config::Config;

pub use paste::PastedDistrict;

/// Holds the read-only collaborators every mutation operation needs;
/// `store`, `cache`, and `plan` are passed per-call since they're the
/// mutable, per-request state (spec §5: one call = one transaction).
pub struct MutationEngine<'a> {
    catalog: &'a Catalog,
    config: &'a Config,
}

impl<'a> MutationEngine<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a Config) -> Self {
        Self { catalog, config }
    }
}
