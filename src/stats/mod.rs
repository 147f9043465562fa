//! Statistics Engine (spec §4.E): incremental per-district aggregate
//! maintenance over subject characteristics.

use rust_decimal::Decimal;

use crate::catalog::{Catalog, RowId, SubjectId, UnitId};
use crate::error::Result;
use crate::plan::PlanStore;

/// `(district_row, subject) -> (number, percentage?)` (spec §3
/// "ComputedCharacteristic").
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComputedCharacteristic {
    pub number: Decimal,
    pub percentage: Option<Decimal>,
}

/// Incrementally add (`combine = true`) or subtract (`combine = false`)
/// `units`' characteristics from `row_id`'s computed aggregates.
///
/// Subjects are processed in denominator-first order (spec §4.E, and per
/// §9's Open Questions, this ordering is followed everywhere a percentage
/// is derived — not just here).
pub fn delta(store: &mut dyn PlanStore, catalog: &Catalog, row_id: RowId, units: &[UnitId], combine: bool) -> Result<()> {
    for subject_id in catalog.subjects_in_dependency_order()? {
        apply_one(store, catalog, row_id, subject_id, units, combine);
    }
    Ok(())
}

fn apply_one(store: &mut dyn PlanStore, catalog: &Catalog, row_id: RowId, subject_id: SubjectId, units: &[UnitId], combine: bool) {
    let magnitude = catalog.characteristics_sum(units, subject_id);
    let mut computed = store.computed(row_id, subject_id);
    if combine {
        computed.number += magnitude;
    } else {
        computed.number -= magnitude;
    }

    if let Some(subject) = catalog.subject(subject_id) {
        if let Some(denom_id) = subject.percentage_denominator {
            let denom = store.computed(row_id, denom_id);
            computed.percentage = Some(if denom.number > Decimal::ZERO {
                computed.number / denom.number
            } else {
                Decimal::ZERO
            });
        }
    }

    store.set_computed(row_id, subject_id, computed);
}

/// Zero every subject's computed aggregate for `row_id` (spec §4.E `reset`).
pub fn reset(store: &mut dyn PlanStore, catalog: &Catalog, row_id: RowId) {
    for subject in catalog.subjects() {
        store.set_computed(row_id, subject.id, ComputedCharacteristic::default());
    }
}
