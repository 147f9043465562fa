use std::collections::HashMap;

use ahash::AHashMap;
use geo::{BoundingRect, MultiPolygon};
use rstar::RTree;
use rust_decimal::Decimal;

use crate::catalog::{Body, GeolevelIndex, Subject, SubjectId, Unit, UnitId, subject::denominator_order};
use crate::error::{EngineError, Result};
use crate::geometry::{BoundingBox, GeometryAdapter, build_rtree, envelope_of, query};

/// Which geometric test `Catalog::units_in` applies, per spec §4.C step 3/5
/// and §6's `units_in(level, predicate_geom, predicate_kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    /// Full-geometry containment — used at non-base geolevels.
    WithinPolygon,
    /// Centroid containment — used at the base geolevel (and always for the
    /// base level regardless of branch, per spec §4.C step 6).
    CentroidWithin,
}

/// Read-only store of geographic units, geometries, parent-child nesting,
/// and per-subject characteristic values (spec §2 component A).
///
/// Bootstrapped once via [`CatalogBuilder`] and never mutated afterward —
/// the engine's versioning lives entirely in the plan store, not here.
pub struct Catalog {
    body: Body,
    units: Vec<Unit>,
    id_index: HashMap<UnitId, usize>,
    by_level: Vec<Vec<usize>>,
    rtrees: Vec<RTree<BoundingBox>>,
    subjects: Vec<Subject>,
    characteristics: AHashMap<(UnitId, SubjectId), Decimal>,
    contiguity_overrides: Vec<(UnitId, UnitId)>,
}

impl Catalog {
    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[inline]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject_by_name(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Subjects sorted so denominators are processed before dependents
    /// (spec §3 invariant, §4.E processing order).
    pub fn subjects_in_dependency_order(&self) -> Result<Vec<SubjectId>> {
        denominator_order(&self.subjects)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.id_index.get(&id).map(|&i| &self.units[i])
    }

    pub fn units_at_level(&self, level: GeolevelIndex) -> Vec<&Unit> {
        self.by_level.get(level.0 as usize).map(|idxs| idxs.iter().map(|&i| &self.units[i]).collect()).unwrap_or_default()
    }

    /// Spatial query: `units_by_ids(ids) -> rows` (spec §6).
    pub fn units_by_ids<'a>(&'a self, ids: &[UnitId]) -> Vec<&'a Unit> {
        ids.iter().filter_map(|id| self.unit(*id)).collect()
    }

    /// Spatial query: `units_in(level, predicate_geom, predicate_kind) -> rows` (spec §6).
    pub fn units_in(&self, level: GeolevelIndex, predicate_geom: &MultiPolygon<f64>, kind: PredicateKind) -> Vec<&Unit> {
        if GeometryAdapter::is_empty(predicate_geom) {
            return Vec::new();
        }
        let Some(level_units) = self.by_level.get(level.0 as usize) else { return Vec::new() };
        let Some(tree) = self.rtrees.get(level.0 as usize) else { return Vec::new() };
        let Some(bounds) = predicate_geom.bounding_rect() else { return Vec::new() };
        let envelope = envelope_of(&bounds);

        query(tree, &envelope)
            .filter_map(|pos| level_units.get(pos).map(|&global| &self.units[global]))
            .filter(|unit| match kind {
                PredicateKind::WithinPolygon => GeometryAdapter::within(&unit.geom, predicate_geom),
                PredicateKind::CentroidWithin => GeometryAdapter::point_intersects(&unit.centroid, predicate_geom),
            })
            .collect()
    }

    /// `characteristics_sum(units, subject) -> decimal` (spec §6). Units or
    /// subjects with no recorded characteristic contribute zero.
    pub fn characteristics_sum<'a>(&self, units: impl IntoIterator<Item = &'a UnitId>, subject: SubjectId) -> Decimal {
        units.into_iter().map(|id| self.characteristic(*id, subject)).sum()
    }

    pub fn characteristic(&self, unit: UnitId, subject: SubjectId) -> Decimal {
        self.characteristics.get(&(unit, subject)).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn contiguity_overrides(&self) -> &[(UnitId, UnitId)] {
        &self.contiguity_overrides
    }
}

/// Builder for [`Catalog`]; validates the denominator graph and assembles
/// one spatial index per geolevel.
#[derive(Default)]
pub struct CatalogBuilder {
    units: Vec<Unit>,
    subjects: Vec<Subject>,
    characteristics: AHashMap<(UnitId, SubjectId), Decimal>,
    contiguity_overrides: Vec<(UnitId, UnitId)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, units: Vec<Unit>) -> Self {
        self.units = units;
        self
    }

    pub fn with_subjects(mut self, subjects: Vec<Subject>) -> Self {
        self.subjects = subjects;
        self
    }

    pub fn with_characteristic(mut self, unit: UnitId, subject: SubjectId, value: Decimal) -> Self {
        self.characteristics.insert((unit, subject), value);
        self
    }

    pub fn with_contiguity_override(mut self, from: UnitId, to: UnitId) -> Self {
        self.contiguity_overrides.push((from, to));
        self
    }

    pub fn build(self, body: Body) -> Result<Catalog> {
        // Validate the denominator graph eagerly so a malformed catalog
        // fails at construction rather than deep inside a mutation.
        denominator_order(&self.subjects)?;

        let num_levels = body.geolevels().len();
        let mut by_level: Vec<Vec<usize>> = vec![Vec::new(); num_levels];
        let mut id_index = HashMap::with_capacity(self.units.len());

        for (i, unit) in self.units.iter().enumerate() {
            if id_index.insert(unit.id, i).is_some() {
                return Err(EngineError::InvariantViolation(format!("duplicate unit id {:?}", unit.id)));
            }
            let level = unit.level.0 as usize;
            let levels = by_level.get_mut(level).ok_or_else(|| {
                EngineError::InvariantViolation(format!("unit {:?} references out-of-range geolevel {}", unit.id, level))
            })?;
            levels.push(i);
        }

        let rtrees = by_level
            .iter()
            .map(|level_units| {
                let geoms: Vec<MultiPolygon<f64>> = level_units.iter().map(|&i| self.units[i].geom.clone()).collect();
                build_rtree(&geoms)
            })
            .collect();

        Ok(Catalog {
            body,
            units: self.units,
            id_index,
            by_level,
            rtrees,
            subjects: self.subjects,
            characteristics: self.characteristics,
            contiguity_overrides: self.contiguity_overrides,
        })
    }
}
