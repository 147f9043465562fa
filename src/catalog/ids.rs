use std::sync::Arc;

/// Stable numeric id for a [`crate::catalog::Unit`], unique within a [`crate::catalog::Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

/// External string key for a unit (e.g. a Census GEOID), carried alongside
/// the stable numeric id so callers can round-trip against their own source data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortableId(pub Arc<str>);

impl PortableId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Index of a [`crate::catalog::Subject`] within a [`crate::catalog::Catalog`]'s subject table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(pub u32);

/// Logical district identity, stable across versions within a plan. `0` is reserved
/// for the Unassigned district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistrictId(pub u32);

impl DistrictId {
    pub const UNASSIGNED: DistrictId = DistrictId(0);

    #[inline]
    pub fn is_unassigned(self) -> bool {
        self == Self::UNASSIGNED
    }
}

/// Position of a [`crate::catalog::Geolevel`] within a body's ordered hierarchy,
/// coarsest at `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeolevelIndex(pub u16);

/// A row primary key assigned when a [`crate::plan::DistrictRow`] is inserted
/// into a [`crate::plan::PlanStore`]. Distinct from `DistrictId`: many rows
/// share one `DistrictId` across versions, but each row has its own primary id
/// so that dependents (computed characteristics, cache entries) can cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);
