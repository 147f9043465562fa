//! Unit Catalog (spec §4.A): a read-only store of geographic units, their
//! geometries, centroids, parent-child nesting, and per-subject
//! characteristic values.

mod body;
mod catalog;
mod ids;
mod subject;
mod unit;

pub use body::{Body, Geolevel, MultiMemberRules};
pub use catalog::{Catalog, CatalogBuilder, PredicateKind};
pub use ids::{DistrictId, GeolevelIndex, PortableId, RowId, SubjectId, UnitId};
pub use subject::Subject;
pub use unit::Unit;
