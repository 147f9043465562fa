#![doc = "distmander: a versioned districting engine"]

mod cache;
mod catalog;
mod config;
mod error;
mod geometry;
mod mutate;
mod plan;
mod selector;
mod stats;
mod version;

#[doc(inline)]
pub use cache::ScoreCache;

#[doc(inline)]
pub use catalog::{Body, Catalog, CatalogBuilder, DistrictId, Geolevel, GeolevelIndex, MultiMemberRules, PortableId, PredicateKind, RowId, Subject, SubjectId, Unit, UnitId};

#[doc(inline)]
pub use config::Config;

#[doc(inline)]
pub use error::{EngineError, Result};

#[doc(inline)]
pub use geometry::GeometryAdapter;

#[doc(inline)]
pub use mutate::MutationEngine;
pub use mutate::PastedDistrict;

#[doc(inline)]
pub use plan::{DistrictRow, MemPlanStore, Plan, PlanStore};

#[doc(inline)]
pub use selector::mixed_geounits;

#[doc(inline)]
pub use stats::ComputedCharacteristic;

#[doc(inline)]
pub use version::{PurgeMode, VersionManager};
