//! Geometry Adapter (spec §4.B): a thin, stateless wrapper over the `geo`
//! crate's boolean/topological operations, plus an R-tree helper used by
//! the catalog's spatial queries.

mod adapter;
mod index;

pub use adapter::GeometryAdapter;
pub(crate) use index::{build_rtree, envelope_of, query, BoundingBox};
