use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a catalog entry by position.
///
/// Grounded on the teacher's `geom::BoundingBox` — an index-only envelope
/// wrapper kept separate from the geometry it bounds, so the tree can be
/// bulk-loaded without cloning every polygon into the tree itself.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl BoundingBox {
    #[inline]
    pub(crate) fn idx(&self) -> usize {
        self.idx
    }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Bulk-load an R-tree over `geoms`, keyed by position. Geometries with no
/// bounding rectangle (empty multipolygons) are skipped and therefore never
/// returned by a query — callers must handle them as "never selectable".
pub(crate) fn build_rtree(geoms: &[MultiPolygon<f64>]) -> RTree<BoundingBox> {
    RTree::bulk_load(
        geoms
            .iter()
            .enumerate()
            .filter_map(|(idx, geom)| geom.bounding_rect().map(|bbox| BoundingBox { idx, bbox }))
            .collect(),
    )
}

/// Query the tree for candidate indices whose bounding box intersects `envelope`.
pub(crate) fn query<'a>(tree: &'a RTree<BoundingBox>, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + 'a {
    tree.locate_in_envelope_intersecting(envelope).map(BoundingBox::idx)
}

/// Convenience: envelope covering a bounding rectangle.
pub(crate) fn envelope_of(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}
