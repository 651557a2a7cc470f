//! The registry of occupied boxes.
//!
//! Everything placed on the map that later labels must not cover registers
//! its box here: point markers, road signs and the glyphs of street names.
//! The registry only ever grows while a tile is processed.

use kurbo::Rect;
use rstar::{AABB, RTree, RTreeObject};
use crate::projection::Projection;
use crate::world::WorldBox;


//------------ ObjectBox -----------------------------------------------------

/// An occupied box in world and pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectBox {
    pub world: WorldBox,
    pub pixel: Rect,
}

impl ObjectBox {
    pub fn new(world: WorldBox, projection: &dyn Projection) -> Self {
        ObjectBox { world, pixel: projection.pixel_box(&world) }
    }
}


//------------ ObjectBoxes ---------------------------------------------------

/// The append-only registry of occupied boxes.
#[derive(Clone, Debug, Default)]
pub struct ObjectBoxes {
    boxes: Vec<ObjectBox>,
    index: RTree<IndexedBox>,
}

impl ObjectBoxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a world box, projecting it into pixels.
    pub fn add(&mut self, world: WorldBox, projection: &dyn Projection) {
        self.push(ObjectBox::new(world, projection))
    }

    pub fn push(&mut self, item: ObjectBox) {
        self.index.insert(IndexedBox {
            envelope: AABB::from_corners(
                [item.pixel.x0, item.pixel.y0],
                [item.pixel.x1, item.pixel.y1]
            )
        });
        self.boxes.push(item);
    }

    /// Forgets all boxes. Only to be used when starting a new tile.
    pub fn reset(&mut self) {
        self.boxes.clear();
        self.index = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ObjectBox> {
        self.boxes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectBox> + '_ {
        self.boxes.iter()
    }

    pub fn world_boxes(&self) -> impl Iterator<Item = &WorldBox> + '_ {
        self.boxes.iter().map(|item| &item.world)
    }

    /// Returns whether `rect` overlaps the interior of any pixel box.
    pub fn collides(&self, rect: &Rect) -> bool {
        let envelope = AABB::from_corners([rect.x0, rect.y0], [rect.x1, rect.y1]);
        self.index.locate_in_envelope_intersecting(&envelope).any(|item| {
            overlaps_strict(&item.rect(), rect)
        })
    }

    /// Returns whether `bbox` shares a point with any world box.
    pub fn overlaps_world(&self, bbox: &WorldBox) -> bool {
        self.boxes.iter().any(|item| item.world.overlaps(bbox))
    }
}


//------------ IndexedBox ----------------------------------------------------

#[derive(Clone, Debug)]
struct IndexedBox {
    envelope: AABB<[f64; 2]>,
}

impl IndexedBox {
    fn rect(&self) -> Rect {
        let lower = self.envelope.lower();
        let upper = self.envelope.upper();
        Rect::new(lower[0], lower[1], upper[0], upper[1])
    }
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}


//------------ Helper Functions ----------------------------------------------

/// Returns whether the interiors of two rectangles intersect.
pub fn overlaps_strict(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}


//============ Testing =======================================================
