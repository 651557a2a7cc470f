//! Polygons, the coordinate sequences of features.

use std::slice;
use serde::Deserialize;
use crate::world::{Coord, WorldBox, MC2SCALE_TO_METER};


//------------ Polygon -------------------------------------------------------

/// An ordered sequence of coordinates belonging to a feature.
///
/// Coordinates are kept either absolute or, if every step between two
/// consecutive coordinates fits, as 16 bit deltas. Accessors work the same
/// regardless.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "PolygonData")]
pub struct Polygon {
    coords: Coords,

    /// The number of coordinates.
    len: usize,

    /// Is this a closed polygon?
    ///
    /// The first and last coordinates of a closed polygon are considered
    /// identical even if only the first is stored.
    closed: bool,

    /// The cached area of the feature in square meters.
    area: f64,

    /// Road attributes if this is the polygon of a road.
    road: Option<RoadAttrs>,
}

impl Polygon {
    /// Creates an open polygon from a list of coordinates.
    pub fn new(coords: Vec<Coord>) -> Self {
        Self::with_attrs(coords, false, None)
    }

    /// Creates a closed polygon from a list of coordinates.
    pub fn closed(coords: Vec<Coord>) -> Self {
        Self::with_attrs(coords, true, None)
    }

    /// Creates an open road polygon.
    pub fn road(coords: Vec<Coord>, attrs: RoadAttrs) -> Self {
        Self::with_attrs(coords, false, Some(attrs))
    }

    pub fn with_attrs(
        coords: Vec<Coord>, closed: bool, road: Option<RoadAttrs>
    ) -> Self {
        let area = shoelace_area_m2(&coords);
        let len = coords.len();
        Polygon {
            coords: Coords::compact(coords),
            len,
            closed,
            area,
            road,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether coordinates are stored as 16 bit deltas.
    pub fn is_delta_encoded(&self) -> bool {
        matches!(self.coords, Coords::Delta { .. })
    }

    pub fn iter(&self) -> CoordIter {
        match self.coords {
            Coords::Absolute(ref coords) => CoordIter::Absolute(coords.iter()),
            Coords::Delta { first, ref steps } => CoordIter::Delta {
                next: Some(first), steps: steps.iter()
            }
        }
    }

    /// Returns the coordinate at `index`.
    pub fn get(&self, index: usize) -> Option<Coord> {
        match self.coords {
            Coords::Absolute(ref coords) => coords.get(index).copied(),
            Coords::Delta { .. } => self.iter().nth(index),
        }
    }

    pub fn first(&self) -> Option<Coord> {
        self.get(0)
    }

    pub fn last(&self) -> Option<Coord> {
        match self.len {
            0 => None,
            len => self.get(len - 1)
        }
    }

    /// Returns the coordinates as a vector.
    pub fn to_coords(&self) -> Vec<Coord> {
        self.iter().collect()
    }

    /// The cached area in square meters.
    pub fn area_m2(&self) -> f64 {
        self.area
    }

    pub fn road_attrs(&self) -> Option<&RoadAttrs> {
        self.road.as_ref()
    }

    /// The length of the polyline in meters.
    ///
    /// For closed polygons, this includes the closing segment.
    pub fn length_m(&self) -> f64 {
        let mut res = polyline_length_m(self.iter());
        if self.closed && self.len > 2 {
            if let (Some(first), Some(last)) = (self.first(), self.last()) {
                res += last.distance_m(first);
            }
        }
        res
    }

    pub fn bbox(&self) -> Option<WorldBox> {
        WorldBox::from_coords(self.iter())
    }

    /// Returns the area centroid of the polygon.
    ///
    /// Degenerated polygons without area get the centre of their bounding
    /// box. Returns `None` for empty polygons.
    pub fn centroid(&self) -> Option<Coord> {
        let bbox = self.bbox()?;
        let cos_lat = bbox.cos_lat();
        let origin = bbox.center();
        let coords: Vec<_> = self.iter().map(|c| {
            Coord::new(c.lat - origin.lat, c.lon - origin.lon)
                .to_plane(cos_lat)
        }).collect();
        let mut area = 0.;
        let mut cx = 0.;
        let mut cy = 0.;
        for (i, a) in coords.iter().enumerate() {
            let b = coords[(i + 1) % coords.len()];
            let cross = a.x * b.y - b.x * a.y;
            area += cross;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        if area.abs() < 1e-9 {
            return Some(origin)
        }
        let x = cx / (3. * area);
        let y = cy / (3. * area);
        let centre = Coord::from_plane(kurbo::Point::new(x, y), cos_lat);
        Some(Coord::new(centre.lat + origin.lat, centre.lon + origin.lon))
    }

    /// Returns the point `distance` meters along the polyline.
    ///
    /// Distances beyond the end yield the last coordinate.
    pub fn point_at_length(&self, distance: f64) -> Option<Coord> {
        point_at_length(self.iter(), distance)
    }
}

impl From<PolygonData> for Polygon {
    fn from(data: PolygonData) -> Self {
        Polygon::with_attrs(data.coords, data.closed, data.road)
    }
}


//------------ PolygonData ---------------------------------------------------

/// The serialized form of a polygon.
#[derive(Clone, Debug, Deserialize)]
struct PolygonData {
    coords: Vec<Coord>,

    #[serde(default)]
    closed: bool,

    #[serde(default)]
    road: Option<RoadAttrs>,
}


//------------ Coords --------------------------------------------------------

#[derive(Clone, Debug)]
enum Coords {
    Absolute(Vec<Coord>),
    Delta {
        first: Coord,
        steps: Vec<(i16, i16)>,
    }
}

impl Coords {
    fn compact(coords: Vec<Coord>) -> Self {
        let first = match coords.first() {
            Some(first) => *first,
            None => return Coords::Absolute(coords),
        };
        let mut steps = Vec::with_capacity(coords.len() - 1);
        for pair in coords.windows(2) {
            let lat = i16::try_from(
                i64::from(pair[1].lat) - i64::from(pair[0].lat)
            );
            let lon = i16::try_from(
                i64::from(pair[1].lon) - i64::from(pair[0].lon)
            );
            match (lat, lon) {
                (Ok(lat), Ok(lon)) => steps.push((lat, lon)),
                _ => return Coords::Absolute(coords)
            }
        }
        Coords::Delta { first, steps }
    }
}


//------------ CoordIter -----------------------------------------------------

/// An iterator over the coordinates of a polygon.
pub enum CoordIter<'a> {
    Absolute(slice::Iter<'a, Coord>),
    Delta {
        next: Option<Coord>,
        steps: slice::Iter<'a, (i16, i16)>,
    }
}

impl<'a> Iterator for CoordIter<'a> {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        match *self {
            CoordIter::Absolute(ref mut iter) => iter.next().copied(),
            CoordIter::Delta { ref mut next, ref mut steps } => {
                let res = (*next)?;
                *next = steps.next().map(|&(lat, lon)| {
                    Coord::new(
                        res.lat.wrapping_add(i32::from(lat)),
                        res.lon.wrapping_add(i32::from(lon)),
                    )
                });
                Some(res)
            }
        }
    }
}


//------------ RoadAttrs -----------------------------------------------------

/// The attributes of a road polygon.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct RoadAttrs {
    /// Speed limit in positive direction.
    pub pos_speed: u8,

    /// Speed limit in negative direction.
    pub neg_speed: u8,

    pub multi_digitized: bool,
    pub ramp: bool,
    pub roundabout: bool,

    /// The level of the first node, negative for tunnels.
    pub level0: i8,

    /// The level of the last node.
    pub level1: i8,

    /// The entry restrictions at the first and last node.
    pub entry_restrictions: [EntryRestriction; 2],
}

impl RoadAttrs {
    /// Returns whether either node carries an entry restriction.
    pub fn has_entry_restriction(&self) -> bool {
        self.entry_restrictions.iter().any(|item| {
            *item != EntryRestriction::NoRestrictions
        })
    }
}


//------------ EntryRestriction ----------------------------------------------

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EntryRestriction {
    #[default]
    NoRestrictions,
    NoEntry,
    NoWay,
    OnlyThroughTraffic,
}


//------------ Helper Functions ----------------------------------------------

/// Returns the length of a polyline in meters.
pub fn polyline_length_m(coords: impl IntoIterator<Item = Coord>) -> f64 {
    let mut coords = coords.into_iter();
    let mut prev = match coords.next() {
        Some(prev) => prev,
        None => return 0.
    };
    coords.fold(0., |sum, coord| {
        let res = sum + prev.distance_m(coord);
        prev = coord;
        res
    })
}

/// Returns the point `distance` meters along a polyline.
pub fn point_at_length(
    coords: impl IntoIterator<Item = Coord>, distance: f64
) -> Option<Coord> {
    let mut coords = coords.into_iter();
    let mut prev = coords.next()?;
    let mut left = distance.max(0.);
    for coord in coords {
        let seg = prev.distance_m(coord);
        if seg > 0. && left <= seg {
            return Some(prev.lerp(coord, left / seg))
        }
        left -= seg;
        prev = coord;
    }
    Some(prev)
}

/// Returns the area enclosed by the coordinates in square meters.
fn shoelace_area_m2(coords: &[Coord]) -> f64 {
    if coords.len() < 3 {
        return 0.
    }
    let cos_lat = match WorldBox::from_coords(coords.iter().copied()) {
        Some(bbox) => bbox.cos_lat(),
        None => return 0.
    };
    let origin = coords[0];
    let mut sum = 0.;
    for i in 0..coords.len() {
        let a = Coord::new(
            coords[i].lat - origin.lat, coords[i].lon - origin.lon
        ).to_plane(cos_lat);
        let b = coords[(i + 1) % coords.len()];
        let b = Coord::new(b.lat - origin.lat, b.lon - origin.lon)
            .to_plane(cos_lat);
        sum += a.x * b.y - b.x * a.y;
    }
    (sum / 2.).abs() * MC2SCALE_TO_METER * MC2SCALE_TO_METER
}


//============ Testing =======================================================
