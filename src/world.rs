//! World coordinates and bounding boxes.
//!
//! World coordinates are integer MC2 units: the full circle of latitude or
//! longitude is divided into 2^32 units. Distances and areas use the
//! cos-latitude approximation which is plenty accurate at tile size.

use std::f64::consts::PI;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// The length of one MC2 unit along a meridian in meters.
pub const MC2SCALE_TO_METER: f64 = 40_075_016.685_578_5 / 4_294_967_296.0;

/// The number of MC2 units per meter along a meridian.
pub const METER_TO_MC2SCALE: f64 = 1. / MC2SCALE_TO_METER;

/// Conversion factor from MC2 units to radians.
const MC2_TO_RADIANS: f64 = (2. * PI) / 4_294_967_296.0;


//------------ Coord ---------------------------------------------------------

/// A coordinate in world space.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd,
    Deserialize, Serialize
)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Coord {
    pub lat: i32,
    pub lon: i32,
}

impl Coord {
    pub fn new(lat: i32, lon: i32) -> Self {
        Coord { lat, lon }
    }

    /// Returns the latitude in radians.
    pub fn lat_radians(self) -> f64 {
        f64::from(self.lat) * MC2_TO_RADIANS
    }

    /// Returns the coordinate as a point in a plane scaled by `cos_lat`.
    ///
    /// The x axis is longitude, the y axis is latitude. Both are in MC2
    /// units along a meridian.
    pub fn to_plane(self, cos_lat: f64) -> Point {
        Point::new(f64::from(self.lon) * cos_lat, f64::from(self.lat))
    }

    /// Converts a point in the `cos_lat` plane back into a coordinate.
    pub fn from_plane(point: Point, cos_lat: f64) -> Self {
        let lon = if cos_lat > 0. { point.x / cos_lat } else { point.x };
        Coord::new(clamp_i32(point.y), clamp_i32(lon))
    }

    /// Returns the distance to another coordinate in meters.
    pub fn distance_m(self, other: Coord) -> f64 {
        self.distance(other) * MC2SCALE_TO_METER
    }

    /// Returns the distance to another coordinate in MC2 units.
    pub fn distance(self, other: Coord) -> f64 {
        let cos_lat = mean_cos_lat(self, other);
        (self.to_plane(cos_lat) - other.to_plane(cos_lat)).hypot()
    }

    /// Returns the distance to the line through `a` and `b` in MC2 units.
    ///
    /// If `a` and `b` are identical, returns the distance to `a`.
    pub fn line_distance(self, a: Coord, b: Coord) -> f64 {
        let cos_lat = mean_cos_lat(a, b);
        let p = self.to_plane(cos_lat);
        let a = a.to_plane(cos_lat);
        let b = b.to_plane(cos_lat);
        let dir = b - a;
        let len = dir.hypot();
        if len == 0. {
            return (p - a).hypot()
        }
        dir.cross(p - a).abs() / len
    }

    /// Returns the point a fraction `t` of the way towards `other`.
    pub fn lerp(self, other: Coord, t: f64) -> Self {
        Coord::new(
            clamp_i32(
                f64::from(self.lat) + f64::from(other.lat - self.lat) * t
            ),
            clamp_i32(
                f64::from(self.lon) + f64::from(other.lon - self.lon) * t
            ),
        )
    }
}

impl From<[i32; 2]> for Coord {
    fn from([lat, lon]: [i32; 2]) -> Self {
        Coord::new(lat, lon)
    }
}

impl From<Coord> for [i32; 2] {
    fn from(coord: Coord) -> Self {
        [coord.lat, coord.lon]
    }
}

fn mean_cos_lat(a: Coord, b: Coord) -> f64 {
    ((a.lat_radians() + b.lat_radians()) / 2.).cos()
}

pub(crate) fn clamp_i32(value: f64) -> i32 {
    value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}


//------------ WorldBox ------------------------------------------------------

/// An axis-aligned bounding box in world coordinates.
///
/// All bounds are inclusive.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct WorldBox {
    pub min_lat: i32,
    pub max_lat: i32,
    pub min_lon: i32,
    pub max_lon: i32,
}

impl WorldBox {
    /// Creates a box from two arbitrary corners.
    pub fn new(a: Coord, b: Coord) -> Self {
        WorldBox {
            min_lat: a.lat.min(b.lat),
            max_lat: a.lat.max(b.lat),
            min_lon: a.lon.min(b.lon),
            max_lon: a.lon.max(b.lon),
        }
    }

    /// Creates a box covering exactly one coordinate.
    pub fn point(coord: Coord) -> Self {
        Self::new(coord, coord)
    }

    /// Creates the smallest box covering all coordinates.
    ///
    /// Returns `None` if there are no coordinates.
    pub fn from_coords(
        coords: impl IntoIterator<Item = Coord>
    ) -> Option<Self> {
        let mut coords = coords.into_iter();
        let mut res = Self::point(coords.next()?);
        coords.for_each(|coord| res.extend(coord));
        Some(res)
    }

    /// Extends the box to cover `coord`.
    pub fn extend(&mut self, coord: Coord) {
        self.min_lat = self.min_lat.min(coord.lat);
        self.max_lat = self.max_lat.max(coord.lat);
        self.min_lon = self.min_lon.min(coord.lon);
        self.max_lon = self.max_lon.max(coord.lon);
    }

    /// Extends the box to cover `other`.
    pub fn union(&mut self, other: &WorldBox) {
        self.extend(Coord::new(other.min_lat, other.min_lon));
        self.extend(Coord::new(other.max_lat, other.max_lon));
    }

    pub fn height(&self) -> i64 {
        i64::from(self.max_lat) - i64::from(self.min_lat)
    }

    pub fn lon_diff(&self) -> i64 {
        i64::from(self.max_lon) - i64::from(self.min_lon)
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            ((i64::from(self.min_lat) + i64::from(self.max_lat)) / 2) as i32,
            ((i64::from(self.min_lon) + i64::from(self.max_lon)) / 2) as i32,
        )
    }

    /// The cosine of the latitude at the centre of the box.
    pub fn cos_lat(&self) -> f64 {
        self.center().lat_radians().cos()
    }

    /// The height of the box in meters.
    pub fn height_m(&self) -> f64 {
        self.height() as f64 * MC2SCALE_TO_METER
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.min_lat <= coord.lat && coord.lat <= self.max_lat
        && self.min_lon <= coord.lon && coord.lon <= self.max_lon
    }

    /// Returns whether the two boxes share at least one point.
    pub fn overlaps(&self, other: &WorldBox) -> bool {
        self.min_lat <= other.max_lat && other.min_lat <= self.max_lat
        && self.min_lon <= other.max_lon && other.min_lon <= self.max_lon
    }

    /// Returns whether the interiors of the two boxes intersect.
    ///
    /// Boxes that only touch along an edge do not overlap strictly.
    pub fn overlaps_strict(&self, other: &WorldBox) -> bool {
        self.min_lat < other.max_lat && other.min_lat < self.max_lat
        && self.min_lon < other.max_lon && other.min_lon < self.max_lon
    }

    /// Returns whether `self` lies completely inside `other`.
    pub fn inside(&self, other: &WorldBox) -> bool {
        other.min_lat <= self.min_lat && self.max_lat <= other.max_lat
        && other.min_lon <= self.min_lon && self.max_lon <= other.max_lon
    }

    /// Grows the box by `factor` of its size, half on each side.
    pub fn increase_factor(&mut self, factor: f64) {
        let lat_inc = (self.height() as f64 * factor / 2.) as i32;
        let lon_inc = (self.lon_diff() as f64 * factor / 2.) as i32;
        self.max_lat = self.max_lat.saturating_add(lat_inc);
        self.min_lat = self.min_lat.saturating_sub(lat_inc);
        self.max_lon = self.max_lon.saturating_add(lon_inc);
        self.min_lon = self.min_lon.saturating_sub(lon_inc);
    }

    /// Returns the box moved by the given offsets.
    pub fn translated(&self, lat: i32, lon: i32) -> Self {
        WorldBox {
            min_lat: self.min_lat.saturating_add(lat),
            max_lat: self.max_lat.saturating_add(lat),
            min_lon: self.min_lon.saturating_add(lon),
            max_lon: self.max_lon.saturating_add(lon),
        }
    }

    /// Returns whether the segment from `a` to `b` touches the box.
    pub fn intersects_segment(&self, a: Coord, b: Coord) -> bool {
        if self.contains(a) || self.contains(b) {
            return true
        }
        let seg = WorldBox::new(a, b);
        if !seg.overlaps(self) {
            return false
        }
        let corners = [
            Coord::new(self.min_lat, self.min_lon),
            Coord::new(self.min_lat, self.max_lon),
            Coord::new(self.max_lat, self.max_lon),
            Coord::new(self.max_lat, self.min_lon),
        ];
        let side = |c: Coord| {
            let dir = Vec2::new(
                f64::from(b.lon) - f64::from(a.lon),
                f64::from(b.lat) - f64::from(a.lat),
            );
            let off = Vec2::new(
                f64::from(c.lon) - f64::from(a.lon),
                f64::from(c.lat) - f64::from(a.lat),
            );
            dir.cross(off).signum()
        };
        let first = side(corners[0]);
        corners[1..].iter().any(|c| side(*c) != first)
    }
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn distance_along_meridian() {
        let a = Coord::new(0, 0);
        let b = Coord::new((1000. * METER_TO_MC2SCALE) as i32, 0);
        assert!((a.distance_m(b) - 1000.).abs() < 0.1);
    }

    #[test]
    fn strict_overlap_ignores_touching_edges() {
        let a = WorldBox::new(Coord::new(0, 0), Coord::new(10, 10));
        let b = WorldBox::new(Coord::new(10, 0), Coord::new(20, 10));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps_strict(&b));
    }

    #[test]
    fn increase_factor_grows_both_sides() {
        let mut bbox = WorldBox::new(Coord::new(0, 0), Coord::new(100, 200));
        bbox.increase_factor(0.2);
        assert_eq!(bbox.min_lat, -10);
        assert_eq!(bbox.max_lat, 110);
        assert_eq!(bbox.min_lon, -20);
        assert_eq!(bbox.max_lon, 220);
    }

    #[test]
    fn line_distance() {
        let p = Coord::new(5, 5);
        let d = p.line_distance(Coord::new(0, 0), Coord::new(0, 10));
        assert!((d - 5.).abs() < 1e-6);
    }

    #[test]
    fn segment_crossing_box() {
        let bbox = WorldBox::new(Coord::new(0, 0), Coord::new(10, 10));
        assert!(bbox.intersects_segment(Coord::new(-5, 5), Coord::new(15, 5)));
        assert!(!bbox.intersects_segment(
            Coord::new(-5, 20), Coord::new(15, 20)
        ));
    }
}
