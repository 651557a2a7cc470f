//! Mapping between world and pixel coordinates.

use kurbo::{Point, Rect, Size};
use crate::world::{clamp_i32, Coord, WorldBox, MC2SCALE_TO_METER};


//------------ Projection ----------------------------------------------------

/// A projection of a world bounding box onto a pixel image.
///
/// Pixel coordinates have their origin in the upper left corner with the
/// y axis pointing down.
pub trait Projection {
    fn world_to_pixel(&self, coord: Coord) -> Point;

    fn pixel_to_world(&self, point: Point) -> Coord;

    /// The world bounding box covered by the image.
    fn bounding_box(&self) -> WorldBox;

    /// The size of the image in pixels.
    fn screen_size(&self) -> Size;

    /// Whether the projection is the linear cos-latitude projection.
    ///
    /// Label boxes for other projections are derived from projected
    /// geometry instead of world offsets.
    fn is_cos_lat(&self) -> bool {
        true
    }

    /// Returns how many world units of latitude `pixels` pixels span.
    fn lat_diff(&self, pixels: f64) -> i32 {
        let a = self.pixel_to_world(Point::new(0., 0.));
        let b = self.pixel_to_world(Point::new(0., pixels));
        (a.lat - b.lat).abs()
    }

    /// Returns how many world units of longitude `pixels` pixels span.
    fn lon_diff(&self, pixels: f64) -> i32 {
        let a = self.pixel_to_world(Point::new(0., 0.));
        let b = self.pixel_to_world(Point::new(pixels, 0.));
        (b.lon - a.lon).abs()
    }

    /// The length of one pixel in meters.
    fn meters_per_pixel(&self) -> f64 {
        f64::from(self.lat_diff(1000.)) / 1000. * MC2SCALE_TO_METER
    }

    /// Converts a world box into a pixel rectangle.
    fn pixel_box(&self, bbox: &WorldBox) -> Rect {
        Rect::from_points(
            self.world_to_pixel(Coord::new(bbox.max_lat, bbox.min_lon)),
            self.world_to_pixel(Coord::new(bbox.min_lat, bbox.max_lon)),
        )
    }
}


//------------ CosLatProjection ----------------------------------------------

/// The plain linear projection with longitudes scaled by cos-latitude.
#[derive(Clone, Debug)]
pub struct CosLatProjection {
    bbox: WorldBox,
    size: Size,

    /// World units per pixel vertically.
    lat_scale: f64,

    /// World units per pixel horizontally.
    lon_scale: f64,
}

impl CosLatProjection {
    /// Creates a projection of `bbox` onto an image of the given size.
    ///
    /// The box is widened in one direction so that pixels are square.
    pub fn new(bbox: WorldBox, size: Size) -> Self {
        let width = size.width.max(1.);
        let height = size.height.max(1.);
        let cos_lat = bbox.cos_lat().max(f64::EPSILON);
        let lat_scale = (bbox.height() as f64 / height).max(
            bbox.lon_diff() as f64 * cos_lat / width
        ).max(f64::EPSILON);
        let lon_scale = lat_scale / cos_lat;
        let center = bbox.center();
        let half_lat = (lat_scale * height / 2.) as i32;
        let half_lon = (lon_scale * width / 2.) as i32;
        let bbox = WorldBox::new(
            Coord::new(
                center.lat.saturating_sub(half_lat),
                center.lon.saturating_sub(half_lon)
            ),
            Coord::new(
                center.lat.saturating_add(half_lat),
                center.lon.saturating_add(half_lon)
            ),
        );
        CosLatProjection { bbox, size, lat_scale, lon_scale }
    }
}

impl Projection for CosLatProjection {
    fn world_to_pixel(&self, coord: Coord) -> Point {
        Point::new(
            (f64::from(coord.lon) - f64::from(self.bbox.min_lon))
                / self.lon_scale,
            (f64::from(self.bbox.max_lat) - f64::from(coord.lat))
                / self.lat_scale,
        )
    }

    fn pixel_to_world(&self, point: Point) -> Coord {
        Coord::new(
            clamp_i32(f64::from(self.bbox.max_lat) - point.y * self.lat_scale),
            clamp_i32(f64::from(self.bbox.min_lon) + point.x * self.lon_scale),
        )
    }

    fn bounding_box(&self) -> WorldBox {
        self.bbox
    }

    fn screen_size(&self) -> Size {
        self.size
    }

    fn lat_diff(&self, pixels: f64) -> i32 {
        clamp_i32(pixels * self.lat_scale)
    }

    fn lon_diff(&self, pixels: f64) -> i32 {
        clamp_i32(pixels * self.lon_scale)
    }

    fn meters_per_pixel(&self) -> f64 {
        self.lat_scale * MC2SCALE_TO_METER
    }
}


//============ Testing =======================================================
