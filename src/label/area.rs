//! Labels for areas and points.

use kurbo::{Point, Rect};
use tracing::trace;
use crate::feature::{Feature, FeatureType, Polygon};
use crate::names::{split_two_lines, title_case};
use crate::world::{Coord, WorldBox};
use super::{Placer, TextImportance, TextNotice, AREA_FONT_SIZE};


//------------ Configuration Constants ---------------------------------------

/// Names longer than this many chars are split into two lines.
const MAX_LINE_CHARS: usize = 12;

/// The number of pixels a label box is grown by for other projections.
const PROJECTED_MARGIN: f64 = 3.;

/// Anchor shifts for symbol labels in quarters of the label box.
const SYMBOL_SHIFTS: [(f64, f64); 5] = [
    (0., 0.), (1., 0.), (-1., 0.), (0., 1.), (0., -1.),
];


//------------ Extent --------------------------------------------------------

/// Where a label box has to be relative to the tile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Extent {
    /// The box only needs to touch the tile.
    Open,

    /// The box has to be inside the tile.
    Closed,
}

impl Extent {
    fn of(feature: &Feature) -> Option<Self> {
        use FeatureType::*;

        match feature.feature_type {
            Poi | WaterLine => Some(Extent::Open),
            BuiltupArea | BuiltupAreaSquare | BuiltupAreaSmall | Land
                | Park | NationalPark | Forest | Building | IndividualBuilding
                | Water | Island | PedestrianArea | AircraftRoad
                | AirportGround | CartographicGreenArea
                => Some(Extent::Closed),
            _ => None
        }
    }

    fn accepts(self, bbox: &WorldBox, tile: &WorldBox) -> bool {
        match self {
            Extent::Open => bbox.overlaps(tile),
            Extent::Closed => bbox.inside(tile),
        }
    }
}


//------------ place_other_text ----------------------------------------------

/// Places the label of an area or point feature.
///
/// Returns whether the label was placed.
pub fn place_other_text(placer: &mut Placer, label: &mut TextNotice) -> bool {
    let map = placer.map;
    let feature = match map.feature(label.feature) {
        Some(feature) => feature,
        None => return false,
    };
    let poly = match label_polygon(label, feature) {
        Some(poly) => poly,
        None => return false,
    };
    let extent = match Extent::of(feature) {
        Some(extent) => extent,
        None => return false,
    };
    if is_filtered(placer, feature) {
        trace!("'{}' filtered at scale {}", feature.name, placer.scale());
        return false
    }

    let (first, second) = label_lines(feature);
    let first_dim = placer.measure(&first, AREA_FONT_SIZE);
    let second_dim = second.as_ref().map(|text| {
        placer.measure(text, AREA_FONT_SIZE)
    });
    let (width, height) = match second_dim {
        Some(dim) => {
            (first_dim.width.max(dim.width), first_dim.height + dim.height)
        }
        None => (first_dim.width, first_dim.height)
    };
    let chars = first.chars().count().max(
        second.as_ref().map(|text| text.chars().count()).unwrap_or(0)
    ).max(1);
    label.font_size = AREA_FONT_SIZE;
    label.text = first;
    label.second_line = second;

    let tile = placer.tile();
    if !fits_any_width(feature, label.second_line.is_some())
        && width * placer.projection.meters_per_pixel() > poly.length_m()
    {
        trace!("'{}' wider than its feature", feature.name);
        return false
    }
    if feature.feature_type == FeatureType::Water {
        if let Some(bbox) = feature.bbox() {
            if tile.inside(&bbox) {
                return false
            }
        }
    }

    let text = TextSize { width, height, char_width: width / chars as f64 };
    let tries = if has_symbol(feature) { SYMBOL_SHIFTS.len() } else { 1 };
    for attempt in 0..tries {
        let (bbox, anchor) = match label_box(
            placer, feature, poly, text, attempt
        ) {
            Some(res) => res,
            None => return false,
        };
        if !extent.accepts(&bbox, &tile) || placer.collides(&bbox) {
            continue
        }
        placer.accept(bbox);
        if feature.feature_type.is_builtup_area() {
            placer.bua_labels += 1;
        }
        if has_symbol(feature) {
            label.symbol = Some(anchor);
        }
        label.text_coord = Some(Coord::new(bbox.min_lat, bbox.min_lon));
        label.text_box = Some(bbox);
        return true
    }
    false
}

/// Returns whether the static rules exclude a feature at this scale.
fn is_filtered(placer: &Placer, feature: &Feature) -> bool {
    let scale = placer.scale();
    match feature.feature_type {
        FeatureType::Water if scale < 4 => return true,
        FeatureType::IndividualBuilding => {
            let length = feature.length_m();
            if (scale < 9 && length < 600.) || (scale < 8 && length < 1200.) {
                return true
            }
        }
        _ => { }
    }
    let bua = feature.feature_type.is_builtup_area();
    if bua && placer.is_small_image()
        && placer.bua_labels >= placer.options.max_small_image_bua_labels
    {
        return true
    }
    let feature_scale = feature.scale_level;
    if feature_scale.saturating_add(3) <= scale {
        let exempt = bua && feature_scale <= 3 && scale - feature_scale <= 3;
        if !exempt {
            return true
        }
    }
    false
}

/// Returns the one or two lines of a label.
fn label_lines(feature: &Feature) -> (String, Option<String>) {
    if feature.is_city_centre() {
        return (title_case(&feature.name), None)
    }
    if feature.feature_type == FeatureType::Land
        && !feature.basename.is_empty() && feature.basename != feature.name
    {
        return (feature.name.clone(), Some(feature.basename.clone()))
    }
    if feature.feature_type != FeatureType::Poi {
        if let Some((first, second)) = split_two_lines(
            &feature.name, MAX_LINE_CHARS
        ) {
            return (first.into(), Some(second.into()))
        }
    }
    (feature.name.clone(), None)
}

/// Returns the polygon a label is placed on.
///
/// Large built-up areas at coarse scales use their longest polygon, all
/// others the first one with coordinates.
fn label_polygon<'f>(
    label: &TextNotice, feature: &'f Feature
) -> Option<&'f Polygon> {
    if label.importance == TextImportance::BuiltupArea
        && label.scale_level <= 4
    {
        return feature.polygons.iter().filter(|poly| !poly.is_empty()).reduce(
            |best, poly| {
                if poly.length_m() > best.length_m() { poly } else { best }
            }
        )
    }
    feature.polygons.iter().find(|poly| !poly.is_empty())
}

/// Returns the centre of an area label.
///
/// Large areas may carry their centre as a trailing polygon with a single
/// coordinate.
fn label_centre(feature: &Feature, poly: &Polygon) -> Option<Coord> {
    if feature.feature_type.is_large_area() {
        if let Some(centre) = feature.polygons.last().filter(|last| {
            last.len() == 1
        }) {
            return centre.first()
        }
    }
    poly.centroid()
}

/// Returns whether a label may be wider than the length of its feature.
fn fits_any_width(feature: &Feature, two_lines: bool) -> bool {
    two_lines || matches!(
        feature.feature_type,
        FeatureType::BuiltupArea | FeatureType::BuiltupAreaSquare
        | FeatureType::BuiltupAreaSmall | FeatureType::Poi | FeatureType::Land
    )
}

fn has_symbol(feature: &Feature) -> bool {
    matches!(
        feature.feature_type,
        FeatureType::BuiltupAreaSquare | FeatureType::BuiltupAreaSmall
    )
}


//------------ Label Boxes ---------------------------------------------------

/// The measured size of a label in pixels.
#[derive(Clone, Copy, Debug)]
struct TextSize {
    width: f64,
    height: f64,
    char_width: f64,
}

/// Returns the box of a label and its anchor for the given attempt.
fn label_box(
    placer: &Placer, feature: &Feature, poly: &Polygon, text: TextSize,
    attempt: usize,
) -> Option<(WorldBox, Coord)> {
    let projection = placer.projection;
    if feature.is_city_centre() {
        let anchor = feature.anchor()?;
        let half = projection.lon_diff(text.width / 2.);
        let bbox = WorldBox {
            min_lat: anchor.lat.saturating_sub(
                projection.lat_diff(2. * text.height)
            ),
            max_lat: anchor.lat,
            min_lon: anchor.lon.saturating_sub(half),
            max_lon: anchor.lon.saturating_add(half),
        };
        return Some((bbox, anchor))
    }

    let (anchor, shift) = if has_symbol(feature) {
        let (x, y) = SYMBOL_SHIFTS.get(attempt).copied().unwrap_or_default();
        (
            feature.bbox()?.center(),
            (
                text.width / 2. + x * text.width / 4.,
                -text.height + y * text.height / 4.
            )
        )
    }
    else {
        (label_centre(feature, poly)?, (0., 0.))
    };
    let point = projection.world_to_pixel(anchor);
    let (x, y) = (point.x + shift.0, point.y + shift.1);

    let rect = if projection.is_cos_lat() {
        let dx = text.width / 2. + text.char_width / 3.;
        Rect::new(x - dx, y - 1.5 * text.height, x + dx, y + text.height)
    }
    else {
        Rect::from_center_size(
            Point::new(x, y), (text.width, text.height)
        ).inflate(PROJECTED_MARGIN, PROJECTED_MARGIN)
    };
    let bbox = WorldBox::new(
        projection.pixel_to_world(Point::new(rect.x0, rect.y0)),
        projection.pixel_to_world(Point::new(rect.x1, rect.y1)),
    );
    Some((bbox, anchor))
}


//============ Testing =======================================================
