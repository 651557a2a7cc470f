//! Placing text labels.
//!
//! Every feature drawn may get a label. Labels are placed one after
//! another in order of importance and each one must keep clear of
//! everything placed before: point markers and road signs in the object
//! box registry as well as all accepted labels. Area and point features
//! get a straight label near their centre, see [`area`]. Streets get their
//! name laid out glyph by glyph along the centreline or a road sign, see
//! [`street`] and [`curved`].

use std::cmp::Ordering;
use std::collections::HashSet;
use serde::Deserialize;
use tracing::{debug, trace};
use crate::boxes::ObjectBoxes;
use crate::feature::{Feature, FeatureMap, FeatureType};
use crate::measure::{Dimensions, EstimatingMeasurer, GlyphMeasurer};
use crate::merge::joined_coords;
use crate::merge::street::{merge_street_names, street_names_at_scale, MergedStreet};
use crate::names::{is_road_sign_name, Language};
use crate::notice::FeatureNotice;
use crate::projection::Projection;
use crate::style::Setting;
use crate::world::{Coord, WorldBox};

pub mod area;
pub mod curved;
pub mod street;


//------------ LabelOptions --------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LabelOptions {
    /// Check labels against the registry and each other.
    pub collision_checking: bool,

    /// The maximum number of road signs.
    pub max_road_signs: usize,

    /// The maximum number of road signs at scale level 4 and above.
    pub max_road_signs_coarse: usize,

    /// The width of a road sign in pixels.
    pub road_sign_width_px: f64,

    /// The height of a road sign in pixels.
    pub road_sign_height_px: f64,

    /// Images up to this width are small.
    pub small_image_width: f64,

    /// The maximum number of built-up area labels on a small image.
    pub max_small_image_bua_labels: usize,

    /// The language for abbreviating street names.
    pub language: Language,

    /// Label built-up areas themselves rather than their city centres.
    pub builtup_area_names: bool,

    /// The font family used for measuring.
    pub font: String,
}

impl Default for LabelOptions {
    fn default() -> Self {
        LabelOptions {
            collision_checking: true,
            max_road_signs: 8,
            max_road_signs_coarse: 5,
            road_sign_width_px: 60.,
            road_sign_height_px: 30.,
            small_image_width: 250.,
            max_small_image_bua_labels: 6,
            language: Language::default(),
            builtup_area_names: false,
            font: "sans-serif".into(),
        }
    }
}

/// The font size of area and point labels.
pub const AREA_FONT_SIZE: u8 = 8;

/// The font size of street labels.
pub const STREET_FONT_SIZE: u8 = 9;


//------------ TextImportance ------------------------------------------------

/// The importance class of a label. Earlier variants are placed first.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TextImportance {
    CityCentre,
    BuiltupArea,
    BuiltupAreaSquare,
    BuiltupAreaSmall,
    Land,
    StreetMain,
    StreetFirst,
    StreetSecond,
    StreetThird,
    StreetFourth,
    Ferry,
    Water,
    WaterLine,
    Island,
    Park,
    PedestrianArea,
    AircraftRoad,
    Building,
    IndividualBuilding,
    Other,
}

impl TextImportance {
    pub fn of(feature: &Feature) -> Self {
        use FeatureType::*;

        match feature.feature_type {
            Poi if feature.is_city_centre() => TextImportance::CityCentre,
            BuiltupArea => TextImportance::BuiltupArea,
            BuiltupAreaSquare => TextImportance::BuiltupAreaSquare,
            BuiltupAreaSmall => TextImportance::BuiltupAreaSmall,
            Land => TextImportance::Land,
            StreetMain => TextImportance::StreetMain,
            StreetFirst => TextImportance::StreetFirst,
            StreetSecond => TextImportance::StreetSecond,
            StreetThird => TextImportance::StreetThird,
            StreetFourth => TextImportance::StreetFourth,
            Ferry => TextImportance::Ferry,
            Water => TextImportance::Water,
            WaterLine => TextImportance::WaterLine,
            Island | IslandInBua => TextImportance::Island,
            Park | Forest | NationalPark | CartographicGreenArea
                | CartographicGround => TextImportance::Park,
            PedestrianArea => TextImportance::PedestrianArea,
            AircraftRoad => TextImportance::AircraftRoad,
            Building => TextImportance::Building,
            IndividualBuilding => TextImportance::IndividualBuilding,
            _ => TextImportance::Other,
        }
    }

    pub fn is_builtup_area(self) -> bool {
        matches!(
            self,
            TextImportance::BuiltupArea | TextImportance::BuiltupAreaSquare
            | TextImportance::BuiltupAreaSmall
        )
    }

    pub fn is_street(self) -> bool {
        matches!(
            self,
            TextImportance::StreetMain | TextImportance::StreetFirst
            | TextImportance::StreetSecond | TextImportance::StreetThird
            | TextImportance::StreetFourth
        )
    }
}


//------------ LabelKind -----------------------------------------------------

/// How a label is shown.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LabelKind {
    /// Straight text near an area’s centre or a point.
    Area,

    /// Glyphs along a street’s centreline.
    Street,

    /// A road number in a sign.
    RoadSign,
}


//------------ GlyphPosition -------------------------------------------------

/// A single placed glyph of a street label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPosition {
    pub ch: char,

    /// The centre of the glyph.
    pub coord: Coord,

    /// The reading direction in radians clockwise from north.
    pub angle: f64,
}


//------------ TextNotice ----------------------------------------------------

/// A feature selected for labelling and the outcome of placing it.
#[derive(Clone, Debug)]
pub struct TextNotice<'a> {
    /// The index of the feature in the feature map.
    ///
    /// For merged streets, this is the first feature of the chain.
    pub feature: usize,

    pub setting: Option<&'a Setting>,
    pub scale_level: u8,
    pub importance: TextImportance,

    /// The length used for ordering in meters.
    pub length_m: f64,

    /// The index of the street merge the notice resulted from.
    pub merge_id: Option<usize>,

    /// The joined centreline if several features were merged.
    pub merged: Option<MergedStreet>,

    pub kind: LabelKind,

    /// The text as shown.
    pub text: String,

    /// The second line of a two line label.
    pub second_line: Option<String>,

    pub font_size: u8,

    /// The lower left corner of the text.
    pub text_coord: Option<Coord>,

    /// The box occupied by an area label or road sign.
    pub text_box: Option<WorldBox>,

    /// The glyphs of a street label.
    pub glyphs: Vec<GlyphPosition>,

    /// Where the companion symbol of a small built-up area goes.
    pub symbol: Option<Coord>,

    /// Has the label been placed?
    pub placed: bool,
}

impl<'a> TextNotice<'a> {
    fn new(
        map: &FeatureMap, index: usize, feature: &Feature,
        setting: Option<&'a Setting>,
    ) -> Self {
        let importance = TextImportance::of(feature);
        TextNotice {
            feature: index,
            setting,
            scale_level: feature.scale_level,
            importance,
            length_m: importance_length(map, feature, importance),
            merge_id: None,
            merged: None,
            kind: if feature.feature_type.is_street()
                || feature.feature_type == FeatureType::Ferry
            {
                LabelKind::Street
            }
            else {
                LabelKind::Area
            },
            text: feature.name.clone(),
            second_line: None,
            font_size: 0,
            text_coord: None,
            text_box: None,
            glyphs: Vec::new(),
            symbol: None,
            placed: false,
        }
    }

    /// Returns the centreline of a street label.
    pub fn centreline(&self, map: &FeatureMap) -> Vec<Coord> {
        match self.merged {
            Some(ref merged) => merged.coords.clone(),
            None => map.feature(self.feature).map(joined_coords)
                .unwrap_or_default()
        }
    }
}

/// The length a label is ordered by.
fn importance_length(
    map: &FeatureMap, feature: &Feature, importance: TextImportance
) -> f64 {
    match importance {
        TextImportance::StreetMain | TextImportance::StreetFirst => {
            if map.scale_level > 2 {
                feature.polygons.first().map(|poly| {
                    poly.length_m()
                }).unwrap_or(0.)
            }
            else {
                0.
            }
        }
        importance if importance.is_builtup_area() => feature.length_m(),
        _ => 0.
    }
}


//------------ Ordering ------------------------------------------------------

/// Compares two notices by importance.
///
/// Built-up areas of the same class go by scale level and then longest
/// first. City centres go by their size class. Streets of the same class
/// go longest first and anything else by name.
pub fn importance_order(
    map: &FeatureMap, a: &TextNotice, b: &TextNotice
) -> Ordering {
    if a.importance != b.importance {
        return a.importance.cmp(&b.importance)
    }
    if a.importance.is_builtup_area() {
        return a.scale_level.cmp(&b.scale_level).then_with(|| {
            b.length_m.total_cmp(&a.length_m)
        })
    }
    if a.importance == TextImportance::CityCentre {
        let extra = |notice: &TextNotice| {
            map.feature(notice.feature).and_then(Feature::poi).map(|poi| {
                poi.extra_info
            })
        };
        return extra(a).cmp(&extra(b)).then_with(|| a.text.cmp(&b.text))
    }
    if a.importance.is_street() {
        return b.length_m.total_cmp(&a.length_m)
    }
    a.text.cmp(&b.text)
}

/// Compares two notices by importance and then name.
///
/// Names are compared ignoring case with empty names last.
pub fn name_order(a: &TextNotice, b: &TextNotice) -> Ordering {
    a.importance.cmp(&b.importance).then_with(|| {
        match (a.text.is_empty(), b.text.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                a.text.to_lowercase().cmp(&b.text.to_lowercase())
            }
        }
    })
}


//------------ place_labels --------------------------------------------------

/// Selects the features to label and places their labels.
///
/// Only features with a visible notice are considered. Returns a notice
/// for every feature selected in the order they were tried. Boxes of
/// placed labels are added to `registry`.
pub fn place_labels<'a>(
    map: &FeatureMap,
    notices: &[FeatureNotice<'a>],
    projection: &dyn Projection,
    registry: &mut ObjectBoxes,
    measurer: &dyn GlyphMeasurer,
    options: &LabelOptions,
) -> Vec<TextNotice<'a>> {
    let mut labels = select_candidates(map, notices, options);
    labels.sort_by(|a, b| importance_order(map, a, b));

    let mut placer = Placer::new(map, projection, registry, measurer, options);
    for label in &mut labels {
        let placed = match label.kind {
            LabelKind::Area => area::place_other_text(&mut placer, label),
            _ => street::place_street_text(&mut placer, label),
        };
        if placed {
            label.placed = true;
        }
        else {
            trace!("no room for '{}'", label.text);
        }
    }
    debug!(
        "placed {} of {} labels",
        labels.iter().filter(|label| label.placed).count(), labels.len()
    );
    labels
}

/// Creates the text notices for all features that may get a label.
///
/// Streets eligible for merging are merged first and become one notice
/// per merged street.
fn select_candidates<'a>(
    map: &FeatureMap,
    notices: &[FeatureNotice<'a>],
    options: &LabelOptions,
) -> Vec<TextNotice<'a>> {
    let small_image = map.is_small_image(options.small_image_width);
    let mut settings: Vec<Option<Option<&'a Setting>>> = vec![None; map.len()];
    for notice in notices {
        if !notice.visible {
            continue
        }
        if let Some(item) = settings.get_mut(notice.feature) {
            if item.is_none() {
                *item = Some(notice.setting)
            }
        }
    }

    let mut res = Vec::new();
    let mut streets = Vec::new();
    for (index, feature) in map.features.iter().enumerate() {
        let setting = match settings[index] {
            Some(setting) => setting,
            None => continue,
        };
        if !is_labelled(feature, setting, options) {
            continue
        }
        if feature.feature_type.is_road_class()
            && !is_road_sign_name(&feature.name)
            && street_names_at_scale(
                feature.feature_type, map.scale_level, true, small_image
            )
        {
            streets.push(index);
        }
        else {
            res.push(TextNotice::new(map, index, feature, setting));
        }
    }

    for (merge_id, street) in merge_street_names(map, &streets).into_iter()
        .enumerate()
    {
        let index = match street.features.first() {
            Some(index) => *index,
            None => continue,
        };
        let feature = match map.feature(index) {
            Some(feature) => feature,
            None => continue,
        };
        let setting = settings[index].flatten();
        let mut notice = TextNotice::new(map, index, feature, setting);
        notice.merge_id = Some(merge_id);
        if street.is_merged() {
            if notice.importance == TextImportance::StreetMain
                || notice.importance == TextImportance::StreetFirst
            {
                notice.length_m = street.length_m;
            }
            notice.merged = Some(street);
        }
        res.push(notice);
    }
    res
}

/// Returns whether a feature may get a label at all.
fn is_labelled(
    feature: &Feature, setting: Option<&Setting>, options: &LabelOptions
) -> bool {
    if setting.map(|setting| !setting.text_on_map).unwrap_or(false) {
        return false
    }
    if feature.name.is_empty() || feature.name == "MISSING" {
        return false
    }
    match feature.feature_type {
        FeatureType::NationalPark | FeatureType::Island => false,
        FeatureType::Land => !feature.name.contains("USA"),
        FeatureType::Poi => feature.is_city_centre(),
        t if t.is_builtup_area() => options.builtup_area_names,
        FeatureType::TrafficInfo | FeatureType::Symbol | FeatureType::Event
            | FeatureType::Route | FeatureType::RouteContinuation
            | FeatureType::RouteOrigin | FeatureType::RouteDestination
            | FeatureType::ParkCar | FeatureType::Empty => false,
        _ => true
    }
}


//------------ apply_labels --------------------------------------------------

/// Writes the outcome of label placement back into the feature map.
pub fn apply_labels(map: &mut FeatureMap, labels: &[TextNotice]) {
    for label in labels.iter().filter(|label| label.placed) {
        let feature = match map.features.get_mut(label.feature) {
            Some(feature) => feature,
            None => continue,
        };
        feature.display_text = true;
        feature.font_size = label.font_size;
        feature.text_coord = label.text_coord.or_else(|| {
            label.glyphs.first().map(|glyph| glyph.coord)
        });
        if let Some(glyph) = label.glyphs.first() {
            feature.text_start = glyph.angle.to_degrees();
        }
        if label.kind == LabelKind::Street {
            feature.name = label.text.clone();
        }
    }
}


//------------ Placer --------------------------------------------------------

/// The state of one label placement pass.
pub struct Placer<'m, 'r> {
    pub map: &'m FeatureMap,
    pub projection: &'m dyn Projection,
    pub measurer: &'m dyn GlyphMeasurer,
    pub options: &'m LabelOptions,

    registry: &'r mut ObjectBoxes,

    /// The boxes of all accepted labels.
    accepted: Vec<WorldBox>,

    /// The street names already placed.
    street_names: HashSet<String>,

    /// The number of road signs placed.
    pub road_signs: usize,

    /// The number of built-up area labels placed.
    pub bua_labels: usize,
}

impl<'m, 'r> Placer<'m, 'r> {
    pub fn new(
        map: &'m FeatureMap,
        projection: &'m dyn Projection,
        registry: &'r mut ObjectBoxes,
        measurer: &'m dyn GlyphMeasurer,
        options: &'m LabelOptions,
    ) -> Self {
        Placer {
            map, projection, measurer, options, registry,
            accepted: Vec::new(),
            street_names: HashSet::new(),
            road_signs: 0,
            bua_labels: 0,
        }
    }

    /// The scale level of the map.
    pub fn scale(&self) -> u8 {
        self.map.scale_level
    }

    pub fn is_small_image(&self) -> bool {
        self.map.is_small_image(self.options.small_image_width)
    }

    /// The world box covered by the output tile.
    pub fn tile(&self) -> WorldBox {
        self.projection.bounding_box()
    }

    pub fn registry(&self) -> &ObjectBoxes {
        &*self.registry
    }

    /// Returns whether a label box hits anything placed so far.
    ///
    /// The pixel box is checked against the registry, the world box
    /// against the accepted labels. Boxes touching at the edge don’t
    /// collide.
    pub fn collides(&self, bbox: &WorldBox) -> bool {
        if !self.options.collision_checking {
            return false
        }
        let pixel = self.projection.pixel_box(bbox);
        self.registry.collides(&pixel)
        || self.accepted.iter().any(|item| item.overlaps_strict(bbox))
    }

    /// Accepts a label box.
    pub fn accept(&mut self, bbox: WorldBox) {
        self.accepted.push(bbox);
        self.registry.add(bbox, self.projection);
    }

    /// Adds a box to the registry without making it a label box.
    pub fn register(&mut self, bbox: WorldBox) {
        self.registry.add(bbox, self.projection);
    }

    pub fn has_street_name(&self, name: &str) -> bool {
        self.street_names.contains(name)
    }

    pub fn add_street_name(&mut self, name: String) {
        self.street_names.insert(name);
    }

    /// Measures a text, estimating if the measurer fails.
    pub fn measure(&self, text: &str, size: u8) -> Dimensions {
        let size = f64::from(size);
        match self.measurer.measure(text, &self.options.font, size) {
            Some(res) => res,
            None => {
                trace!("estimating size of '{}'", text);
                EstimatingMeasurer::default().measure(
                    text, &self.options.font, size
                ).unwrap_or_default()
            }
        }
    }

    /// Measures every glyph of a text, estimating if the measurer fails.
    pub fn measure_glyphs(&self, text: &str, size: u8) -> Vec<Dimensions> {
        let size = f64::from(size);
        match self.measurer.per_glyph_dimensions(
            text, &self.options.font, size
        ) {
            Some(res) if res.len() == text.chars().count() => res,
            _ => {
                let glyph = EstimatingMeasurer::default().glyph(size);
                vec![glyph; text.chars().count()]
            }
        }
    }
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use kurbo::Size;
    use crate::feature::{FeatureKind, PoiInfo, PoiType, Polygon, RoadAttrs};
    use crate::notice::build_notices;
    use crate::projection::CosLatProjection;

    pub(crate) fn map(scale: u8) -> FeatureMap {
        FeatureMap::new(
            WorldBox::new(Coord::new(0, 0), Coord::new(256_000, 256_000)),
            Size::new(512., 512.), scale
        )
    }

    fn street(name: &str, coords: &[(i32, i32)]) -> Feature {
        Feature::new(FeatureType::StreetSecond, name, 10).with_polygon(
            Polygon::road(
                coords.iter().map(|&(a, b)| Coord::new(a, b)).collect(),
                RoadAttrs::default()
            )
        )
    }

    fn city(name: &str, extra: u8, lat: i32, lon: i32) -> Feature {
        Feature::new(FeatureType::Poi, name, 2)
            .with_kind(FeatureKind::Poi(
                PoiInfo::new(PoiType::CITY_CENTRE).with_extra_info(extra)
            ))
            .with_polygon(Polygon::new(vec![Coord::new(lat, lon)]))
    }

    #[test]
    fn importance_classes_are_ordered() {
        assert!(TextImportance::CityCentre < TextImportance::BuiltupArea);
        assert!(TextImportance::StreetMain < TextImportance::StreetFourth);
        assert!(TextImportance::Building < TextImportance::Other);
    }

    #[test]
    fn candidates_merge_streets() {
        let mut map = map(10);
        map.push(street("Main St", &[(1000, 1000), (1000, 50000)]));
        map.push(street("Main St", &[(1000, 50000), (1000, 90000)]));
        map.push(street("E4", &[(5000, 1000), (5000, 90000)]));
        map.push(city("Springfield", 5, 100_000, 100_000));
        map.push(Feature::new(FeatureType::Island, "Isle", 10).with_polygon(
            Polygon::closed(vec![Coord::new(0, 0), Coord::new(0, 10)])
        ));
        let notices = build_notices(&map, None, false);
        let labels = select_candidates(&map, &notices, &LabelOptions::default());
        assert_eq!(labels.len(), 3);
        let merged: Vec<_> = labels.iter().filter(|l| l.merged.is_some()).collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].merged.as_ref().unwrap().features, [0, 1]);
        assert!(labels.iter().any(|l| l.text == "E4" && l.merge_id.is_none()));
    }

    #[test]
    fn sorted_by_importance() {
        let mut map = map(10);
        map.push(street("Short", &[(1000, 1000), (1000, 2000)]));
        map.push(city("Small", 9, 100_000, 100_000));
        map.push(city("Big", 2, 150_000, 150_000));
        let notices = build_notices(&map, None, false);
        let mut labels = select_candidates(&map, &notices, &LabelOptions::default());
        labels.sort_by(|a, b| importance_order(&map, a, b));
        let names: Vec<_> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(names, ["Big", "Small", "Short"]);
    }

    #[test]
    fn equal_cities_sorted_by_name() {
        let mut map = map(10);
        map.push(city("Uppsala", 3, 100_000, 100_000));
        map.push(city("Arboga", 3, 150_000, 150_000));
        map.push(city("Malmo", 3, 50_000, 50_000));
        let notices = build_notices(&map, None, false);
        let mut labels = select_candidates(
            &map, &notices, &LabelOptions::default()
        );
        labels.sort_by(|a, b| importance_order(&map, a, b));
        let names: Vec<_> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(names, ["Arboga", "Malmo", "Uppsala"]);
    }

    #[test]
    fn name_order_puts_empty_last() {
        let mut map = map(10);
        map.push(city("beta", 2, 0, 0));
        map.push(city("Alpha", 2, 0, 0));
        map.push(city("", 2, 0, 0));
        let mut labels: Vec<_> = map.features.iter().enumerate().map(|(i, f)| {
            TextNotice::new(&map, i, f, None)
        }).collect();
        labels.sort_by(name_order);
        let names: Vec<_> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta", ""]);
    }

    #[test]
    fn placed_labels_do_not_overlap() {
        let mut map = map(4);
        for i in 0..6 {
            map.push(city("Springfield", 5, 128_000, 100_000 + i * 500));
        }
        let proj = CosLatProjection::new(map.bbox, map.screen_size);
        let notices = build_notices(&map, None, false);
        let mut registry = ObjectBoxes::new();
        let labels = place_labels(
            &map, &notices, &proj, &mut registry,
            &EstimatingMeasurer::default(), &LabelOptions::default()
        );
        let boxes: Vec<_> = labels.iter().filter(|l| l.placed).map(|l| {
            l.text_box.unwrap()
        }).collect();
        assert!(!boxes.is_empty());
        assert!(boxes.len() < 6);
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(!a.overlaps_strict(b));
            }
        }
        assert_eq!(registry.len(), boxes.len());
    }

    #[test]
    fn apply_writes_back() {
        let mut map = map(4);
        map.push(city("STOCKHOLM", 1, 128_000, 128_000));
        let proj = CosLatProjection::new(map.bbox, map.screen_size);
        let notices = build_notices(&map, None, false);
        let mut registry = ObjectBoxes::new();
        let labels = place_labels(
            &map, &notices, &proj, &mut registry,
            &EstimatingMeasurer::default(), &LabelOptions::default()
        );
        assert!(labels[0].placed);
        assert_eq!(labels[0].text, "Stockholm");
        apply_labels(&mut map, &labels);
        assert!(map.features[0].display_text);
        assert_eq!(map.features[0].font_size, AREA_FONT_SIZE);
        assert!(map.features[0].text_coord.is_some());
    }
}
