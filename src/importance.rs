//! Selecting the features of a tile layer by importance.
//!
//! A tile layer is split into a number of importance levels, each a
//! separate piece of tile content. An importance level names a group of
//! feature types and either a fixed detail limit or a minimum area in
//! pixels. Area limits are given per detail level and interpolated in
//! between so that features don’t pop in at zoom steps.

use std::collections::HashSet;
use serde::Deserialize;
use tracing::{debug, trace};
use crate::feature::{Feature, FeatureMap, FeatureType, PoiType};


//------------ Group ---------------------------------------------------------

/// A named group of feature types.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Group {
    AllAreaFeatures,
    AllOtherFeatures,
    StreetSecondAndFerry,
    StreetFourthAndRailway,
    AllRouteFeatures,
    LandAndMajorCitycentres,
    StreetMainAndMediumCitycentresAndAirports,
    StreetFirstAndMinorCitycentres,
    Pois,
    Traffic,
}

impl Group {
    pub fn contains(self, feature: &Feature) -> bool {
        use FeatureType::*;

        let city_size = || {
            feature.poi().filter(|_| feature.is_city_centre()).map(|poi| {
                poi.extra_info
            })
        };

        match self {
            Group::AllAreaFeatures => matches!(
                feature.feature_type,
                BuiltupArea | Island | Water | Park | Building
                | IndividualBuilding | AirportGround | CartographicGreenArea
                | CartographicGround | Forest | AircraftRoad | WaterInPark
                | IslandInBua | Walkway | Railway | IslandInWaterInPark
                | IslandInWaterInParkBua | IslandInWaterInParkIsland
                | BuaOnIsland
            ),
            Group::AllOtherFeatures => matches!(
                feature.feature_type,
                Land | StreetMain | StreetFirst | StreetSecond | StreetThird
                | StreetFourth | Border | Walkway | Railway
            ),
            Group::StreetSecondAndFerry => matches!(
                feature.feature_type, StreetSecond | Ferry | Railway
            ),
            Group::StreetFourthAndRailway => matches!(
                feature.feature_type, StreetFourth | Railway | Walkway
            ),
            Group::AllRouteFeatures => matches!(
                feature.feature_type,
                Route | RouteContinuation | RouteOrigin | RouteDestination
                | ParkCar | StreetMain | StreetFirst | StreetSecond
                | StreetThird | StreetFourth
            ),
            Group::LandAndMajorCitycentres => match feature.feature_type {
                Railway | Border => true,
                Poi => city_size().map(|size| size < 8).unwrap_or(false),
                _ => false,
            }
            Group::StreetMainAndMediumCitycentresAndAirports => {
                match feature.feature_type {
                    Railway | StreetMain | StreetFirst => true,
                    Poi => match city_size() {
                        Some(size) => (8..11).contains(&size),
                        None => feature.poi_type() == Some(PoiType::AIRPORT),
                    }
                    _ => false,
                }
            }
            Group::StreetFirstAndMinorCitycentres => {
                match feature.feature_type {
                    Railway => true,
                    Poi => city_size().map(|size| size >= 11).unwrap_or(false),
                    _ => false
                }
            }
            Group::Pois => matches!(feature.feature_type, Poi | Event),
            Group::Traffic => feature.feature_type == TrafficInfo,
        }
    }

    /// Returns whether the group is made of streets.
    ///
    /// Content of such groups is merged for transmission.
    pub fn is_street_group(self) -> bool {
        matches!(
            self,
            Group::AllOtherFeatures | Group::StreetSecondAndFerry
            | Group::StreetFourthAndRailway | Group::AllRouteFeatures
            | Group::StreetMainAndMediumCitycentresAndAirports
        )
    }
}


//------------ TypeGroup -----------------------------------------------------

/// Either a single feature type or a named group.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum TypeGroup {
    Group(Group),
    Type(FeatureType),
}

impl TypeGroup {
    pub fn contains(self, feature: &Feature) -> bool {
        match self {
            TypeGroup::Group(group) => group.contains(feature),
            TypeGroup::Type(feature_type) => {
                feature.feature_type == feature_type
            }
        }
    }

    pub fn is_street_group(self) -> bool {
        match self {
            TypeGroup::Group(group) => group.is_street_group(),
            TypeGroup::Type(feature_type) => feature_type.is_street(),
        }
    }
}


//------------ Threshold -----------------------------------------------------

/// The condition a feature of an importance level needs to meet.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Threshold {
    /// The minimum area in square pixels for each detail level.
    Area {
        area: Vec<f64>,
    },

    /// Included at all detail levels up to and including `max_detail`.
    Fixed {
        max_detail: u8,
    },
}

impl Threshold {
    /// Returns the area threshold at a possibly fractional detail level.
    ///
    /// Returns `None` for fixed thresholds or if no areas are given.
    pub fn area_at(&self, detail: f64) -> Option<f64> {
        let area = match *self {
            Threshold::Area { ref area } => area,
            Threshold::Fixed { .. } => return None,
        };
        let last = area.len().checked_sub(1)?;
        let detail = detail.max(0.);
        let lower = (detail.floor() as usize).min(last);
        let upper = (detail.ceil() as usize).min(last);
        let frac = if upper > lower { detail - lower as f64 } else { 0. };
        Some(area[lower] + (area[upper] - area[lower]) * frac)
    }
}


//------------ ImportanceNotice ----------------------------------------------

/// One importance level of a layer.
#[derive(Clone, Debug, Deserialize)]
pub struct ImportanceNotice {
    pub group: TypeGroup,

    /// The smallest feature scale level included.
    #[serde(default)]
    pub min_scale: u8,

    /// The largest feature scale level included.
    #[serde(default = "ImportanceNotice::default_max_scale")]
    pub max_scale: u8,

    #[serde(flatten)]
    pub threshold: Threshold,
}

impl ImportanceNotice {
    pub fn area(group: TypeGroup, area: Vec<f64>) -> Self {
        Self::new(group, Threshold::Area { area })
    }

    pub fn fixed(group: TypeGroup, max_detail: u8) -> Self {
        Self::new(group, Threshold::Fixed { max_detail })
    }

    fn new(group: TypeGroup, threshold: Threshold) -> Self {
        ImportanceNotice {
            group,
            min_scale: 0,
            max_scale: Self::default_max_scale(),
            threshold
        }
    }

    pub fn with_scale_range(mut self, min_scale: u8, max_scale: u8) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    fn default_max_scale() -> u8 {
        u8::MAX
    }

    fn scale_in_range(&self, feature: &Feature) -> bool {
        self.min_scale <= feature.scale_level
        && feature.scale_level <= self.max_scale
    }
}


//------------ Layer ---------------------------------------------------------

/// The importance levels of a tile layer, most important first.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Layer {
    #[serde(default)]
    pub id: u32,

    #[serde(default)]
    pub importance: Vec<ImportanceNotice>,
}

impl Layer {
    pub fn new(id: u32, importance: Vec<ImportanceNotice>) -> Self {
        Layer { id, importance }
    }

    /// Returns the upper area bound for importance level `nbr`.
    ///
    /// This is the threshold of the last area based level before it.
    /// Features at least this large belong to that level already.
    fn max_area(&self, nbr: usize, detail: f64) -> Option<f64> {
        self.importance.iter().take(nbr).filter_map(|notice| {
            notice.threshold.area_at(detail)
        }).last()
    }

    /// Returns whether a feature belongs to importance level `nbr`.
    pub fn is_of_importance(
        &self, feature: &Feature, nbr: usize, scale: &TileScale
    ) -> bool {
        let notice = match self.importance.get(nbr) {
            Some(notice) => notice,
            None => return false,
        };
        if !notice.group.contains(feature) || !notice.scale_in_range(feature) {
            return false
        }
        match notice.threshold {
            Threshold::Fixed { max_detail } => {
                scale.detail <= f64::from(max_detail)
            }
            Threshold::Area { .. } => {
                if feature.polygons.is_empty() {
                    return false
                }
                let lower = match notice.threshold.area_at(scale.detail) {
                    Some(lower) => lower,
                    None => return true,
                };
                let pixel_area = feature.area_m2() * scale.sq_meter_to_sq_pixel();
                let upper = self.max_area(nbr, scale.detail);
                trace!(
                    "area of '{}' is {} px², bounds {}..{:?}",
                    feature.name, pixel_area, lower, upper
                );
                pixel_area >= lower
                && upper.map(|upper| pixel_area < upper).unwrap_or(true)
            }
        }
    }
}


//------------ TileScale -----------------------------------------------------

/// The scale a tile is produced for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileScale {
    /// The detail level, fractional between zoom steps.
    pub detail: f64,

    /// The length of an output pixel in meters.
    pub meters_per_pixel: f64,
}

impl TileScale {
    pub fn new(detail: f64, meters_per_pixel: f64) -> Self {
        TileScale { detail, meters_per_pixel }
    }

    /// The factor converting square meters into square pixels.
    pub fn sq_meter_to_sq_pixel(&self) -> f64 {
        if self.meters_per_pixel > 0. {
            1. / (self.meters_per_pixel * self.meters_per_pixel)
        }
        else {
            0.
        }
    }

    /// The integer detail level.
    pub fn detail_level(&self) -> u8 {
        self.detail.max(0.).floor().min(f64::from(u8::MAX)) as u8
    }
}


//------------ filter_importance ---------------------------------------------

/// Returns a map with the features of one importance level of a layer.
///
/// Features keep their order and are copied unchanged.
pub fn filter_importance(
    map: &FeatureMap, layer: &Layer, nbr: usize, scale: &TileScale
) -> FeatureMap {
    let mut res = map.empty_like();
    res.features = map.features.iter().filter(|feature| {
        layer.is_of_importance(feature, nbr, scale)
    }).cloned().collect();
    debug!(
        "importance {} of layer {}: {} of {} features",
        nbr, layer.id, res.len(), map.len()
    );
    res
}

/// Removes the names that are not shown at a detail level.
///
/// With `all`, all names are removed.
pub fn remove_names(map: &mut FeatureMap, detail: u8, all: bool) {
    for feature in &mut map.features {
        if all || names_removed(feature.feature_type, detail) {
            feature.name.clear();
            feature.basename.clear();
        }
    }
}

fn names_removed(feature_type: FeatureType, detail: u8) -> bool {
    match detail {
        3 => feature_type == FeatureType::StreetFirst,
        4 | 5 => matches!(
            feature_type, FeatureType::StreetFirst | FeatureType::StreetMain
        ),
        6 | 7 => feature_type == FeatureType::StreetMain,
        _ => false
    }
}

/// Removes features identical in type, name and geometry to an earlier one.
pub fn remove_duplicates(map: &mut FeatureMap) {
    let mut seen = HashSet::new();
    let before = map.len();
    map.features.retain(|feature| {
        let coords: Vec<_> = feature.polygons.iter().map(|poly| {
            poly.to_coords()
        }).collect();
        seen.insert((feature.feature_type, feature.name.clone(), coords))
    });
    if map.len() != before {
        debug!("removed {} duplicate features", before - map.len());
    }
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use kurbo::Size;
    use crate::feature::{FeatureKind, PoiInfo, Polygon};
    use crate::world::{Coord, WorldBox, METER_TO_MC2SCALE};

    /// A square feature with the given side in meters.
    fn square(feature_type: FeatureType, side_m: f64) -> Feature {
        let side = (side_m * METER_TO_MC2SCALE) as i32;
        Feature::new(feature_type, "square", 5).with_polygon(Polygon::closed(
            vec![
                Coord::new(0, 0), Coord::new(side, 0),
                Coord::new(side, side), Coord::new(0, side),
            ]
        ))
    }

    fn map() -> FeatureMap {
        FeatureMap::new(
            WorldBox::new(Coord::new(0, 0), Coord::new(100_000, 100_000)),
            Size::new(256., 256.), 5
        )
    }

    fn layer() -> Layer {
        Layer::new(0, vec![
            ImportanceNotice::area(
                TypeGroup::Group(Group::AllAreaFeatures), vec![100., 400.]
            ),
            ImportanceNotice::area(
                TypeGroup::Group(Group::AllAreaFeatures), vec![10., 40.]
            ),
            ImportanceNotice::fixed(TypeGroup::Type(FeatureType::Land), 2),
        ])
    }

    #[test]
    fn area_bands() {
        // One pixel is ten meters, so the squares are 4, 25 and 225 px².
        let scale = TileScale::new(0., 10.);
        let layer = layer();
        let small = square(FeatureType::Water, 20.);
        let medium = square(FeatureType::Water, 50.);
        let large = square(FeatureType::Water, 150.);
        assert!(!layer.is_of_importance(&small, 0, &scale));
        assert!(!layer.is_of_importance(&small, 1, &scale));
        assert!(!layer.is_of_importance(&medium, 0, &scale));
        assert!(layer.is_of_importance(&medium, 1, &scale));
        assert!(layer.is_of_importance(&large, 0, &scale));
        assert!(!layer.is_of_importance(&large, 1, &scale));
        // Evaluating again gives the same answer.
        assert!(layer.is_of_importance(&medium, 1, &scale));
    }

    #[test]
    fn interpolated_threshold() {
        let threshold = Threshold::Area { area: vec![100., 400.] };
        assert_eq!(threshold.area_at(0.), Some(100.));
        assert_eq!(threshold.area_at(0.5), Some(250.));
        assert_eq!(threshold.area_at(1.), Some(400.));
        assert_eq!(threshold.area_at(7.), Some(400.));
        assert_eq!(Threshold::Fixed { max_detail: 3 }.area_at(1.), None);
    }

    #[test]
    fn fixed_threshold() {
        let layer = layer();
        let land = square(FeatureType::Land, 10.);
        assert!(layer.is_of_importance(&land, 2, &TileScale::new(2., 10.)));
        assert!(!layer.is_of_importance(&land, 2, &TileScale::new(3., 10.)));
        assert!(!layer.is_of_importance(&land, 0, &TileScale::new(0., 10.)));
    }

    #[test]
    fn scale_range() {
        let layer = Layer::new(0, vec![
            ImportanceNotice::fixed(TypeGroup::Type(FeatureType::Land), 9)
                .with_scale_range(2, 4)
        ]);
        let scale = TileScale::new(0., 10.);
        let mut land = square(FeatureType::Land, 10.);
        assert!(!layer.is_of_importance(&land, 0, &scale));
        land.scale_level = 3;
        assert!(layer.is_of_importance(&land, 0, &scale));
    }

    #[test]
    fn city_centre_groups() {
        let city = |extra| {
            Feature::new(FeatureType::Poi, "c", 5).with_kind(FeatureKind::Poi(
                PoiInfo::new(PoiType::CITY_CENTRE).with_extra_info(extra)
            ))
        };
        assert!(Group::LandAndMajorCitycentres.contains(&city(3)));
        assert!(!Group::LandAndMajorCitycentres.contains(&city(9)));
        assert!(
            Group::StreetMainAndMediumCitycentresAndAirports.contains(&city(9))
        );
        assert!(Group::StreetFirstAndMinorCitycentres.contains(&city(12)));
    }

    #[test]
    fn filter_keeps_order() {
        let mut map = map();
        map.push(square(FeatureType::Water, 150.));
        map.push(square(FeatureType::Park, 20.));
        map.push(square(FeatureType::Forest, 200.));
        let res = filter_importance(&map, &layer(), 0, &TileScale::new(0., 10.));
        let types: Vec<_> = res.features.iter().map(|f| f.feature_type).collect();
        assert_eq!(types, [FeatureType::Water, FeatureType::Forest]);
    }

    #[test]
    fn names_by_detail() {
        let mut map = map();
        map.push(Feature::new(FeatureType::StreetMain, "E4", 5));
        map.push(Feature::new(FeatureType::StreetFirst, "Road", 5));
        map.push(Feature::new(FeatureType::StreetSecond, "Street", 5));
        remove_names(&mut map, 6, false);
        let names: Vec<_> = map.features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["", "Road", "Street"]);
        remove_names(&mut map, 4, false);
        let names: Vec<_> = map.features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["", "", "Street"]);
    }

    #[test]
    fn duplicates_are_removed() {
        let mut map = map();
        map.push(square(FeatureType::Water, 150.));
        map.push(square(FeatureType::Water, 150.));
        map.push(square(FeatureType::Park, 150.));
        remove_duplicates(&mut map);
        assert_eq!(map.len(), 2);
    }
}
