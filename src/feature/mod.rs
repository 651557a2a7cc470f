//! The features the pipeline works on.
//!
//! A [`FeatureMap`] owns a sequence of [`Feature`]s which in turn own their
//! [`Polygon`]s. Everything further down the pipeline refers to features
//! and polygons by index.

use std::fs;
use std::path::Path;
use kurbo::Size;
use serde::Deserialize;
use crate::error::Error;
use crate::world::{Coord, WorldBox};

pub use self::polygon::{
    CoordIter, EntryRestriction, Polygon, RoadAttrs, point_at_length,
    polyline_length_m,
};

pub mod polygon;


//------------ FeatureType ---------------------------------------------------

/// The type of a feature.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    StreetMain,
    StreetFirst,
    StreetSecond,
    StreetThird,
    StreetFourth,
    BuiltupArea,
    Park,
    Forest,
    Building,
    Water,
    Island,
    #[serde(rename = "PEDESTRIANAREA")]
    PedestrianArea,
    #[serde(rename = "AIRCRAFTROAD")]
    AircraftRoad,
    Land,
    BuiltupAreaSquare,
    BuiltupAreaSmall,
    WaterLine,
    Ferry,
    Railway,
    #[serde(rename = "INDIVIDUALBUILDING")]
    IndividualBuilding,
    #[serde(rename = "NATIONALPARK")]
    NationalPark,
    Ocean,
    Border,
    #[serde(rename = "AIRPORTGROUND")]
    AirportGround,
    CartographicGreenArea,
    CartographicGround,
    Route,
    RouteContinuation,
    ParkCar,
    Empty,
    Symbol,
    TrafficInfo,
    RouteOrigin,
    RouteDestination,
    Poi,
    Event,
    Walkway,
    WaterInPark,
    IslandInBua,
    IslandInWaterInPark,
    IslandInWaterInParkBua,
    IslandInWaterInParkIsland,
    BuaOnIsland,
}

impl FeatureType {
    /// Returns whether this is one of the five road classes.
    pub fn is_road_class(self) -> bool {
        matches!(
            self,
            FeatureType::StreetMain | FeatureType::StreetFirst
            | FeatureType::StreetSecond | FeatureType::StreetThird
            | FeatureType::StreetFourth
        )
    }

    /// Returns whether features of this type are drawn as streets.
    pub fn is_street(self) -> bool {
        self.is_road_class() || self == FeatureType::Walkway
    }

    pub fn is_builtup_area(self) -> bool {
        matches!(
            self,
            FeatureType::BuiltupArea | FeatureType::BuiltupAreaSquare
            | FeatureType::BuiltupAreaSmall
        )
    }

    /// Returns whether the type is an area that may carry its label
    /// position as a separate single-coordinate polygon.
    pub fn is_large_area(self) -> bool {
        matches!(
            self,
            FeatureType::IndividualBuilding | FeatureType::AircraftRoad
            | FeatureType::CartographicGround
            | FeatureType::CartographicGreenArea | FeatureType::Park
            | FeatureType::NationalPark | FeatureType::Building
            | FeatureType::Land | FeatureType::Water | FeatureType::Island
            | FeatureType::WaterInPark | FeatureType::IslandInBua
        )
    }

    /// Returns whether the type is drawn as a point marker.
    pub fn is_point(self) -> bool {
        matches!(self, FeatureType::Poi | FeatureType::TrafficInfo)
    }
}


//------------ PoiType -------------------------------------------------------

/// The subtype of a point of interest.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq,
    PartialOrd
)]
#[serde(transparent)]
pub struct PoiType(pub u16);

impl PoiType {
    pub const UNKNOWN: Self = PoiType(0);
    pub const AIRPORT: Self = PoiType(1);
    pub const CITY_CENTRE: Self = PoiType(11);
    pub const FERRY_TERMINAL: Self = PoiType(17);
    pub const HOSPITAL: Self = PoiType(23);
    pub const HOTEL: Self = PoiType(24);
    pub const PETROL_STATION: Self = PoiType(31);
    pub const RESTAURANT: Self = PoiType(39);
    pub const RAILWAY_STATION: Self = PoiType(36);
    pub const POST_OFFICE: Self = PoiType(34);
    pub const PARKING_GARAGE: Self = PoiType(29);
    pub const TOURIST_ATTRACTION: Self = PoiType(45);
}


//------------ Feature -------------------------------------------------------

/// A single semantic map object.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "FeatureData")]
pub struct Feature {
    /// The type of the feature.
    pub feature_type: FeatureType,

    /// The name as displayed.
    pub name: String,

    /// The name before abbreviation or other rewriting.
    pub basename: String,

    /// The scale level the feature belongs to.
    pub scale_level: u8,

    /// The country the feature is located in.
    pub country: u16,

    /// Whether the feature’s text should be displayed.
    pub display_text: bool,

    /// The lower left corner of the feature’s label.
    pub text_coord: Option<Coord>,

    /// The font size of the label.
    pub font_size: u8,

    /// The angle the label starts at in degrees.
    pub text_start: f64,

    /// The feature’s polygons.
    pub polygons: Vec<Polygon>,

    /// The variant specific data.
    pub kind: FeatureKind,
}

impl Feature {
    pub fn new(
        feature_type: FeatureType, name: impl Into<String>, scale_level: u8
    ) -> Self {
        let name = name.into();
        Feature {
            feature_type,
            basename: name.clone(),
            name,
            scale_level,
            country: 0,
            display_text: false,
            text_coord: None,
            font_size: 0,
            text_start: 0.,
            polygons: Vec::new(),
            kind: FeatureKind::default_for(feature_type),
        }
    }

    pub fn with_polygon(mut self, polygon: Polygon) -> Self {
        self.polygons.push(polygon);
        self
    }

    pub fn with_kind(mut self, kind: FeatureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn polygon(&self, index: usize) -> Option<&Polygon> {
        self.polygons.get(index)
    }

    pub fn poi(&self) -> Option<&PoiInfo> {
        match self.kind {
            FeatureKind::Poi(ref poi) => Some(poi),
            _ => None
        }
    }

    pub fn poi_type(&self) -> Option<PoiType> {
        self.poi().map(|poi| poi.poi_type)
    }

    pub fn is_city_centre(&self) -> bool {
        self.poi_type() == Some(PoiType::CITY_CENTRE)
    }

    /// Returns whether two features are of the same type.
    ///
    /// Points of interest also need to agree on their subtype.
    pub fn equals_type(&self, other: &Feature) -> bool {
        self.feature_type == other.feature_type
        && self.poi_type() == other.poi_type()
    }

    /// Returns the anchor coordinate of a point feature.
    pub fn anchor(&self) -> Option<Coord> {
        self.polygons.first().and_then(Polygon::first)
    }

    /// The sum of the lengths of all polygons in meters.
    pub fn length_m(&self) -> f64 {
        self.polygons.iter().map(Polygon::length_m).sum()
    }

    /// The sum of the areas of all polygons in square meters.
    pub fn area_m2(&self) -> f64 {
        self.polygons.iter().map(Polygon::area_m2).sum()
    }

    pub fn bbox(&self) -> Option<WorldBox> {
        let mut res: Option<WorldBox> = None;
        for bbox in self.polygons.iter().filter_map(Polygon::bbox) {
            match res {
                Some(ref mut res) => res.union(&bbox),
                None => res = Some(bbox),
            }
        }
        res
    }
}


//------------ FeatureKind ---------------------------------------------------

/// The variant specific data of a feature.
#[derive(Clone, Debug, Default)]
pub enum FeatureKind {
    #[default]
    Plain,

    /// A road. Its attributes live with each polygon.
    Road,

    Poi(PoiInfo),
    TrafficInfo(TrafficInfo),
    Symbol(SymbolInfo),
    Event(EventInfo),
}

impl FeatureKind {
    /// Returns the natural kind for a feature type.
    pub fn default_for(feature_type: FeatureType) -> Self {
        match feature_type {
            t if t.is_street() => FeatureKind::Road,
            FeatureType::Poi => FeatureKind::Poi(PoiInfo::default()),
            FeatureType::TrafficInfo => {
                FeatureKind::TrafficInfo(TrafficInfo::default())
            }
            FeatureType::Symbol => {
                FeatureKind::Symbol(SymbolInfo::default())
            }
            FeatureType::Event => FeatureKind::Event(EventInfo::default()),
            _ => FeatureKind::Plain,
        }
    }
}


//------------ FeatureData ---------------------------------------------------

/// The serialized form of a feature.
///
/// Variant data is given in a table named after the variant. Which of them
/// is used depends on the feature type.
#[derive(Clone, Debug, Deserialize)]
struct FeatureData {
    #[serde(rename = "type")]
    feature_type: FeatureType,

    #[serde(default)]
    name: String,

    basename: Option<String>,

    #[serde(default)]
    scale_level: u8,

    #[serde(default)]
    country: u16,

    #[serde(default)]
    polygons: Vec<Polygon>,

    poi: Option<PoiInfo>,
    traffic: Option<TrafficInfo>,
    symbol: Option<SymbolInfo>,
    event: Option<EventInfo>,
}

impl From<FeatureData> for Feature {
    fn from(data: FeatureData) -> Self {
        let kind = match FeatureKind::default_for(data.feature_type) {
            FeatureKind::Poi(default) => {
                FeatureKind::Poi(data.poi.unwrap_or(default))
            }
            FeatureKind::TrafficInfo(default) => {
                FeatureKind::TrafficInfo(data.traffic.unwrap_or(default))
            }
            FeatureKind::Symbol(default) => {
                FeatureKind::Symbol(data.symbol.unwrap_or(default))
            }
            FeatureKind::Event(default) => {
                FeatureKind::Event(data.event.unwrap_or(default))
            }
            kind => kind
        };
        Feature {
            feature_type: data.feature_type,
            basename: data.basename.unwrap_or_else(|| data.name.clone()),
            name: data.name,
            scale_level: data.scale_level,
            country: data.country,
            display_text: false,
            text_coord: None,
            font_size: 0,
            text_start: 0.,
            polygons: data.polygons,
            kind,
        }
    }
}


//------------ PoiInfo -------------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PoiInfo {
    pub poi_type: PoiType,

    /// Extra information, the size class for city centres.
    pub extra_info: u8,

    /// An image to use instead of the default symbol.
    pub image: Option<String>,

    pub categories: Vec<u16>,
}

impl PoiInfo {
    pub fn new(poi_type: PoiType) -> Self {
        PoiInfo { poi_type, .. Default::default() }
    }

    pub fn with_extra_info(mut self, extra_info: u8) -> Self {
        self.extra_info = extra_info;
        self
    }
}


//------------ TrafficInfo ---------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrafficInfo {
    pub incident: u16,

    /// Does the incident affect both directions?
    pub both_directions: bool,

    /// Start of validity in seconds since the epoch.
    pub start_time: u32,

    /// End of validity in seconds since the epoch.
    pub end_time: u32,

    /// The angle of the road at the incident in degrees.
    pub angle: f64,
}


//------------ SymbolInfo ----------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SymbolInfo {
    pub symbol: SymbolKind,
    pub image: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    #[default]
    Pin,
    UserDefined,
}


//------------ EventInfo -----------------------------------------------------

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventInfo {
    pub id: u32,
    pub start_date: u32,
    pub end_date: u32,
    pub strings: Vec<String>,
    pub categories: Vec<u16>,
}


//------------ FeatureMap ----------------------------------------------------

/// A collection of features for one bounding box.
#[derive(Clone, Debug, Deserialize)]
pub struct FeatureMap {
    /// The features in the order they were created.
    #[serde(default, rename = "feature")]
    pub features: Vec<Feature>,

    /// The world bounding box of the map.
    pub bbox: WorldBox,

    /// The size of the image in pixels.
    #[serde(with = "screen_size")]
    pub screen_size: Size,

    /// The scale level the map was created for.
    #[serde(default)]
    pub scale_level: u8,

    #[serde(default)]
    pub transportation: Transportation,

    /// The angle of the map’s start direction in degrees.
    #[serde(default)]
    pub start_angle: f64,

    #[serde(default = "default_true")]
    pub driving_on_right: bool,
}

impl FeatureMap {
    pub fn new(bbox: WorldBox, screen_size: Size, scale_level: u8) -> Self {
        FeatureMap {
            features: Vec::new(),
            bbox,
            screen_size,
            scale_level,
            transportation: Transportation::default(),
            start_angle: 0.,
            driving_on_right: true,
        }
    }

    /// Loads a feature map from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|err| {
            Error::io(path, err)
        })?;
        toml::from_str(&data).map_err(|err| Error::parse(path, err))
    }

    /// Returns an empty map with the same frame.
    pub fn empty_like(&self) -> Self {
        FeatureMap {
            features: Vec::new(),
            bbox: self.bbox,
            screen_size: self.screen_size,
            scale_level: self.scale_level,
            transportation: self.transportation,
            start_angle: self.start_angle,
            driving_on_right: self.driving_on_right,
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature)
    }

    pub fn feature(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns whether the image is small.
    pub fn is_small_image(&self, small_width: f64) -> bool {
        self.screen_size.width <= small_width
    }
}

fn default_true() -> bool {
    true
}

mod screen_size {
    use kurbo::Size;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D
    ) -> Result<Size, D::Error> {
        let [width, height] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Size::new(width, height))
    }
}


//------------ Transportation ------------------------------------------------

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Transportation {
    #[default]
    Car,
    Pedestrian,
    Bicycle,
    PublicTransport,
}


//============ Testing =======================================================
