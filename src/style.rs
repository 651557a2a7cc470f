//! Draw settings and the draw order.
//!
//! The pipeline doesn’t paint anything. It only needs to know which
//! feature types are shown at a scale level, how wide streets are and
//! whether their texts go on the map. This is what a [`Setting`] says.

use serde::Deserialize;
use tracing::{trace, warn};
use crate::feature::{Feature, FeatureType};


//------------ Setting -------------------------------------------------------

/// How a feature type is drawn at some scale levels.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Setting {
    /// The fill color as 0xRRGGBB.
    pub color: u32,

    /// The border color as 0xRRGGBB.
    pub border_color: u32,

    /// The width of the fill line in pixels.
    pub line_width: u8,

    /// The width of the border line in pixels.
    pub border_width: u8,

    /// Is the fill drawn?
    pub on_map: bool,

    /// Is the border drawn?
    pub border_on_map: bool,

    /// Is the name drawn?
    pub text_on_map: bool,
}

impl Default for Setting {
    fn default() -> Self {
        Setting {
            color: 0,
            border_color: 0,
            line_width: 3,
            border_width: 5,
            on_map: true,
            border_on_map: true,
            text_on_map: true,
        }
    }
}


//------------ DrawSettings --------------------------------------------------

/// Resolves the setting for a feature type at a scale level.
pub trait DrawSettings {
    fn settings_for(
        &self, feature_type: FeatureType, scale_level: u8
    ) -> Option<&Setting>;

    /// Returns the draw order of a polygon.
    ///
    /// Lower values are drawn first.
    fn draw_order(&self, feature: &Feature, poly: usize, border: bool) -> i32 {
        draw_order(feature, poly, border)
    }
}


//------------ StyleEntry ----------------------------------------------------

/// A setting for a feature type over a range of scale levels.
#[derive(Clone, Debug, Deserialize)]
pub struct StyleEntry {
    #[serde(rename = "type")]
    pub feature_type: FeatureType,

    /// The smallest scale level the entry applies to.
    #[serde(default)]
    pub min_scale: u8,

    /// The largest scale level the entry applies to.
    #[serde(default = "StyleEntry::default_max_scale")]
    pub max_scale: u8,

    #[serde(flatten)]
    pub setting: Setting,
}

impl StyleEntry {
    fn default_max_scale() -> u8 {
        u8::MAX
    }

    fn matches(&self, feature_type: FeatureType, scale_level: u8) -> bool {
        self.feature_type == feature_type
        && self.min_scale <= scale_level
        && scale_level <= self.max_scale
    }
}


//------------ StyleTable ----------------------------------------------------

/// A list of style entries.
///
/// The first entry matching type and scale wins.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct StyleTable {
    entries: Vec<StyleEntry>,
}

impl StyleTable {
    pub fn new(entries: Vec<StyleEntry>) -> Self {
        StyleTable { entries }
    }

    pub fn push(
        &mut self, feature_type: FeatureType, min_scale: u8, max_scale: u8,
        setting: Setting,
    ) {
        self.entries.push(StyleEntry {
            feature_type, min_scale, max_scale, setting
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DrawSettings for StyleTable {
    fn settings_for(
        &self, feature_type: FeatureType, scale_level: u8
    ) -> Option<&Setting> {
        self.entries.iter().find(|entry| {
            entry.matches(feature_type, scale_level)
        }).map(|entry| &entry.setting)
    }
}


//------------ draw_order ----------------------------------------------------

/// Returns the default draw order of a feature’s polygon.
///
/// Background areas come first, then streets in the range 100 to 240
/// ordered by level, border and class, then point features.
pub fn draw_order(feature: &Feature, poly: usize, border: bool) -> i32 {
    use FeatureType::*;

    match feature.feature_type {
        Land => 0,
        BuiltupArea => 1,
        Border => 2,
        Water => 3,
        WaterLine => 4,
        Ferry => 5,
        Island | IslandInBua => 6,
        BuaOnIsland | CartographicGround | CartographicGreenArea
            | Park => 7,
        NationalPark => 8,
        Forest => 9,
        Building => 10,
        PedestrianArea | WaterInPark => 11,
        AirportGround | IslandInWaterInPark | IslandInWaterInParkBua
            | IslandInWaterInParkIsland => 12,
        IndividualBuilding | AircraftRoad => 13,
        Railway => 14,
        Walkway => if border { 15 } else { 16 },
        StreetFourth | StreetThird | StreetSecond | StreetFirst
            | StreetMain => street_draw_order(feature, poly, border),
        BuiltupAreaSquare => 241,
        BuiltupAreaSmall => 242,
        Route => 243,
        RouteOrigin => 244,
        RouteDestination => 245,
        ParkCar => 246,
        TrafficInfo => 252,
        Poi => {
            match feature.poi() {
                Some(poi) if feature.is_city_centre() => {
                    match poi.extra_info {
                        extra @ 1..=12 => 252 + i32::from(extra),
                        _ => 265
                    }
                }
                _ => 266
            }
        }
        Symbol => 268,
        _ => -1
    }
}

fn street_draw_order(feature: &Feature, poly: usize, border: bool) -> i32 {
    let mut class_offset = match feature.feature_type {
        FeatureType::StreetFourth => 1,
        FeatureType::StreetThird => 3,
        FeatureType::StreetSecond => 5,
        FeatureType::StreetFirst => 7,
        FeatureType::StreetMain => 9,
        _ => 0,
    };
    let attrs = feature.polygon(poly).and_then(|poly| {
        poly.road_attrs().copied()
    }).unwrap_or_default();
    if attrs.has_entry_restriction() {
        class_offset -= 1;
    }

    let (level0, level1) = (i32::from(attrs.level0), i32::from(attrs.level1));
    if (level0 - level1).abs() > 1 {
        warn!(
            "level difference {} for '{}', l0={}, l1={}",
            level0 - level1, feature.name, level0, level1
        );
    }

    let (border_offset, fill_offset) = match level0 + level1 {
        i32::MIN..=-4 => (0, 2),
        -3 | -2 => (1, 4),
        -1 => (3, 6),
        0 => (5, 8),
        1 | 2 => (7, 10),
        3 => (9, 12),
        _ => (11, 13),
    };
    let level_offset = if border { border_offset } else { fill_offset };
    let res = 100 + level_offset * 10 + class_offset;
    trace!(
        "street order {} for '{}', class {}, level {}",
        res, feature.name, class_offset, level_offset
    );
    res
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::feature::{
        EntryRestriction, FeatureKind, PoiInfo, PoiType, Polygon, RoadAttrs
    };
    use crate::world::Coord;

    fn street(feature_type: FeatureType, attrs: RoadAttrs) -> Feature {
        Feature::new(feature_type, "x", 10).with_polygon(Polygon::road(
            vec![Coord::new(0, 0), Coord::new(0, 10)], attrs
        ))
    }

    #[test]
    fn street_order() {
        let main = street(FeatureType::StreetMain, RoadAttrs::default());
        assert_eq!(draw_order(&main, 0, true), 159);
        assert_eq!(draw_order(&main, 0, false), 189);

        let restricted = street(FeatureType::StreetFourth, RoadAttrs {
            entry_restrictions: [
                EntryRestriction::NoEntry, EntryRestriction::NoRestrictions
            ],
            .. Default::default()
        });
        assert_eq!(draw_order(&restricted, 0, false), 180);

        let bridge = street(FeatureType::StreetSecond, RoadAttrs {
            level0: 1, level1: 1, .. Default::default()
        });
        assert_eq!(draw_order(&bridge, 0, true), 175);
    }

    #[test]
    fn city_centre_order() {
        let capital = Feature::new(FeatureType::Poi, "Capital", 2).with_kind(
            FeatureKind::Poi(PoiInfo::new(PoiType::CITY_CENTRE).with_extra_info(1))
        );
        let hotel = Feature::new(FeatureType::Poi, "Hotel", 2).with_kind(
            FeatureKind::Poi(PoiInfo::new(PoiType::HOTEL))
        );
        assert_eq!(draw_order(&capital, 0, true), 253);
        assert_eq!(draw_order(&hotel, 0, true), 266);
    }

    #[test]
    fn first_matching_entry_wins() {
        let mut table = StyleTable::default();
        table.push(FeatureType::Water, 0, 5, Setting {
            text_on_map: false, .. Default::default()
        });
        table.push(FeatureType::Water, 0, 20, Setting::default());
        assert!(!table.settings_for(FeatureType::Water, 3).unwrap().text_on_map);
        assert!(table.settings_for(FeatureType::Water, 8).unwrap().text_on_map);
        assert!(table.settings_for(FeatureType::Land, 8).is_none());
    }
}
