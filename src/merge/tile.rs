//! Joining road features for tile content.
//!
//! Tiles transmit roads as few, long polylines. Road features of the same
//! type and base name are joined at shared end points, continuing with the
//! longest candidate at crossings. The result is simplified for the tile’s
//! resolution.

use serde::Deserialize;
use tracing::{debug, trace};
use crate::feature::{polyline_length_m, Feature, FeatureMap, FeatureType};
use crate::feature::{Polygon, RoadAttrs};
use crate::names::{abbreviate, Language};
use crate::world::Coord;
use super::simplify::{filter_open_polyline, straighten};
use super::{joined_coords, merge_roads, CrossingPolicy, MergedChain, Segment};


//------------ MergeOptions --------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// The maximum deviation of simplified roads in pixels.
    pub street_filter_factor: f64,

    /// The maximum distance in world units of a skipped point when
    /// straightening.
    pub straighten_cutoff: f64,

    /// The detail level from which ramps are dropped.
    pub ramps_from_detail: u8,

    /// The minimum length of a merged road in meters.
    pub min_length_m: f64,

    /// The detail level from which short roads are dropped.
    pub min_length_from_detail: u8,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            street_filter_factor: 2.,
            straighten_cutoff: 300.,
            ramps_from_detail: 3,
            min_length_m: 500.,
            min_length_from_detail: 4,
        }
    }
}

impl MergeOptions {
    /// The maximum deviation in meters at a detail level.
    pub fn max_deviation(&self, detail: u8, meters_per_pixel: f64) -> f64 {
        let res = self.street_filter_factor * meters_per_pixel;
        if detail > 3 { res * 2. } else { res }
    }
}


//------------ RoadPiece -----------------------------------------------------

#[derive(Clone, Debug)]
struct RoadPiece<'a> {
    feature: usize,
    feature_type: FeatureType,
    basename: &'a str,
    coords: Vec<Coord>,
    length: f64,
    attrs: RoadAttrs,
}

impl<'a> Segment for RoadPiece<'a> {
    fn first(&self) -> Option<Coord> {
        self.coords.first().copied()
    }

    fn last(&self) -> Option<Coord> {
        self.coords.last().copied()
    }

    fn length(&self) -> f64 {
        self.length
    }
}


//------------ merge_tile_streets --------------------------------------------

/// Joins and simplifies the streets of a tile’s feature map.
///
/// Features that aren’t streets are copied unchanged. The merged street
/// takes the place of the first feature of its chain, so the order of the
/// result follows the input.
pub fn merge_tile_streets(
    map: &FeatureMap,
    detail: u8,
    meters_per_pixel: f64,
    options: &MergeOptions,
    language: Language,
) -> FeatureMap {
    let drop_ramps = detail >= options.ramps_from_detail;
    let mut pieces = Vec::new();
    for (index, feature) in map.features.iter().enumerate() {
        if !feature.feature_type.is_street() {
            continue
        }
        let attrs = feature.polygons.first().and_then(|poly| {
            poly.road_attrs().copied()
        }).unwrap_or_default();
        if drop_ramps && attrs.ramp {
            trace!("dropping ramp '{}'", feature.name);
            continue
        }
        let coords = joined_coords(feature);
        if coords.is_empty() {
            continue
        }
        pieces.push(RoadPiece {
            feature: index,
            feature_type: feature.feature_type,
            basename: &feature.basename,
            length: polyline_length_m(coords.iter().copied()),
            coords,
            attrs,
        });
    }

    let chains = merge_roads(
        &pieces,
        |a, b| a.feature_type == b.feature_type && a.basename == b.basename,
        CrossingPolicy::Split
    );

    // The merged feature for each feature that starts a chain.
    let mut merged: Vec<Option<Feature>> = vec![None; map.len()];
    let max_deviation = options.max_deviation(detail, meters_per_pixel);
    for chain in &chains {
        let seed = match chain.seed() {
            Some(seed) => &pieces[seed],
            None => continue,
        };
        if let Some(feature) = merged_feature(
            map, &pieces, chain, seed, detail, max_deviation, options, language
        ) {
            merged[seed.feature] = Some(feature);
        }
    }

    let mut res = map.empty_like();
    for (index, feature) in map.features.iter().enumerate() {
        if !feature.feature_type.is_street() {
            res.push(feature.clone())
        }
        else if let Some(feature) = merged[index].take() {
            res.push(feature)
        }
    }
    debug!(
        "tile merge at detail {}: {} streets into {} chains, {} features",
        detail, pieces.len(), chains.len(), res.len()
    );
    res
}

#[allow(clippy::too_many_arguments)]
fn merged_feature(
    map: &FeatureMap,
    pieces: &[RoadPiece],
    chain: &MergedChain,
    seed: &RoadPiece,
    detail: u8,
    max_deviation: f64,
    options: &MergeOptions,
    language: Language,
) -> Option<Feature> {
    let source = map.feature(seed.feature)?;
    let paths = chain.paths(|index| pieces[index].coords.clone());
    let length: f64 = paths.iter().map(|path| {
        polyline_length_m(path.iter().copied())
    }).sum();
    if detail >= options.min_length_from_detail && length < options.min_length_m {
        trace!("dropping short road '{}', {} m", source.name, length);
        return None
    }

    let exempt = seed.attrs.roundabout || seed.attrs.ramp;
    let mut res = Feature::new(
        source.feature_type,
        abbreviate(&source.basename, language),
        source.scale_level
    );
    res.basename = source.basename.clone();
    res.country = source.country;
    for path in paths {
        let mut coords = filter_open_polyline(&path, max_deviation);
        if !exempt {
            coords = straighten(&coords, options.straighten_cutoff);
        }
        res.polygons.push(Polygon::road(coords, seed.attrs));
    }
    Some(res)
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use kurbo::Size;
    use crate::world::{WorldBox, METER_TO_MC2SCALE};

    /// A straight east-west street from `from` to `to` meters.
    fn street(name: &str, from: f64, to: f64, attrs: RoadAttrs) -> Feature {
        let lon = |m: f64| (m * METER_TO_MC2SCALE) as i32;
        Feature::new(FeatureType::StreetSecond, name, 5).with_polygon(
            Polygon::road(
                vec![
                    Coord::new(0, lon(from)),
                    Coord::new(0, lon((from + to) / 2.)),
                    Coord::new(0, lon(to))
                ],
                attrs
            )
        )
    }

    fn map(features: Vec<Feature>) -> FeatureMap {
        let mut map = FeatureMap::new(
            WorldBox::new(Coord::new(0, 0), Coord::new(1_000_000, 1_000_000)),
            Size::new(256., 256.), 5
        );
        features.into_iter().for_each(|feature| map.push(feature));
        map
    }

    #[test]
    fn streets_join_and_simplify() {
        let mut water = Feature::new(FeatureType::Water, "Lake", 5);
        water.polygons.push(Polygon::closed(vec![Coord::new(5, 5)]));
        let map = map(vec![
            street("Main Street", 0., 400., RoadAttrs::default()),
            water,
            street("Main Street", 400., 900., RoadAttrs::default()),
        ]);
        let res = merge_tile_streets(&map, 2, 10., &MergeOptions::default(), Language::English);
        assert_eq!(res.len(), 2);
        assert_eq!(res.features[0].feature_type, FeatureType::StreetSecond);
        assert_eq!(res.features[0].name, "Main St");
        assert_eq!(res.features[0].basename, "Main Street");
        assert_eq!(res.features[0].polygons.len(), 1);
        // Straight, so only the ends remain.
        assert_eq!(res.features[0].polygons[0].len(), 2);
        assert_eq!(res.features[1].feature_type, FeatureType::Water);
    }

    #[test]
    fn short_roads_dropped_at_coarse_detail() {
        let map = map(vec![street("Lane", 0., 300., RoadAttrs::default())]);
        let options = MergeOptions::default();
        assert_eq!(merge_tile_streets(&map, 3, 10., &options, Language::English).len(), 1);
        assert_eq!(merge_tile_streets(&map, 4, 10., &options, Language::English).len(), 0);
    }

    #[test]
    fn ramps_dropped_from_detail() {
        let ramp = RoadAttrs { ramp: true, .. Default::default() };
        let map = map(vec![
            street("Exit", 0., 600., ramp),
            street("Main", 0., 600., RoadAttrs::default()),
        ]);
        let options = MergeOptions::default();
        assert_eq!(merge_tile_streets(&map, 2, 10., &options, Language::English).len(), 2);
        let res = merge_tile_streets(&map, 3, 10., &options, Language::English);
        assert_eq!(res.len(), 1);
        assert_eq!(res.features[0].name, "Main");
    }

    #[test]
    fn crossing_starts_new_polygon() {
        let lon = |m: f64| (m * METER_TO_MC2SCALE) as i32;
        let mut branch = Feature::new(FeatureType::StreetSecond, "Main", 5);
        branch.polygons.push(Polygon::road(
            vec![Coord::new(0, lon(400.)), Coord::new(lon(100.), lon(400.))],
            RoadAttrs::default()
        ));
        let map = map(vec![
            street("Main", 0., 400., RoadAttrs::default()),
            street("Main", 400., 1400., RoadAttrs::default()),
            branch,
        ]);
        let res = merge_tile_streets(&map, 2, 10., &MergeOptions::default(), Language::English);
        assert_eq!(res.len(), 2);
        let polys = &res.features[0].polygons;
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[0].last(), polys[1].first());
        assert_eq!(polys[1].last(), Some(Coord::new(0, lon(1400.))));
    }
}
