//! Joining street segments of the same name for labelling.
//!
//! A street name placed along a single short segment rarely fits. Before
//! placing labels, segments of the same street that continue each other
//! are joined so the label can use the whole length.

use tracing::debug;
use crate::feature::{polyline_length_m, FeatureMap, FeatureType};
use crate::world::Coord;
use super::{joined_coords, merge_roads, CrossingPolicy, Segment};


//------------ StreetPiece ---------------------------------------------------

/// A street feature taking part in a name merge.
#[derive(Clone, Debug)]
struct StreetPiece<'a> {
    feature: usize,
    feature_type: FeatureType,
    name: &'a str,
    scale_level: u8,
    coords: Vec<Coord>,
    length: f64,
}

impl<'a> Segment for StreetPiece<'a> {
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


//------------ MergedStreet --------------------------------------------------

/// The centreline of a street made of one or more features.
#[derive(Clone, Debug)]
pub struct MergedStreet {
    /// The indexes of the features in the feature map.
    ///
    /// The first one is the one the merge started with.
    pub features: Vec<usize>,

    /// The joined coordinates.
    pub coords: Vec<Coord>,

    /// The length of the centreline in meters.
    pub length_m: f64,
}

impl MergedStreet {
    pub fn is_merged(&self) -> bool {
        self.features.len() > 1
    }
}


//------------ merge_street_names --------------------------------------------

/// Joins street features that continue each other.
///
/// Two features are joined if they share an end point and have the same
/// type, name and scale level. At end points where more than one such
/// feature meets, the streets are not joined. Features without
/// coordinates are skipped. Each candidate ends up in exactly one result.
pub fn merge_street_names(
    map: &FeatureMap, candidates: &[usize]
) -> Vec<MergedStreet> {
    let pieces: Vec<_> = candidates.iter().filter_map(|&index| {
        let feature = map.feature(index)?;
        let coords = joined_coords(feature);
        if coords.is_empty() {
            return None
        }
        Some(StreetPiece {
            feature: index,
            feature_type: feature.feature_type,
            name: &feature.name,
            scale_level: feature.scale_level,
            length: polyline_length_m(coords.iter().copied()),
            coords,
        })
    }).collect();

    let chains = merge_roads(
        &pieces,
        |a, b| {
            a.feature_type == b.feature_type
            && a.name == b.name
            && a.scale_level == b.scale_level
        },
        CrossingPolicy::Stop
    );

    let res: Vec<_> = chains.into_iter().map(|chain| {
        let mut features: Vec<_> = chain.indexes().map(|index| {
            pieces[index].feature
        }).collect();
        if let Some(seed) = chain.seed() {
            let seed = pieces[seed].feature;
            features.retain(|&index| index != seed);
            features.insert(0, seed);
        }
        let coords = chain.coords(|index| pieces[index].coords.clone());
        MergedStreet {
            features,
            length_m: polyline_length_m(coords.iter().copied()),
            coords,
        }
    }).collect();
    debug!(
        "merged {} street features into {} streets",
        pieces.len(), res.len()
    );
    res
}


//------------ street_names_at_scale -----------------------------------------

/// Returns whether names of a street type are shown at a scale level.
///
/// Merged names need a finer scale than unmerged ones. Small images
/// show names one scale level earlier. Types other than the five road
/// classes never get names through this path.
pub fn street_names_at_scale(
    feature_type: FeatureType, scale_level: u8, merge: bool, small_image: bool
) -> bool {
    let s = u8::from(small_image);
    let min = match (feature_type, merge) {
        (FeatureType::StreetFourth, true) => 10,
        (FeatureType::StreetThird, true) => 8,
        (FeatureType::StreetSecond, true) => 7,
        (FeatureType::StreetFirst, true) => 7,
        (FeatureType::StreetMain, true) => 7,
        (FeatureType::StreetFourth, false) => 9,
        (FeatureType::StreetThird, false) => 8,
        (FeatureType::StreetSecond, false) => 7,
        (FeatureType::StreetFirst, false) => 6,
        (FeatureType::StreetMain, false) => 6,
        _ => return false
    };
    scale_level >= min - s
}


//============ Testing =======================================================
