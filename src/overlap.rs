//! Aggregation of overlapping point markers.
//!
//! Points of interest and traffic information are drawn as markers of a
//! fixed pixel size. Markers that would overlap are folded into the most
//! important one which then stands for all of them.

use std::collections::{BTreeMap, HashSet};
use serde::Deserialize;
use tracing::{debug, trace};
use crate::boxes::ObjectBoxes;
use crate::feature::{FeatureMap, PoiType};
use crate::notice::{sort_notices, FeatureNotice, PoiStatus};
use crate::projection::Projection;
use crate::world::WorldBox;


//------------ OverlapOptions ------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OverlapOptions {
    /// Limit the number of points of interest by dropping categories.
    pub poi_filtering: bool,

    /// Also return the markers that have been folded into others.
    pub include_hidden: bool,

    /// The share of the image markers may cover.
    pub poi_factor: f64,

    /// The size of a marker in pixels.
    pub poi_size_px: f64,
}

impl Default for OverlapOptions {
    fn default() -> Self {
        OverlapOptions {
            poi_filtering: true,
            include_hidden: false,
            poi_factor: 0.020,
            poi_size_px: 8.,
        }
    }
}

impl OverlapOptions {
    /// Returns the maximum number of markers for an image size.
    pub fn max_pois(&self, width: f64, height: f64) -> usize {
        let marker = self.poi_size_px * self.poi_size_px;
        if marker <= 0. {
            return usize::MAX
        }
        (self.poi_factor * width * height / marker) as usize
    }
}


//------------ filter_overlaps -----------------------------------------------

/// Folds overlapping point markers into each other.
///
/// Takes all notices of a pass and returns them again, sorted by draw
/// order, with the point markers reduced. The boxes of the visible markers
/// are returned in a new registry.
pub fn filter_overlaps<'a>(
    map: &FeatureMap,
    projection: &dyn Projection,
    notices: Vec<FeatureNotice<'a>>,
    options: &OverlapOptions,
) -> (Vec<FeatureNotice<'a>>, ObjectBoxes) {
    let (mut points, res): (Vec<_>, Vec<_>) = notices.into_iter()
        .partition(|notice| {
            map.feature(notice.feature).map(|feature| {
                feature.feature_type.is_point()
            }).unwrap_or(false)
        });

    if options.poi_filtering {
        let size = map.screen_size;
        let removed = capped_categories(
            map, &points, options.max_pois(size.width, size.height)
        );
        if !removed.is_empty() {
            points = points.into_iter().enumerate().filter_map(|(i, n)| {
                (!removed.contains(&i)).then_some(n)
            }).collect();
        }
    }

    // The most important marker must end up visible.
    sort_notices(&mut points);

    let lat_diff = projection.lat_diff(options.poi_size_px);
    let lon_diff = projection.lon_diff(options.poi_size_px);
    let mut clusters: Vec<Cluster> = Vec::new();
    for mut notice in points {
        let feature = match map.feature(notice.feature) {
            Some(feature) => feature,
            None => continue,
        };
        let anchor = match feature.anchor() {
            Some(anchor) => anchor,
            None => {
                debug!("skipping marker '{}' without coordinate", feature.name);
                continue
            }
        };
        let bbox = WorldBox {
            min_lat: anchor.lat.saturating_sub(lat_diff),
            max_lat: anchor.lat.saturating_add(lat_diff),
            min_lon: anchor.lon.saturating_sub(lon_diff),
            max_lon: anchor.lon.saturating_add(lon_diff),
        };
        let host = clusters.iter_mut().find(|cluster| {
            cluster.bbox.overlaps(&bbox)
        });
        match host {
            Some(host) => {
                notice.visible = false;
                if host.host.poi_status != PoiStatus::MultiDifferent {
                    let same = map.feature(host.host.feature).map(|other| {
                        other.equals_type(feature)
                    }).unwrap_or(false);
                    host.host.poi_status = if same {
                        PoiStatus::MultiSame
                    }
                    else {
                        PoiStatus::MultiDifferent
                    };
                }
                trace!("folding marker '{}'", feature.name);
                host.folded.insert(0, notice);
            }
            None => {
                clusters.push(Cluster { host: notice, bbox, folded: Vec::new() })
            }
        }
    }

    // Hidden markers stay right behind their host, so whole groups are
    // sorted.
    let mut boxes = ObjectBoxes::new();
    let mut groups: Vec<Vec<FeatureNotice>> = res.into_iter().map(|notice| {
        vec![notice]
    }).collect();
    for cluster in clusters {
        let registers = map.feature(cluster.host.feature).map(|feature| {
            !feature.is_city_centre()
        }).unwrap_or(false);
        if registers {
            boxes.add(marker_box(cluster.bbox), projection);
        }
        let mut group = vec![cluster.host];
        if options.include_hidden {
            group.extend(cluster.folded);
        }
        groups.push(group);
    }
    groups.sort_by_key(|group| {
        group.first().map(|notice| notice.draw_order).unwrap_or_default()
    });
    let res: Vec<_> = groups.into_iter().flatten().collect();
    debug!(
        "{} notices after overlap filter, {} marker boxes",
        res.len(), boxes.len()
    );
    (res, boxes)
}

/// Returns the indexes of notices in categories that need to go.
///
/// Categories are visited from the smallest to the largest. A category
/// that would reach the maximum is removed completely. City centres are
/// never removed.
fn capped_categories(
    map: &FeatureMap, points: &[FeatureNotice], max_pois: usize
) -> HashSet<usize> {
    let mut categories: BTreeMap<PoiType, Vec<usize>> = BTreeMap::new();
    for (index, notice) in points.iter().enumerate() {
        let poi_type = match map.feature(notice.feature) {
            Some(feature) if !feature.is_city_centre() => {
                match feature.poi_type() {
                    Some(poi_type) => poi_type,
                    None => continue,
                }
            }
            _ => continue,
        };
        categories.entry(poi_type).or_default().push(index);
    }
    let mut categories: Vec<_> = categories.into_iter().collect();
    categories.sort_by_key(|(_, items)| items.len());

    let mut sum = 0;
    let mut res = HashSet::new();
    for (poi_type, items) in categories {
        if sum + items.len() >= max_pois {
            debug!(
                "removing {} markers of category {}", items.len(), poi_type.0
            );
            res.extend(items);
        }
        else {
            sum += items.len();
        }
    }
    res
}

/// Returns the box a marker occupies for label placement.
///
/// Markers are drawn with their anchor in the lower left corner, so the
/// box is moved half a box to the north-east and grown by a fifth.
fn marker_box(bbox: WorldBox) -> WorldBox {
    let lat = (bbox.height() / 2) as i32;
    let lon = (bbox.lon_diff() / 2) as i32;
    let mut res = bbox.translated(lat, lon);
    res.increase_factor(0.2);
    res
}


//------------ Cluster -------------------------------------------------------

/// A visible marker and the markers folded into it.
struct Cluster<'a> {
    host: FeatureNotice<'a>,
    bbox: WorldBox,

    /// The folded markers, most recently folded first.
    folded: Vec<FeatureNotice<'a>>,
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use kurbo::Size;
    use crate::feature::{Feature, FeatureKind, FeatureType, PoiInfo, Polygon};
    use crate::notice::build_notices;
    use crate::projection::CosLatProjection;
    use crate::world::Coord;

    fn map() -> FeatureMap {
        FeatureMap::new(
            WorldBox::new(Coord::new(0, 0), Coord::new(25600, 25600)),
            Size::new(256., 256.), 10
        )
    }

    fn projection(map: &FeatureMap) -> CosLatProjection {
        CosLatProjection::new(map.bbox, map.screen_size)
    }

    fn poi(poi_type: PoiType, lat: i32, lon: i32) -> Feature {
        Feature::new(FeatureType::Poi, "poi", 10)
            .with_kind(FeatureKind::Poi(PoiInfo::new(poi_type)))
            .with_polygon(Polygon::new(vec![Coord::new(lat, lon)]))
    }

    fn city(extra: u8, lat: i32, lon: i32) -> Feature {
        Feature::new(FeatureType::Poi, "city", 10)
            .with_kind(FeatureKind::Poi(
                PoiInfo::new(PoiType::CITY_CENTRE).with_extra_info(extra)
            ))
            .with_polygon(Polygon::new(vec![Coord::new(lat, lon)]))
    }

    fn no_capping() -> OverlapOptions {
        OverlapOptions { poi_filtering: false, .. Default::default() }
    }

    #[test]
    fn three_close_markers_of_same_type() {
        let mut map = map();
        map.push(poi(PoiType::HOTEL, 10000, 10000));
        map.push(poi(PoiType::HOTEL, 10300, 10200));
        map.push(poi(PoiType::HOTEL, 10500, 10600));
        let proj = projection(&map);
        let notices = build_notices(&map, None, false);
        let (res, boxes) = filter_overlaps(&map, &proj, notices, &no_capping());
        let visible: Vec<_> = res.iter().filter(|n| n.visible).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].poi_status, PoiStatus::MultiSame);
        assert_eq!(res.len(), 1);
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn three_close_markers_of_different_types() {
        let mut map = map();
        map.push(poi(PoiType::HOTEL, 10000, 10000));
        map.push(poi(PoiType::HOTEL, 10300, 10200));
        map.push(poi(PoiType::RESTAURANT, 10500, 10600));
        let proj = projection(&map);
        let notices = build_notices(&map, None, false);
        let options = OverlapOptions {
            include_hidden: true, .. no_capping()
        };
        let (res, _) = filter_overlaps(&map, &proj, notices, &options);
        assert_eq!(res.len(), 3);
        let visible: Vec<_> = res.iter().filter(|n| n.visible).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].poi_status, PoiStatus::MultiDifferent);
        // Hidden markers follow their host.
        assert!(res[0].visible);
        assert_eq!(res[0].feature, 0);
        assert_eq!(res[1].feature, 2);
        assert_eq!(res[2].feature, 1);
    }

    #[test]
    fn hidden_markers_stay_with_their_host() {
        let mut map = map();
        map.push(
            Feature::new(FeatureType::TrafficInfo, "roadworks", 10)
                .with_polygon(Polygon::new(vec![Coord::new(10000, 10000)]))
        );
        map.push(poi(PoiType::HOTEL, 10100, 10100));
        map.push(city(3, 20000, 20000));
        let proj = projection(&map);
        let notices = build_notices(&map, None, false);
        let options = OverlapOptions {
            include_hidden: true, .. no_capping()
        };
        let (res, _) = filter_overlaps(&map, &proj, notices, &options);
        let order: Vec<_> = res.iter().map(|n| (n.feature, n.visible)).collect();
        assert_eq!(order, [(0, true), (1, false), (2, true)]);
        assert_eq!(res[0].poi_status, PoiStatus::MultiDifferent);
    }

    #[test]
    fn distant_markers_stay_single() {
        let mut map = map();
        map.push(poi(PoiType::HOTEL, 1000, 1000));
        map.push(poi(PoiType::HOTEL, 20000, 20000));
        let proj = projection(&map);
        let notices = build_notices(&map, None, false);
        let (res, boxes) = filter_overlaps(&map, &proj, notices, &no_capping());
        assert_eq!(res.len(), 2);
        assert!(res.iter().all(|n| n.visible && n.poi_status == PoiStatus::Single));
        assert_eq!(boxes.len(), 2);
    }

    #[test]
    fn capping_removes_categories_but_keeps_cities() {
        let mut map = map();
        // 0.02 * 256 * 256 / 64 = 20 markers allowed.
        for i in 0..15 {
            map.push(poi(PoiType::RESTAURANT, 100, i * 1700));
        }
        for i in 0..10 {
            map.push(poi(PoiType::HOTEL, 20000, i * 2500));
        }
        map.push(city(3, 10000, 10000));
        let proj = projection(&map);
        let notices = build_notices(&map, None, false);
        let (res, boxes) = filter_overlaps(
            &map, &proj, notices, &OverlapOptions::default()
        );
        let types: Vec<_> = res.iter().map(|n| {
            map.features[n.feature].poi_type().unwrap()
        }).collect();
        assert!(types.contains(&PoiType::CITY_CENTRE));
        assert!(types.contains(&PoiType::HOTEL));
        assert!(!types.contains(&PoiType::RESTAURANT));
        // The city centre doesn't occupy space for labels.
        assert_eq!(boxes.len(), 10);
    }
}
