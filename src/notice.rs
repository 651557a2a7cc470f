//! Feature notices and the draw order.
//!
//! A notice selects one polygon of one feature for drawing. Notices refer
//! to the feature map by index and only live for one processing pass.

use tracing::debug;
use crate::feature::FeatureMap;
use crate::style::{draw_order, DrawSettings, Setting};


//------------ FeatureNotice -------------------------------------------------

/// A polygon selected for drawing.
#[derive(Clone, Debug)]
pub struct FeatureNotice<'a> {
    /// The draw order. Lower values are drawn first.
    pub draw_order: i32,

    /// Is this the border pass of the polygon?
    pub border: bool,

    /// The index of the feature in the feature map.
    pub feature: usize,

    /// The index of the polygon within the feature.
    pub poly: usize,

    /// The setting for the feature’s type and scale level.
    pub setting: Option<&'a Setting>,

    /// The aggregation status of a point marker.
    pub poi_status: PoiStatus,

    /// Is the notice drawn?
    pub visible: bool,
}


//------------ PoiStatus -----------------------------------------------------

/// How many markers a point marker stands for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PoiStatus {
    /// The marker only stands for itself.
    #[default]
    Single,

    /// Other markers of the same type have been folded into it.
    MultiSame,

    /// Markers of a different type have been folded into it.
    MultiDifferent,
}


//------------ build_notices -------------------------------------------------

/// Creates the notices for all polygons of a feature map.
///
/// With `single_draw`, street polygons get a second notice for the fill
/// pass so that the border can be drawn underneath all fills. The result
/// is sorted by draw order, keeping the input order for equal keys.
pub fn build_notices<'a>(
    map: &FeatureMap,
    settings: Option<&'a dyn DrawSettings>,
    single_draw: bool,
) -> Vec<FeatureNotice<'a>> {
    let mut res = Vec::new();
    for (index, feature) in map.features.iter().enumerate() {
        let setting = settings.and_then(|settings| {
            settings.settings_for(feature.feature_type, feature.scale_level)
        });
        let order = |poly, border| match settings {
            Some(settings) => settings.draw_order(feature, poly, border),
            None => draw_order(feature, poly, border),
        };
        for poly in 0..feature.polygons.len() {
            res.push(FeatureNotice {
                draw_order: order(poly, true),
                border: true,
                feature: index,
                poly,
                setting,
                poi_status: PoiStatus::Single,
                visible: true,
            });
            if single_draw && feature.feature_type.is_street() {
                res.push(FeatureNotice {
                    draw_order: order(poly, false),
                    border: false,
                    feature: index,
                    poly,
                    setting,
                    poi_status: PoiStatus::Single,
                    visible: true,
                });
            }
        }
    }
    sort_notices(&mut res);
    debug!("created {} feature notices", res.len());
    res
}

/// Sorts notices by draw order.
///
/// The sort is stable, so sorting twice changes nothing.
pub fn sort_notices(notices: &mut [FeatureNotice]) {
    notices.sort_by_key(|notice| notice.draw_order)
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use kurbo::Size;
    use crate::feature::{Feature, FeatureType, Polygon, RoadAttrs};
    use crate::style::StyleTable;
    use crate::world::{Coord, WorldBox};

    fn map() -> FeatureMap {
        let mut map = FeatureMap::new(
            WorldBox::new(Coord::new(0, 0), Coord::new(1000, 1000)),
            Size::new(256., 256.), 10
        );
        map.push(
            Feature::new(FeatureType::StreetMain, "A", 10).with_polygon(
                Polygon::road(
                    vec![Coord::new(0, 0), Coord::new(10, 10)],
                    RoadAttrs::default()
                )
            )
        );
        map.push(
            Feature::new(FeatureType::Water, "Lake", 10)
                .with_polygon(Polygon::closed(vec![
                    Coord::new(0, 0), Coord::new(0, 100), Coord::new(100, 0)
                ]))
                .with_polygon(Polygon::closed(vec![
                    Coord::new(200, 0), Coord::new(200, 100),
                    Coord::new(300, 0)
                ]))
        );
        map.push(
            Feature::new(FeatureType::Land, "Land", 10).with_polygon(
                Polygon::closed(vec![Coord::new(0, 0), Coord::new(1000, 0)])
            )
        );
        map
    }

    #[test]
    fn sorted_by_draw_order() {
        let map = map();
        let notices = build_notices(&map, None, false);
        let order: Vec<_> = notices.iter().map(|n| n.draw_order).collect();
        assert_eq!(order, [0, 3, 3, 159]);
        assert_eq!(notices[1].poly, 0);
        assert_eq!(notices[2].poly, 1);
    }

    #[test]
    fn single_draw_doubles_streets() {
        let map = map();
        let table = StyleTable::default();
        let notices = build_notices(&map, Some(&table as &dyn DrawSettings), true);
        assert_eq!(notices.len(), 5);
        let street: Vec<_> = notices.iter().filter(|n| n.feature == 0)
            .map(|n| (n.draw_order, n.border)).collect();
        assert_eq!(street, [(159, true), (189, false)]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let map = map();
        let mut notices = build_notices(&map, None, true);
        let before: Vec<_> = notices.iter().map(|n| (n.feature, n.poly, n.border)).collect();
        sort_notices(&mut notices);
        let after: Vec<_> = notices.iter().map(|n| (n.feature, n.poly, n.border)).collect();
        assert_eq!(before, after);
    }
}
