//! Labels for streets.
//!
//! Street names are abbreviated and laid out along the centreline. Names
//! that are road numbers get a road sign at the middle of the street
//! instead.

use tracing::trace;
use crate::feature::{polyline_length_m, point_at_length, Feature, FeatureType};
use crate::names::{abbreviate, is_road_sign_name};
use crate::world::{Coord, WorldBox};
use super::curved::place_curved;
use super::{LabelKind, Placer, TextNotice, STREET_FONT_SIZE};


//------------ place_street_text ---------------------------------------------

/// Places the label of a street.
///
/// Returns whether the label was placed.
pub fn place_street_text(placer: &mut Placer, label: &mut TextNotice) -> bool {
    let map = placer.map;
    let feature = match map.feature(label.feature) {
        Some(feature) => feature,
        None => return false,
    };
    if !names_shown(placer, feature.feature_type) {
        return false
    }
    if is_road_sign_name(&feature.name) {
        return place_road_sign(placer, label, feature)
    }

    let text = abbreviate(&feature.name, placer.options.language);
    if placer.has_street_name(&text) {
        trace!("'{}' already labelled", text);
        return false
    }
    let coords = label.centreline(placer.map);
    let dims = placer.measure_glyphs(&text, STREET_FONT_SIZE);
    let curved = match place_curved(
        placer.projection, placer.registry(), &coords, &text, &dims
    ) {
        Some(curved) => curved,
        None => return false,
    };
    for bbox in curved.boxes {
        placer.register(bbox);
    }
    placer.add_street_name(text.clone());
    label.kind = LabelKind::Street;
    label.font_size = STREET_FONT_SIZE;
    label.text = text;
    label.glyphs = curved.glyphs;
    true
}

/// Returns whether street names of a type are shown at the map’s scale.
fn names_shown(placer: &Placer, feature_type: FeatureType) -> bool {
    let scale = placer.scale();
    if scale <= 2 || feature_type == FeatureType::Ferry {
        return false
    }
    let s = u8::from(placer.is_small_image());
    match feature_type {
        FeatureType::StreetFourth => scale > 8 - s,
        FeatureType::StreetThird => scale > 7 - s,
        FeatureType::StreetSecond => scale > 6 - s,
        _ => true
    }
}


//------------ place_road_sign -----------------------------------------------

/// Places a road sign in the middle of the street.
fn place_road_sign(
    placer: &mut Placer, label: &mut TextNotice, feature: &Feature
) -> bool {
    if placer.is_small_image() {
        return false
    }
    let max = if placer.scale() >= 4 {
        placer.options.max_road_signs_coarse
    }
    else {
        placer.options.max_road_signs
    };
    if placer.road_signs >= max {
        return false
    }
    if let Some(attrs) = feature.polygons.first().and_then(|poly| {
        poly.road_attrs()
    }) {
        if attrs.ramp || attrs.roundabout {
            return false
        }
    }

    let coords = label.centreline(placer.map);
    let length = polyline_length_m(coords.iter().copied());
    let centre = match point_at_length(coords.iter().copied(), length / 2.) {
        Some(centre) => centre,
        None => return false,
    };
    let projection = placer.projection;
    let half_width = projection.lon_diff(
        placer.options.road_sign_width_px / 2.
    );
    let half_height = projection.lat_diff(
        placer.options.road_sign_height_px / 2.
    );
    let bbox = WorldBox {
        min_lat: centre.lat.saturating_sub(half_height),
        max_lat: centre.lat.saturating_add(half_height),
        min_lon: centre.lon.saturating_sub(half_width),
        max_lon: centre.lon.saturating_add(half_width),
    };
    if !bbox.inside(&placer.tile()) || placer.registry().overlaps_world(&bbox) {
        return false
    }
    placer.register(bbox);
    placer.road_signs += 1;
    label.kind = LabelKind::RoadSign;
    label.font_size = STREET_FONT_SIZE;
    label.text = feature.name.clone();
    label.text_coord = Some(Coord::new(centre.lat, bbox.min_lon));
    label.text_box = Some(bbox);
    true
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::boxes::{overlaps_strict, ObjectBoxes};
    use crate::feature::{FeatureMap, Polygon, RoadAttrs};
    use crate::label::test::map;
    use crate::label::LabelOptions;
    use crate::measure::EstimatingMeasurer;
    use crate::projection::CosLatProjection;

    fn street(
        feature_type: FeatureType, name: &str, from: i32, to: i32,
        attrs: RoadAttrs,
    ) -> Feature {
        Feature::new(feature_type, name, 10).with_polygon(Polygon::road(
            vec![Coord::new(128_000, from), Coord::new(128_000, to)], attrs
        ))
    }

    fn place_all(
        map: &FeatureMap, registry: &mut ObjectBoxes, options: &LabelOptions
    ) -> Vec<TextNotice<'static>> {
        let proj = CosLatProjection::new(map.bbox, map.screen_size);
        let measurer = EstimatingMeasurer::default();
        let mut placer = Placer::new(map, &proj, registry, &measurer, options);
        map.features.iter().enumerate().map(|(index, feature)| {
            let mut label = TextNotice::new(map, index, feature, None);
            label.placed = place_street_text(&mut placer, &mut label);
            label
        }).collect()
    }

    #[test]
    fn street_name_along_the_street() {
        let mut map = map(10);
        map.push(street(
            FeatureType::StreetSecond, "Main Street", 20_000, 230_000,
            RoadAttrs::default()
        ));
        let mut registry = ObjectBoxes::new();
        let labels = place_all(&map, &mut registry, &LabelOptions::default());
        assert!(labels[0].placed);
        assert_eq!(labels[0].text, "Main St");
        assert_eq!(labels[0].glyphs.len(), 7);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn street_name_avoids_boxes_beside_the_street() {
        let mut map = map(10);
        map.push(street(
            FeatureType::StreetSecond, "Main Street", 20_000, 230_000,
            RoadAttrs::default()
        ));
        let proj = CosLatProjection::new(map.bbox, map.screen_size);
        let mut registry = ObjectBoxes::new();
        registry.add(
            WorldBox::new(Coord::new(130_000, 75_000), Coord::new(135_000, 175_000)),
            &proj
        );
        let labels = place_all(&map, &mut registry, &LabelOptions::default());
        assert!(labels[0].placed);
        assert_eq!(registry.len(), 8);
        let marker = registry.get(0).unwrap().pixel;
        assert!(registry.iter().skip(1).all(|item| {
            !overlaps_strict(&item.pixel, &marker)
        }));
    }

    #[test]
    fn short_street_rejected_without_registering() {
        let mut map = map(10);
        map.push(street(
            FeatureType::StreetSecond, "Very Long Boulevard Name",
            100_000, 110_000, RoadAttrs::default()
        ));
        let mut registry = ObjectBoxes::new();
        let labels = place_all(&map, &mut registry, &LabelOptions::default());
        assert!(!labels[0].placed);
        assert!(labels[0].glyphs.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_names_placed_once() {
        let mut map = map(10);
        map.push(street(
            FeatureType::StreetThird, "Elm Street", 20_000, 120_000,
            RoadAttrs::default()
        ));
        map.push(Feature::new(FeatureType::StreetThird, "Elm Street", 10)
            .with_polygon(Polygon::road(
                vec![Coord::new(30_000, 20_000), Coord::new(30_000, 120_000)],
                RoadAttrs::default()
            ))
        );
        let mut registry = ObjectBoxes::new();
        let labels = place_all(&map, &mut registry, &LabelOptions::default());
        assert!(labels[0].placed);
        assert!(!labels[1].placed);
    }

    #[test]
    fn coarse_scales_have_no_names() {
        let mut map = map(6);
        map.push(street(
            FeatureType::StreetSecond, "Main Street", 20_000, 230_000,
            RoadAttrs::default()
        ));
        map.push(street(
            FeatureType::StreetFirst, "High Street", 20_000, 230_000,
            RoadAttrs::default()
        ));
        let mut registry = ObjectBoxes::new();
        let labels = place_all(&map, &mut registry, &LabelOptions::default());
        assert!(!labels[0].placed);
        assert!(labels[1].placed);
    }

    #[test]
    fn road_numbers_get_signs() {
        let mut map = map(10);
        map.push(street(
            FeatureType::StreetMain, "E4", 20_000, 230_000,
            RoadAttrs::default()
        ));
        map.push(street(
            FeatureType::StreetMain, "E6", 20_000, 230_000,
            RoadAttrs { ramp: true, .. Default::default() }
        ));
        let mut registry = ObjectBoxes::new();
        let labels = place_all(&map, &mut registry, &LabelOptions::default());
        assert!(labels[0].placed);
        assert_eq!(labels[0].kind, LabelKind::RoadSign);
        assert!(labels[0].glyphs.is_empty());
        assert!(!labels[1].placed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn road_signs_are_capped() {
        let mut map = map(10);
        for i in 0..4 {
            let lat = 20_000 + i * 50_000;
            map.push(Feature::new(FeatureType::StreetMain, "A1", 10)
                .with_polygon(Polygon::road(
                    vec![Coord::new(lat, 20_000), Coord::new(lat, 230_000)],
                    RoadAttrs::default()
                ))
            );
        }
        let options = LabelOptions {
            max_road_signs_coarse: 2, .. Default::default()
        };
        let mut registry = ObjectBoxes::new();
        let labels = place_all(&map, &mut registry, &options);
        assert_eq!(labels.iter().filter(|label| label.placed).count(), 2);
    }
}
