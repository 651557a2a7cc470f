//! Running all stages over a feature map.
//!
//! There are two paths. [`Pipeline::process`] prepares a map for drawing:
//! it builds the feature notices, folds overlapping markers and places
//! the labels. [`Pipeline::simplify`] prepares a map for transmission as
//! tiles: it reduces the map to the features of a layer’s importance
//! levels and joins the streets.

use tracing::{debug, info, warn};
use crate::boxes::ObjectBoxes;
use crate::config::Config;
use crate::feature::FeatureMap;
use crate::importance::{
    filter_importance, remove_duplicates, remove_names, TileScale,
};
use crate::label::{apply_labels, place_labels, TextNotice};
use crate::measure::GlyphMeasurer;
use crate::merge::tile::merge_tile_streets;
use crate::notice::{build_notices, FeatureNotice};
use crate::overlap::filter_overlaps;
use crate::projection::Projection;
use crate::style::DrawSettings;


//------------ Output --------------------------------------------------------

/// The result of processing a map.
#[derive(Clone, Debug)]
pub struct Output<'a> {
    /// The notices in draw order.
    pub notices: Vec<FeatureNotice<'a>>,

    /// The label candidates in the order they were tried.
    pub labels: Vec<TextNotice<'a>>,

    /// Everything placed on the map that labels have to avoid.
    pub registry: ObjectBoxes,
}

impl<'a> Output<'a> {
    /// Returns the labels that have been placed.
    pub fn placed_labels(&self) -> impl Iterator<Item = &TextNotice<'a>> {
        self.labels.iter().filter(|label| label.placed)
    }
}


//------------ Pipeline ------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn settings(&self) -> Option<&dyn DrawSettings> {
        if self.config.style.is_empty() {
            None
        }
        else {
            Some(&self.config.style as &dyn DrawSettings)
        }
    }

    /// Prepares a map for drawing.
    ///
    /// The placed labels are also written back into the features of the
    /// map.
    pub fn process(
        &self,
        map: &mut FeatureMap,
        projection: &dyn Projection,
        measurer: &dyn GlyphMeasurer,
    ) -> Output {
        let options = &self.config.notices;
        let notices = build_notices(map, self.settings(), options.single_draw);
        let (notices, mut registry) = if options.check_overlaps {
            filter_overlaps(map, projection, notices, &options.overlap)
        }
        else {
            (notices, ObjectBoxes::new())
        };
        let labels = place_labels(
            map, &notices, projection, &mut registry, measurer,
            &self.config.labels
        );
        apply_labels(map, &labels);

        let res = Output { notices, labels, registry };
        info!(
            "processed {} features: {} notices, {} labels",
            map.len(), res.notices.len(), res.placed_labels().count()
        );
        res
    }

    /// Prepares a map for a tile layer.
    ///
    /// Returns one map per importance level of the layer. Returns nothing
    /// if there is no layer with the id `layer`.
    pub fn simplify(
        &self, map: &FeatureMap, detail: f64, layer: u32
    ) -> Vec<FeatureMap> {
        let layer = match self.config.layer(layer) {
            Some(layer) => layer,
            None => {
                warn!("unknown layer {}", layer);
                return Vec::new()
            }
        };
        let meters_per_pixel = if map.screen_size.height > 0. {
            map.bbox.height_m() / map.screen_size.height
        }
        else {
            0.
        };
        let scale = TileScale::new(detail, meters_per_pixel);
        let detail = scale.detail_level();

        let mut source = map.clone();
        remove_names(&mut source, detail, self.config.remove_all_names);
        layer.importance.iter().enumerate().map(|(nbr, notice)| {
            let mut res = filter_importance(&source, layer, nbr, &scale);
            remove_duplicates(&mut res);
            if notice.group.is_street_group() {
                res = merge_tile_streets(
                    &res, detail, meters_per_pixel, &self.config.merge,
                    self.config.labels.language
                );
            }
            debug!(
                "layer {} importance {}: {} features", layer.id, nbr, res.len()
            );
            res
        }).collect()
    }
}


//============ Testing =======================================================
