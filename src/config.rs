//! Configuration of the pipeline.

use std::fs;
use std::path::Path;
use serde::Deserialize;
use crate::error::Error;
use crate::importance::Layer;
use crate::label::LabelOptions;
use crate::merge::tile::MergeOptions;
use crate::overlap::OverlapOptions;
use crate::style::StyleTable;


//------------ Config --------------------------------------------------------

/// The pipeline configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub notices: NoticeOptions,
    pub labels: LabelOptions,
    pub merge: MergeOptions,

    /// The draw settings.
    ///
    /// If empty, every feature is drawn and labelled.
    pub style: StyleTable,

    /// The tile layers.
    pub layers: Vec<Layer>,

    /// Remove all names when simplifying for tiles.
    pub remove_all_names: bool,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|err| {
            Error::io(path, err)
        })?;
        toml::from_str(&data).map_err(|err| Error::parse(path, err))
    }

    /// Returns the layer with the given id.
    pub fn layer(&self, id: u32) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}


//------------ NoticeOptions -------------------------------------------------

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NoticeOptions {
    /// Draw street borders and fills in separate passes.
    pub single_draw: bool,

    /// Fold overlapping point markers.
    pub check_overlaps: bool,

    #[serde(flatten)]
    pub overlap: OverlapOptions,
}

impl Default for NoticeOptions {
    fn default() -> Self {
        NoticeOptions {
            single_draw: false,
            check_overlaps: true,
            overlap: OverlapOptions::default(),
        }
    }
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::feature::FeatureType;
    use crate::importance::{Group, Threshold, TypeGroup};
    use crate::names::Language;
    use crate::style::DrawSettings;

    #[test]
    fn empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.notices.check_overlaps);
        assert_eq!(config.labels.max_road_signs, 8);
        assert_eq!(config.merge.min_length_m, 500.);
        assert!(config.style.is_empty());
        assert!(config.layers.is_empty());
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(r#"
            remove_all_names = true

            [notices]
            single_draw = true
            poi_size_px = 10.0

            [labels]
            language = "swedish"
            max_road_signs = 3

            [merge]
            min_length_m = 200.0

            [[style]]
            type = "WATER"
            max_scale = 4
            text_on_map = false

            [[layers]]
            id = 1

            [[layers.importance]]
            group = "ALL_AREA_FEATURES"
            area = [1000.0, 500.0, 100.0]

            [[layers.importance]]
            group = "STREET_MAIN"
            max_detail = 5
        "#).unwrap();

        assert!(config.remove_all_names);
        assert!(config.notices.single_draw);
        assert!(config.notices.check_overlaps);
        assert_eq!(config.notices.overlap.poi_size_px, 10.);
        assert_eq!(config.labels.language, Language::Swedish);
        assert_eq!(config.labels.max_road_signs, 3);
        assert_eq!(config.merge.min_length_m, 200.);
        assert!(!config.style.settings_for(FeatureType::Water, 2).unwrap().text_on_map);
        assert!(config.style.settings_for(FeatureType::Water, 5).is_none());

        let layer = config.layer(1).unwrap();
        assert_eq!(layer.importance.len(), 2);
        assert_eq!(
            layer.importance[0].group,
            TypeGroup::Group(Group::AllAreaFeatures)
        );
        assert_eq!(
            layer.importance[1].group,
            TypeGroup::Type(FeatureType::StreetMain)
        );
        assert_eq!(
            layer.importance[1].threshold,
            Threshold::Fixed { max_detail: 5 }
        );
        assert!(config.layer(2).is_none());
    }
}
