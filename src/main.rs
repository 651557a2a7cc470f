use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use clap::{
    Arg, ArgAction, ArgMatches, Command, crate_version, crate_authors,
    value_parser,
};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use maplabel::{
    CachedMeasurer, Config, CosLatProjection, FeatureMap, GlyphMeasurer,
    Pipeline,
};
use maplabel::label::name_order;

/// The number of measured texts to remember.
const MEASURE_CACHE_SIZE: usize = 1024;


struct Args {
    config: Option<PathBuf>,
    map: PathBuf,
    scale: Option<u8>,
    detail: Option<f64>,
    layer: Option<u32>,
}

impl Args {
    fn get() -> Self {
        Self::from_matches(Self::get_matches())
    }

    fn get_matches() -> ArgMatches {
        Command::new("maplabel")
            .version(crate_version!())
            .author(crate_authors!())
            .about("places labels on a feature map")
            .arg(Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("the configuration file")
                .action(ArgAction::Set)
            )
            .arg(Arg::new("map")
                .value_name("MAP")
                .value_parser(value_parser!(PathBuf))
                .help("the feature map file")
                .required(true)
                .action(ArgAction::Set)
            )
            .arg(Arg::new("scale")
                .short('s')
                .long("scale")
                .value_name("N")
                .value_parser(value_parser!(u8))
                .help("override the scale level of the map")
                .action(ArgAction::Set)
            )
            .arg(Arg::new("detail")
                .short('d')
                .long("detail")
                .value_name("N")
                .value_parser(value_parser!(f64))
                .help("simplify for tiles at this detail level")
                .action(ArgAction::Set)
            )
            .arg(Arg::new("layer")
                .short('l')
                .long("layer")
                .value_name("N")
                .value_parser(value_parser!(u32))
                .help("the tile layer to simplify for")
                .action(ArgAction::Set)
            )
            .get_matches()
    }

    fn from_matches(mut matches: ArgMatches) -> Self {
        Args {
            config: matches.remove_one("config"),
            map: matches.remove_one("map").unwrap_or_default(),
            scale: matches.remove_one("scale"),
            detail: matches.remove_one("detail"),
            layer: matches.remove_one("layer"),
        }
    }

    fn run(self) -> Result<(), maplabel::Error> {
        let config = match self.config {
            Some(ref path) => Config::load(path)?,
            None => Config::default(),
        };
        let mut map = FeatureMap::load(&self.map)?;
        if let Some(scale) = self.scale {
            map.scale_level = scale;
        }
        let pipeline = Pipeline::new(config);

        if self.detail.is_some() || self.layer.is_some() {
            let detail = self.detail.unwrap_or(f64::from(map.scale_level));
            let layer = self.layer.unwrap_or(0);
            for (nbr, level) in pipeline.simplify(
                &map, detail, layer
            ).iter().enumerate() {
                for feature in &level.features {
                    println!(
                        "{}\t{:?}\t{}\t{}",
                        nbr, feature.feature_type, feature.name,
                        feature.polygons.len()
                    );
                }
            }
            return Ok(())
        }

        let projection = CosLatProjection::new(map.bbox, map.screen_size);
        let measurer = measurer();
        let output = pipeline.process(&mut map, &projection, &measurer);
        for notice in &output.notices {
            let name = map.feature(notice.feature).map(|feature| {
                feature.name.as_str()
            }).unwrap_or_default();
            println!(
                "notice\t{}\t{}\t{}\t{:?}\t{}",
                notice.draw_order, notice.feature, notice.poly,
                notice.poi_status, name
            );
        }
        let mut placed: Vec<_> = output.placed_labels().collect();
        placed.sort_by(|a, b| name_order(a, b));
        for label in placed {
            let coord = label.text_coord.or_else(|| {
                label.glyphs.first().map(|glyph| glyph.coord)
            });
            println!(
                "label\t{:?}\t{}\t{:?}\t{}",
                label.kind, label.text, coord, label.glyphs.len()
            );
        }
        Ok(())
    }
}

#[cfg(feature = "cairo")]
fn measurer() -> impl GlyphMeasurer {
    let cache = NonZeroUsize::new(MEASURE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
    match maplabel::measure::CairoMeasurer::new() {
        Ok(inner) => Measurer::Cairo(CachedMeasurer::new(inner, cache)),
        Err(err) => {
            error!("cairo unavailable, estimating text sizes: {}", err);
            Measurer::Estimate(CachedMeasurer::new(Default::default(), cache))
        }
    }
}

#[cfg(feature = "cairo")]
enum Measurer {
    Cairo(CachedMeasurer<maplabel::measure::CairoMeasurer>),
    Estimate(CachedMeasurer<maplabel::EstimatingMeasurer>),
}

#[cfg(feature = "cairo")]
impl GlyphMeasurer for Measurer {
    fn measure(
        &self, text: &str, font: &str, size: f64
    ) -> Option<maplabel::measure::Dimensions> {
        match self {
            Measurer::Cairo(inner) => inner.measure(text, font, size),
            Measurer::Estimate(inner) => inner.measure(text, font, size),
        }
    }
}

#[cfg(not(feature = "cairo"))]
fn measurer() -> impl GlyphMeasurer {
    CachedMeasurer::new(
        maplabel::EstimatingMeasurer::default(),
        NonZeroUsize::new(MEASURE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN)
    )
}

fn main() -> ExitCode {
    let directives = env::var("RUST_LOG").unwrap_or(
        "warn,maplabel=info".into()
    );
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    match Args::get().run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
