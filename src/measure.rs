//! Measuring text.
//!
//! Label placement needs to know how large a text is in pixels. This is
//! answered by a [`GlyphMeasurer`]. The crate comes with a measurer that
//! estimates from the number of characters, a caching wrapper, and, with
//! the `cairo` feature, a measurer that asks cairo.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use lru::LruCache;


//------------ Dimensions ----------------------------------------------------

/// The size of a text in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Dimensions { width, height }
    }
}


//------------ GlyphMeasurer -------------------------------------------------

/// Something that can tell the size of a text.
pub trait GlyphMeasurer {
    /// Returns the size of `text` in the given font and size.
    ///
    /// Returns `None` if the text cannot be measured.
    fn measure(&self, text: &str, font: &str, size: f64) -> Option<Dimensions>;

    /// Returns the size of every char of `text`.
    fn per_glyph_dimensions(
        &self, text: &str, font: &str, size: f64
    ) -> Option<Vec<Dimensions>> {
        let mut buf = [0u8; 4];
        text.chars().map(|ch| {
            self.measure(ch.encode_utf8(&mut buf), font, size)
        }).collect()
    }
}

impl<T: GlyphMeasurer + ?Sized> GlyphMeasurer for &T {
    fn measure(&self, text: &str, font: &str, size: f64) -> Option<Dimensions> {
        (**self).measure(text, font, size)
    }

    fn per_glyph_dimensions(
        &self, text: &str, font: &str, size: f64
    ) -> Option<Vec<Dimensions>> {
        (**self).per_glyph_dimensions(text, font, size)
    }
}


//------------ EstimatingMeasurer --------------------------------------------

/// A measurer assuming all glyphs have the same size.
#[derive(Clone, Copy, Debug)]
pub struct EstimatingMeasurer {
    /// The glyph size at the reference font size.
    glyph: Dimensions,

    /// The font size the glyph size is for.
    reference_size: f64,
}

impl EstimatingMeasurer {
    pub fn new(glyph: Dimensions, reference_size: f64) -> Self {
        EstimatingMeasurer { glyph, reference_size }
    }

    /// Returns the estimate for a single glyph at a font size.
    pub fn glyph(&self, size: f64) -> Dimensions {
        let scale = if self.reference_size > 0. {
            size / self.reference_size
        }
        else {
            1.
        };
        Dimensions::new(self.glyph.width * scale, self.glyph.height * scale)
    }
}

impl Default for EstimatingMeasurer {
    /// Seven by ten pixels per glyph at size 9.
    fn default() -> Self {
        EstimatingMeasurer::new(Dimensions::new(7., 10.), 9.)
    }
}

impl GlyphMeasurer for EstimatingMeasurer {
    fn measure(
        &self, text: &str, _font: &str, size: f64
    ) -> Option<Dimensions> {
        let glyph = self.glyph(size);
        Some(Dimensions::new(
            glyph.width * text.chars().count() as f64, glyph.height
        ))
    }
}


//------------ CachedMeasurer ------------------------------------------------

type CacheKey = (String, String, u64);

/// A measurer remembering recent results of another measurer.
pub struct CachedMeasurer<M> {
    inner: M,
    cache: RefCell<LruCache<CacheKey, Option<Dimensions>>>,
}

impl<M> CachedMeasurer<M> {
    pub fn new(inner: M, capacity: NonZeroUsize) -> Self {
        CachedMeasurer {
            inner,
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: GlyphMeasurer> GlyphMeasurer for CachedMeasurer<M> {
    fn measure(&self, text: &str, font: &str, size: f64) -> Option<Dimensions> {
        let key = (text.to_string(), font.to_string(), size.to_bits());
        if let Some(res) = self.cache.borrow_mut().get(&key) {
            return *res
        }
        let res = self.inner.measure(text, font, size);
        self.cache.borrow_mut().put(key, res);
        res
    }
}


//------------ CairoMeasurer -------------------------------------------------

#[cfg(feature = "cairo")]
pub use self::cairo_measurer::CairoMeasurer;

#[cfg(feature = "cairo")]
mod cairo_measurer {
    use super::{Dimensions, GlyphMeasurer};

    /// A measurer using cairo’s toy font API.
    pub struct CairoMeasurer {
        context: cairo::Context,
    }

    impl CairoMeasurer {
        pub fn new() -> Result<Self, cairo::Error> {
            let surface = cairo::ImageSurface::create(
                cairo::Format::ARgb32, 1, 1
            )?;
            Ok(CairoMeasurer { context: cairo::Context::new(&surface)? })
        }
    }

    impl GlyphMeasurer for CairoMeasurer {
        fn measure(
            &self, text: &str, font: &str, size: f64
        ) -> Option<Dimensions> {
            self.context.select_font_face(
                font, cairo::FontSlant::Normal, cairo::FontWeight::Normal
            );
            self.context.set_font_size(size);

            // The width is the advance, the height that of the font, so
            // all labels of a font are equally high.
            let text = self.context.text_extents(text).ok()?;
            let font = self.context.font_extents().ok()?;
            Some(Dimensions::new(text.x_advance(), font.height()))
        }
    }
}


//============ Testing =======================================================
