//! Pluggable text drawing for icon titles.
//!
//! A [`DrawStringConfig`] names the drawing function by tag and carries its
//! arguments; [`init`] turns it into a [`StringDrawer`].

mod glyph;
mod plain;

use std::{io, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    display::{self, Display, Target},
    font::FontMetrics,
    raster::Rgba,
};

pub use glyph::GlyphString;
pub use plain::PlainString;

pub const PLAIN_STRING: &str = "drawPlainString";
pub const FREETYPE_STRING: &str = "drawFreeTypeString";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown string drawing function {0:?}.")]
    UnknownFunction(String),
    #[error("{0} needs at least one color.")]
    MissingColor(&'static str),
    #[error("{0} needs a font file.")]
    MissingFont(&'static str),
    #[error("Failed to read font {path}: {source}")]
    FontRead { path: PathBuf, source: io::Error },
    #[error("Failed to parse font {path}: {reason}")]
    FontParse { path: PathBuf, reason: &'static str },
    #[error(transparent)]
    Display(#[from] display::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DrawStringConfig {
    pub function: String,
    #[serde(default)]
    pub colors: Vec<Rgba>,
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Pixel size of scalable fonts.
    #[serde(default)]
    pub size: Option<u32>,
}

pub trait StringDrawer {
    /// Draw `text` starting at `x` inside the `width`x`height` band whose top
    /// edge is at `y`.
    #[allow(clippy::too_many_arguments)]
    fn draw(
        &mut self,
        display: &mut dyn Display,
        target: Target,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        text: &str,
    ) -> Result<(), Error>;

    fn text_width(&mut self, text: &str) -> u32;

    /// Release what the drawer holds. It must not be used afterwards.
    fn destroy(&mut self) {}
}

pub fn init(config: &DrawStringConfig, font: &FontMetrics) -> Result<Box<dyn StringDrawer>, Error> {
    tracing::debug!(function = %config.function, "initializing string drawer");
    match config.function.as_str() {
        PLAIN_STRING => Ok(Box::new(PlainString::new(config, font.clone())?)),
        FREETYPE_STRING => Ok(Box::new(GlyphString::new(config)?)),
        other => Err(Error::UnknownFunction(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json() {
        let config: DrawStringConfig = serde_json::from_str(
            r##"{ "function": "drawPlainString", "colors": ["#ffffff", "black"] }"##,
        )
        .unwrap();

        assert_eq!(config.function, PLAIN_STRING);
        assert_eq!(config.colors, vec![Rgba::WHITE, Rgba::BLACK]);
        assert_eq!(config.font, None);
    }

    #[test]
    fn test_init_unknown_function() {
        let config = DrawStringConfig {
            function: "drawFancyString".to_owned(),
            colors: vec![Rgba::WHITE],
            font: None,
            size: None,
        };

        let result = init(&config, &FontMetrics::monospace(6, 10, 3));

        assert!(matches!(result, Err(Error::UnknownFunction(name)) if name == "drawFancyString"));
    }

    #[test]
    fn test_init_freetype_without_font() {
        let config = DrawStringConfig {
            function: FREETYPE_STRING.to_owned(),
            colors: vec![Rgba::WHITE],
            font: None,
            size: Some(12),
        };

        let result = init(&config, &FontMetrics::monospace(6, 10, 3));

        assert!(matches!(result, Err(Error::MissingFont(_))));
    }

    #[test]
    fn test_init_freetype_with_unreadable_font() {
        let dir = tempfile::tempdir().unwrap();
        let config = DrawStringConfig {
            function: FREETYPE_STRING.to_owned(),
            colors: vec![Rgba::WHITE],
            font: Some(dir.path().join("missing.ttf")),
            size: Some(12),
        };

        let result = init(&config, &FontMetrics::monospace(6, 10, 3));

        assert!(matches!(result, Err(Error::FontRead { .. })));
    }
}
