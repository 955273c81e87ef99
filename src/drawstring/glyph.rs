use std::{fs, path::Path};

use fontdue::{Font, FontSettings};

use crate::{
    display::{Display, Target},
    raster::{Image, Rgba},
    vector::Vector2D,
};

use super::{DrawStringConfig, Error, StringDrawer, FREETYPE_STRING};

const MAX_GLYPHS: usize = 256;
const DEFAULT_PIXEL_SIZE: u32 = 12;
const SHADOW_OPAQUENESS: u8 = 100;

/// A rendered character and its metrics, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    image: Option<Image>,
    shadow: Option<Image>,
    advance: i32,
    left: i32,
    top: i32,
}

impl Glyph {
    /// Color a coverage bitmap twice, in `color` and in black.
    pub(crate) fn from_coverage(
        width: u32,
        height: u32,
        coverage: &[u8],
        color: Rgba,
        advance: i32,
        left: i32,
        top: i32,
    ) -> Self {
        let paint = |color: Rgba| {
            if width == 0 || height == 0 {
                return None;
            }
            let data = coverage
                .iter()
                .flat_map(|&alpha| [color.r, color.g, color.b, alpha])
                .collect();
            Image::from_rgba(width, height, data).ok()
        };
        Self {
            image: paint(color),
            shadow: paint(Rgba::BLACK),
            advance,
            left,
            top,
        }
    }
}

/// Antialiased text rendered from a scalable font, with a soft shadow.
pub struct GlyphString {
    font: Font,
    pixel_size: u32,
    color: Rgba,
    glyphs: Vec<Option<Glyph>>,
}

impl GlyphString {
    pub fn new(config: &DrawStringConfig) -> Result<Self, Error> {
        let color = *config
            .colors
            .first()
            .ok_or(Error::MissingColor(FREETYPE_STRING))?;
        let path = config
            .font
            .as_deref()
            .ok_or(Error::MissingFont(FREETYPE_STRING))?;
        let font = load_font(path)?;
        let pixel_size = config.size.unwrap_or(DEFAULT_PIXEL_SIZE);
        tracing::info!("loaded title font {} at {}px", path.display(), pixel_size);

        Ok(Self {
            font,
            pixel_size,
            color,
            glyphs: vec![None; MAX_GLYPHS],
        })
    }

    fn glyph(&mut self, byte: u8) -> &Glyph {
        let (font, size, color) = (&self.font, self.pixel_size, self.color);
        self.glyphs[byte as usize].get_or_insert_with(|| {
            let (metrics, coverage) = font.rasterize(byte as char, size as f32);
            Glyph::from_coverage(
                metrics.width as u32,
                metrics.height as u32,
                &coverage,
                color,
                metrics.advance_width.round() as i32,
                metrics.xmin,
                metrics.ymin + metrics.height as i32,
            )
        })
    }

    fn glyphs_for(&mut self, text: &str) -> Vec<Glyph> {
        text.bytes().map(|byte| self.glyph(byte).clone()).collect()
    }
}

fn load_font(path: &Path) -> Result<Font, Error> {
    let data = fs::read(path).map_err(|source| Error::FontRead {
        path: path.to_owned(),
        source,
    })?;
    Font::from_bytes(data.as_slice(), FontSettings::default()).map_err(|reason| Error::FontParse {
        path: path.to_owned(),
        reason,
    })
}

/// Composite a run of glyphs onto `image`, shadow first, left to right from
/// `x`, vertically centered in a band of `height` pixels.
pub(crate) fn composite_run(image: &mut Image, glyphs: &[Glyph], x: i32, height: u32, pixel_size: u32) {
    let mut pen = x;
    for glyph in glyphs {
        if let (Some(fg), Some(shadow)) = (&glyph.image, &glyph.shadow) {
            let dx = pen + glyph.left;
            let dy = (height + pixel_size) as i32 / 2 - glyph.top;
            let (width, rows) = (fg.width(), fg.height());
            image.combine_area_with_opaqueness(shadow, 0, 0, width, rows, dx - 2, dy + 2, SHADOW_OPAQUENESS);
            image.combine_area(fg, 0, 0, width, rows, dx - 3, dy + 1);
        }
        pen += glyph.advance;
    }
}

impl StringDrawer for GlyphString {
    fn draw(
        &mut self,
        display: &mut dyn Display,
        target: Target,
        x: i32,
        y: i32,
        _width: u32,
        height: u32,
        text: &str,
    ) -> Result<(), Error> {
        if let Target::Window(window) = target {
            display.clear_window(window);
        }
        let mut image = display.capture(target, None)?;
        let glyphs = self.glyphs_for(text);
        composite_run(&mut image, &glyphs, x, height, self.pixel_size);

        let pixmap = display.image_to_pixmap(&image)?;
        display.copy_area(
            Target::Pixmap(pixmap),
            target,
            Vector2D::default(),
            Vector2D::new(0, y),
            image.width(),
            height,
        );
        display.free_pixmap(pixmap);
        Ok(())
    }

    fn text_width(&mut self, text: &str) -> u32 {
        let width: i32 = text.bytes().map(|byte| self.glyph(byte).advance).sum();
        width.max(0) as u32
    }

    fn destroy(&mut self) {
        let cached = self.glyphs.iter().filter(|glyph| glyph.is_some()).count();
        tracing::debug!(cached, "dropping glyph cache");
        self.glyphs.iter_mut().for_each(|glyph| *glyph = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(color: Rgba) -> Glyph {
        // A 2x2 fully covered glyph.
        Glyph::from_coverage(2, 2, &[0xff; 4], color, 4, 0, 2)
    }

    #[test]
    fn test_from_coverage_empty_bitmap() {
        let space = Glyph::from_coverage(0, 0, &[], Rgba::WHITE, 3, 0, 0);

        assert_eq!(space.image, None);
        assert_eq!(space.shadow, None);
        assert_eq!(space.advance, 3);
    }

    #[test]
    fn test_composite_run_offsets() {
        let mut image = Image::filled(16, 12, Rgba::opaque(0x80, 0x80, 0x80));

        // dy = (12 + 8) / 2 - 2 = 8; foreground at (dx - 3, dy + 1) = (2, 9).
        composite_run(&mut image, &[block(Rgba::WHITE)], 5, 12, 8);

        assert_eq!(image.pixel(2, 9), Rgba::WHITE);
        assert_eq!(image.pixel(3, 10), Rgba::WHITE);
        // Shadow at (dx - 2, dy + 2) = (3, 10), only its right column shows.
        assert_eq!(image.pixel(4, 11), Rgba::opaque(77, 77, 77));
        assert_eq!(image.pixel(1, 9), Rgba::opaque(0x80, 0x80, 0x80));
    }

    #[test]
    fn test_composite_run_advances() {
        let mut image = Image::filled(16, 12, Rgba::BLACK);
        let space = Glyph::from_coverage(0, 0, &[], Rgba::WHITE, 3, 0, 0);

        composite_run(
            &mut image,
            &[block(Rgba::WHITE), space, block(Rgba::WHITE)],
            3,
            12,
            8,
        );

        // Second block starts 4 + 3 pixels after the first.
        assert_eq!(image.pixel(0, 9), Rgba::WHITE);
        assert_eq!(image.pixel(7, 9), Rgba::WHITE);
        assert_eq!(image.pixel(2, 9), Rgba::BLACK);
    }
}
