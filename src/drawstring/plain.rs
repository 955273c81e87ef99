use crate::{
    display::{Display, Target},
    font::FontMetrics,
    raster::Rgba,
    vector::Vector2D,
};

use super::{DrawStringConfig, Error, StringDrawer, PLAIN_STRING};

/// Core font text drawn up to three times for an embossed look.
///
/// The first color is the text itself, the second an offset by one pixel and
/// the third a shadow three pixels down and right.
pub struct PlainString {
    colors: Vec<Rgba>,
    font: FontMetrics,
}

impl PlainString {
    pub fn new(config: &DrawStringConfig, font: FontMetrics) -> Result<Self, Error> {
        if config.colors.is_empty() {
            return Err(Error::MissingColor(PLAIN_STRING));
        }
        Ok(Self {
            colors: config.colors.iter().take(3).copied().collect(),
            font,
        })
    }

    /// Back to front: shadow, offset, text.
    fn passes(&self) -> Vec<(Rgba, i32)> {
        let offsets = [0, 1, 3];
        self.colors
            .iter()
            .zip(offsets)
            .rev()
            .map(|(&color, offset)| (color, offset))
            .collect()
    }
}

impl StringDrawer for PlainString {
    fn draw(
        &mut self,
        display: &mut dyn Display,
        target: Target,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        text: &str,
    ) -> Result<(), Error> {
        let scratch = display.create_pixmap(width, height)?;
        let band = Vector2D::new(0, y - 1);
        display.copy_area(target, Target::Pixmap(scratch), band, Vector2D::default(), width, height);

        for (color, offset) in self.passes() {
            display.draw_colored_text(Target::Pixmap(scratch), color, x + offset, offset, text);
        }

        display.copy_area(Target::Pixmap(scratch), target, Vector2D::default(), band, width, height);
        display.free_pixmap(scratch);
        Ok(())
    }

    fn text_width(&mut self, text: &str) -> u32 {
        self.font.text_width(text)
    }
}

#[cfg(test)]
mod tests {
    use xcb::{x, Xid, XidNew};

    use super::*;
    use crate::display::testing::{Op, RecordingDisplay};

    fn plain(colors: Vec<Rgba>) -> PlainString {
        let config = DrawStringConfig {
            function: PLAIN_STRING.to_owned(),
            colors,
            font: None,
            size: None,
        };
        PlainString::new(&config, FontMetrics::monospace(6, 10, 3)).unwrap()
    }

    #[test]
    fn test_needs_a_color() {
        let config = DrawStringConfig {
            function: PLAIN_STRING.to_owned(),
            colors: Vec::new(),
            font: None,
            size: None,
        };

        assert!(matches!(
            PlainString::new(&config, FontMetrics::monospace(6, 10, 3)),
            Err(Error::MissingColor(_))
        ));
    }

    #[test]
    fn test_draw_passes_back_to_front() {
        let red = Rgba::opaque(0xff, 0, 0);
        let mut drawer = plain(vec![Rgba::WHITE, Rgba::BLACK, red]);
        let mut display = RecordingDisplay::default();
        let window = unsafe { x::Window::new(123) };

        drawer
            .draw(&mut display, Target::Window(window), 2, 1, 60, 13, "xterm")
            .unwrap();

        let texts: Vec<(Rgba, Vector2D)> = display
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::ColoredText { color, pos, .. } => Some((*color, *pos)),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                (red, Vector2D::new(5, 3)),
                (Rgba::BLACK, Vector2D::new(3, 1)),
                (Rgba::WHITE, Vector2D::new(2, 0)),
            ]
        );
        assert_eq!(display.freed_pixmaps.len(), 1);
        assert!(display.pixmaps.is_empty());
    }

    #[test]
    fn test_draw_copies_band_back() {
        let mut drawer = plain(vec![Rgba::WHITE]);
        let mut display = RecordingDisplay::default();
        let window = unsafe { x::Window::new(123) };

        drawer
            .draw(&mut display, Target::Window(window), 0, 5, 40, 13, "a")
            .unwrap();

        let copies: Vec<&Op> = display
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Copy { .. }))
            .collect();
        assert_eq!(copies.len(), 2);
        assert!(matches!(
            copies[1],
            Op::Copy { dst, dst_pos, size, .. }
                if *dst == window.resource_id() && *dst_pos == Vector2D::new(0, 4) && *size == (40, 13)
        ));
    }

    #[test]
    fn test_text_width_uses_core_font() {
        let mut drawer = plain(vec![Rgba::WHITE]);
        assert_eq!(drawer.text_width("abc"), 18);
    }
}
