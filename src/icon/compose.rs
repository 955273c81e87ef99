//! Rendering an icon image onto its tile.

use xcb::x;

use crate::{
    config::ICON_BORDER,
    display::{Display, Pen, Target},
    raster::{Image, Rgba},
    vector::Vector2D,
};

use super::{IconContext, TileType};

const SHADOW_ALPHA: u8 = 150;
const HIGHLIGHT_ALPHA: u8 = 160;

/// How an icon is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub tile_type: TileType,
    pub titled: bool,
    pub shadowed: bool,
    pub highlighted: bool,
}

/// Where the visible part of an image lands on the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub src: (u32, u32),
    pub size: (u32, u32),
    pub dst: (i32, i32),
}

impl Placement {
    /// Center a `width`x`height` image under a title of `title_height`
    /// pixels, cropping it evenly on both sides when it does not fit.
    pub fn centered(width: u32, height: u32, icon_size: u32, title_height: u32) -> Self {
        let w = width.min(icon_size);
        let h = if height + title_height > icon_size {
            icon_size.saturating_sub(title_height)
        } else {
            height
        };
        Self {
            src: ((width - w) / 2, height.saturating_sub(h) / 2),
            size: (w, h),
            dst: (
                ((icon_size - w) / 2) as i32,
                (title_height + icon_size.saturating_sub(title_height + h) / 2) as i32,
            ),
        }
    }
}

/// Render `image` on the tile into a new pixmap.
///
/// Returns `None` when the pixmap cannot be created, which leaves the icon
/// without a background image.
pub fn compose(ctx: &mut IconContext, style: &Style, image: Option<&Image>) -> Option<x::Pixmap> {
    let mut tile = Image::clone(ctx.screen.tile(style.tile_type));
    let icon_size = ctx.screen.icon_size();
    let title_height = if style.titled {
        ctx.screen.title_font().height()
    } else {
        0
    };

    if let Some(image) = image {
        let placement = Placement::centered(image.width(), image.height(), icon_size, title_height);
        let (sx, sy) = placement.src;
        let (w, h) = placement.size;
        let (dx, dy) = placement.dst;
        tile.combine_area(image, sx, sy, w, h, dx, dy);
    }

    if style.shadowed {
        tile.overlay(ctx.screen.theme().icon_back_light.with_alpha(SHADOW_ALPHA));
    }
    if style.highlighted {
        tile.overlay(Rgba::BLACK.with_alpha(HIGHLIGHT_ALPHA));
    }

    let pixmap = match ctx.display.image_to_pixmap(&tile) {
        Ok(pixmap) => pixmap,
        Err(err) => {
            tracing::warn!("error rendering image: {}", err);
            return None;
        }
    };

    if style.titled {
        draw_icon_title(ctx.display, pixmap, icon_size, title_height);
    }
    Some(pixmap)
}

/// Title strip: background, light top and left edges, dim right edge.
pub fn draw_icon_title(display: &mut dyn Display, pixmap: x::Pixmap, icon_size: u32, height: u32) {
    let target = Target::Pixmap(pixmap);
    let size = icon_size as i32;
    let bottom = height as i32 + 1;
    display.fill_rectangle(target, Pen::TitleBack, 0, 0, icon_size, height + 1);
    display.draw_line(target, Pen::TitleLight, Vector2D::new(0, 0), Vector2D::new(size, 0));
    display.draw_line(target, Pen::TitleLight, Vector2D::new(0, 0), Vector2D::new(0, bottom));
    display.draw_line(
        target,
        Pen::TitleDim,
        Vector2D::new(size - 1, 0),
        Vector2D::new(size - 1, bottom),
    );
}

/// Scale `image` down, keeping its aspect ratio, so that it leaves room for
/// the tile border in an icon of `max_size` pixels. Smaller images are
/// returned untouched.
pub fn validate_icon_size(image: Image, max_size: u32) -> Image {
    let limit = max_size.saturating_sub(ICON_BORDER).max(1);
    let (width, height) = (image.width(), image.height());
    if width <= limit && height <= limit {
        return image;
    }

    let (new_width, new_height) = if width >= height {
        (limit, (height as u64 * limit as u64 / width as u64).max(1) as u32)
    } else {
        ((width as u64 * limit as u64 / height as u64).max(1) as u32, limit)
    };
    tracing::debug!(width, height, new_width, new_height, "scaling icon image down");
    image.scale(new_width, new_height)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use xcb::Xid;

    use super::*;
    use crate::{
        config::Preferences,
        display::testing::{Op, RecordingDisplay},
        screen::testing::screen,
    };

    #[rstest]
    #[case((128, 64), (61, 30))]
    #[case((64, 128), (30, 61))]
    #[case((64, 64), (61, 61))]
    #[case((61, 20), (61, 20))]
    #[case((32, 32), (32, 32))]
    #[case((1000, 2), (61, 1))]
    fn test_validate_icon_size(#[case] size: (u32, u32), #[case] expected: (u32, u32)) {
        let image = Image::filled(size.0, size.1, Rgba::WHITE);

        let validated = validate_icon_size(image, 64);

        assert_eq!((validated.width(), validated.height()), expected);
    }

    #[rstest]
    #[case((32, 32), 0, Placement { src: (0, 0), size: (32, 32), dst: (16, 16) })]
    #[case((32, 32), 13, Placement { src: (0, 0), size: (32, 32), dst: (16, 22) })]
    #[case((80, 60), 13, Placement { src: (8, 4), size: (64, 51), dst: (0, 13) })]
    #[case((64, 51), 13, Placement { src: (0, 0), size: (64, 51), dst: (0, 13) })]
    fn test_placement(
        #[case] size: (u32, u32),
        #[case] title_height: u32,
        #[case] expected: Placement,
    ) {
        assert_eq!(Placement::centered(size.0, size.1, 64, title_height), expected);
    }

    fn style() -> Style {
        Style {
            tile_type: TileType::Normal,
            titled: false,
            shadowed: false,
            highlighted: false,
        }
    }

    #[test]
    fn test_compose_without_image_is_the_tile() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        let tile = Image::clone(screen.tile(TileType::Normal));
        let mut ctx = IconContext::new(&mut display, &mut screen, &prefs);

        let pixmap = compose(&mut ctx, &style(), None).unwrap();

        assert_eq!(display.pixmap(pixmap), &tile);
    }

    #[test]
    fn test_compose_centers_opaque_image() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        let mut ctx = IconContext::new(&mut display, &mut screen, &prefs);
        let red = Rgba::opaque(0xff, 0, 0);

        let pixmap = compose(&mut ctx, &style(), Some(&Image::filled(32, 32, red))).unwrap();

        let composed = display.pixmap(pixmap);
        assert_eq!(composed.pixel(16, 16), red);
        assert_eq!(composed.pixel(47, 47), red);
        assert_ne!(composed.pixel(15, 16), red);
    }

    #[test]
    fn test_compose_highlight_darkens_after_shadow() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        let mut ctx = IconContext::new(&mut display, &mut screen, &prefs);
        let image = Image::filled(32, 32, Rgba::WHITE);

        let plain = compose(&mut ctx, &style(), Some(&image)).unwrap();
        let shadowed = compose(
            &mut ctx,
            &Style {
                shadowed: true,
                ..style()
            },
            Some(&image),
        )
        .unwrap();
        let both = compose(
            &mut ctx,
            &Style {
                shadowed: true,
                highlighted: true,
                ..style()
            },
            Some(&image),
        )
        .unwrap();

        let light = prefs.theme.icon_back_light;
        let mut expected = Image::filled(1, 1, Rgba::WHITE);
        expected.overlay(light.with_alpha(SHADOW_ALPHA));
        assert_eq!(display.pixmap(plain).pixel(32, 32), Rgba::WHITE);
        assert_eq!(display.pixmap(shadowed).pixel(32, 32), expected.pixel(0, 0));
        expected.overlay(Rgba::BLACK.with_alpha(HIGHLIGHT_ALPHA));
        assert_eq!(display.pixmap(both).pixel(32, 32), expected.pixel(0, 0));
    }

    #[test]
    fn test_compose_draws_title_strip() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        let mut ctx = IconContext::new(&mut display, &mut screen, &prefs);

        let pixmap = compose(
            &mut ctx,
            &Style {
                titled: true,
                ..style()
            },
            None,
        )
        .unwrap();

        let target = pixmap.resource_id();
        assert_eq!(
            display.ops_on(target),
            vec![
                Op::Fill {
                    target,
                    pen: Pen::TitleBack,
                    area: (0, 0, 64, 14)
                },
                Op::Line {
                    target,
                    pen: Pen::TitleLight,
                    from: Vector2D::new(0, 0),
                    to: Vector2D::new(64, 0)
                },
                Op::Line {
                    target,
                    pen: Pen::TitleLight,
                    from: Vector2D::new(0, 0),
                    to: Vector2D::new(0, 14)
                },
                Op::Line {
                    target,
                    pen: Pen::TitleDim,
                    from: Vector2D::new(63, 0),
                    to: Vector2D::new(63, 14)
                },
            ]
        );
    }

    #[test]
    fn test_compose_conversion_failure() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        display.fail_conversion = true;
        let mut ctx = IconContext::new(&mut display, &mut screen, &prefs);

        assert_eq!(compose(&mut ctx, &style(), None), None);
        assert!(display.ops.is_empty());
    }
}
