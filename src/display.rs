//! The window system as seen by icons.
//!
//! [`Display`] is everything the icon code asks of the X server. The real
//! implementation, [`XcbDisplay`], talks to the server through `xcb`.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use xcb::{x, Xid};

use crate::{
    config::{Theme, MOD_KEY, MOVE_BUTTON},
    font::FontMetrics,
    raster::{Image, Rgba},
    vector::Vector2D,
};

// Glyphs of the X cursor font.
const XC_FLEUR: u16 = 52;
const XC_LEFT_PTR: u16 = 68;

// Keep PutImage requests well below the smallest maximum request length.
const MAX_PUT_IMAGE_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Xcb(#[from] xcb::Error),
    #[error(transparent)]
    Protocol(#[from] xcb::ProtocolError),
    #[error(transparent)]
    Connection(#[from] xcb::ConnError),
    #[error("Screen {0} not found.")]
    ScreenNotFound(usize),
    #[error("Unsupported visual: {0}-bit {1:?}, expected 24/32-bit TrueColor.")]
    UnsupportedVisual(u8, x::VisualClass),
    #[error("Unsupported drawable depth {0}.")]
    UnsupportedDepth(u8),
    #[error("Image {0}x{1} is too large.")]
    ImageTooLarge(u32, u32),
    #[error("Drawable {0:#x} is gone.")]
    BadDrawable(u32),
}

/// Something that can be drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Window(x::Window),
    Pixmap(x::Pixmap),
}

impl Target {
    pub fn resource_id(&self) -> u32 {
        match self {
            Target::Window(window) => window.resource_id(),
            Target::Pixmap(pixmap) => pixmap.resource_id(),
        }
    }

    fn drawable(&self) -> x::Drawable {
        match *self {
            Target::Window(window) => x::Drawable::Window(window),
            Target::Pixmap(pixmap) => x::Drawable::Pixmap(pixmap),
        }
    }
}

/// Graphic contexts set up from the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pen {
    TitleBack,
    TitleLight,
    TitleDim,
    TitleText,
    /// Dashed line around selected icons.
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Arrow,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub depth: u8,
}

pub trait Display {
    fn root(&self) -> x::Window;

    /// Create an unmapped, override-redirect icon frame with a white border.
    fn create_frame(&mut self, pos: Vector2D, size: u32, save_under: bool) -> Result<x::Window, Error>;
    fn destroy_window(&mut self, window: x::Window);

    fn geometry(&mut self, target: Target) -> Result<Geometry, Error>;
    /// Read back the contents of a drawable. `mask` is a bitmap of the same
    /// size whose unset bits become transparent.
    fn capture(&mut self, target: Target, mask: Option<x::Pixmap>) -> Result<Image, Error>;
    /// Upload an image into a new pixmap owned by the caller.
    fn image_to_pixmap(&mut self, image: &Image) -> Result<x::Pixmap, Error>;
    fn create_pixmap(&mut self, width: u32, height: u32) -> Result<x::Pixmap, Error>;
    fn free_pixmap(&mut self, pixmap: x::Pixmap);
    #[allow(clippy::too_many_arguments)]
    fn copy_area(
        &mut self,
        src: Target,
        dst: Target,
        src_pos: Vector2D,
        dst_pos: Vector2D,
        width: u32,
        height: u32,
    );

    fn set_background(&mut self, window: x::Window, pixmap: x::Pixmap);
    fn clear_area(&mut self, window: x::Window, x: i32, y: i32, width: u32, height: u32, exposures: bool);
    fn clear_window(&mut self, window: x::Window) {
        self.clear_area(window, 0, 0, 0, 0, false);
    }

    fn fill_rectangle(&mut self, target: Target, pen: Pen, x: i32, y: i32, width: u32, height: u32);
    fn draw_line(&mut self, target: Target, pen: Pen, from: Vector2D, to: Vector2D);
    fn draw_rectangle(&mut self, target: Target, pen: Pen, x: i32, y: i32, width: u32, height: u32);
    /// Draw text whose top edge is at `y`.
    fn draw_text(&mut self, target: Target, pen: Pen, x: i32, y: i32, text: &str);
    fn draw_colored_text(&mut self, target: Target, color: Rgba, x: i32, y: i32, text: &str);
    fn set_dash_offset(&mut self, pen: Pen, offset: u16);

    fn reparent(&mut self, window: x::Window, parent: x::Window, pos: Vector2D);
    fn map(&mut self, window: x::Window);
    fn unmap(&mut self, window: x::Window);
    fn add_to_save_set(&mut self, window: x::Window);
    fn set_border_width(&mut self, window: x::Window, width: u32);
    fn move_window(&mut self, window: x::Window, pos: Vector2D);
    fn raise(&mut self, window: x::Window);
    fn lower(&mut self, window: x::Window);

    /// Whether any client selects button presses on `window`.
    fn selects_button_press(&mut self, window: x::Window) -> bool;
    /// Grab the move button with the modifier on an icon frame so that the
    /// icon can be dragged even when a live icon window covers it.
    fn grab_move_button(&mut self, window: x::Window);
    fn grab_pointer(&mut self, window: x::Window) -> bool;
    fn change_pointer_grab(&mut self, cursor: Cursor);
    fn ungrab_pointer(&mut self);
}

/// Width and height of a request, which the protocol caps at 16 bits.
fn extent(width: u32, height: u32) -> Result<(u16, u16), Error> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(request_width), Ok(request_height)) => Ok((request_width, request_height)),
        _ => Err(Error::ImageTooLarge(width, height)),
    }
}

/// Clamp a size for requests that have no way to fail.
fn saturate(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn coord(value: i32) -> i16 {
    value.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

/// The drag loop only listens to these.
pub fn drag_event_mask() -> x::EventMask {
    x::EventMask::BUTTON_MOTION | x::EventMask::BUTTON_RELEASE | x::EventMask::BUTTON_PRESS
}

/// X server backed [`Display`].
pub struct XcbDisplay {
    conn: Arc<xcb::Connection>,
    root: x::Window,
    depth: u8,
    visual: x::Visualid,
    colormap: x::Colormap,
    rgb_shifts: (u8, u8, u8),
    white_pixel: u32,
    font: x::Font,
    font_metrics: FontMetrics,
    pens: IndexMap<Pen, x::Gcontext>,
    scratch_gc: x::Gcontext,
    arrow_cursor: x::Cursor,
    move_cursor: x::Cursor,
}

impl XcbDisplay {
    pub fn new(
        conn: Arc<xcb::Connection>,
        screen_num: usize,
        theme: &Theme,
        font_name: &str,
    ) -> Result<Self, Error> {
        let setup = conn.get_setup();
        let screen = setup
            .roots()
            .nth(screen_num)
            .ok_or(Error::ScreenNotFound(screen_num))?;
        let rgb_shifts = rgb_shifts(screen)?;
        let root = screen.root();
        let depth = screen.root_depth();
        let visual = screen.root_visual();
        let colormap = screen.default_colormap();
        let white_pixel = screen.white_pixel();

        let font = conn.generate_id();
        let cookie = conn.send_request_checked(&x::OpenFont {
            fid: font,
            name: font_name.as_bytes(),
        });
        conn.check_request(cookie)?;
        let cookie = conn.send_request(&x::QueryFont {
            font: x::Fontable::Font(font),
        });
        let font_metrics = FontMetrics::from_query(&conn.wait_for_reply(cookie)?);

        let scratch_gc = conn.generate_id();
        let cookie = conn.send_request_checked(&x::CreateGc {
            cid: scratch_gc,
            drawable: x::Drawable::Window(root),
            value_list: &[x::Gc::Font(font), x::Gc::GraphicsExposures(false)],
        });
        conn.check_request(cookie)?;

        let (arrow_cursor, move_cursor) = create_cursors(&conn)?;

        let mut display = Self {
            conn,
            root,
            depth,
            visual,
            colormap,
            rgb_shifts,
            white_pixel,
            font,
            font_metrics,
            pens: IndexMap::new(),
            scratch_gc,
            arrow_cursor,
            move_cursor,
        };
        display.create_pens(theme)?;
        let colormap = display.colormap.resource_id();
        tracing::debug!(depth, colormap, "display ready");

        Ok(display)
    }

    pub fn font_metrics(&self) -> &FontMetrics {
        &self.font_metrics
    }

    pub fn arrow_cursor(&self) -> x::Cursor {
        self.arrow_cursor
    }

    fn pixel(&self, color: Rgba) -> u32 {
        let (r_shift, g_shift, b_shift) = self.rgb_shifts;
        (u32::from(color.r) << r_shift) | (u32::from(color.g) << g_shift) | (u32::from(color.b) << b_shift)
    }

    fn create_pens(&mut self, theme: &Theme) -> Result<(), Error> {
        for pen in [
            Pen::TitleBack,
            Pen::TitleLight,
            Pen::TitleDim,
            Pen::TitleText,
            Pen::Select,
        ] {
            let gc = self.conn.generate_id();
            let foreground = self.pixel(pen_color(theme, pen));
            let cookie = if pen == Pen::Select {
                self.conn.send_request_checked(&x::CreateGc {
                    cid: gc,
                    drawable: x::Drawable::Window(self.root),
                    value_list: &[
                        x::Gc::Foreground(foreground),
                        x::Gc::LineStyle(x::LineStyle::OnOffDash),
                        x::Gc::GraphicsExposures(false),
                    ],
                })
            } else {
                self.conn.send_request_checked(&x::CreateGc {
                    cid: gc,
                    drawable: x::Drawable::Window(self.root),
                    value_list: &[
                        x::Gc::Foreground(foreground),
                        x::Gc::Font(self.font),
                        x::Gc::GraphicsExposures(false),
                    ],
                })
            };
            self.conn.check_request(cookie)?;
            if let Some(old) = self.pens.insert(pen, gc) {
                self.conn.send_request(&x::FreeGc { gc: old });
            }
        }
        Ok(())
    }

    /// Recolor the pens after a theme change.
    pub fn set_theme(&mut self, theme: &Theme) -> Result<(), Error> {
        self.create_pens(theme)
    }

    fn gc(&self, pen: Pen) -> x::Gcontext {
        self.pens.get(&pen).copied().unwrap_or(self.scratch_gc)
    }

    fn decode(&self, data: &[u8], width: u32, height: u32, depth: u8) -> Result<Image, Error> {
        let mut image = Image::new(width, height);
        match depth {
            1 => {
                let stride = ((width as usize + 31) / 32) * 4;
                for y in 0..height {
                    for x in 0..width {
                        let color = if bit_at(data, stride, x, y) {
                            Rgba::BLACK
                        } else {
                            Rgba::WHITE
                        };
                        image.put_pixel(x, y, color);
                    }
                }
            }
            24 | 32 => {
                let (r_shift, g_shift, b_shift) = self.rgb_shifts;
                for (index, chunk) in data.chunks_exact(4).take((width * height) as usize).enumerate() {
                    let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    let channel = |shift: u8| (value >> shift) as u8;
                    image.put_pixel(
                        index as u32 % width,
                        index as u32 / width,
                        Rgba::opaque(channel(r_shift), channel(g_shift), channel(b_shift)),
                    );
                }
            }
            depth => return Err(Error::UnsupportedDepth(depth)),
        }
        Ok(image)
    }

    fn get_image(&self, target: Target, width: u32, height: u32) -> Result<x::GetImageReply, Error> {
        let (width, height) = extent(width, height)?;
        let cookie = self.conn.send_request(&x::GetImage {
            format: x::ImageFormat::ZPixmap,
            drawable: target.drawable(),
            x: 0,
            y: 0,
            width,
            height,
            plane_mask: u32::MAX,
        });
        Ok(self.conn.wait_for_reply(cookie)?)
    }
}

fn bit_at(data: &[u8], stride: usize, x: u32, y: u32) -> bool {
    data.get(y as usize * stride + x as usize / 8)
        .is_some_and(|byte| byte >> (x % 8) & 1 == 1)
}

fn pen_color(theme: &Theme, pen: Pen) -> Rgba {
    match pen {
        Pen::TitleBack => theme.icon_title_back,
        Pen::TitleLight => theme.icon_title_light,
        Pen::TitleDim => theme.icon_title_dim,
        Pen::TitleText => theme.icon_title_color,
        Pen::Select => theme.select_color,
    }
}

/// Channel shifts of the root visual.
fn rgb_shifts(screen: &x::Screen) -> Result<(u8, u8, u8), Error> {
    let depth = screen.root_depth();
    let visual = screen
        .allowed_depths()
        .filter(|allowed| allowed.depth() == depth)
        .flat_map(|allowed| allowed.visuals())
        .find(|visual| visual.visual_id() == screen.root_visual())
        .ok_or(Error::UnsupportedDepth(depth))?;

    if visual.class() != x::VisualClass::TrueColor || (depth != 24 && depth != 32) {
        return Err(Error::UnsupportedVisual(depth, visual.class()));
    }

    Ok((
        visual.red_mask().trailing_zeros() as u8,
        visual.green_mask().trailing_zeros() as u8,
        visual.blue_mask().trailing_zeros() as u8,
    ))
}

fn create_cursors(conn: &xcb::Connection) -> Result<(x::Cursor, x::Cursor), Error> {
    let cursor_font: x::Font = conn.generate_id();
    let cookie = conn.send_request_checked(&x::OpenFont {
        fid: cursor_font,
        name: b"cursor",
    });
    conn.check_request(cookie)?;

    let glyph_cursor = |glyph: u16| -> Result<x::Cursor, Error> {
        let cursor = conn.generate_id();
        let cookie = conn.send_request_checked(&x::CreateGlyphCursor {
            cid: cursor,
            source_font: cursor_font,
            mask_font: cursor_font,
            source_char: glyph,
            mask_char: glyph + 1,
            fore_red: 0,
            fore_green: 0,
            fore_blue: 0,
            back_red: u16::MAX,
            back_green: u16::MAX,
            back_blue: u16::MAX,
        });
        conn.check_request(cookie)?;
        Ok(cursor)
    };
    let cursors = (glyph_cursor(XC_LEFT_PTR)?, glyph_cursor(XC_FLEUR)?);

    conn.send_request(&x::CloseFont { font: cursor_font });
    Ok(cursors)
}

/// PolyText8 items: a length byte, a delta byte, then at most 254 bytes.
fn text_items(text: &str) -> Vec<u8> {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect();
    let mut items = Vec::with_capacity(bytes.len() + 2);
    for chunk in bytes.chunks(254) {
        items.push(chunk.len() as u8);
        items.push(0);
        items.extend_from_slice(chunk);
    }
    items
}

impl Display for XcbDisplay {
    fn root(&self) -> x::Window {
        self.root
    }

    fn create_frame(&mut self, pos: Vector2D, size: u32, save_under: bool) -> Result<x::Window, Error> {
        let (width, height) = extent(size, size)?;
        let window = self.conn.generate_id();
        let cookie = self.conn.send_request_checked(&x::CreateWindow {
            depth: self.depth,
            wid: window,
            parent: self.root,
            x: coord(pos.x),
            y: coord(pos.y),
            width,
            height,
            border_width: 0,
            class: x::WindowClass::InputOutput,
            visual: self.visual,
            value_list: &[
                x::Cw::BorderPixel(self.white_pixel),
                x::Cw::OverrideRedirect(true),
                x::Cw::SaveUnder(save_under),
                x::Cw::EventMask(
                    x::EventMask::EXPOSURE
                        | x::EventMask::BUTTON_PRESS
                        | x::EventMask::BUTTON_RELEASE
                        | x::EventMask::BUTTON_MOTION,
                ),
                x::Cw::Colormap(self.colormap),
            ],
        });
        self.conn.check_request(cookie)?;
        Ok(window)
    }

    fn destroy_window(&mut self, window: x::Window) {
        self.conn.send_request(&x::DestroyWindow { window });
    }

    fn geometry(&mut self, target: Target) -> Result<Geometry, Error> {
        let cookie = self.conn.send_request(&x::GetGeometry {
            drawable: target.drawable(),
        });
        let reply = self.conn.wait_for_reply(cookie)?;
        Ok(Geometry {
            width: reply.width().into(),
            height: reply.height().into(),
            depth: reply.depth(),
        })
    }

    fn capture(&mut self, target: Target, mask: Option<x::Pixmap>) -> Result<Image, Error> {
        let geometry = self.geometry(target)?;
        let reply = self.get_image(target, geometry.width, geometry.height)?;
        let mut image = self.decode(reply.data(), geometry.width, geometry.height, reply.depth())?;

        if let Some(mask) = mask {
            let mask_geometry = self.geometry(Target::Pixmap(mask))?;
            let width = mask_geometry.width.min(geometry.width);
            let height = mask_geometry.height.min(geometry.height);
            let reply = self.get_image(Target::Pixmap(mask), mask_geometry.width, mask_geometry.height)?;
            let stride = ((mask_geometry.width as usize + 31) / 32) * 4;
            for y in 0..height {
                for x in 0..width {
                    if !bit_at(reply.data(), stride, x, y) {
                        image.put_pixel(x, y, image.pixel(x, y).with_alpha(0));
                    }
                }
            }
        }
        Ok(image)
    }

    fn image_to_pixmap(&mut self, image: &Image) -> Result<x::Pixmap, Error> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Error::ImageTooLarge(width, height));
        }
        let (request_width, _) = extent(width, height)?;
        let pixmap = self.create_pixmap(width, height)?;

        let data: Vec<u32> = image
            .as_rgba()
            .chunks_exact(4)
            .map(|rgba| self.pixel(Rgba::opaque(rgba[0], rgba[1], rgba[2])))
            .collect();
        let rows_per_request = (MAX_PUT_IMAGE_BYTES / (width as usize * 4)).max(1);
        for (band, rows) in data.chunks(rows_per_request * width as usize).enumerate() {
            let cookie = self.conn.send_request_checked(&x::PutImage {
                format: x::ImageFormat::ZPixmap,
                drawable: x::Drawable::Pixmap(pixmap),
                gc: self.scratch_gc,
                width: request_width,
                height: saturate((rows.len() / width as usize) as u32),
                dst_x: 0,
                dst_y: coord((band * rows_per_request) as i32),
                left_pad: 0,
                depth: self.depth,
                data: bytemuck::cast_slice(rows),
            });
            if let Err(err) = self.conn.check_request(cookie) {
                self.free_pixmap(pixmap);
                return Err(err.into());
            }
        }
        Ok(pixmap)
    }

    fn create_pixmap(&mut self, width: u32, height: u32) -> Result<x::Pixmap, Error> {
        let (request_width, request_height) = extent(width, height)?;
        let pixmap = self.conn.generate_id();
        let cookie = self.conn.send_request_checked(&x::CreatePixmap {
            depth: self.depth,
            pid: pixmap,
            drawable: x::Drawable::Window(self.root),
            width: request_width,
            height: request_height,
        });
        self.conn.check_request(cookie)?;
        Ok(pixmap)
    }

    fn free_pixmap(&mut self, pixmap: x::Pixmap) {
        self.conn.send_request(&x::FreePixmap { pixmap });
    }

    fn copy_area(
        &mut self,
        src: Target,
        dst: Target,
        src_pos: Vector2D,
        dst_pos: Vector2D,
        width: u32,
        height: u32,
    ) {
        self.conn.send_request(&x::CopyArea {
            src_drawable: src.drawable(),
            dst_drawable: dst.drawable(),
            gc: self.scratch_gc,
            src_x: coord(src_pos.x),
            src_y: coord(src_pos.y),
            dst_x: coord(dst_pos.x),
            dst_y: coord(dst_pos.y),
            width: saturate(width),
            height: saturate(height),
        });
    }

    fn set_background(&mut self, window: x::Window, pixmap: x::Pixmap) {
        self.conn.send_request(&x::ChangeWindowAttributes {
            window,
            value_list: &[x::Cw::BackPixmap(pixmap)],
        });
    }

    fn clear_area(&mut self, window: x::Window, x: i32, y: i32, width: u32, height: u32, exposures: bool) {
        self.conn.send_request(&x::ClearArea {
            exposures,
            window,
            x: coord(x),
            y: coord(y),
            width: saturate(width),
            height: saturate(height),
        });
    }

    fn fill_rectangle(&mut self, target: Target, pen: Pen, x: i32, y: i32, width: u32, height: u32) {
        self.conn.send_request(&x::PolyFillRectangle {
            drawable: target.drawable(),
            gc: self.gc(pen),
            rectangles: &[x::Rectangle {
                x: coord(x),
                y: coord(y),
                width: saturate(width),
                height: saturate(height),
            }],
        });
    }

    fn draw_line(&mut self, target: Target, pen: Pen, from: Vector2D, to: Vector2D) {
        self.conn.send_request(&x::PolyLine {
            coordinate_mode: x::CoordMode::Origin,
            drawable: target.drawable(),
            gc: self.gc(pen),
            points: &[
                x::Point {
                    x: coord(from.x),
                    y: coord(from.y),
                },
                x::Point {
                    x: coord(to.x),
                    y: coord(to.y),
                },
            ],
        });
    }

    fn draw_rectangle(&mut self, target: Target, pen: Pen, x: i32, y: i32, width: u32, height: u32) {
        self.conn.send_request(&x::PolyRectangle {
            drawable: target.drawable(),
            gc: self.gc(pen),
            rectangles: &[x::Rectangle {
                x: coord(x),
                y: coord(y),
                width: saturate(width),
                height: saturate(height),
            }],
        });
    }

    fn draw_text(&mut self, target: Target, pen: Pen, x: i32, y: i32, text: &str) {
        self.conn.send_request(&x::PolyText8 {
            drawable: target.drawable(),
            gc: self.gc(pen),
            x: coord(x),
            y: coord(y + self.font_metrics.ascent() as i32),
            items: &text_items(text),
        });
    }

    fn draw_colored_text(&mut self, target: Target, color: Rgba, x: i32, y: i32, text: &str) {
        self.conn.send_request(&x::ChangeGc {
            gc: self.scratch_gc,
            value_list: &[x::Gc::Foreground(self.pixel(color))],
        });
        self.conn.send_request(&x::PolyText8 {
            drawable: target.drawable(),
            gc: self.scratch_gc,
            x: coord(x),
            y: coord(y + self.font_metrics.ascent() as i32),
            items: &text_items(text),
        });
    }

    fn set_dash_offset(&mut self, pen: Pen, offset: u16) {
        self.conn.send_request(&x::ChangeGc {
            gc: self.gc(pen),
            value_list: &[x::Gc::DashOffset(offset.into())],
        });
    }

    fn reparent(&mut self, window: x::Window, parent: x::Window, pos: Vector2D) {
        self.conn.send_request(&x::ReparentWindow {
            window,
            parent,
            x: coord(pos.x),
            y: coord(pos.y),
        });
    }

    fn map(&mut self, window: x::Window) {
        self.conn.send_request(&x::MapWindow { window });
    }

    fn unmap(&mut self, window: x::Window) {
        self.conn.send_request(&x::UnmapWindow { window });
    }

    fn add_to_save_set(&mut self, window: x::Window) {
        self.conn.send_request(&x::ChangeSaveSet {
            mode: x::SetMode::Insert,
            window,
        });
    }

    fn set_border_width(&mut self, window: x::Window, width: u32) {
        self.conn.send_request(&x::ConfigureWindow {
            window,
            value_list: &[x::ConfigWindow::BorderWidth(width)],
        });
    }

    fn move_window(&mut self, window: x::Window, pos: Vector2D) {
        self.conn.send_request(&x::ConfigureWindow {
            window,
            value_list: &[x::ConfigWindow::X(pos.x), x::ConfigWindow::Y(pos.y)],
        });
    }

    fn raise(&mut self, window: x::Window) {
        self.conn.send_request(&x::ConfigureWindow {
            window,
            value_list: &[x::ConfigWindow::StackMode(x::StackMode::Above)],
        });
    }

    fn lower(&mut self, window: x::Window) {
        self.conn.send_request(&x::ConfigureWindow {
            window,
            value_list: &[x::ConfigWindow::StackMode(x::StackMode::Below)],
        });
    }

    fn selects_button_press(&mut self, window: x::Window) -> bool {
        let cookie = self.conn.send_request(&x::GetWindowAttributes { window });
        match self.conn.wait_for_reply(cookie) {
            Ok(reply) => reply.all_event_masks().contains(x::EventMask::BUTTON_PRESS),
            Err(err) => {
                tracing::debug!("cannot read attributes of {:?}: {}", window, err);
                false
            }
        }
    }

    fn grab_move_button(&mut self, window: x::Window) {
        self.conn.send_request(&x::GrabButton {
            owner_events: true,
            grab_window: window,
            event_mask: x::EventMask::BUTTON_PRESS,
            pointer_mode: x::GrabMode::Sync,
            keyboard_mode: x::GrabMode::Async,
            confine_to: x::Window::none(),
            cursor: self.arrow_cursor,
            button: MOVE_BUTTON,
            modifiers: MOD_KEY,
        });
    }

    fn grab_pointer(&mut self, window: x::Window) -> bool {
        let cookie = self.conn.send_request(&x::GrabPointer {
            owner_events: false,
            grab_window: window,
            event_mask: drag_event_mask(),
            pointer_mode: x::GrabMode::Async,
            keyboard_mode: x::GrabMode::Async,
            confine_to: x::Window::none(),
            cursor: x::Cursor::none(),
            time: x::CURRENT_TIME,
        });
        match self.conn.wait_for_reply(cookie) {
            Ok(reply) => reply.status() == x::GrabStatus::Success,
            Err(err) => {
                tracing::warn!("pointer grab failed: {}", err);
                false
            }
        }
    }

    fn change_pointer_grab(&mut self, cursor: Cursor) {
        let cursor = match cursor {
            Cursor::Arrow => self.arrow_cursor,
            Cursor::Move => self.move_cursor,
        };
        self.conn.send_request(&x::ChangeActivePointerGrab {
            cursor,
            time: x::CURRENT_TIME,
            event_mask: drag_event_mask(),
        });
    }

    fn ungrab_pointer(&mut self) {
        self.conn.send_request(&x::UngrabPointer {
            time: x::CURRENT_TIME,
        });
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_extent() {
        assert_eq!(extent(64, 65535).unwrap(), (64, u16::MAX));
        assert!(matches!(extent(70000, 64), Err(Error::ImageTooLarge(70000, 64))));
        assert_eq!(saturate(70000), u16::MAX);
        assert_eq!(coord(40000), i16::MAX);
        assert_eq!(coord(-40000), i16::MIN);
        assert_eq!(coord(-3), -3);
    }

    #[test]
    fn test_text_items() {
        assert_eq!(text_items("ab"), vec![2, 0, b'a', b'b']);
        assert_eq!(text_items("é"), vec![1, 0, 0xe9]);

        let long = "x".repeat(300);
        let items = text_items(&long);
        assert_eq!(items[0], 254);
        assert_eq!(items[256], 46);
        assert_eq!(items.len(), 300 + 4);
    }

    #[test]
    fn test_bit_at() {
        // Two rows of a 3 pixel wide bitmap, padded to 32 bits.
        let data = [0b101, 0, 0, 0, 0b010, 0, 0, 0];

        assert!(bit_at(&data, 4, 0, 0));
        assert!(!bit_at(&data, 4, 1, 0));
        assert!(bit_at(&data, 4, 2, 0));
        assert!(bit_at(&data, 4, 1, 1));
        assert!(!bit_at(&data, 4, 0, 2));
    }
}
