//! RGBA images used to build icons.
//!
//! Images handed around between icons are [`SharedImage`]s: the tile and the
//! default image are shared by every icon of a screen, so anything that wants
//! to draw on one clones it first.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
    rc::Rc,
    sync::OnceLock,
};

use image::{imageops, RgbaImage};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to write image: {0}")]
    Io(#[from] io::Error),
    #[error("Buffer of {len} pixels does not match a {width}x{height} image.")]
    BadBuffer { width: u32, height: u32, len: usize },
    #[error("Invalid color {0:?}.")]
    BadColor(String),
    #[error("Invalid XPM image: {0}.")]
    BadXpm(String),
}

pub type SharedImage = Rc<Image>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrrgggbbb`, `#rrrrggggbbbb`, `#rrggbbaa` or
    /// an X11 color name such as `gray50` or `light gray`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let bad = || Error::BadColor(value.to_owned());
        match value.strip_prefix('#') {
            Some(hex) => Self::parse_hex(hex).ok_or_else(bad),
            None => color_names().get(&color_key(value)).copied().ok_or_else(bad),
        }
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        // Wider channels keep their most significant byte.
        let channel = |i: usize, digits: usize| -> Option<u8> {
            let value = u16::from_str_radix(hex.get(i * digits..(i + 1) * digits)?, 16).ok()?;
            Some(match digits {
                1 => value as u8 * 0x11,
                2 => value as u8,
                3 => (value >> 4) as u8,
                _ => (value >> 8) as u8,
            })
        };
        match hex.len() {
            8 => Some(Self::new(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, channel(3, 2)?)),
            3 | 6 | 9 | 12 => {
                let digits = hex.len() / 3;
                Some(Self::opaque(channel(0, digits)?, channel(1, digits)?, channel(2, digits)?))
            }
            _ => None,
        }
    }
}

/// Names compare without case or spaces, as the X server does.
fn color_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The X.org color database.
fn color_names() -> &'static IndexMap<String, Rgba> {
    static NAMES: OnceLock<IndexMap<String, Rgba>> = OnceLock::new();
    NAMES.get_or_init(|| parse_color_names(include_str!("../data/rgb.txt")))
}

fn parse_color_names(text: &str) -> IndexMap<String, Rgba> {
    text.lines()
        .filter(|line| !line.starts_with('!'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let mut channel = || fields.next()?.parse::<u8>().ok();
            let color = Rgba::opaque(channel()?, channel()?, channel()?);
            let name: Vec<&str> = fields.collect();
            (!name.is_empty()).then(|| (color_key(&name.concat()), color))
        })
        .collect()
}

impl TryFrom<String> for Rgba {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

fn blend(src: u8, dst: u8, alpha: u32) -> u8 {
    ((src as u32 * alpha + dst as u32 * (255 - alpha)) / 255) as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    buf: RgbaImage,
}

impl Image {
    /// A fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: RgbaImage::new(width, height),
        }
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            buf: RgbaImage::from_pixel(width, height, image::Rgba([color.r, color.g, color.b, color.a])),
        }
    }

    /// Top to bottom gradient between two opaque colors.
    pub fn vertical_gradient(width: u32, height: u32, from: Rgba, to: Rgba) -> Self {
        let span = height.saturating_sub(1).max(1);
        let buf = RgbaImage::from_fn(width, height, |_, y| {
            let t = y * 255 / span;
            image::Rgba([
                blend(to.r, from.r, t),
                blend(to.g, from.g, t),
                blend(to.b, from.b, t),
                0xff,
            ])
        });
        Self { buf }
    }

    /// Build an image from packed RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        let len = data.len() / 4;
        RgbaImage::from_raw(width, height, data)
            .map(|buf| Self { buf })
            .ok_or(Error::BadBuffer { width, height, len })
    }

    /// Build an image from `0xAARRGGBB` pixels, as found in `_NET_WM_ICON`.
    pub fn from_argb32(width: u32, height: u32, pixels: &[u32]) -> Result<Self, Error> {
        if pixels.len() != width as usize * height as usize {
            return Err(Error::BadBuffer {
                width,
                height,
                len: pixels.len(),
            });
        }
        let data = pixels
            .iter()
            .flat_map(|&argb| {
                let [a, r, g, b] = argb.to_be_bytes();
                [r, g, b, a]
            })
            .collect();
        Self::from_rgba(width, height, data)
    }

    /// Decode an image file of any format the `image` crate knows, or an XPM
    /// file as written by [`Image::save_xpm`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let is_xpm = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xpm"));
        if is_xpm {
            return Self::read_xpm(&fs::read_to_string(path)?);
        }
        Ok(Self {
            buf: image::open(path)?.to_rgba8(),
        })
    }

    /// Parse XPM3 text. Pixel colors come from the `c` key, falling back to
    /// the grayscale and monochrome keys.
    pub fn read_xpm(text: &str) -> Result<Self, Error> {
        let bad = |what: &str| Error::BadXpm(what.to_owned());
        let mut strings = text.split('"').skip(1).step_by(2);

        let header = strings.next().ok_or_else(|| bad("missing header"))?;
        let values: Vec<u32> = header
            .split_whitespace()
            .take(4)
            .map(|value| value.parse().map_err(|_| bad("bad header")))
            .collect::<Result<_, _>>()?;
        let [width, height, colors, cpp] = values[..] else {
            return Err(bad("short header"));
        };
        if width == 0 || height == 0 || width > MAX_XPM_SIDE || height > MAX_XPM_SIDE {
            return Err(bad("unsupported size"));
        }
        if cpp == 0 || cpp > MAX_XPM_CPP {
            return Err(bad("unsupported chars per pixel"));
        }
        let cpp = cpp as usize;

        let mut palette = IndexMap::new();
        for _ in 0..colors {
            let line = strings.next().ok_or_else(|| bad("missing color"))?;
            let code = line.get(..cpp).ok_or_else(|| bad("short color"))?;
            let rest = line.get(cpp..).ok_or_else(|| bad("short color"))?;
            palette.insert(code.to_owned(), xpm_color(rest)?);
        }

        let row_len = width as usize * cpp;
        let rows: Vec<&str> = strings.by_ref().take(height as usize).collect();
        if rows.len() < height as usize {
            return Err(bad("missing row"));
        }
        if rows.iter().any(|row| row.len() < row_len) {
            return Err(bad("short row"));
        }

        let mut image = Self::new(width, height);
        for (y, row) in (0..height).zip(&rows) {
            for x in 0..width {
                let start = x as usize * cpp;
                let code = row.get(start..start + cpp).ok_or_else(|| bad("short row"))?;
                let color = palette.get(code).ok_or_else(|| bad("unknown pixel code"))?;
                image.put_pixel(x, y, *color);
            }
        }
        Ok(image)
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let [r, g, b, a] = self.buf.get_pixel(x, y).0;
        Rgba::new(r, g, b, a)
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        self.buf
            .put_pixel(x, y, image::Rgba([color.r, color.g, color.b, color.a]));
    }

    /// Packed RGBA bytes, row by row.
    pub fn as_rgba(&self) -> &[u8] {
        self.buf.as_raw()
    }

    /// Composite the `width`x`height` area of `src` at (`sx`, `sy`) onto this
    /// image at (`dx`, `dy`), weighting by the source alpha only.
    #[allow(clippy::too_many_arguments)]
    pub fn combine_area(
        &mut self,
        src: &Image,
        sx: u32,
        sy: u32,
        width: u32,
        height: u32,
        dx: i32,
        dy: i32,
    ) {
        self.combine_area_with_opaqueness(src, sx, sy, width, height, dx, dy, 0xff);
    }

    /// Like [`Image::combine_area`], with the source alpha further scaled by
    /// `opaqueness / 255`. The area is clipped to both images.
    #[allow(clippy::too_many_arguments)]
    pub fn combine_area_with_opaqueness(
        &mut self,
        src: &Image,
        sx: u32,
        sy: u32,
        width: u32,
        height: u32,
        dx: i32,
        dy: i32,
        opaqueness: u8,
    ) {
        let (mut sx, mut sy) = (sx as i64, sy as i64);
        let (mut dx, mut dy) = (dx as i64, dy as i64);
        let (mut width, mut height) = (width as i64, height as i64);
        if dx < 0 {
            sx -= dx;
            width += dx;
            dx = 0;
        }
        if dy < 0 {
            sy -= dy;
            height += dy;
            dy = 0;
        }
        width = width
            .min(src.width() as i64 - sx)
            .min(self.width() as i64 - dx);
        height = height
            .min(src.height() as i64 - sy)
            .min(self.height() as i64 - dy);
        if width <= 0 || height <= 0 {
            return;
        }

        for y in 0..height {
            for x in 0..width {
                let s = src.buf.get_pixel((sx + x) as u32, (sy + y) as u32).0;
                let d = self.buf.get_pixel_mut((dx + x) as u32, (dy + y) as u32);
                let alpha = s[3] as u32 * opaqueness as u32 / 255;
                if alpha == 0 {
                    continue;
                }
                d.0 = [
                    blend(s[0], d.0[0], alpha),
                    blend(s[1], d.0[1], alpha),
                    blend(s[2], d.0[2], alpha),
                    (alpha + d.0[3] as u32 * (255 - alpha) / 255) as u8,
                ];
            }
        }
    }

    /// Blend `color` over the whole image using its alpha.
    pub fn overlay(&mut self, color: Rgba) {
        let alpha = color.a as u32;
        for pixel in self.buf.pixels_mut() {
            pixel.0[0] = blend(color.r, pixel.0[0], alpha);
            pixel.0[1] = blend(color.g, pixel.0[1], alpha);
            pixel.0[2] = blend(color.b, pixel.0[2], alpha);
        }
    }

    pub fn scale(&self, width: u32, height: u32) -> Image {
        Self {
            buf: imageops::resize(&self.buf, width, height, imageops::FilterType::Triangle),
        }
    }

    pub fn save_xpm(&self, path: &Path) -> Result<(), Error> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut out = BufWriter::new(File::create(path)?);
        self.write_xpm(&name, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Serialize as an XPM3 image. Pixels with alpha below one half become
    /// transparent (`None`).
    pub fn write_xpm<W: Write>(&self, name: &str, out: &mut W) -> io::Result<()> {
        let mut palette: IndexMap<Option<[u8; 3]>, usize> = IndexMap::new();
        let indices: Vec<usize> = self
            .buf
            .pixels()
            .map(|pixel| {
                let [r, g, b, a] = pixel.0;
                let key = (a >= 0x80).then_some([r, g, b]);
                let next = palette.len();
                *palette.entry(key).or_insert(next)
            })
            .collect();

        let cpp = chars_per_pixel(palette.len());
        let identifier: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        writeln!(out, "/* XPM */")?;
        writeln!(out, "static char *{}[] = {{", identifier)?;
        writeln!(out, "/* columns rows colors chars-per-pixel */")?;
        write!(
            out,
            "\"{} {} {} {}\"",
            self.width(),
            self.height(),
            palette.len(),
            cpp
        )?;
        for (color, &index) in &palette {
            let code = xpm_code(index, cpp);
            match color {
                Some([r, g, b]) => write!(out, ",\n\"{} c #{:02X}{:02X}{:02X}\"", code, r, g, b)?,
                None => write!(out, ",\n\"{} c None\"", code)?,
            }
        }
        for row in indices.chunks(self.width().max(1) as usize) {
            let line: String = row.iter().map(|&index| xpm_code(index, cpp)).collect();
            write!(out, ",\n\"{}\"", line)?;
        }
        writeln!(out, "\n}};")
    }
}

/// Larger than any icon worth showing.
const MAX_XPM_SIDE: u32 = 4096;
const MAX_XPM_CPP: u32 = 8;
const XPM_KEYS: [&str; 5] = ["c", "g", "g4", "m", "s"];

/// Pick the color of an XPM color line, without its pixel code. Values run
/// until the next key, so names may contain spaces.
fn xpm_color(line: &str) -> Result<Rgba, Error> {
    let mut values: IndexMap<&str, Vec<&str>> = IndexMap::new();
    let mut key: Option<&str> = None;
    for token in line.split_whitespace() {
        if XPM_KEYS.contains(&token) && key.map_or(true, |key| !values[key].is_empty()) {
            key = Some(token);
            values.entry(token).or_default();
        } else if let Some(key) = key {
            values[key].push(token);
        }
    }

    let value = ["c", "g", "g4", "m"]
        .iter()
        .find_map(|key| values.get(key).filter(|value| !value.is_empty()))
        .ok_or_else(|| Error::BadXpm("no color key".to_owned()))?
        .join(" ");
    if value.eq_ignore_ascii_case("none") {
        return Ok(Rgba::new(0, 0, 0, 0));
    }
    Rgba::parse(&value)
}

const XPM_CHARS: &[u8] =
    b".#abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@$%&*=-;:+<>,?/!~^|()[]{}_";

fn chars_per_pixel(colors: usize) -> usize {
    let mut cpp = 1;
    let mut capacity = XPM_CHARS.len();
    while capacity < colors {
        cpp += 1;
        capacity *= XPM_CHARS.len();
    }
    cpp
}

fn xpm_code(mut index: usize, cpp: usize) -> String {
    let mut code = String::with_capacity(cpp);
    for _ in 0..cpp {
        code.push(XPM_CHARS[index % XPM_CHARS.len()] as char);
        index /= XPM_CHARS.len();
    }
    code
}
