//! Text measurement for icon titles.

use xcb::x;

const ELLIPSIS: &str = "...";

/// Metrics of a single-byte X core font, queried once so that measuring text
/// does not need a server round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    ascent: i16,
    descent: i16,
    first_char: u16,
    widths: Vec<u16>,
    default_width: u16,
}

impl FontMetrics {
    /// Every character has the same advance.
    pub fn monospace(char_width: u16, ascent: i16, descent: i16) -> Self {
        Self {
            ascent,
            descent,
            first_char: 0,
            widths: Vec::new(),
            default_width: char_width,
        }
    }

    pub fn from_query(reply: &x::QueryFontReply) -> Self {
        let widths = reply
            .char_infos()
            .iter()
            .map(|info| info.character_width.max(0) as u16)
            .collect();

        Self {
            ascent: reply.font_ascent(),
            descent: reply.font_descent(),
            first_char: reply.min_char_or_byte2(),
            widths,
            default_width: reply.max_bounds().character_width.max(0) as u16,
        }
    }

    pub fn ascent(&self) -> i16 {
        self.ascent
    }

    pub fn height(&self) -> u32 {
        (self.ascent + self.descent).max(0) as u32
    }

    fn char_width(&self, c: char) -> u32 {
        let code = c as u32;
        if code > 0xff {
            return self.default_width as u32;
        }
        let index = (code as usize).checked_sub(self.first_char as usize);
        index
            .and_then(|index| self.widths.get(index))
            .copied()
            .unwrap_or(self.default_width) as u32
    }

    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Shorten `text` so that it fits in `width` pixels, marking the cut with
    /// an ellipsis.
    pub fn shrink_string(&self, text: &str, width: u32) -> String {
        shrink_with(text, width, |text| self.text_width(text))
    }
}

/// Shorten `text` as [`FontMetrics::shrink_string`] does, measuring with
/// `measure` instead of the server font.
pub fn shrink_with(text: &str, width: u32, mut measure: impl FnMut(&str) -> u32) -> String {
    if measure(text) <= width {
        return text.to_owned();
    }

    let available = width.saturating_sub(measure(ELLIPSIS));
    let mut used = 0;
    let mut buf = [0; 4];
    let mut shrunk: String = text
        .chars()
        .take_while(|c| {
            used += measure(c.encode_utf8(&mut buf));
            used <= available
        })
        .collect();
    shrunk.push_str(ELLIPSIS);
    shrunk
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn test_height() {
        let font = FontMetrics::monospace(6, 10, 3);
        assert_eq!(font.height(), 13);
    }

    #[rstest]
    #[case("xterm", 60, "xterm")]
    #[case("a very long title", 60, "a very ...")]
    #[case("miniwindow", 60, "miniwindow")]
    #[case("miniwindow", 54, "miniwi...")]
    #[case("abcdef", 18, "...")]
    #[case("abcdef", 2, "...")]
    fn test_shrink_string(#[case] text: &str, #[case] width: u32, #[case] expected: &str) {
        let font = FontMetrics::monospace(6, 10, 3);
        assert_eq!(font.shrink_string(text, width), expected);
    }

    #[test]
    fn test_text_width_uses_char_table() {
        let font = FontMetrics {
            ascent: 10,
            descent: 2,
            first_char: b'a' as u16,
            widths: vec![5, 7],
            default_width: 9,
        };

        assert_eq!(font.text_width("ab"), 12);
        assert_eq!(font.text_width("c"), 9);
        assert_eq!(font.text_width("A"), 9);
    }
}
