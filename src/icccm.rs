//! Functions to interact with the ICCCM specification.

use bitflags::bitflags;
use xcb::{x, XidNew};

use crate::vector::Vector2D;

bitflags! {
    /// Which `WM_HINTS` fields are set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WmHintsFlags: u32 {
        const INPUT = 1 << 0;
        const STATE = 1 << 1;
        const ICON_PIXMAP = 1 << 2;
        const ICON_WINDOW = 1 << 3;
        const ICON_POSITION = 1 << 4;
        const ICON_MASK = 1 << 5;
        const WINDOW_GROUP = 1 << 6;
        const URGENCY = 1 << 8;
    }
}

/// The `WM_HINTS` property. Resources the client did not set are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmHints {
    pub flags: WmHintsFlags,
    pub input: bool,
    pub initial_state: u32,
    pub icon_pixmap: Option<x::Pixmap>,
    pub icon_window: Option<x::Window>,
    pub icon_pos: Option<Vector2D>,
    pub icon_mask: Option<x::Pixmap>,
    pub window_group: Option<x::Window>,
}

impl Default for WmHints {
    fn default() -> Self {
        Self {
            flags: WmHintsFlags::empty(),
            input: true,
            initial_state: 0,
            icon_pixmap: None,
            icon_window: None,
            icon_pos: None,
            icon_mask: None,
            window_group: None,
        }
    }
}

fn resource<T: XidNew>(id: u32) -> Option<T> {
    (id != 0).then(|| unsafe { T::new(id) })
}

impl WmHints {
    /// Decode the 32 bit values of the property. Pre-ICCCM clients send eight
    /// values without the window group.
    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.len() < 8 {
            return None;
        }
        let flags = WmHintsFlags::from_bits_truncate(values[0]);
        let has = |flag| flags.contains(flag);

        Some(Self {
            flags,
            input: !has(WmHintsFlags::INPUT) || values[1] != 0,
            initial_state: if has(WmHintsFlags::STATE) { values[2] } else { 0 },
            icon_pixmap: has(WmHintsFlags::ICON_PIXMAP).then(|| resource(values[3])).flatten(),
            icon_window: has(WmHintsFlags::ICON_WINDOW).then(|| resource(values[4])).flatten(),
            icon_pos: has(WmHintsFlags::ICON_POSITION)
                .then(|| Vector2D::new(values[5] as i32, values[6] as i32)),
            icon_mask: has(WmHintsFlags::ICON_MASK).then(|| resource(values[7])).flatten(),
            window_group: values
                .get(8)
                .filter(|_| has(WmHintsFlags::WINDOW_GROUP))
                .and_then(|&id| resource(id)),
        })
    }
}

/// Get the WM_HINTS property from a window.
pub fn get_wm_hints(conn: &xcb::Connection, window: x::Window) -> xcb::Result<Option<WmHints>> {
    let cookie = conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: x::ATOM_WM_HINTS,
        r#type: x::ATOM_WM_HINTS,
        long_offset: 0,
        long_length: 9,
    });

    let reply = conn.wait_for_reply(cookie)?;
    if reply.format() != 32 {
        return Ok(None);
    }

    Ok(WmHints::from_values(reply.value()))
}

/// Split `WM_CLASS` into its instance and class names.
pub fn parse_wm_class(data: &[u8]) -> (Option<String>, Option<String>) {
    let mut names = data
        .split(|&byte| byte == 0)
        .map(|name| String::from_utf8_lossy(name).into_owned());
    let mut next = || names.next().filter(|name| !name.is_empty());
    let instance = next();
    let class = next();
    (instance, class)
}

/// Get the WM_CLASS property from a window as (instance, class).
pub fn get_wm_class(
    conn: &xcb::Connection,
    window: x::Window,
) -> xcb::Result<(Option<String>, Option<String>)> {
    let cookie = conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: x::ATOM_WM_CLASS,
        r#type: x::ATOM_STRING,
        long_offset: 0,
        long_length: 256,
    });

    let reply = conn.wait_for_reply(cookie)?;
    if reply.format() != 8 {
        return Ok((None, None));
    }

    Ok(parse_wm_class(reply.value()))
}

/// Get the WM_ICON_NAME property from a window.
pub fn get_wm_icon_name(conn: &xcb::Connection, window: x::Window) -> xcb::Result<Option<String>> {
    let cookie = conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: x::ATOM_WM_ICON_NAME,
        r#type: x::ATOM_ANY,
        long_offset: 0,
        long_length: 256,
    });

    let reply = conn.wait_for_reply(cookie)?;
    if reply.format() != 8 || reply.value::<u8>().is_empty() {
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(reply.value()).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use xcb::Xid;

    #[test]
    fn test_wm_hints_from_values() {
        let flags = (WmHintsFlags::ICON_PIXMAP | WmHintsFlags::ICON_MASK | WmHintsFlags::ICON_POSITION).bits();

        let hints = WmHints::from_values(&[flags, 0, 0, 0x200, 0x300, 10, 20, 0x400, 0x500]).unwrap();

        assert_eq!(hints.icon_pixmap.map(|pixmap| pixmap.resource_id()), Some(0x200));
        assert_eq!(hints.icon_mask.map(|mask| mask.resource_id()), Some(0x400));
        assert_eq!(hints.icon_pos, Some(Vector2D::new(10, 20)));
        assert_eq!(hints.icon_window, None);
        assert_eq!(hints.window_group, None);
        assert!(hints.input);
    }

    #[test]
    fn test_wm_hints_ignores_none_resources() {
        let flags = (WmHintsFlags::ICON_PIXMAP | WmHintsFlags::ICON_WINDOW).bits();

        let hints = WmHints::from_values(&[flags, 0, 0, 0, 0x300, 0, 0, 0]).unwrap();

        assert_eq!(hints.icon_pixmap, None);
        assert_eq!(hints.icon_window.map(|window| window.resource_id()), Some(0x300));
    }

    #[test]
    fn test_wm_hints_too_short() {
        assert_eq!(WmHints::from_values(&[4, 0, 0]), None);
    }

    #[rstest]
    #[case(b"xterm\0XTerm\0", Some("xterm"), Some("XTerm"))]
    #[case(b"xterm\0XTerm", Some("xterm"), Some("XTerm"))]
    #[case(b"\0Emacs\0", None, Some("Emacs"))]
    #[case(b"", None, None)]
    fn test_parse_wm_class(#[case] data: &[u8], #[case] instance: Option<&str>, #[case] class: Option<&str>) {
        let (parsed_instance, parsed_class) = parse_wm_class(data);

        assert_eq!(parsed_instance.as_deref(), instance);
        assert_eq!(parsed_class.as_deref(), class);
    }
}
