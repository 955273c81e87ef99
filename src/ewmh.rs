//! Functions to interact with the EWMH specification.

use xcb::x;

use crate::{atoms::Atoms, raster::Image};

// Set the _NET_SUPPORTED property on the root window.
// This is needed to indicate which hints are supported by the window manager.
pub fn set_supported(conn: &xcb::Connection, atoms: &Atoms, root: x::Window) {
    conn.send_request(&x::ChangeProperty {
        mode: x::PropMode::Replace,
        window: root,
        property: atoms.net_supported,
        r#type: x::ATOM_ATOM,
        data: &[
            atoms.net_supported,
            atoms.net_active_window,
            atoms.net_supporting_wm_check,
            atoms.net_wm_name,
            atoms.net_wm_icon,
            atoms.net_wm_icon_name,
        ],
    });
}

/// Set the _NET_SUPPORTING_WM_CHECK property on the root and child windows.
/// This is needed to indicate that a compliant window manager is active.
pub fn set_supporting_wm_check(
    conn: &xcb::Connection,
    atoms: &Atoms,
    root: x::Window,
    child: x::Window,
) {
    for window in [child, root] {
        conn.send_request(&x::ChangeProperty {
            mode: x::PropMode::Replace,
            window,
            property: atoms.net_supporting_wm_check,
            r#type: x::ATOM_WINDOW,
            data: &[child],
        });
    }
}

/// Set the _NET_WM_NAME property on the child window.
/// This is needed to indicate the name of the window manager.
pub fn set_wm_name(conn: &xcb::Connection, atoms: &Atoms, child: x::Window, wm_name: &str) {
    conn.send_request(&x::ChangeProperty {
        mode: x::PropMode::Replace,
        window: child,
        property: atoms.net_wm_name,
        r#type: atoms.utf8_string,
        data: wm_name.as_bytes(),
    });
}

/// Set the _NET_ACTIVE_WINDOW property on the root window.
/// This is needed to indicate the currently active window.
pub fn set_active_window(
    conn: &xcb::Connection,
    atoms: &Atoms,
    root: x::Window,
    window: x::Window,
) {
    conn.send_request(&x::ChangeProperty {
        mode: x::PropMode::Replace,
        window: root,
        property: atoms.net_active_window,
        r#type: x::ATOM_WINDOW,
        data: &[window],
    });
}

/// Pick an image out of _NET_WM_ICON data.
///
/// The property is a list of `width, height, pixels...` entries. The smallest
/// entry covering `size` on both sides wins, else the largest one. Entries
/// with a bogus size end the list.
pub fn parse_wm_icon(data: &[u32], size: u32) -> Option<Image> {
    let mut entries = Vec::new();
    let mut rest = data;
    while let [width, height, tail @ ..] = rest {
        let len = (*width as usize).checked_mul(*height as usize)?;
        if *width == 0 || *height == 0 || len > tail.len() {
            tracing::debug!(width, height, "truncated _NET_WM_ICON entry");
            break;
        }
        entries.push((*width, *height, &tail[..len]));
        rest = &tail[len..];
    }

    let area = |width: u32, height: u32| width as u64 * height as u64;
    let best = entries
        .iter()
        .filter(|(width, height, _)| *width >= size && *height >= size)
        .min_by_key(|(width, height, _)| area(*width, *height))
        .or_else(|| entries.iter().max_by_key(|(width, height, _)| area(*width, *height)))?;

    let (width, height, pixels) = *best;
    Image::from_argb32(width, height, pixels)
        .map_err(|err| tracing::debug!("bad _NET_WM_ICON entry: {}", err))
        .ok()
}

/// Get the _NET_WM_ICON property of a window as an image close to `size`.
pub fn get_wm_icon(
    conn: &xcb::Connection,
    atoms: &Atoms,
    window: x::Window,
    size: u32,
) -> xcb::Result<Option<Image>> {
    let cookie = conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: atoms.net_wm_icon,
        r#type: x::ATOM_CARDINAL,
        long_offset: 0,
        long_length: u32::MAX,
    });

    let reply = conn.wait_for_reply(cookie)?;
    if reply.format() != 32 {
        return Ok(None);
    }

    Ok(parse_wm_icon(reply.value(), size))
}

/// Get the _NET_WM_ICON_NAME property of a window.
pub fn get_wm_icon_name(
    conn: &xcb::Connection,
    atoms: &Atoms,
    window: x::Window,
) -> xcb::Result<Option<String>> {
    let cookie = conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: atoms.net_wm_icon_name,
        r#type: atoms.utf8_string,
        long_offset: 0,
        long_length: 256,
    });

    let reply = conn.wait_for_reply(cookie)?;
    if reply.format() != 8 || reply.value::<u8>().is_empty() {
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(reply.value()).into_owned()))
}
