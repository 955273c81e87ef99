use indexmap::IndexMap;
use xcb::x;

use crate::{state::Client, vector::Vector2D};

/// Miniwindows in rows along the bottom edge of the monitor, left to right,
/// wrapping upwards.
pub struct IconRowLayout {
    pub monitor_size: Vector2D,
    pub icon_size: i32,
    pub gap: i32,
}

impl IconRowLayout {
    fn per_row(&self) -> i32 {
        let cell = self.icon_size + self.gap;
        ((self.monitor_size.x - self.gap) / cell).max(1)
    }

    /// Position of the icon in slot `index`.
    pub fn position(&self, index: usize) -> Vector2D {
        let cell = self.icon_size + self.gap;
        let per_row = self.per_row();
        let index = index as i32;

        Vector2D::new(
            self.gap + (index % per_row) * cell,
            self.monitor_size.y - (index / per_row + 1) * cell,
        )
    }

    /// Place the icons of iconified clients and return where each icon goes.
    ///
    /// Icons the user moved stay where they are unless `force` is set.
    pub fn apply_layout(
        &self,
        clients: &mut IndexMap<x::Window, Client>,
        force: bool,
    ) -> Vec<(x::Window, Vector2D)> {
        let mut moves = Vec::new();
        let mut slot = 0;

        for client in clients.values_mut() {
            let Some(icon) = client.icon else {
                continue;
            };
            if client.icon_moved && !force {
                continue;
            }
            client.icon_pos = self.position(slot);
            client.icon_moved = false;
            slot += 1;
            moves.push((icon, client.icon_pos));
        }
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use xcb::XidNew;

    fn layout() -> IconRowLayout {
        IconRowLayout {
            monitor_size: Vector2D::new(300, 200),
            icon_size: 64,
            gap: 4,
        }
    }

    #[test]
    fn test_position_wraps_upwards() {
        let layout = layout();

        assert_eq!(layout.position(0), Vector2D::new(4, 132));
        assert_eq!(layout.position(3), Vector2D::new(208, 132));
        assert_eq!(layout.position(4), Vector2D::new(4, 64));
    }

    #[test]
    fn test_apply_layout_skips_moved_icons() {
        let mut clients = IndexMap::new();
        for id in 1..=3 {
            let window = unsafe { x::Window::new(id) };
            let mut client = Client::new(window);
            client.icon = (id != 2).then(|| unsafe { x::Window::new(id + 100) });
            clients.insert(window, client);
        }
        let moved = unsafe { x::Window::new(3) };
        clients[&moved].icon_moved = true;
        clients[&moved].icon_pos = Vector2D::new(50, 50);

        let moves = layout().apply_layout(&mut clients, false);

        assert_eq!(moves, vec![(unsafe { x::Window::new(101) }, Vector2D::new(4, 132))]);
        assert_eq!(clients[&moved].icon_pos, Vector2D::new(50, 50));

        let moves = layout().apply_layout(&mut clients, true);

        assert_eq!(moves.len(), 2);
        assert_eq!(clients[&moved].icon_pos, Vector2D::new(72, 132));
        assert!(!clients[&moved].icon_moved);
    }
}
