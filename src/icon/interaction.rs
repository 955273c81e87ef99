//! Mouse handling on miniwindows.
//!
//! Nothing in here talks to the server. [`on_button_press`] decides what a
//! press means and a [`DragTracker`] follows the pointer afterwards, so that
//! the event loop keeps running while an icon is dragged.

use xcb::x;

use crate::{
    config::{Preferences, MENU_BUTTON, MOD_KEY_BUT, MOVE_BUTTON, MOVE_THRESHOLD, SHIFT_BUT},
    vector::Vector2D,
};

/// Remembers the last click to recognize double clicks.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<(x::Window, u8, u32)>,
}

impl ClickTracker {
    /// Whether this click completes a double click. The click ending a
    /// double click does not start another one.
    pub fn is_double_click(&mut self, window: x::Window, button: u8, time: u32, delay: u32) -> bool {
        if let Some((last_window, last_button, last_time)) = self.last {
            if last_window == window && last_button == button && time.wrapping_sub(last_time) <= delay {
                self.last = None;
                return true;
            }
        }
        self.last = Some((window, button, time));
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress {
    pub window: x::Window,
    pub button: u8,
    pub state: x::KeyButMask,
    /// Relative to the icon.
    pub pos: Vector2D,
    pub root: Vector2D,
    pub time: u32,
}

impl From<&x::ButtonPressEvent> for ButtonPress {
    fn from(ev: &x::ButtonPressEvent) -> Self {
        Self {
            window: ev.event(),
            button: ev.detail(),
            state: ev.state(),
            pos: (ev.event_x(), ev.event_y()).into(),
            root: (ev.root_x(), ev.root_y()).into(),
            time: ev.time(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stacking {
    Raise,
    Lower,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressAction {
    Ignore,
    Deiconify,
    OpenMenu { root: Vector2D },
    Begin {
        stacking: Option<Stacking>,
        /// Toggle the icon and its owner's selection.
        toggle_selection: bool,
        drag: DragTracker,
    },
}

pub fn on_button_press(
    press: &ButtonPress,
    modal: bool,
    clicks: &mut ClickTracker,
    prefs: &Preferences,
    icon_pos: Vector2D,
) -> PressAction {
    if modal {
        return PressAction::Ignore;
    }
    if clicks.is_double_click(press.window, press.button, press.time, prefs.double_click_delay) {
        return PressAction::Deiconify;
    }

    let mut stacking = None;
    let mut toggle_selection = false;
    if press.button == MOVE_BUTTON as u8 {
        stacking = Some(if press.state.contains(MOD_KEY_BUT) {
            Stacking::Lower
        } else {
            Stacking::Raise
        });
        toggle_selection = press.state.contains(SHIFT_BUT);
    } else if press.button == MENU_BUTTON as u8 {
        return PressAction::OpenMenu { root: press.root };
    }

    PressAction::Begin {
        stacking,
        toggle_selection,
        drag: DragTracker::new(press.button, press.pos, icon_pos),
    }
}

/// Pointer events of interest while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Motion { pos: Vector2D, root: Vector2D },
    Press,
    Release { button: u8 },
}

impl DragEvent {
    pub fn from_event(event: &x::Event) -> Option<Self> {
        match event {
            x::Event::MotionNotify(ev) => Some(Self::Motion {
                pos: (ev.event_x(), ev.event_y()).into(),
                root: (ev.root_x(), ev.root_y()).into(),
            }),
            x::Event::ButtonPress(_) => Some(Self::Press),
            x::Event::ButtonRelease(ev) => Some(Self::Release { button: ev.detail() }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub pos: Vector2D,
    /// The icon ended up somewhere else.
    pub moved: bool,
    /// The pointer moved at all.
    pub has_moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStep {
    Continue,
    /// Threshold crossed: switch to the move cursor and move.
    StartMove(Vector2D),
    Move(Vector2D),
    Finish(DragEnd),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragTracker {
    button: u8,
    offset: Vector2D,
    start: Vector2D,
    pos: Vector2D,
    grabbed: bool,
    has_moved: bool,
}

impl DragTracker {
    pub fn new(button: u8, offset: Vector2D, start: Vector2D) -> Self {
        Self {
            button,
            offset,
            start,
            pos: start,
            grabbed: false,
            has_moved: false,
        }
    }

    pub fn step(&mut self, event: DragEvent) -> DragStep {
        match event {
            DragEvent::Motion { pos, root } => {
                self.has_moved = true;
                if self.grabbed {
                    self.pos = root - self.offset;
                    return DragStep::Move(self.pos);
                }
                if !self.offset.is_beyond(pos, MOVE_THRESHOLD) {
                    return DragStep::Continue;
                }
                self.grabbed = true;
                self.pos = root - self.offset;
                DragStep::StartMove(self.pos)
            }
            DragEvent::Press => DragStep::Continue,
            DragEvent::Release { button } if button == self.button => DragStep::Finish(DragEnd {
                pos: self.pos,
                moved: self.pos != self.start,
                has_moved: self.has_moved,
            }),
            DragEvent::Release { .. } => DragStep::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use xcb::XidNew;

    use super::*;

    fn press(button: u8, state: x::KeyButMask, time: u32) -> ButtonPress {
        ButtonPress {
            window: unsafe { x::Window::new(7) },
            button,
            state,
            pos: Vector2D::new(10, 10),
            root: Vector2D::new(110, 510),
            time,
        }
    }

    fn prefs() -> Preferences {
        Preferences {
            double_click_delay: 250,
            ..Default::default()
        }
    }

    #[test]
    fn test_double_click() {
        let window = unsafe { x::Window::new(7) };
        let other = unsafe { x::Window::new(8) };
        let mut clicks = ClickTracker::default();

        assert!(!clicks.is_double_click(window, 1, 1000, 250));
        assert!(clicks.is_double_click(window, 1, 1200, 250));
        assert!(!clicks.is_double_click(window, 1, 1300, 250));
        assert!(!clicks.is_double_click(window, 3, 1400, 250));
        assert!(!clicks.is_double_click(other, 3, 1450, 250));
        assert!(!clicks.is_double_click(other, 3, 1800, 250));
    }

    #[test]
    fn test_modal_ignores_press() {
        let mut clicks = ClickTracker::default();
        let action = on_button_press(
            &press(1, x::KeyButMask::empty(), 0),
            true,
            &mut clicks,
            &prefs(),
            Vector2D::default(),
        );
        assert_eq!(action, PressAction::Ignore);
    }

    #[test]
    fn test_double_click_deiconifies() {
        let mut clicks = ClickTracker::default();
        let first = press(1, x::KeyButMask::empty(), 100);
        let second = press(1, x::KeyButMask::empty(), 200);

        on_button_press(&first, false, &mut clicks, &prefs(), Vector2D::default());
        let action = on_button_press(&second, false, &mut clicks, &prefs(), Vector2D::default());

        assert_eq!(action, PressAction::Deiconify);
    }

    #[rstest]
    #[case(x::KeyButMask::empty(), Some(Stacking::Raise), false)]
    #[case(x::KeyButMask::MOD1, Some(Stacking::Lower), false)]
    #[case(x::KeyButMask::SHIFT, Some(Stacking::Raise), true)]
    fn test_first_button(
        #[case] state: x::KeyButMask,
        #[case] stacking: Option<Stacking>,
        #[case] toggle_selection: bool,
    ) {
        let mut clicks = ClickTracker::default();
        let start = Vector2D::new(100, 500);

        let action = on_button_press(&press(1, state, 0), false, &mut clicks, &prefs(), start);

        assert_eq!(
            action,
            PressAction::Begin {
                stacking,
                toggle_selection,
                drag: DragTracker::new(1, Vector2D::new(10, 10), start),
            }
        );
    }

    #[test]
    fn test_menu_button() {
        let mut clicks = ClickTracker::default();
        let action = on_button_press(
            &press(3, x::KeyButMask::empty(), 0),
            false,
            &mut clicks,
            &prefs(),
            Vector2D::default(),
        );
        assert_eq!(
            action,
            PressAction::OpenMenu {
                root: Vector2D::new(110, 510)
            }
        );
    }

    #[test]
    fn test_middle_button_only_drags() {
        let mut clicks = ClickTracker::default();
        let action = on_button_press(
            &press(2, x::KeyButMask::empty(), 0),
            false,
            &mut clicks,
            &prefs(),
            Vector2D::default(),
        );
        assert!(matches!(
            action,
            PressAction::Begin {
                stacking: None,
                toggle_selection: false,
                ..
            }
        ));
    }

    #[test]
    fn test_drag_below_threshold_is_a_click() {
        let start = Vector2D::new(100, 500);
        let mut drag = DragTracker::new(1, Vector2D::new(10, 10), start);

        let motion = DragEvent::Motion {
            pos: Vector2D::new(13, 12),
            root: Vector2D::new(103, 502),
        };
        assert_eq!(drag.step(motion), DragStep::Continue);
        assert_eq!(drag.step(DragEvent::Release { button: 3 }), DragStep::Continue);
        assert_eq!(
            drag.step(DragEvent::Release { button: 1 }),
            DragStep::Finish(DragEnd {
                pos: start,
                moved: false,
                has_moved: true
            })
        );
    }

    #[test]
    fn test_drag_moves_icon() {
        let start = Vector2D::new(100, 500);
        let mut drag = DragTracker::new(1, Vector2D::new(10, 10), start);

        let first = drag.step(DragEvent::Motion {
            pos: Vector2D::new(15, 10),
            root: Vector2D::new(115, 510),
        });
        let second = drag.step(DragEvent::Motion {
            pos: Vector2D::new(11, 11),
            root: Vector2D::new(200, 300),
        });
        assert_eq!(drag.step(DragEvent::Press), DragStep::Continue);
        let end = drag.step(DragEvent::Release { button: 1 });

        assert_eq!(first, DragStep::StartMove(Vector2D::new(105, 500)));
        assert_eq!(second, DragStep::Move(Vector2D::new(190, 290)));
        assert_eq!(
            end,
            DragStep::Finish(DragEnd {
                pos: Vector2D::new(190, 290),
                moved: true,
                has_moved: true
            })
        );
    }

    #[test]
    fn test_release_without_motion() {
        let mut drag = DragTracker::new(2, Vector2D::default(), Vector2D::new(1, 1));

        assert_eq!(
            drag.step(DragEvent::Release { button: 2 }),
            DragStep::Finish(DragEnd {
                pos: Vector2D::new(1, 1),
                moved: false,
                has_moved: false
            })
        );
    }
}
