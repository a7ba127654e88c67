//! Frame-coherent mouse state tracker.
//!
//! [`MouseState`] accumulates winit mouse events between two redraws and
//! answers the questions the orbit camera asks: how far did the pointer move
//! while a given button was held, and how much did the wheel turn.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Pixels of a `PixelDelta` scroll treated as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

/// Maps a [`MouseButton`] to an index 0..4.
fn button_index(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        MouseButton::Back => 3,
        MouseButton::Forward | MouseButton::Other(_) => 4,
    }
}

/// Frame-coherent mouse state.
///
/// Forward winit events through the `on_*` methods, read the accessors while
/// updating the frame, then call [`clear_transients`](Self::clear_transients).
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Option<Vec2>,
    delta: Vec2,
    held: [bool; 5],
    scroll: f32,
}

impl MouseState {
    /// Creates a new `MouseState` with no known cursor position.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Event handlers ──────────────────────────────────────────────

    /// Process a `CursorMoved` event.
    ///
    /// The first event after the cursor enters only establishes a position,
    /// so re-entering the window never produces a jump.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if let Some(old) = self.position {
            self.delta += new_pos - old;
        }
        self.position = Some(new_pos);
    }

    /// Process a `MouseInput` event.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        self.held[button_index(button)] = state == ElementState::Pressed;
        tracing::trace!(?button, ?state, "mouse button");
    }

    /// Process a `MouseWheel` event.
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    /// Process a `CursorLeft` event. Held buttons are released since their
    /// release event may be delivered to another window.
    pub fn on_cursor_left(&mut self) {
        self.position = None;
        self.held = [false; 5];
    }

    /// Clears per-frame transients: movement delta and scroll.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Movement delta since the last clear if `button` is held, zero otherwise.
    #[must_use]
    pub fn drag_delta(&self, button: MouseButton) -> Vec2 {
        if self.held[button_index(button)] {
            self.delta
        } else {
            Vec2::ZERO
        }
    }

    /// Scroll wheel delta accumulated this frame (positive = scroll up).
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_first_move_sets_position_without_delta() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(100.0, 200.0);
        assert_eq!(ms.position, Some(Vec2::new(100.0, 200.0)));
        assert_eq!(ms.delta, Vec2::ZERO);
    }

    #[test]
    fn test_delta_is_difference_between_moves() {
        let mut ms = MouseState::new();
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_moved(100.0, 200.0);
        ms.clear_transients();
        ms.on_cursor_moved(110.0, 195.0);
        let d = ms.drag_delta(MouseButton::Left);
        assert!((d.x - 10.0).abs() < f32::EPSILON);
        assert!((d.y - (-5.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_drag_delta_requires_held_button() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(0.0, 0.0);
        ms.on_cursor_moved(4.0, 3.0);
        assert_eq!(ms.drag_delta(MouseButton::Left), Vec2::ZERO);

        ms.on_button(MouseButton::Left, ElementState::Pressed);
        assert_eq!(ms.drag_delta(MouseButton::Left), Vec2::new(4.0, 3.0));
        assert_eq!(ms.drag_delta(MouseButton::Right), Vec2::ZERO);
    }

    #[test]
    fn test_release_stops_drag() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(0.0, 0.0);
        ms.on_button(MouseButton::Middle, ElementState::Pressed);
        ms.on_cursor_moved(6.0, 0.0);
        assert_eq!(ms.drag_delta(MouseButton::Middle), Vec2::new(6.0, 0.0));

        ms.on_button(MouseButton::Middle, ElementState::Released);
        assert_eq!(ms.drag_delta(MouseButton::Middle), Vec2::ZERO);
    }

    #[test]
    fn test_scroll_accumulates_within_frame() {
        let mut ms = MouseState::new();
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 0.5));
        assert!((ms.scroll() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pixel_scroll_normalized_to_lines() {
        let mut ms = MouseState::new();
        ms.on_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 80.0)));
        assert!((ms.scroll() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_transients_reset_after_clear() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(0.0, 0.0);
        ms.on_cursor_moved(50.0, 50.0);
        ms.on_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        ms.on_button(MouseButton::Right, ElementState::Pressed);
        ms.clear_transients();
        assert_eq!(ms.drag_delta(MouseButton::Right), Vec2::ZERO);
        assert_eq!(ms.scroll(), 0.0);
        assert!(ms.held[button_index(MouseButton::Right)]);
    }

    #[test]
    fn test_cursor_leave_releases_buttons_and_forgets_position() {
        let mut ms = MouseState::new();
        ms.on_cursor_moved(10.0, 10.0);
        ms.on_button(MouseButton::Left, ElementState::Pressed);
        ms.on_cursor_left();

        assert!(!ms.held[button_index(MouseButton::Left)]);
        assert_eq!(ms.position, None);

        ms.clear_transients();
        ms.on_cursor_moved(500.0, 500.0);
        assert_eq!(ms.delta, Vec2::ZERO);
    }
}
