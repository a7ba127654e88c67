//! Pointer input for camera navigation.

pub mod mouse;

pub use mouse::MouseState;
