//! Scene model for the orrery: bodies and their motion, lights, camera
//! controls, viewport reconciliation and render sessions.
//!
//! Nothing here touches the GPU; the app crate drives a [`SceneState`]
//! through a [`RenderSession`].

pub mod builder;
pub mod controls;
pub mod error;
pub mod kinematics;
pub mod lights;
pub mod session;
pub mod state;
pub mod viewport;

pub use builder::{BodyDescriptor, SceneBuilder};
pub use controls::{OrbitControls, OrbitInput};
pub use error::SceneError;
pub use kinematics::{Body, Orbit};
pub use lights::{AmbientLight, PointLight, SceneLights};
pub use session::{HeadlessSession, RenderSession};
pub use state::SceneState;
pub use viewport::{Viewport, ViewportError};
