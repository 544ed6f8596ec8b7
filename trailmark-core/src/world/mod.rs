//! Static world description the recorder reads from
//!
//! The world is the character position plus a fixed set of points of
//! interest. Rendering concerns live with the host; this module only keeps
//! what sampling needs.

mod poi;
mod position;
mod scene;
pub mod spatial;

pub use poi::{PoiCategory, PointOfInterest};
pub use position::Position;
pub use scene::{Scene, SceneBuilder};
pub use spatial::{Nearest, nearest, nearest_of, within_radius};

/// Interaction radius shared by every point of interest
pub const INTERACTION_RADIUS: f64 = 2.0;
