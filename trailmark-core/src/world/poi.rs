use serde::{Deserialize, Serialize};
use std::fmt;

use super::{INTERACTION_RADIUS, Position};

/// Kind of interactable location
///
/// Declaration order is the order of proximity flags in the state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Bench,
    Sofa,
    Bed,
}

impl PoiCategory {
    /// All categories, in state-vector order
    pub const ALL: [PoiCategory; 3] = [PoiCategory::Bench, PoiCategory::Sofa, PoiCategory::Bed];

    /// Reward granted for sitting within range; also the priority
    pub fn reward_value(self) -> f64 {
        match self {
            PoiCategory::Bench => 1.0,
            PoiCategory::Sofa => 2.0,
            PoiCategory::Bed => 3.0,
        }
    }

    /// Indoor furniture only counts once the house has been entered
    pub fn is_indoor(self) -> bool {
        matches!(self, PoiCategory::Sofa | PoiCategory::Bed)
    }

    pub fn label(self) -> &'static str {
        match self {
            PoiCategory::Bench => "bench",
            PoiCategory::Sofa => "sofa",
            PoiCategory::Bed => "bed",
        }
    }

    /// Index of this category's flag among the proximity flags
    pub fn flag_index(self) -> usize {
        match self {
            PoiCategory::Bench => 0,
            PoiCategory::Sofa => 1,
            PoiCategory::Bed => 2,
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fixed interactable location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub category: PoiCategory,
    pub position: Position,
    pub radius: f64,
}

impl PointOfInterest {
    /// Create a point with the shared interaction radius
    pub fn new(category: PoiCategory, position: Position) -> Self {
        Self {
            category,
            position,
            radius: INTERACTION_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn bench(position: Position) -> Self {
        Self::new(PoiCategory::Bench, position)
    }

    pub fn sofa(position: Position) -> Self {
        Self::new(PoiCategory::Sofa, position)
    }

    pub fn bed(position: Position) -> Self {
        Self::new(PoiCategory::Bed, position)
    }
}
