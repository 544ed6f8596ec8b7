use serde::{Deserialize, Serialize};

use super::{PoiCategory, PointOfInterest, Position};
use crate::config::RecorderConfig;

/// Static points of interest plus the indoor-unlock latch
///
/// Indoor categories are invisible to sampling until the character has
/// crossed `indoor_threshold_z` once; the latch never resets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    points: Vec<PointOfInterest>,
    indoor_threshold_z: Option<f64>,
    indoor_unlocked: bool,
}

impl Scene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    /// A scene with nothing to interact with
    pub fn empty() -> Self {
        SceneBuilder::default().build()
    }

    /// Park path with five benches leading to a house holding a sofa and a bed
    pub fn park_and_house() -> Self {
        Self::park_and_house_with(&RecorderConfig::default())
    }

    /// The park-and-house layout using the configured radius and threshold
    pub fn park_and_house_with(config: &RecorderConfig) -> Self {
        const BENCH_OFFSETS: [f64; 5] = [-2.5, 1.5, 3.0, -1.0, 0.5];

        let radius = config.interaction_radius;
        let mut builder = SceneBuilder::default().indoor_threshold(config.indoor_threshold_z);
        for (i, x) in BENCH_OFFSETS.iter().enumerate() {
            let seat = Position::new(*x, 0.25, -(i as f64) * 30.0 - 20.0);
            builder = builder.point(PointOfInterest::bench(seat).with_radius(radius));
        }
        builder
            .point(PointOfInterest::sofa(Position::new(-4.0, 0.5, -200.0)).with_radius(radius))
            .point(PointOfInterest::bed(Position::new(4.0, 0.25, -200.0)).with_radius(radius))
            .build()
    }

    /// Every point, locked or not
    pub fn points(&self) -> &[PointOfInterest] {
        &self.points
    }

    /// Points that currently count for sampling
    pub fn active_points(&self) -> impl Iterator<Item = &PointOfInterest> + '_ {
        self.points
            .iter()
            .filter(move |p| self.is_category_active(p.category))
    }

    pub fn is_category_active(&self, category: PoiCategory) -> bool {
        !category.is_indoor() || self.indoor_unlocked
    }

    pub fn indoor_unlocked(&self) -> bool {
        self.indoor_unlocked
    }

    /// Trip the indoor latch if `position` is past the threshold.
    ///
    /// Returns `true` only on the tick that unlocks. Scenes without a
    /// threshold keep indoor points always active.
    pub fn update_latch(&mut self, position: &Position) -> bool {
        match self.indoor_threshold_z {
            Some(threshold) if !self.indoor_unlocked && position.z < threshold => {
                self.indoor_unlocked = true;
                tracing::info!(z = position.z, threshold, "Indoor area unlocked");
                true
            }
            _ => false,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for Scene
#[derive(Debug, Default)]
pub struct SceneBuilder {
    points: Vec<PointOfInterest>,
    indoor_threshold_z: Option<f64>,
}

impl SceneBuilder {
    pub fn point(mut self, point: PointOfInterest) -> Self {
        self.points.push(point);
        self
    }

    pub fn points(mut self, points: impl IntoIterator<Item = PointOfInterest>) -> Self {
        self.points.extend(points);
        self
    }

    /// Gate indoor categories behind crossing this z
    pub fn indoor_threshold(mut self, z: f64) -> Self {
        self.indoor_threshold_z = Some(z);
        self
    }

    pub fn build(self) -> Scene {
        let indoor_unlocked = self.indoor_threshold_z.is_none();
        Scene {
            points: self.points,
            indoor_threshold_z: self.indoor_threshold_z,
            indoor_unlocked,
        }
    }
}
