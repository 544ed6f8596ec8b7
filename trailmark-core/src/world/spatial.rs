//! Nearest-point queries against points of interest

use super::{PoiCategory, PointOfInterest, Position};

/// Result of a nearest-point query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a> {
    /// Closest point, or `None` when the candidate set was empty
    pub point: Option<&'a PointOfInterest>,
    /// Distance to `point`, or `f64::INFINITY` when there is none
    pub distance: f64,
}

impl Nearest<'static> {
    /// Sentinel for an empty candidate set
    pub const NONE: Nearest<'static> = Nearest {
        point: None,
        distance: f64::INFINITY,
    };
}

impl Nearest<'_> {
    /// Whether the nearest point lies strictly inside its interaction radius
    pub fn is_near(&self) -> bool {
        self.point
            .is_some_and(|p| within_radius(self.distance, p.radius))
    }
}

/// Strict radius test: a distance equal to the radius is not near
#[inline]
pub fn within_radius(distance: f64, radius: f64) -> bool {
    distance < radius
}

/// Find the point closest to `from`.
///
/// Ties keep the first point encountered in iteration order.
pub fn nearest<'a, I>(from: &Position, points: I) -> Nearest<'a>
where
    I: IntoIterator<Item = &'a PointOfInterest>,
{
    let mut best: Nearest<'a> = Nearest::NONE;
    for point in points {
        let distance = from.distance_to(&point.position);
        if distance < best.distance {
            best = Nearest {
                point: Some(point),
                distance,
            };
        }
    }
    best
}

/// Nearest point of a single category
pub fn nearest_of<'a, I>(from: &Position, points: I, category: PoiCategory) -> Nearest<'a>
where
    I: IntoIterator<Item = &'a PointOfInterest>,
{
    nearest(from, points.into_iter().filter(|p| p.category == category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_returns_sentinel() {
        let result = nearest(&Position::default(), std::iter::empty());
        assert!(result.point.is_none());
        assert_eq!(result.distance, f64::INFINITY);
        assert!(!result.is_near());
    }

    #[test]
    fn test_picks_closest() {
        let points = vec![
            PointOfInterest::bench(Position::ground(5.0, 0.0)),
            PointOfInterest::bench(Position::ground(1.0, 0.0)),
            PointOfInterest::bench(Position::ground(-3.0, 0.0)),
        ];
        let result = nearest(&Position::default(), &points);
        assert_eq!(result.point, Some(&points[1]));
        assert_eq!(result.distance, 1.0);
        assert!(result.is_near());
    }

    #[test]
    fn test_ties_keep_first_encountered() {
        let points = vec![
            PointOfInterest::bench(Position::ground(1.0, 0.0)),
            PointOfInterest::sofa(Position::ground(-1.0, 0.0)),
        ];
        let result = nearest(&Position::default(), &points);
        assert_eq!(result.point.map(|p| p.category), Some(PoiCategory::Bench));
    }

    #[test]
    fn test_distance_equal_to_radius_is_not_near() {
        let points = vec![PointOfInterest::bench(Position::ground(2.0, 0.0))];
        let result = nearest(&Position::default(), &points);
        assert_eq!(result.distance, 2.0);
        assert!(!result.is_near());

        let inside = nearest(&Position::ground(0.01, 0.0), &points);
        assert!(inside.is_near());
    }

    #[test]
    fn test_nearest_of_filters_category() {
        let points = vec![
            PointOfInterest::bench(Position::ground(0.5, 0.0)),
            PointOfInterest::bed(Position::ground(1.5, 0.0)),
        ];
        let result = nearest_of(&Position::default(), &points, PoiCategory::Bed);
        assert_eq!(result.point.map(|p| p.category), Some(PoiCategory::Bed));
        assert_eq!(result.distance, 1.5);

        let none = nearest_of(&Position::default(), &points, PoiCategory::Sofa);
        assert!(none.point.is_none());
    }

    #[test]
    fn test_custom_radius() {
        let points = vec![PointOfInterest::bench(Position::ground(3.0, 0.0)).with_radius(4.0)];
        assert!(nearest(&Position::default(), &points).is_near());
    }
}
