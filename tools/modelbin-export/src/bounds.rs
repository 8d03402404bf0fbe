//! Axis-aligned bounds shared across sequential imports

use glam::DVec3;

/// Axis-aligned bounding box over model positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl ModelBounds {
    /// Bounds of a point set, or `None` when it is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 3]>,
    {
        let mut points = points.into_iter().map(DVec3::from_array);
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &ModelBounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis extent.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Largest per-axis extent.
    pub fn max_extent(&self) -> f64 {
        self.size().max_element()
    }
}

/// Union of the bounds of every mesh imported in one session.
///
/// Created once per batch and passed by `&mut` to each import, so every
/// subsequent export centers and quantizes against the same frame.
#[derive(Debug, Clone, Default)]
pub struct BoundsSession {
    bounds: Option<ModelBounds>,
}

impl BoundsSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the session bounds to include `bounds`.
    pub fn record(&mut self, bounds: &ModelBounds) {
        let merged = match &self.bounds {
            Some(current) => current.union(bounds),
            None => *bounds,
        };
        tracing::info!(
            "Session bounds: min {:?}, max {:?}",
            merged.min.to_array(),
            merged.max.to_array()
        );
        self.bounds = Some(merged);
    }

    /// Bounds recorded so far, if any import has completed.
    pub fn current(&self) -> Option<&ModelBounds> {
        self.bounds.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bounds =
            ModelBounds::from_points([[1.0, -2.0, 0.0], [-1.0, 4.0, 0.5], [0.0, 0.0, -0.5]])
                .unwrap();
        assert_eq!(bounds.min, DVec3::new(-1.0, -2.0, -0.5));
        assert_eq!(bounds.max, DVec3::new(1.0, 4.0, 0.5));
        assert_eq!(bounds.center(), DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(bounds.max_extent(), 6.0);
    }

    #[test]
    fn test_from_no_points() {
        assert!(ModelBounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_session_accumulates() {
        let mut session = BoundsSession::new();
        assert!(session.current().is_none());

        session.record(&ModelBounds::from_points([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]).unwrap());
        session.record(&ModelBounds::from_points([[-2.0, 0.5, 0.0], [0.0, 0.5, 3.0]]).unwrap());

        let bounds = session.current().unwrap();
        assert_eq!(bounds.min, DVec3::new(-2.0, 0.0, 0.0));
        assert_eq!(bounds.max, DVec3::new(1.0, 1.0, 3.0));
    }
}
