//! Immutable polyline that every moving creep follows.

use glam::Vec2;
use thiserror::Error;

/// Reasons a path polyline may be rejected during construction.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A path needs a start and an end point.
    #[error("path requires at least two points, got {count}")]
    TooFewPoints {
        /// Number of points supplied by the caller.
        count: usize,
    },
    /// One of the supplied points contained a NaN or infinite coordinate.
    #[error("path point {index} is not finite")]
    NonFinitePoint {
        /// Index of the offending point.
        index: usize,
    },
}

/// Straight piece of the path between two consecutive waypoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    start: Vec2,
    end: Vec2,
    length: f32,
    direction: Vec2,
}

impl PathSegment {
    fn between(start: Vec2, end: Vec2) -> Self {
        let delta = end - start;
        let length = delta.length();
        let direction = if length > 0.0 {
            delta / length
        } else {
            Vec2::ZERO
        };

        Self {
            start,
            end,
            length,
            direction,
        }
    }

    /// World position where the segment begins.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// World position where the segment ends.
    #[must_use]
    pub const fn end(&self) -> Vec2 {
        self.end
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Unit direction of travel; zero for degenerate segments.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }
}

/// Location on the path resolved from a travelled distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPosition {
    /// World coordinates of the resolved point.
    pub position: Vec2,
    /// Unit direction of the segment containing the point.
    pub direction: Vec2,
    /// Travelled distance divided by the total path length, in `[0, 1]`.
    pub progress: f32,
}

/// Fixed, precomputed route from the spawn point to the exit.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    total_length: f32,
}

impl Path {
    /// Builds a path from consecutive waypoints.
    pub fn from_points(points: &[Vec2]) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewPoints {
                count: points.len(),
            });
        }

        if let Some(index) = points.iter().position(|point| !point.is_finite()) {
            return Err(PathError::NonFinitePoint { index });
        }

        let segments: Vec<PathSegment> = points
            .windows(2)
            .map(|pair| PathSegment::between(pair[0], pair[1]))
            .collect();
        let total_length = segments.iter().map(PathSegment::length).sum();

        Ok(Self {
            segments,
            total_length,
        })
    }

    /// Builds a single-segment path between two points.
    #[must_use]
    pub fn straight(start: Vec2, end: Vec2) -> Self {
        let segment = PathSegment::between(start, end);
        Self {
            total_length: segment.length(),
            segments: vec![segment],
        }
    }

    /// Segments composing the path in travel order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Sum of all segment lengths.
    #[must_use]
    pub const fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Reports whether the travelled distance has reached the exit.
    #[must_use]
    pub fn has_reached_end(&self, distance: f32) -> bool {
        distance >= self.total_length
    }

    /// Travelled distance expressed as a fraction of the total length.
    #[must_use]
    pub fn progress_at(&self, distance: f32) -> f32 {
        if self.total_length <= 0.0 {
            return 1.0;
        }
        (distance / self.total_length).clamp(0.0, 1.0)
    }

    /// Resolves the world position reached after travelling `distance`.
    ///
    /// Distances outside `[0, total_length]` clamp to the path's endpoints.
    #[must_use]
    pub fn position_at(&self, distance: f32) -> PathPosition {
        let clamped = distance.clamp(0.0, self.total_length);
        let progress = self.progress_at(clamped);
        let mut remaining = clamped;

        let last_index = self.segments.len().saturating_sub(1);
        for (index, segment) in self.segments.iter().enumerate() {
            let is_last = index == last_index;
            if segment.length() <= 0.0 && !is_last {
                continue;
            }

            if remaining <= segment.length() || is_last {
                let along = remaining.min(segment.length());
                return PathPosition {
                    position: segment.start() + segment.direction() * along,
                    direction: segment.direction(),
                    progress,
                };
            }

            remaining -= segment.length();
        }

        PathPosition {
            position: Vec2::ZERO,
            direction: Vec2::ZERO,
            progress,
        }
    }
}
