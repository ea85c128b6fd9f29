use crate::Stamp;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A single measurement: position plus an optional color channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudPoint {
    pub position: Point3<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
}

impl CloudPoint {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            color: None,
        }
    }

    #[inline]
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    /// `true` if every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|c| c.is_finite())
    }
}

/// Ordered points tagged with the frame they are expressed in and the time
/// they were captured.
///
/// Processing stages build new clouds instead of editing existing ones; the
/// point vector is only reachable through shared accessors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    frame_id: String,
    stamp: Stamp,
    points: Vec<CloudPoint>,
}

impl PointCloud {
    pub fn new(frame_id: impl Into<String>, stamp: Stamp, points: Vec<CloudPoint>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            points,
        }
    }

    pub fn empty(frame_id: impl Into<String>, stamp: Stamp) -> Self {
        Self::new(frame_id, stamp, Vec::new())
    }

    #[inline]
    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    #[inline]
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    #[inline]
    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep the points accepted by `keep`, preserving their order and the
    /// frame/stamp tags.
    pub fn retained(&self, mut keep: impl FnMut(&CloudPoint) -> bool) -> PointCloud {
        let points = self.points.iter().filter(|p| keep(p)).copied().collect();
        PointCloud::new(self.frame_id.clone(), self.stamp, points)
    }

    /// Build a sibling cloud with the same stamp but a different frame tag.
    pub fn with_points(&self, frame_id: impl Into<String>, points: Vec<CloudPoint>) -> PointCloud {
        PointCloud::new(frame_id, self.stamp, points)
    }

    pub fn into_points(self) -> Vec<CloudPoint> {
        self.points
    }
}
