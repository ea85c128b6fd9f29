use crate::{CloudPoint, PointCloud, Stamp};
use log::debug;
use nalgebra::{Isometry3, Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Rigid transform between two named frames at a given time.
///
/// The transform maps coordinates expressed in `child` into `parent`:
/// `p_parent = isometry * p_child`. Its translation is therefore the origin of
/// `child` expressed in `parent`, and its rotation is the orientation of
/// `child` relative to `parent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    parent: String,
    child: String,
    stamp: Stamp,
    isometry: Isometry3<f64>,
}

impl RigidTransform {
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        stamp: Stamp,
        isometry: Isometry3<f64>,
    ) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            stamp,
            isometry,
        }
    }

    /// Identity transform of `frame` onto itself.
    pub fn identity(frame: impl Into<String>, stamp: Stamp) -> Self {
        let frame = frame.into();
        Self::new(frame.clone(), frame, stamp, Isometry3::identity())
    }

    #[inline]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    #[inline]
    pub fn child(&self) -> &str {
        &self.child
    }

    #[inline]
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    #[inline]
    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }

    /// Rotation part as an orthonormal matrix.
    #[inline]
    pub fn rotation(&self) -> Matrix3<f64> {
        self.isometry.rotation.to_rotation_matrix().into_inner()
    }

    /// Translation part: origin of `child` in `parent` coordinates.
    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.isometry.translation.vector
    }

    /// The transform mapping `parent` coordinates back into `child`.
    pub fn inverse(&self) -> RigidTransform {
        RigidTransform {
            parent: self.child.clone(),
            child: self.parent.clone(),
            stamp: self.stamp,
            isometry: self.isometry.inverse(),
        }
    }

    /// `true` if the rotation and translation contain only finite values.
    pub fn is_finite(&self) -> bool {
        let q = self.isometry.rotation.coords;
        let t = self.isometry.translation.vector;
        q.iter().chain(t.iter()).all(|v| v.is_finite())
    }

    /// Map a single-precision point from `child` into `parent`.
    #[inline]
    pub fn transform_point(&self, p: &Point3<f32>) -> Point3<f32> {
        self.isometry.cast::<f32>().transform_point(p)
    }
}

/// Re-express every point of `cloud` through `transform` and tag the result
/// with `target_frame`.
///
/// Colors pass through untouched, the stamp is kept and point order is
/// preserved. Empty clouds yield an empty, correctly tagged cloud.
pub fn transform_point_cloud(
    cloud: &PointCloud,
    transform: &RigidTransform,
    target_frame: &str,
) -> PointCloud {
    let iso = transform.isometry().cast::<f32>();
    let map_point = |p: &CloudPoint| CloudPoint {
        position: iso.transform_point(&p.position),
        color: p.color,
    };

    #[cfg(feature = "rayon")]
    let points: Vec<CloudPoint> = cloud.points().par_iter().map(map_point).collect();
    #[cfg(not(feature = "rayon"))]
    let points: Vec<CloudPoint> = cloud.points().iter().map(map_point).collect();

    let out = cloud.with_points(target_frame, points);
    debug!(
        "point cloud transformed to frame {} for time stamp {}",
        target_frame,
        out.stamp()
    );
    out
}
