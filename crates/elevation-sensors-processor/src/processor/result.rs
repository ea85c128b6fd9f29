use elevation_sensors_core::PointCloud;
use elevation_sensors_tf::ResolvedTransforms;

/// Output of one successful processing run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedCloud {
    /// Cleaned points expressed in the map frame.
    pub cloud: PointCloud,
    /// Height variance of each point of `cloud`, same order.
    pub variances: Vec<f32>,
    /// Transforms the frame was registered with.
    pub transforms: ResolvedTransforms,
}

impl ProcessedCloud {
    #[inline]
    pub fn len(&self) -> usize {
        self.cloud.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cloud.is_empty()
    }

    /// Split into the cloud and variance vector consumed by map fusion.
    pub fn into_parts(self) -> (PointCloud, Vec<f32>) {
        (self.cloud, self.variances)
    }
}
