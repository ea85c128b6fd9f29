//! In-memory frame tree with per-edge transform history.
//!
//! Every frame has at most one parent. Each edge stores the transform that
//! maps child coordinates into the parent, either as a single static value or
//! as a time-ordered history that is interpolated on lookup.

use crate::{LookupError, PoseSource};
use elevation_sensors_core::{RigidTransform, Stamp};
use log::warn;
use nalgebra::{Isometry3, Translation3};
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

/// How much dynamic history each edge keeps by default.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(10);

/// Rejected insertions.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("transform has an empty frame id")]
    EmptyFrameId,
    #[error("transform maps frame \"{0}\" onto itself")]
    SelfTransform(String),
    #[error("transform \"{child}\" -> \"{parent}\" contains non-finite values")]
    NonFinite { parent: String, child: String },
    #[error("making \"{parent}\" the parent of \"{child}\" would create a cycle")]
    Cycle { parent: String, child: String },
}

struct Edge {
    parent: String,
    is_static: bool,
    history: BTreeMap<Stamp, Isometry3<f64>>,
}

impl Edge {
    fn sample(&self, child: &str, stamp: Stamp) -> Result<Isometry3<f64>, LookupError> {
        if self.is_static {
            return self
                .history
                .values()
                .next()
                .copied()
                .ok_or_else(|| LookupError::UnknownFrame(child.to_owned()));
        }

        let before = self.history.range(..=stamp).next_back();
        let after = self.history.range(stamp..).next();
        match (before, after) {
            (Some((&t0, a)), Some((&t1, b))) => {
                if t0 == t1 {
                    return Ok(*a);
                }
                let alpha = (stamp.as_nanos() - t0.as_nanos()) as f64
                    / (t1.as_nanos() - t0.as_nanos()) as f64;
                Ok(interpolate(a, b, alpha))
            }
            _ => {
                let earliest = self.history.keys().next().copied().unwrap_or_default();
                let latest = self.history.keys().next_back().copied().unwrap_or_default();
                Err(LookupError::Extrapolation {
                    parent: self.parent.clone(),
                    child: child.to_owned(),
                    requested: stamp,
                    earliest,
                    latest,
                })
            }
        }
    }

    fn prune(&mut self, cache_time: Duration) {
        let Some(&latest) = self.history.keys().next_back() else {
            return;
        };
        let oldest_kept = latest.saturating_sub(cache_time);
        self.history = self.history.split_off(&oldest_kept);
    }
}

/// Linear interpolation of the translation, spherical of the rotation.
fn interpolate(a: &Isometry3<f64>, b: &Isometry3<f64>, alpha: f64) -> Isometry3<f64> {
    let translation = a.translation.vector.lerp(&b.translation.vector, alpha);
    let rotation = a
        .rotation
        .try_slerp(&b.rotation, alpha, 1e-9)
        .unwrap_or(if alpha < 0.5 { a.rotation } else { b.rotation });
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

#[derive(Default)]
struct FrameTree {
    edges: HashMap<String, Edge>,
}

impl FrameTree {
    fn is_known(&self, frame: &str) -> bool {
        self.edges.contains_key(frame) || self.edges.values().any(|e| e.parent == frame)
    }

    /// `frame` followed by its ancestors up to the root.
    fn path_to_root<'a>(&'a self, frame: &'a str) -> Vec<&'a str> {
        let mut path = vec![frame];
        let mut current = frame;
        while let Some(edge) = self.edges.get(current) {
            current = edge.parent.as_str();
            path.push(current);
        }
        path
    }

    fn insert(
        &mut self,
        transform: &RigidTransform,
        is_static: bool,
        cache_time: Duration,
    ) -> Result<(), BufferError> {
        let parent = transform.parent();
        let child = transform.child();
        if parent.is_empty() || child.is_empty() {
            return Err(BufferError::EmptyFrameId);
        }
        if parent == child {
            return Err(BufferError::SelfTransform(child.to_owned()));
        }
        if !transform.is_finite() {
            return Err(BufferError::NonFinite {
                parent: parent.to_owned(),
                child: child.to_owned(),
            });
        }

        let reparent = self.edges.get(child).is_none_or(|e| e.parent != parent);
        if reparent && self.path_to_root(parent).contains(&child) {
            return Err(BufferError::Cycle {
                parent: parent.to_owned(),
                child: child.to_owned(),
            });
        }

        let replace = match self.edges.get(child) {
            Some(edge) if edge.parent != parent => {
                warn!(
                    "frame \"{}\" changes parent from \"{}\" to \"{}\"",
                    child, edge.parent, parent
                );
                true
            }
            Some(edge) => edge.is_static != is_static,
            None => true,
        };
        if replace {
            self.edges.insert(
                child.to_owned(),
                Edge {
                    parent: parent.to_owned(),
                    is_static,
                    history: BTreeMap::new(),
                },
            );
        }

        let Some(edge) = self.edges.get_mut(child) else {
            return Ok(());
        };
        if is_static {
            edge.history.clear();
            edge.history.insert(Stamp::ZERO, *transform.isometry());
        } else {
            edge.history.insert(transform.stamp(), *transform.isometry());
            edge.prune(cache_time);
        }
        Ok(())
    }

    /// Transform mapping `frame` into `ancestor`, composed along the tree.
    fn chain(&self, path: &[&str], stamp: Stamp) -> Result<Isometry3<f64>, LookupError> {
        let mut acc = Isometry3::identity();
        for child in path {
            let Some(edge) = self.edges.get(*child) else {
                break;
            };
            acc = edge.sample(child, stamp)? * acc;
        }
        Ok(acc)
    }

    fn lookup(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
    ) -> Result<RigidTransform, LookupError> {
        for frame in [target, source] {
            if !self.is_known(frame) {
                return Err(LookupError::UnknownFrame(frame.to_owned()));
            }
        }
        if target == source {
            return Ok(RigidTransform::identity(target, stamp));
        }

        let source_path = self.path_to_root(source);
        let target_path = self.path_to_root(target);
        let target_set: HashSet<&str> = target_path.iter().copied().collect();
        let Some(common_idx) = source_path.iter().position(|f| target_set.contains(f)) else {
            return Err(LookupError::NotConnected {
                target: target.to_owned(),
                source_frame: source.to_owned(),
            });
        };
        let common = source_path[common_idx];
        let target_idx = target_path
            .iter()
            .position(|f| *f == common)
            .unwrap_or(target_path.len());

        // Only the edges strictly below the common ancestor are sampled.
        let common_from_source = self.chain(&source_path[..common_idx], stamp)?;
        let common_from_target = self.chain(&target_path[..target_idx], stamp)?;

        Ok(RigidTransform::new(
            target,
            source,
            stamp,
            common_from_target.inverse() * common_from_source,
        ))
    }
}

/// Thread-safe transform store implementing [`PoseSource`].
///
/// Feeder threads insert transforms with [`set_transform`](Self::set_transform)
/// while processing threads block in
/// [`wait_for_transform`](PoseSource::wait_for_transform); every insertion
/// wakes the waiters.
pub struct TransformBuffer {
    cache_time: Duration,
    tree: Mutex<FrameTree>,
    updated: Condvar,
}

impl Default for TransformBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TIME)
    }
}

impl TransformBuffer {
    pub fn new(cache_time: Duration) -> Self {
        Self {
            cache_time,
            tree: Mutex::new(FrameTree::default()),
            updated: Condvar::new(),
        }
    }

    #[inline]
    pub fn cache_time(&self) -> Duration {
        self.cache_time
    }

    /// Record a time-stamped transform `child -> parent`.
    pub fn set_transform(&self, transform: &RigidTransform) -> Result<(), BufferError> {
        self.insert(transform, false)
    }

    /// Record a transform that holds at every time (e.g. a mounting offset).
    pub fn set_static_transform(&self, transform: &RigidTransform) -> Result<(), BufferError> {
        self.insert(transform, true)
    }

    fn insert(&self, transform: &RigidTransform, is_static: bool) -> Result<(), BufferError> {
        self.tree
            .lock()
            .insert(transform, is_static, self.cache_time)?;
        self.updated.notify_all();
        Ok(())
    }

    pub fn can_transform(&self, target: &str, source: &str, stamp: Stamp) -> bool {
        self.tree.lock().lookup(target, source, stamp).is_ok()
    }

    /// All frame ids currently known, sorted.
    pub fn frames(&self) -> Vec<String> {
        let tree = self.tree.lock();
        let mut frames: Vec<String> = tree
            .edges
            .iter()
            .flat_map(|(child, edge)| [child.clone(), edge.parent.clone()])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        frames.sort();
        frames
    }
}

impl PoseSource for TransformBuffer {
    fn wait_for_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut tree = self.tree.lock();
        loop {
            if tree.lookup(target, source, stamp).is_ok() {
                return true;
            }
            match deadline {
                Some(deadline) => {
                    if self.updated.wait_until(&mut tree, deadline).timed_out() {
                        return tree.lookup(target, source, stamp).is_ok();
                    }
                }
                None => self.updated.wait(&mut tree),
            }
        }
    }

    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Stamp,
    ) -> Result<RigidTransform, LookupError> {
        self.tree.lock().lookup(target, source, stamp)
    }
}
