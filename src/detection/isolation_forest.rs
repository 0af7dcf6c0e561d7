//! Isolation forest over (flow, pressure) points
//!
//! Unsupervised outlier scoring: anomalous points are easier to isolate with
//! random axis-aligned splits, so they end up with shorter average path
//! lengths across an ensemble of randomized trees.
//!
//! ## Score scale
//!
//! `score = 2^(-E[path_len] / c(sample_size))`, normalized into (0, 1):
//! - ~0.5 for points indistinguishable from the training data
//! - approaching 1.0 for strong isolates
//! - approaching 0.0 for points in the densest clusters
//!
//! The score is a ranking statistic, not a probability. Thresholds on it are
//! tuned empirically (see `TrainingConfig::score_threshold`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Number of features per point: (flow_rate, pressure).
pub const FEATURES: usize = 2;

/// Euler–Mascheroni constant, for the harmonic-number approximation.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Why a fit could not produce a usable model.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("no training samples provided")]
    Empty,

    #[error("training sample contains non-finite values")]
    NonFinite,

    #[error("degenerate training sample: zero variance on every feature")]
    Degenerate,
}

/// Ensemble hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub num_trees: usize,
    pub sample_size: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            num_trees: 100,
            sample_size: 256,
            seed: 42,
        }
    }
}

enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// A fitted isolation forest. Immutable after `fit`; share via `Arc` and
/// replace wholesale on retrain.
pub struct IsolationForest {
    trees: Vec<Node>,
    /// c(sample_size): expected path length of an unsuccessful BST search,
    /// used to normalize scores
    path_norm: f64,
}

impl IsolationForest {
    /// Fit an ensemble over the sample set.
    ///
    /// Training is from-scratch on every call; there is no online update.
    pub fn fit(data: &[[f64; FEATURES]], params: &ForestParams) -> Result<Self, FitError> {
        if data.is_empty() {
            return Err(FitError::Empty);
        }
        if data
            .iter()
            .any(|p| p.iter().any(|v| !v.is_finite()))
        {
            return Err(FitError::NonFinite);
        }
        if (0..FEATURES).all(|f| feature_range(data, f).is_none()) {
            return Err(FitError::Degenerate);
        }

        let sample_size = params.sample_size.min(data.len()).max(2);
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.num_trees.max(1))
            .map(|_| {
                let mut sample: Vec<[f64; FEATURES]> =
                    rand::seq::index::sample(&mut rng, data.len(), sample_size)
                        .into_iter()
                        .map(|i| data[i])
                        .collect();
                build_tree(&mut sample, 0, max_depth, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            path_norm: average_path_length(sample_size),
        })
    }

    /// Normalized anomaly score for one point (see module docs for the scale).
    pub fn score(&self, point: [f64; FEATURES]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| path_length(t, &point, 0.0)).sum();
        let mean_path = total / self.trees.len() as f64;
        2f64.powf(-mean_path / self.path_norm)
    }
}

/// (min, max) of one feature over the node's points, or `None` when the
/// feature has no spread to split on.
fn feature_range(points: &[[f64; FEATURES]], feature: usize) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points {
        min = min.min(p[feature]);
        max = max.max(p[feature]);
    }
    (max > min).then_some((min, max))
}

fn build_tree(
    points: &mut Vec<[f64; FEATURES]>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if points.len() <= 1 || depth >= max_depth {
        return Node::Leaf { size: points.len() };
    }

    let splittable: Vec<(usize, (f64, f64))> = (0..FEATURES)
        .filter_map(|f| feature_range(points, f).map(|r| (f, r)))
        .collect();
    if splittable.is_empty() {
        // All remaining points identical
        return Node::Leaf { size: points.len() };
    }

    let (feature, (min, max)) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(min..max);

    let (mut left, mut right): (Vec<_>, Vec<_>) =
        points.drain(..).partition(|p| p[feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(&mut left, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(&mut right, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &Node, point: &[f64; FEATURES], depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if point[*feature] < *threshold {
                path_length(left, point, depth + 1.0)
            } else {
                path_length(right, point, depth + 1.0)
            }
        }
    }
}

/// Expected path length of an unsuccessful search in a BST of `n` nodes.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tight cluster of normal operating points around (2.0 lpm, 50 psi).
    fn cluster() -> Vec<[f64; FEATURES]> {
        let mut data = Vec::new();
        for i in 0..300 {
            let jitter = (i % 10) as f64 * 0.01;
            data.push([2.0 + jitter, 50.0 - jitter * 5.0]);
        }
        data
    }

    #[test]
    fn test_outlier_scores_above_inlier() {
        let forest = IsolationForest::fit(&cluster(), &ForestParams::default()).unwrap();

        let inlier = forest.score([2.05, 49.8]);
        let outlier = forest.score([9.0, 15.0]);

        assert!(outlier > inlier, "outlier {outlier} should exceed inlier {inlier}");
        assert!(outlier > 0.5, "far outlier should score above average, got {outlier}");
        assert!((0.0..=1.0).contains(&inlier));
        assert!((0.0..=1.0).contains(&outlier));
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let data = cluster();
        let params = ForestParams {
            seed: 7,
            ..Default::default()
        };
        let a = IsolationForest::fit(&data, &params).unwrap();
        let b = IsolationForest::fit(&data, &params).unwrap();
        assert_eq!(a.score([5.0, 30.0]), b.score([5.0, 30.0]));
    }

    #[test]
    fn test_empty_sample_rejected() {
        assert!(matches!(
            IsolationForest::fit(&[], &ForestParams::default()),
            Err(FitError::Empty)
        ));
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let data = vec![[1.0, f64::NAN], [2.0, 50.0]];
        assert!(matches!(
            IsolationForest::fit(&data, &ForestParams::default()),
            Err(FitError::NonFinite)
        ));
    }

    #[test]
    fn test_zero_variance_sample_rejected() {
        let data = vec![[2.0, 50.0]; 150];
        assert!(matches!(
            IsolationForest::fit(&data, &ForestParams::default()),
            Err(FitError::Degenerate)
        ));
    }

    #[test]
    fn test_average_path_length_monotonic() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert!(average_path_length(10) < average_path_length(100));
    }
}
