//! Random forest regressor over fixed-width feature vectors.
//!
//! Each tree is grown on a bootstrap sample until leaves are pure or no split
//! reduces squared error. All features are considered at every split and the
//! threshold is the midpoint between consecutive distinct values.

use crate::estimation::features::{FEATURE_COUNT, FeatureVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TREE_COUNT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREE_COUNT,
            seed: 42,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(
        features: &[FeatureVector],
        targets: &[f64],
        sample: Vec<usize>,
        min_samples_split: usize,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let root = tree.push_leaf(mean(targets, &sample));
        let mut pending = vec![(root, sample)];

        while let Some((node, indices)) = pending.pop() {
            if indices.len() < min_samples_split.max(2) {
                continue;
            }
            let Some(split) = best_split(features, targets, &indices) else {
                continue;
            };
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| features[i][split.feature] <= split.threshold);

            let left = tree.push_leaf(mean(targets, &left_indices));
            let right = tree.push_leaf(mean(targets, &right_indices));
            tree.nodes[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            pending.push((left, left_indices));
            pending.push((right, right_indices));
        }

        tree
    }

    fn push_leaf(&mut self, value: f64) -> usize {
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return f64::NAN,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fits the forest. Returns `None` when there are no samples, no trees, or
    /// the feature and target lengths disagree.
    pub fn fit(features: &[FeatureVector], targets: &[f64], params: ForestParams) -> Option<Self> {
        if features.is_empty() || features.len() != targets.len() || params.n_trees == 0 {
            return None;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let count = features.len();
        let trees = (0..params.n_trees)
            .map(|_| {
                let sample: Vec<usize> = (0..count).map(|_| rng.gen_range(0..count)).collect();
                RegressionTree::fit(features, targets, sample, params.min_samples_split)
            })
            .collect();
        Some(Self { params, trees })
    }

    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        total / self.trees.len() as f64
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

struct Split {
    feature: usize,
    threshold: f64,
}

fn best_split(features: &[FeatureVector], targets: &[f64], indices: &[usize]) -> Option<Split> {
    let count = indices.len() as f64;
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / count;
    if parent_sse <= 1e-12 {
        return None;
    }

    let mut best: Option<(f64, Split)> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..FEATURE_COUNT {
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for position in 0..sorted.len() - 1 {
            let target = targets[sorted[position]];
            left_sum += target;
            left_sq += target * target;

            let current = features[sorted[position]][feature];
            let next = features[sorted[position + 1]][feature];
            if next <= current {
                continue;
            }

            let left_count = (position + 1) as f64;
            let right_count = count - left_count;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_count)
                + (right_sq - right_sum * right_sum / right_count);

            let improves = match &best {
                Some((best_sse, _)) => sse < *best_sse,
                None => sse < parent_sse,
            };
            if improves {
                let mut threshold = (current + next) / 2.0;
                // midpoint can round up to `next` for adjacent floats
                if threshold >= next {
                    threshold = current;
                }
                best = Some((sse, Split { feature, threshold }));
            }
        }
    }

    best.map(|(_, split)| split)
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<FeatureVector>, Vec<f64>) {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            let x = i as f64;
            features.push([x, 0.0, 0.0, 0.0]);
            targets.push(if x < 20.0 { 10.0 } else { 50.0 });
        }
        (features, targets)
    }

    #[test]
    fn forest_learns_step_function() -> Result<(), &'static str> {
        let (features, targets) = step_data();
        let forest = RandomForest::fit(
            &features,
            &targets,
            ForestParams {
                n_trees: 25,
                ..ForestParams::default()
            },
        )
        .ok_or("fit failed")?;

        assert_eq!(forest.tree_count(), 25);
        assert!((forest.predict(&[2.0, 0.0, 0.0, 0.0]) - 10.0).abs() < 1.0);
        assert!((forest.predict(&[37.0, 0.0, 0.0, 0.0]) - 50.0).abs() < 1.0);
        Ok(())
    }

    #[test]
    fn predictions_stay_within_target_range() -> Result<(), &'static str> {
        let (features, targets) = step_data();
        let forest = RandomForest::fit(&features, &targets, ForestParams::default())
            .ok_or("fit failed")?;

        for x in [-100.0, 0.0, 19.5, 20.5, 1000.0] {
            let prediction = forest.predict(&[x, 0.0, 0.0, 0.0]);
            assert!((10.0..=50.0).contains(&prediction));
        }
        Ok(())
    }

    #[test]
    fn same_seed_gives_identical_forest() {
        let (features, targets) = step_data();
        let first = RandomForest::fit(&features, &targets, ForestParams::default());
        let second = RandomForest::fit(&features, &targets, ForestParams::default());
        assert_eq!(first, second);
    }

    #[test]
    fn constant_targets_produce_single_leaf_trees() -> Result<(), &'static str> {
        let features = vec![[1.0, 2.0, 3.0, 0.0], [4.0, 5.0, 6.0, 1.0]];
        let targets = vec![7.0, 7.0];
        let forest = RandomForest::fit(&features, &targets, ForestParams::default())
            .ok_or("fit failed")?;

        assert!(forest.trees.iter().all(|tree| tree.node_count() == 1));
        assert_eq!(forest.predict(&[0.0; FEATURE_COUNT]), 7.0);
        Ok(())
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let features = vec![[0.0; FEATURE_COUNT]; 3];
        assert!(RandomForest::fit(&features, &[1.0], ForestParams::default()).is_none());
        assert!(RandomForest::fit(&[], &[], ForestParams::default()).is_none());
    }
}
