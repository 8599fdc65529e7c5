//! CART classification tree with Gini impurity.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One node of a fitted tree.
///
/// Children always sit at larger indices than their parent, so a walk from
/// the root terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `features[feature] <= threshold` goes left.
    Split {
        feature: u16,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Class distribution of the training samples that reached this leaf.
    Leaf { distribution: Vec<f32> },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features inspected per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct PendingNode {
    index: usize,
    samples: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f32,
    score: f64,
}

impl DecisionTree {
    /// Grow a tree on `samples`, which index into `x`/`y` and may repeat
    /// (a bootstrap draw weights a row by its multiplicity).
    pub fn fit<R: Rng>(
        x: &[Vec<f32>],
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        options: &TreeOptions,
        rng: &mut R,
    ) -> Self {
        let n_features = x.first().map(|row| row.len()).unwrap_or(0);
        let mut nodes = vec![Node::Leaf {
            distribution: Vec::new(),
        }];
        let mut stack = vec![PendingNode {
            index: 0,
            samples,
            depth: 0,
        }];
        let mut feature_order: Vec<usize> = (0..n_features).collect();

        while let Some(pending) = stack.pop() {
            let counts = class_counts(y, &pending.samples, n_classes);
            let n = pending.samples.len();

            let depth_reached = options.max_depth.is_some_and(|max| pending.depth >= max);
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let too_small =
                n < options.min_samples_split.max(2) || n < 2 * options.min_samples_leaf.max(1);

            let split = if depth_reached || pure || too_small {
                None
            } else {
                feature_order.shuffle(rng);
                best_split(x, y, &pending.samples, &counts, &feature_order, n_classes, options)
            };

            let Some(split) = split else {
                nodes[pending.index] = Node::Leaf {
                    distribution: normalize(&counts),
                };
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = pending
                .samples
                .into_iter()
                .partition(|&s| x[s][split.feature] <= split.threshold);

            let left_index = nodes.len();
            let right_index = left_index + 1;
            nodes.push(Node::Leaf {
                distribution: Vec::new(),
            });
            nodes.push(Node::Leaf {
                distribution: Vec::new(),
            });
            nodes[pending.index] = Node::Split {
                feature: split.feature as u16,
                threshold: split.threshold,
                left: left_index as u32,
                right: right_index as u32,
            };

            stack.push(PendingNode {
                index: right_index,
                samples: right,
                depth: pending.depth + 1,
            });
            stack.push(PendingNode {
                index: left_index,
                samples: left,
                depth: pending.depth + 1,
            });
        }

        Self { nodes }
    }

    /// Leaf distribution reached by `features`.
    ///
    /// Callers must pass a row of the width the tree was fitted on.
    pub fn predict_distribution(&self, features: &[f32]) -> &[f32] {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature as usize).copied().unwrap_or(0.0);
                    index = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(Node::Split { left, right, .. }) = self.nodes.get(index) {
                stack.push((*left as usize, depth + 1));
                stack.push((*right as usize, depth + 1));
            }
        }
        max_depth
    }

    /// Validate structural invariants of a deserialized tree.
    pub fn validate(&self, n_classes: usize, feature_len: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature as usize >= feature_len {
                        return Err(format!(
                            "node {index} splits on feature {feature} (feature_len {feature_len})"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index} has a non-finite threshold"));
                    }
                    for child in [*left as usize, *right as usize] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("node {index} points at invalid child {child}"));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {index} has {} classes but expected {n_classes}",
                            distribution.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn class_counts(y: &[usize], samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &s in samples {
        if let Some(slot) = counts.get_mut(y[s]) {
            *slot += 1;
        }
    }
    counts
}

fn normalize(counts: &[usize]) -> Vec<f32> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![1.0 / counts.len().max(1) as f32; counts.len()];
    }
    counts.iter().map(|&c| c as f32 / total as f32).collect()
}

/// Sum of squared class counts over size; larger means purer children.
fn purity(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let squares: f64 = counts.iter().map(|&c| (c as f64) * (c as f64)).sum();
    squares / n as f64
}

/// Best Gini split over at most `max_features` non-constant features.
///
/// Features are visited in `feature_order`; constant features do not count
/// towards the budget. Ties keep the first split found.
fn best_split(
    x: &[Vec<f32>],
    y: &[usize],
    samples: &[usize],
    counts: &[usize],
    feature_order: &[usize],
    n_classes: usize,
    options: &TreeOptions,
) -> Option<BestSplit> {
    let n = samples.len();
    let min_leaf = options.min_samples_leaf.max(1);
    let mut visited = 0usize;
    let mut best: Option<BestSplit> = None;
    let mut sorted = samples.to_vec();

    for &feature in feature_order {
        if visited >= options.max_features.max(1) {
            break;
        }

        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        let lowest = x[sorted[0]][feature];
        let highest = x[sorted[n - 1]][feature];
        if lowest >= highest {
            continue;
        }
        visited += 1;

        let mut left = vec![0usize; n_classes];
        let mut right = counts.to_vec();
        for i in 0..n - 1 {
            let class = y[sorted[i]];
            left[class] += 1;
            right[class] -= 1;

            let current = x[sorted[i]][feature];
            let next = x[sorted[i + 1]][feature];
            if current >= next {
                continue;
            }
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let score = purity(&left, n_left) + purity(&right, n_right);
            if best.as_ref().map_or(true, |b| score > b.score) {
                let mut threshold = current + (next - current) / 2.0;
                if threshold >= next || !threshold.is_finite() {
                    threshold = current;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}
