//! CART decision trees
//!
//! Binary trees grown greedily: every node tries every feature and every
//! midpoint between consecutive distinct values, keeping the split with the
//! lowest weighted child impurity. Regression trees minimise variance,
//! classification trees minimise Gini impurity. Nodes live in a flat arena
//! so a fitted tree serializes as plain data.

use std::cmp::Ordering;

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};

/// Growth limits shared by both tree kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TreeParams {
    /// Unlimited when `None`
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum Node {
    /// Regression: `[mean]`. Classification: class probabilities.
    Leaf { value: Vec<f64> },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Tree {
    fn leaf_value(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

// ============================================================================
// Split criteria
// ============================================================================

/// Sufficient statistics for one side of a candidate split
trait Criterion {
    type Stats: Clone;

    fn empty(&self) -> Self::Stats;
    fn add(&self, stats: &mut Self::Stats, sample: usize);
    fn remove(&self, stats: &mut Self::Stats, sample: usize);
    fn count(stats: &Self::Stats) -> usize;
    fn impurity(stats: &Self::Stats) -> f64;
    fn leaf_value(stats: &Self::Stats) -> Vec<f64>;
}

struct Variance<'a> {
    targets: &'a [f64],
}

#[derive(Clone)]
struct MomentStats {
    n: usize,
    sum: f64,
    sum_sq: f64,
}

impl Criterion for Variance<'_> {
    type Stats = MomentStats;

    fn empty(&self) -> MomentStats {
        MomentStats {
            n: 0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    fn add(&self, stats: &mut MomentStats, sample: usize) {
        let y = self.targets[sample];
        stats.n += 1;
        stats.sum += y;
        stats.sum_sq += y * y;
    }

    fn remove(&self, stats: &mut MomentStats, sample: usize) {
        let y = self.targets[sample];
        stats.n -= 1;
        stats.sum -= y;
        stats.sum_sq -= y * y;
    }

    fn count(stats: &MomentStats) -> usize {
        stats.n
    }

    fn impurity(stats: &MomentStats) -> f64 {
        if stats.n == 0 {
            return 0.0;
        }
        let n = stats.n as f64;
        let mean = stats.sum / n;
        (stats.sum_sq / n - mean * mean).max(0.0)
    }

    fn leaf_value(stats: &MomentStats) -> Vec<f64> {
        let mean = if stats.n == 0 {
            0.0
        } else {
            stats.sum / stats.n as f64
        };
        vec![mean]
    }
}

struct Gini<'a> {
    labels: &'a [usize],
    n_classes: usize,
}

#[derive(Clone)]
struct ClassCounts {
    n: usize,
    counts: Vec<usize>,
}

impl Criterion for Gini<'_> {
    type Stats = ClassCounts;

    fn empty(&self) -> ClassCounts {
        ClassCounts {
            n: 0,
            counts: vec![0; self.n_classes],
        }
    }

    fn add(&self, stats: &mut ClassCounts, sample: usize) {
        stats.n += 1;
        stats.counts[self.labels[sample]] += 1;
    }

    fn remove(&self, stats: &mut ClassCounts, sample: usize) {
        stats.n -= 1;
        stats.counts[self.labels[sample]] -= 1;
    }

    fn count(stats: &ClassCounts) -> usize {
        stats.n
    }

    fn impurity(stats: &ClassCounts) -> f64 {
        if stats.n == 0 {
            return 0.0;
        }
        let n = stats.n as f64;
        1.0 - stats
            .counts
            .iter()
            .map(|&c| {
                let p = c as f64 / n;
                p * p
            })
            .sum::<f64>()
    }

    fn leaf_value(stats: &ClassCounts) -> Vec<f64> {
        let n = stats.n.max(1) as f64;
        stats.counts.iter().map(|&c| c as f64 / n).collect()
    }
}

// ============================================================================
// Growth
// ============================================================================

const IMPURITY_EPSILON: f64 = 1e-12;

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Number of samples going left once sorted by `feature`
    left_count: usize,
    weighted_child_impurity: f64,
}

fn compare_values(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn find_best_split<C: Criterion>(
    criterion: &C,
    x: ArrayView2<f64>,
    samples: &mut [usize],
    node_stats: &C::Stats,
) -> Option<BestSplit> {
    let n = samples.len();
    let mut best: Option<BestSplit> = None;

    for feature in 0..x.ncols() {
        samples.sort_by(|&a, &b| compare_values(x[[a, feature]], x[[b, feature]]));

        let mut left = criterion.empty();
        let mut right = node_stats.clone();

        for k in 0..n - 1 {
            let sample = samples[k];
            criterion.add(&mut left, sample);
            criterion.remove(&mut right, sample);

            let current = x[[sample, feature]];
            let next = x[[samples[k + 1], feature]];
            if next <= current {
                continue;
            }

            let weighted = C::count(&left) as f64 * C::impurity(&left)
                + C::count(&right) as f64 * C::impurity(&right);

            let better = best
                .as_ref()
                .map_or(true, |b| weighted < b.weighted_child_impurity);
            if better {
                let mut threshold = (current + next) / 2.0;
                if threshold >= next {
                    threshold = current;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    left_count: k + 1,
                    weighted_child_impurity: weighted,
                });
            }
        }
    }

    best
}

fn grow<C: Criterion>(
    criterion: &C,
    x: ArrayView2<f64>,
    mut samples: Vec<usize>,
    params: &TreeParams,
) -> Tree {
    struct Pending {
        node: usize,
        start: usize,
        end: usize,
        depth: usize,
    }

    let n_features = x.ncols();
    let mut nodes = vec![Node::Leaf { value: Vec::new() }];
    let mut importances = vec![0.0; n_features];
    let mut stack = vec![Pending {
        node: 0,
        start: 0,
        end: samples.len(),
        depth: 0,
    }];

    while let Some(Pending {
        node,
        start,
        end,
        depth,
    }) = stack.pop()
    {
        let slice = &mut samples[start..end];
        let mut stats = criterion.empty();
        for &s in slice.iter() {
            criterion.add(&mut stats, s);
        }

        let impurity = C::impurity(&stats);
        let depth_exhausted = params.max_depth.map_or(false, |d| depth >= d);
        let splittable = slice.len() >= params.min_samples_split
            && impurity > IMPURITY_EPSILON
            && !depth_exhausted;

        let split = if splittable {
            find_best_split(criterion, x, slice, &stats)
        } else {
            None
        };

        match split {
            Some(best) => {
                slice.sort_by(|&a, &b| compare_values(x[[a, best.feature]], x[[b, best.feature]]));
                importances[best.feature] +=
                    slice.len() as f64 * impurity - best.weighted_child_impurity;

                let left = nodes.len();
                let right = left + 1;
                nodes.push(Node::Leaf { value: Vec::new() });
                nodes.push(Node::Leaf { value: Vec::new() });
                nodes[node] = Node::Split {
                    feature: best.feature,
                    threshold: best.threshold,
                    left,
                    right,
                };

                let mid = start + best.left_count;
                stack.push(Pending {
                    node: right,
                    start: mid,
                    end,
                    depth: depth + 1,
                });
                stack.push(Pending {
                    node: left,
                    start,
                    end: mid,
                    depth: depth + 1,
                });
            }
            None => {
                nodes[node] = Node::Leaf {
                    value: C::leaf_value(&stats),
                };
            }
        }
    }

    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        importances.iter_mut().for_each(|v| *v /= total);
    }

    Tree {
        nodes,
        n_features,
        feature_importances: importances,
    }
}

fn check_training_input(
    x: ArrayView2<f64>,
    targets: usize,
    samples: &[usize],
) -> PredictorResult<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(PredictorError::InvalidInput(
            "Cannot grow a tree on an empty matrix".to_string(),
        ));
    }
    if x.nrows() != targets {
        return Err(PredictorError::InvalidInput(format!(
            "{} rows but {} targets",
            x.nrows(),
            targets
        )));
    }
    if samples.is_empty() || samples.iter().any(|&s| s >= x.nrows()) {
        return Err(PredictorError::InvalidInput(
            "Sample indices must be non-empty and within the matrix".to_string(),
        ));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(PredictorError::InvalidInput(
            "Feature matrix contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

fn check_row(row: ArrayView1<f64>, n_features: usize) -> PredictorResult<()> {
    if row.len() != n_features {
        return Err(PredictorError::InvalidInput(format!(
            "Tree was grown on {} features, got {}",
            n_features,
            row.len()
        )));
    }
    Ok(())
}

// ============================================================================
// Public estimators
// ============================================================================

/// Regression tree predicting the mean target of a leaf
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTreeRegressor {
    params: TreeParams,
    tree: Tree,
}

impl DecisionTreeRegressor {
    pub fn fit(params: TreeParams, x: ArrayView2<f64>, y: &[f64]) -> PredictorResult<Self> {
        let samples: Vec<usize> = (0..x.nrows()).collect();
        Self::fit_samples(params, x, y, samples)
    }

    /// Grow on a subset (or bootstrap multiset) of the rows of `x`
    pub fn fit_samples(
        params: TreeParams,
        x: ArrayView2<f64>,
        y: &[f64],
        samples: Vec<usize>,
    ) -> PredictorResult<Self> {
        check_training_input(x, y.len(), &samples)?;
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::InvalidInput(
                "Targets contain non-finite values".to_string(),
            ));
        }
        let tree = grow(&Variance { targets: y }, x, samples, &params);
        Ok(Self { params, tree })
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> PredictorResult<f64> {
        check_row(row, self.tree.n_features)?;
        Ok(self.tree.leaf_value(row)[0])
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> PredictorResult<Vec<f64>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Normalised impurity decrease per feature (all zeros for a single leaf)
    pub fn feature_importances(&self) -> &[f64] {
        &self.tree.feature_importances
    }

    pub fn n_features(&self) -> usize {
        self.tree.n_features
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.leaf_count()
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }
}

/// Classification tree over dense class indices `0..n_classes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTreeClassifier {
    params: TreeParams,
    n_classes: usize,
    tree: Tree,
}

impl DecisionTreeClassifier {
    pub fn fit(
        params: TreeParams,
        x: ArrayView2<f64>,
        labels: &[usize],
        n_classes: usize,
    ) -> PredictorResult<Self> {
        let samples: Vec<usize> = (0..x.nrows()).collect();
        check_training_input(x, labels.len(), &samples)?;
        if n_classes == 0 || labels.iter().any(|&l| l >= n_classes) {
            return Err(PredictorError::InvalidInput(format!(
                "Labels must be class indices below {}",
                n_classes
            )));
        }
        let criterion = Gini { labels, n_classes };
        let tree = grow(&criterion, x, samples, &params);
        Ok(Self {
            params,
            n_classes,
            tree,
        })
    }

    /// Class distribution of the leaf the row falls into
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> PredictorResult<Vec<f64>> {
        check_row(row, self.tree.n_features)?;
        Ok(self.tree.leaf_value(row).to_vec())
    }

    /// Most probable class; ties go to the lowest class index
    pub fn predict_row(&self, row: ArrayView1<f64>) -> PredictorResult<usize> {
        let proba = self.predict_proba_row(row)?;
        Ok(argmax(&proba))
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> PredictorResult<Vec<usize>> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.tree.n_features
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.tree.feature_importances
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
