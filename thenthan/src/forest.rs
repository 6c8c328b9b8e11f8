use bincode::{Decode, Encode};
use hashbrown::HashMap;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::{Result, ThenThanError};
use crate::feature::FeatureVector;
use crate::sentence::TargetWord;

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
pub(crate) enum Node {
    Leaf {
        proba: [f64; 2],
    },
    Split {
        feature: u32,
        present: u32,
        absent: u32,
    },
}

/// Binary decision tree over one-hot features.
///
/// Each split tests whether a single column is set.
#[derive(Debug, Clone, PartialEq, Decode, Encode)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
}

impl DecisionTree {
    /// Returns the class distribution of the leaf `x` falls into.
    pub fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    present,
                    absent,
                } => {
                    idx = if x.get(*feature) {
                        *present as usize
                    } else {
                        *absent as usize
                    };
                }
            }
        }
    }

    /// Gets the number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Checks that every path ends at a leaf and every split tests a valid column.
    ///
    /// Children are stored after their parent, so a valid tree has no cycle.
    pub(crate) fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ThenThanError::invalid_model("a tree has no nodes"));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } => {
                    if proba.iter().any(|p| !(0. ..=1.).contains(p)) {
                        return Err(ThenThanError::invalid_model(format!(
                            "leaf {} has invalid probabilities {:?}",
                            idx, proba
                        )));
                    }
                }
                Node::Split {
                    feature,
                    present,
                    absent,
                } => {
                    if *feature as usize >= n_features {
                        return Err(ThenThanError::invalid_model(format!(
                            "node {} splits on column {} of {}",
                            idx, feature, n_features
                        )));
                    }
                    for &child in [present, absent] {
                        let child = child as usize;
                        if child <= idx || child >= self.nodes.len() {
                            return Err(ThenThanError::invalid_model(format!(
                                "node {} has an invalid child {}",
                                idx, child
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Gets the number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

#[inline]
fn gini(w: [f64; 2]) -> f64 {
    let total = w[0] + w[1];
    if total <= 0. {
        return 0.;
    }
    let p0 = w[0] / total;
    let p1 = w[1] / total;
    1. - p0 * p0 - p1 * p1
}

struct TreeBuilder<'a> {
    xs: &'a [FeatureVector],
    ys: &'a [TargetWord],
    max_features: usize,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl TreeBuilder<'_> {
    fn leaf(weights: [f64; 2]) -> Node {
        let total = weights[0] + weights[1];
        Node::Leaf {
            proba: [weights[0] / total, weights[1] / total],
        }
    }

    // Samples are pairs of (example index, bootstrap multiplicity).
    fn build<R>(mut self, samples: Vec<(usize, f64)>, rng: &mut R) -> (DecisionTree, Vec<f64>)
    where
        R: Rng,
    {
        let mut stack = vec![(0, samples)];
        self.nodes.push(Node::Leaf { proba: [0.; 2] });
        while let Some((node_id, samples)) = stack.pop() {
            let mut weights = [0.; 2];
            for &(i, w) in &samples {
                weights[self.ys[i].label()] += w;
            }
            if weights[0] == 0. || weights[1] == 0. {
                self.nodes[node_id] = Self::leaf(weights);
                continue;
            }

            // Per-column class weights and the number of distinct samples having it.
            let mut present: HashMap<u32, ([f64; 2], usize)> = HashMap::new();
            for &(i, w) in &samples {
                let label = self.ys[i].label();
                for &f in self.xs[i].active() {
                    let entry = present.entry(f).or_insert(([0.; 2], 0));
                    entry.0[label] += w;
                    entry.1 += 1;
                }
            }
            let mut candidates: Vec<u32> = present
                .iter()
                .filter(|(_, (_, n))| *n < samples.len())
                .map(|(&f, _)| f)
                .collect();
            if candidates.is_empty() {
                // Identical feature vectors with different labels.
                self.nodes[node_id] = Self::leaf(weights);
                continue;
            }
            candidates.sort_unstable();
            candidates.shuffle(rng);
            candidates.truncate(self.max_features);

            let total = weights[0] + weights[1];
            let impurity = gini(weights);
            let mut best: Option<(u32, f64)> = None;
            for &f in &candidates {
                let left = present[&f].0;
                let right = [weights[0] - left[0], weights[1] - left[1]];
                let n_left = left[0] + left[1];
                let n_right = right[0] + right[1];
                let decrease = total * impurity - n_left * gini(left) - n_right * gini(right);
                if best.map_or(true, |(_, d)| decrease > d) {
                    best = Some((f, decrease));
                }
            }
            let Some((feature, decrease)) = best else {
                self.nodes[node_id] = Self::leaf(weights);
                continue;
            };
            self.importances[feature as usize] += decrease;

            let (with, without): (Vec<_>, Vec<_>) = samples
                .into_iter()
                .partition(|&(i, _)| self.xs[i].get(feature));
            let present_id = self.nodes.len();
            let absent_id = present_id + 1;
            self.nodes.push(Node::Leaf { proba: [0.; 2] });
            self.nodes.push(Node::Leaf { proba: [0.; 2] });
            self.nodes[node_id] = Node::Split {
                feature,
                present: present_id as u32,
                absent: absent_id as u32,
            };
            stack.push((absent_id, without));
            stack.push((present_id, with));
        }
        (DecisionTree { nodes: self.nodes }, self.importances)
    }
}

/// Random forest of fully grown Gini trees.
///
/// Probabilities are the mean of the leaf class frequencies over all trees.
#[derive(Debug, Clone, PartialEq, Decode, Encode)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) importances: Vec<f64>,
}

impl RandomForest {
    /// Fits a forest.
    ///
    /// # Arguments
    ///
    /// * `xs` - Feature vectors.
    /// * `ys` - Labels, parallel to `xs`.
    /// * `n_features` - Number of columns of every vector.
    /// * `n_estimators` - Number of trees.
    /// * `bootstrap` - Whether each tree is trained on a bootstrap resample.
    /// * `rng` - Random number generator.
    ///
    /// # Errors
    ///
    /// If `n_estimators` or `n_features` is 0, `xs` is empty, or the inputs are
    /// inconsistent, an error variant will be returned.
    pub fn fit<R>(
        xs: &[FeatureVector],
        ys: &[TargetWord],
        n_features: usize,
        n_estimators: usize,
        bootstrap: bool,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: Rng,
    {
        if n_estimators == 0 {
            return Err(ThenThanError::configuration(
                "n_estimators",
                "must be at least 1",
            ));
        }
        if n_features == 0 {
            return Err(ThenThanError::configuration(
                "n_features",
                "must be at least 1",
            ));
        }
        if xs.is_empty() {
            return Err(ThenThanError::configuration("xs", "no training examples"));
        }
        if xs.len() != ys.len() {
            return Err(ThenThanError::configuration(
                "ys",
                format!("{} labels for {} examples", ys.len(), xs.len()),
            ));
        }
        if xs.iter().any(|x| x.n_features() != n_features) {
            return Err(ThenThanError::configuration(
                "xs",
                format!("every vector must have {} features", n_features),
            ));
        }

        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut trees = Vec::with_capacity(n_estimators);
        let mut importances = vec![0.; n_features];
        for _ in 0..n_estimators {
            let samples = if bootstrap {
                let mut counts = vec![0usize; xs.len()];
                for _ in 0..xs.len() {
                    counts[rng.gen_range(0..xs.len())] += 1;
                }
                counts
                    .into_iter()
                    .enumerate()
                    .filter(|&(_, c)| c != 0)
                    .map(|(i, c)| (i, c as f64))
                    .collect()
            } else {
                (0..xs.len()).map(|i| (i, 1.)).collect()
            };
            let builder = TreeBuilder {
                xs,
                ys,
                max_features,
                nodes: vec![],
                importances: vec![0.; n_features],
            };
            let (tree, tree_importances) = builder.build(samples, rng);
            let sum: f64 = tree_importances.iter().sum();
            if sum > 0. {
                for (acc, imp) in importances.iter_mut().zip(tree_importances) {
                    *acc += imp / sum;
                }
            }
            trees.push(tree);
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0. {
            for imp in &mut importances {
                *imp /= sum;
            }
        }
        Ok(Self {
            trees,
            n_features,
            importances,
        })
    }

    /// Returns `[P(then), P(than)]`.
    pub fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        let mut sum = [0.; 2];
        for tree in &self.trees {
            let p = tree.predict_proba(x);
            sum[0] += p[0];
            sum[1] += p[1];
        }
        let n = self.trees.len() as f64;
        [sum[0] / n, sum[1] / n]
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ThenThanError::invalid_model("the forest has no trees"));
        }
        if self.importances.len() != self.n_features {
            return Err(ThenThanError::invalid_model(format!(
                "{} importances for {} features",
                self.importances.len(),
                self.n_features
            )));
        }
        for tree in &self.trees {
            tree.validate(self.n_features)?;
        }
        Ok(())
    }

    /// Gets the trees.
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Gets the number of columns the forest was trained on.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Gets the mean decrease in impurity of each column, normalized to sum to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fv(active: &[u32], n: usize) -> FeatureVector {
        FeatureVector::new(active.to_vec(), n).unwrap()
    }

    #[test]
    fn test_fit_separable() {
        // Column 0 marks "then", column 1 marks "than", column 2 is noise.
        let xs = vec![fv(&[0], 3), fv(&[0, 2], 3), fv(&[1], 3), fv(&[1, 2], 3)];
        let ys = vec![
            TargetWord::Then,
            TargetWord::Then,
            TargetWord::Than,
            TargetWord::Than,
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let forest = RandomForest::fit(&xs, &ys, 3, 10, false, &mut rng).unwrap();

        assert_eq!(10, forest.trees().len());
        assert_eq!([1., 0.], forest.predict_proba(&fv(&[0], 3)));
        assert_eq!([0., 1.], forest.predict_proba(&fv(&[1, 2], 3)));
    }

    #[test]
    fn test_fit_single_class_is_leaf() {
        let xs = vec![fv(&[0], 2), fv(&[1], 2)];
        let ys = vec![TargetWord::Than, TargetWord::Than];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let forest = RandomForest::fit(&xs, &ys, 2, 3, true, &mut rng).unwrap();

        for tree in forest.trees() {
            assert_eq!(1, tree.n_nodes());
        }
        assert_eq!([0., 1.], forest.predict_proba(&fv(&[0], 2)));
        assert_eq!(vec![0., 0.], forest.feature_importances());
    }

    #[test]
    fn test_fit_conflicting_examples() {
        let xs = vec![fv(&[0], 1), fv(&[0], 1), fv(&[0], 1), fv(&[0], 1)];
        let ys = vec![
            TargetWord::Then,
            TargetWord::Then,
            TargetWord::Then,
            TargetWord::Than,
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let forest = RandomForest::fit(&xs, &ys, 1, 1, false, &mut rng).unwrap();

        assert_eq!([0.75, 0.25], forest.predict_proba(&fv(&[0], 1)));
    }

    #[test]
    fn test_fit_is_reproducible() {
        let xs = vec![
            fv(&[0, 3], 4),
            fv(&[0, 2], 4),
            fv(&[1, 3], 4),
            fv(&[1, 2], 4),
            fv(&[0, 2], 4),
        ];
        let ys = vec![
            TargetWord::Then,
            TargetWord::Then,
            TargetWord::Than,
            TargetWord::Than,
            TargetWord::Than,
        ];
        let a = RandomForest::fit(&xs, &ys, 4, 5, true, &mut ChaCha8Rng::seed_from_u64(3));
        let b = RandomForest::fit(&xs, &ys, 4, 5, true, &mut ChaCha8Rng::seed_from_u64(3));

        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_feature_importances() {
        let xs = vec![fv(&[0, 2], 3), fv(&[1, 2], 3)];
        let ys = vec![TargetWord::Then, TargetWord::Than];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let forest = RandomForest::fit(&xs, &ys, 3, 4, false, &mut rng).unwrap();
        let importances = forest.feature_importances();

        assert_eq!(3, importances.len());
        assert_eq!(0., importances[2]);
        assert!((importances.iter().sum::<f64>() - 1.).abs() < 1e-9);
    }

    #[test]
    fn test_fit_invalid_arguments() {
        let xs = vec![fv(&[0], 1)];
        let ys = vec![TargetWord::Then];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(RandomForest::fit(&xs, &ys, 1, 0, true, &mut rng).is_err());
        assert!(RandomForest::fit(&xs, &[], 1, 1, true, &mut rng).is_err());
        assert!(RandomForest::fit(&[], &[], 1, 1, true, &mut rng).is_err());
        assert!(RandomForest::fit(&xs, &ys, 2, 1, true, &mut rng).is_err());
    }
}
