use bincode::{Decode, Encode};

use crate::errors::Result;
use crate::feature::FeatureVector;
use crate::forest::RandomForest;
use crate::linear::LogisticModel;

/// A classifier that reports a probability for each target word.
pub trait ProbabilisticClassifier {
    /// Returns `[P(then), P(than)]` for a feature vector.
    fn predict_proba(&self, x: &FeatureVector) -> [f64; 2];

    /// Gets the number of columns the classifier expects.
    fn n_features(&self) -> usize;
}

impl ProbabilisticClassifier for RandomForest {
    fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        RandomForest::predict_proba(self, x)
    }

    fn n_features(&self) -> usize {
        RandomForest::n_features(self)
    }
}

impl ProbabilisticClassifier for LogisticModel {
    fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        LogisticModel::predict_proba(self, x)
    }

    fn n_features(&self) -> usize {
        LogisticModel::n_features(self)
    }
}

/// Classifiers that can be stored in a model file.
#[derive(Debug, Clone, PartialEq, Decode, Encode)]
pub enum Classifier {
    /// Ensemble of decision trees.
    RandomForest(RandomForest),

    /// Logistic regression.
    Logistic(LogisticModel),
}

impl Classifier {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::RandomForest(forest) => forest.validate(),
            Self::Logistic(model) => model.validate(),
        }
    }

    /// Gets the importance of each column, normalized to sum to 1.
    pub fn feature_importances(&self) -> Vec<f64> {
        match self {
            Self::RandomForest(forest) => forest.feature_importances().to_vec(),
            Self::Logistic(model) => model.feature_importances(),
        }
    }
}

impl ProbabilisticClassifier for Classifier {
    fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        match self {
            Self::RandomForest(forest) => forest.predict_proba(x),
            Self::Logistic(model) => model.predict_proba(x),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(forest) => forest.n_features(),
            Self::Logistic(model) => model.n_features(),
        }
    }
}

impl From<RandomForest> for Classifier {
    fn from(forest: RandomForest) -> Self {
        Self::RandomForest(forest)
    }
}

impl From<LogisticModel> for Classifier {
    fn from(model: LogisticModel) -> Self {
        Self::Logistic(model)
    }
}
