use bincode::{Decode, Encode};

#[cfg(feature = "liblinear")]
use liblinear::LibLinearModel;

use crate::errors::{Result, ThenThanError};
use crate::feature::FeatureVector;
#[cfg(feature = "liblinear")]
use crate::sentence::TargetWord;

/// Logistic regression over one-hot features.
///
/// Only the coefficients are stored, so prediction does not need LIBLINEAR.
#[derive(Debug, Clone, PartialEq, Decode, Encode)]
pub struct LogisticModel {
    // Coefficients of the "than" class.
    pub(crate) weights: Vec<f64>,
    pub(crate) bias: f64,
}

impl LogisticModel {
    /// Fits an L2-regularized logistic regression with LIBLINEAR.
    ///
    /// # Arguments
    ///
    /// * `xs` - Feature vectors.
    /// * `ys` - Labels, parallel to `xs`.
    /// * `n_features` - Number of columns of every vector.
    /// * `epsilon` - The tolerance of the termination criterion.
    /// * `cost` - The parameter C.
    ///
    /// # Errors
    ///
    /// If LIBLINEAR rejects the problem, an error variant will be returned.
    #[cfg(feature = "liblinear")]
    #[cfg_attr(docsrs, doc(cfg(feature = "liblinear")))]
    pub fn fit(
        xs: &[FeatureVector],
        ys: &[TargetWord],
        n_features: usize,
        epsilon: f64,
        cost: f64,
    ) -> Result<Self> {
        if !(epsilon > 0.) {
            return Err(ThenThanError::configuration("epsilon", "must be positive"));
        }
        if !(cost > 0.) {
            return Err(ThenThanError::configuration("cost", "must be positive"));
        }
        let labels: Vec<f64> = ys.iter().map(|y| y.label() as f64).collect();
        let features: Vec<Vec<(u32, f64)>> = xs
            .iter()
            .map(|x| x.active().iter().map(|&i| (i + 1, 1.)).collect())
            .collect();

        let mut builder = liblinear::Builder::new();
        let training_input = liblinear::util::TrainingInput::from_sparse_features(labels, features)
            .map_err(|e| ThenThanError::invalid_model(format!("liblinear error: {:?}", e)))?;
        builder.problem().input_data(training_input).bias(1.0);
        builder
            .parameters()
            .solver_type(liblinear::SolverType::L2R_LR)
            .stopping_criterion(epsilon)
            .constraints_violation_cost(cost);
        liblinear::toggle_liblinear_stdout_output(false);
        let model = builder
            .build_model()
            .map_err(|e| ThenThanError::invalid_model(e.to_string()));
        liblinear::toggle_liblinear_stdout_output(true);
        let model = model?;

        let than_idx = model
            .labels()
            .iter()
            .position(|&cls| TargetWord::Than.label() as i32 == cls)
            .ok_or_else(|| ThenThanError::invalid_model("the model has no `than` class"))?;
        let than_idx = than_idx as i32;
        let bias = model.label_bias(than_idx);
        let weights = (0..n_features)
            .map(|fid| {
                if fid < model.num_features() {
                    model.feature_coefficient(fid as i32 + 1, than_idx)
                } else {
                    0.
                }
            })
            .collect();
        Ok(Self { weights, bias })
    }

    /// Returns `[P(then), P(than)]`.
    pub fn predict_proba(&self, x: &FeatureVector) -> [f64; 2] {
        let score = x
            .active()
            .iter()
            .filter_map(|&i| self.weights.get(i as usize))
            .sum::<f64>()
            + self.bias;
        let than = 1. / (1. + (-score).exp());
        [1. - than, than]
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ThenThanError::invalid_model(
                "the logistic model has non-finite coefficients",
            ));
        }
        Ok(())
    }

    /// Gets the number of columns.
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Gets the absolute coefficients normalized to sum to 1.
    pub fn feature_importances(&self) -> Vec<f64> {
        let sum: f64 = self.weights.iter().map(|w| w.abs()).sum();
        if sum == 0. {
            return vec![0.; self.weights.len()];
        }
        self.weights.iter().map(|w| w.abs() / sum).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_proba() {
        let model = LogisticModel {
            weights: vec![-2., 2., 0.],
            bias: 0.,
        };

        let x = FeatureVector::new(vec![2], 3).unwrap();
        assert_eq!([0.5, 0.5], model.predict_proba(&x));

        let x = FeatureVector::new(vec![1], 3).unwrap();
        let p = model.predict_proba(&x);
        assert!(p[1] > 0.88 && p[1] < 0.89);
        assert!((p[0] + p[1] - 1.).abs() < 1e-12);
    }

    #[test]
    fn test_feature_importances() {
        let model = LogisticModel {
            weights: vec![-3., 1., 0.],
            bias: 5.,
        };

        assert_eq!(vec![0.75, 0.25, 0.], model.feature_importances());
    }

    #[cfg(feature = "liblinear")]
    #[test]
    fn test_fit() {
        let mut xs = vec![];
        let mut ys = vec![];
        for _ in 0..10 {
            xs.push(FeatureVector::new(vec![0, 2], 3).unwrap());
            ys.push(TargetWord::Then);
            xs.push(FeatureVector::new(vec![1, 2], 3).unwrap());
            ys.push(TargetWord::Than);
        }
        let model = LogisticModel::fit(&xs, &ys, 3, 0.01, 1.).unwrap();

        assert_eq!(3, model.n_features());
        assert!(model.predict_proba(&xs[0])[0] > 0.5);
        assert!(model.predict_proba(&xs[1])[1] > 0.5);
    }
}
