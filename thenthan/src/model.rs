use std::io::{Read, Write};

use bincode::{Decode, Encode};

use crate::classifier::{Classifier, ProbabilisticClassifier};
use crate::errors::{Result, ThenThanError};
use crate::feature::FeatureSchema;

/// Magic number written at the head of a model file.
const MODEL_MAGIC: &[u8; 8] = b"THENTHAN";

/// Upper bound on the bytes a model file may decode to.
const MODEL_SIZE_LIMIT: usize = 1 << 30;

/// Trained model: the frozen feature schema and the classifier fitted against it.
#[derive(Debug, Clone, PartialEq, Decode, Encode)]
pub struct Model {
    pub(crate) schema: FeatureSchema,
    pub(crate) classifier: Classifier,
}

impl Model {
    /// Bundles a schema with a classifier.
    ///
    /// # Errors
    ///
    /// If the classifier expects a different number of columns than the schema defines,
    /// the schema columns are not strictly sorted, or a tree is malformed, an error variant
    /// will be returned.
    pub fn new<C>(schema: FeatureSchema, classifier: C) -> Result<Self>
    where
        C: Into<Classifier>,
    {
        let classifier = classifier.into();
        schema.validate()?;
        classifier.validate()?;
        if classifier.n_features() != schema.len() {
            return Err(ThenThanError::invalid_model(format!(
                "the classifier expects {} features but the schema has {}",
                classifier.n_features(),
                schema.len()
            )));
        }
        Ok(Self { schema, classifier })
    }

    /// Gets the feature schema.
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Gets the classifier.
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Gets the half-width of the context window.
    pub const fn window_size(&self) -> u8 {
        self.schema.window_size()
    }

    /// Exports the model data.
    ///
    /// # Arguments
    ///
    /// * `wtr` - Byte-oriented sink object.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;
        bincode::encode_into_std_write(self, &mut wtr, bincode::config::standard())?;
        Ok(())
    }

    /// Creates a model from a reader.
    ///
    /// # Arguments
    ///
    /// * `rdr` - A data source.
    ///
    /// # Returns
    ///
    /// A model data read from `rdr`.
    ///
    /// # Errors
    ///
    /// When `rdr` generates an error, it will be returned as is.
    /// If the data is not a model file, or fails the checks of [`Model::new()`],
    /// an error variant will be returned.
    pub fn read<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0; 8];
        rdr.read_exact(&mut magic)?;
        if &magic != MODEL_MAGIC {
            return Err(ThenThanError::invalid_model("not a then/than model file"));
        }
        let config = bincode::config::standard().with_limit::<MODEL_SIZE_LIMIT>();
        let model: Self = bincode::decode_from_std_read(&mut rdr, config)?;
        Self::new(model.schema, model.classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::ContextWindow;
    use crate::forest::Node;
    use crate::linear::LogisticModel;
    use crate::sentence::TaggedSentence;
    use crate::trainer::Trainer;

    fn schema() -> FeatureSchema {
        let windows = vec![
            ContextWindow::extract(&["CC", "RB", "PPSS"], 1, 1).unwrap(),
            ContextWindow::extract(&["JJR", "IN", "DT"], 1, 1).unwrap(),
        ];
        FeatureSchema::build(1, &windows).unwrap()
    }

    #[test]
    fn test_new_mismatch() {
        let classifier = LogisticModel {
            weights: vec![0.; 3],
            bias: 0.,
        };
        let model = Model::new(schema(), classifier);

        assert!(model.is_err());
        assert_eq!(
            "InvalidModelError: the classifier expects 3 features but the schema has 4",
            &model.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_write_read() {
        let classifier = LogisticModel {
            weights: vec![-1., 1., 0.5, 0.],
            bias: 0.25,
        };
        let model = Model::new(schema(), classifier).unwrap();

        let mut buf = vec![];
        model.write(&mut buf).unwrap();
        let restored = Model::read(buf.as_slice()).unwrap();

        assert_eq!(model, restored);
    }

    #[test]
    fn test_read_bad_magic() {
        let model = Model::read(&b"VAPORETTO-MODEL"[..]);

        assert!(model.is_err());
        assert_eq!(
            "InvalidModelError: not a then/than model file",
            &model.err().unwrap().to_string()
        );
    }

    fn trained_model() -> Model {
        let mut trainer = Trainer::new(1, 3).unwrap().bootstrap(false).seed(0);
        for line in ["and/CC then/RB we/PPSS left/VBD", "bigger/JJR than/IN that/DT"] {
            trainer
                .push_sentence(&TaggedSentence::from_tagged(line).unwrap())
                .unwrap();
        }
        trainer.train().unwrap()
    }

    fn root_mut(model: &mut Model) -> &mut Node {
        match &mut model.classifier {
            Classifier::RandomForest(forest) => &mut forest.trees[0].nodes[0],
            Classifier::Logistic(_) => unreachable!(),
        }
    }

    fn assert_rejected(model: &Model) {
        let mut buf = vec![];
        model.write(&mut buf).unwrap();

        assert!(matches!(
            Model::read(buf.as_slice()),
            Err(ThenThanError::InvalidModel(_))
        ));
        assert!(matches!(
            Model::new(model.schema.clone(), model.classifier.clone()),
            Err(ThenThanError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_read_trained_model() {
        let model = trained_model();

        let mut buf = vec![];
        model.write(&mut buf).unwrap();
        let restored = Model::read(buf.as_slice()).unwrap();

        assert_eq!(model, restored);
    }

    #[test]
    fn test_read_child_out_of_range() {
        let mut model = trained_model();
        match root_mut(&mut model) {
            Node::Split { present, .. } => *present = 99,
            Node::Leaf { .. } => unreachable!(),
        }

        assert_rejected(&model);
    }

    #[test]
    fn test_read_cyclic_tree() {
        let mut model = trained_model();
        match root_mut(&mut model) {
            Node::Split { absent, .. } => *absent = 0,
            Node::Leaf { .. } => unreachable!(),
        }

        assert_rejected(&model);
    }

    #[test]
    fn test_read_split_column_out_of_range() {
        let mut model = trained_model();
        match root_mut(&mut model) {
            Node::Split { feature, .. } => *feature = 4,
            Node::Leaf { .. } => unreachable!(),
        }

        assert_rejected(&model);
    }

    #[test]
    fn test_read_invalid_leaf() {
        let mut model = trained_model();
        *root_mut(&mut model) = Node::Leaf {
            proba: [f64::NAN, 0.5],
        };

        assert_rejected(&model);
    }

    #[test]
    fn test_read_empty_forest() {
        let mut model = trained_model();
        if let Classifier::RandomForest(forest) = &mut model.classifier {
            forest.trees.clear();
        }

        assert_rejected(&model);
    }

    #[test]
    fn test_read_unsorted_columns() {
        let mut model = trained_model();
        model.schema.columns.swap(0, 1);

        assert_rejected(&model);
    }

    #[test]
    fn test_read_duplicate_columns() {
        let mut model = trained_model();
        let first = model.schema.columns[0].clone();
        model.schema.columns[1] = first;

        assert_rejected(&model);
    }

    #[test]
    fn test_read_non_finite_weights() {
        let model = Model {
            schema: schema(),
            classifier: Classifier::Logistic(LogisticModel {
                weights: vec![0., f64::INFINITY, 0., 0.],
                bias: 0.,
            }),
        };

        assert_rejected(&model);
    }

    #[test]
    fn test_read_truncated() {
        let model = trained_model();
        let mut buf = vec![];
        model.write(&mut buf).unwrap();
        buf.truncate(buf.len() / 2);

        assert!(Model::read(buf.as_slice()).is_err());
    }
}
