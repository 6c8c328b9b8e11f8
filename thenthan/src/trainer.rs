use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::context::{ContextWindow, MAX_WINDOW_SIZE};
use crate::errors::{Result, ThenThanError};
use crate::feature::{FeatureSchema, FeatureVector};
use crate::forest::RandomForest;
use crate::model::Model;
use crate::sentence::{TaggedSentence, TargetWord};

#[cfg(feature = "liblinear")]
use crate::linear::LogisticModel;

/// Default half-width of the context window.
pub const DEFAULT_WINDOW_SIZE: u8 = 2;

/// Default number of trees.
pub const DEFAULT_N_ESTIMATORS: usize = 20;

/// A context window labeled with the word that was actually written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub(crate) context: ContextWindow,
    pub(crate) word: TargetWord,
}

impl LabeledExample {
    /// Extracts the examples of a sentence: one for the first "then" and one for the
    /// first "than", when present.
    ///
    /// # Errors
    ///
    /// If `window_size` is invalid, an error variant will be returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenthan::{LabeledExample, TaggedSentence, TargetWord};
    ///
    /// let s = TaggedSentence::from_tagged("more/AP than/CS then/RB ,/, than/CS").unwrap();
    /// let examples = LabeledExample::extract_all(&s, 1).unwrap();
    /// assert_eq!(2, examples.len());
    /// assert_eq!(TargetWord::Then, examples[0].word());
    /// assert_eq!(Some("CS"), examples[0].context().get(-1));
    /// ```
    pub fn extract_all(sentence: &TaggedSentence, window_size: u8) -> Result<Vec<Self>> {
        let tags = sentence.tags();
        let mut examples = vec![];
        for word in TargetWord::ALL {
            if let Some(index) = sentence.find(word) {
                examples.push(Self {
                    context: ContextWindow::extract(&tags[..], index, window_size)?,
                    word,
                });
            }
        }
        Ok(examples)
    }

    /// Gets the context.
    pub const fn context(&self) -> &ContextWindow {
        &self.context
    }

    /// Gets the label.
    pub const fn word(&self) -> TargetWord {
        self.word
    }
}

/// Trainer.
///
/// Each tree is trained on a bootstrap resample by default. On a tiny corpus a resample
/// often misses one of the two words, so the forest then depends on the seed. The
/// example below disables bootstrapping to get the same model for every seed.
///
/// # Examples
///
/// ```
/// use thenthan::{TaggedSentence, Trainer};
///
/// let corpus = [
///     "and/CC then/RB we/PPSS left/VBD",
///     "bigger/JJR than/IN that/DT",
/// ];
/// let mut trainer = Trainer::new(1, 20).unwrap().bootstrap(false);
/// for line in corpus {
///     trainer.push_sentence(&TaggedSentence::from_tagged(line).unwrap()).unwrap();
/// }
/// let model = trainer.train().unwrap();
/// assert_eq!(4, model.schema().len());
/// ```
pub struct Trainer {
    window_size: u8,
    n_estimators: usize,
    bootstrap: bool,
    seed: Option<u64>,
    examples: Vec<LabeledExample>,
}

impl Trainer {
    /// Creates a new trainer.
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of context slots on each side of the target word.
    /// * `n_estimators` - Number of trees in the forest.
    ///
    /// # Errors
    ///
    /// If `window_size` is not in `1..=127` or `n_estimators` is 0, an error variant will
    /// be returned.
    pub fn new(window_size: u8, n_estimators: usize) -> Result<Self> {
        if window_size == 0 || window_size > MAX_WINDOW_SIZE {
            return Err(ThenThanError::configuration(
                "window_size",
                format!("must be in 1..={}", MAX_WINDOW_SIZE),
            ));
        }
        if n_estimators == 0 {
            return Err(ThenThanError::configuration(
                "n_estimators",
                "must be at least 1",
            ));
        }
        Ok(Self {
            window_size,
            n_estimators,
            bootstrap: true,
            seed: None,
            examples: vec![],
        })
    }

    /// Sets whether each tree is trained on a bootstrap resample. Enabled by default.
    ///
    /// Without bootstrapping every tree sees all examples and the trees only differ in
    /// the columns drawn at each split.
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Fixes the random seed for reproducible training.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Adds the then/than occurrences of a sentence to the dataset.
    ///
    /// Sentences without either word are ignored.
    pub fn push_sentence(&mut self, s: &TaggedSentence) -> Result<()> {
        let examples = LabeledExample::extract_all(s, self.window_size)?;
        self.examples.extend(examples);
        Ok(())
    }

    /// Adds a prepared example.
    ///
    /// # Errors
    ///
    /// If the example was extracted with another window size, an error variant will be
    /// returned.
    pub fn push_example(&mut self, example: LabeledExample) -> Result<()> {
        if example.context.window_size() != self.window_size {
            return Err(ThenThanError::configuration(
                "example",
                format!(
                    "window size {} differs from the trainer's {}",
                    example.context.window_size(),
                    self.window_size
                ),
            ));
        }
        self.examples.push(example);
        Ok(())
    }

    /// Gets the collected examples.
    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    /// Gets the number of collected examples of a word.
    pub fn n_examples(&self, word: TargetWord) -> usize {
        self.examples.iter().filter(|e| e.word == word).count()
    }

    fn dataset(&self) -> Result<(FeatureSchema, Vec<FeatureVector>, Vec<TargetWord>)> {
        if self.examples.is_empty() {
            return Err(ThenThanError::configuration(
                "corpus",
                "contains no occurrence of `then` or `than`",
            ));
        }
        for word in TargetWord::ALL {
            if self.n_examples(word) == 0 {
                return Err(ThenThanError::configuration(
                    "corpus",
                    format!("contains no occurrence of `{}`", word),
                ));
            }
        }
        let schema = FeatureSchema::build(
            self.window_size,
            self.examples.iter().map(|e| &e.context),
        )?;
        let xs = self
            .examples
            .iter()
            .map(|e| schema.encode(&e.context))
            .collect::<Result<Vec<_>>>()?;
        let ys = self.examples.iter().map(|e| e.word).collect();
        Ok((schema, xs, ys))
    }

    /// Trains a random forest.
    ///
    /// # Returns
    ///
    /// A trained model.
    ///
    /// # Errors
    ///
    /// An error variant will be returned when the corpus has no occurrence of one of the
    /// two words, or no context tag was observed.
    pub fn train(self) -> Result<Model> {
        let (schema, xs, ys) = self.dataset()?;
        let mut rng = self
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let forest = RandomForest::fit(
            &xs,
            &ys,
            schema.len(),
            self.n_estimators,
            self.bootstrap,
            &mut rng,
        )?;
        Model::new(schema, forest)
    }

    /// Trains a logistic regression with LIBLINEAR instead of a forest.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - The tolerance of the termination criterion.
    /// * `cost` - The parameter C.
    ///
    /// # Errors
    ///
    /// Same as [`Trainer::train()`], plus LIBLINEAR failures.
    #[cfg(feature = "liblinear")]
    #[cfg_attr(docsrs, doc(cfg(feature = "liblinear")))]
    pub fn train_logistic(self, epsilon: f64, cost: f64) -> Result<Model> {
        let (schema, xs, ys) = self.dataset()?;
        let model = LogisticModel::fit(&xs, &ys, schema.len(), epsilon, cost)?;
        Model::new(schema, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classifier::ProbabilisticClassifier;

    fn push_all(trainer: &mut Trainer, lines: &[&str]) {
        for line in lines {
            trainer
                .push_sentence(&TaggedSentence::from_tagged(line).unwrap())
                .unwrap();
        }
    }

    #[test]
    fn test_new_invalid() {
        let t = Trainer::new(0, 20);
        assert!(t.is_err());
        assert_eq!(
            "ConfigurationError: window_size: must be in 1..=127",
            &t.err().unwrap().to_string()
        );

        let t = Trainer::new(2, 0);
        assert!(t.is_err());
        assert_eq!(
            "ConfigurationError: n_estimators: must be at least 1",
            &t.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_push_sentence_first_occurrence_only() {
        let mut trainer = Trainer::new(1, 1).unwrap();
        push_all(
            &mut trainer,
            &[
                "then/RB he/PPS ran/VBD ,/, then/RB walked/VBD",
                "no/AT target/NN here/RB",
                "Then/RB capitalized/VBN",
            ],
        );

        assert_eq!(1, trainer.examples().len());
        let example = &trainer.examples()[0];
        assert_eq!(TargetWord::Then, example.word());
        assert_eq!(None, example.context().get(-1));
        assert_eq!(Some("PPS"), example.context().get(1));
    }

    #[test]
    fn test_push_sentence_both_words() {
        let mut trainer = Trainer::new(2, 1).unwrap();
        push_all(&mut trainer, &["more/AP than/CS ever/RB ,/, then/RB"]);

        assert_eq!(1, trainer.n_examples(TargetWord::Then));
        assert_eq!(1, trainer.n_examples(TargetWord::Than));
    }

    #[test]
    fn test_push_example_window_mismatch() {
        let mut trainer = Trainer::new(2, 1).unwrap();
        let example = LabeledExample {
            context: ContextWindow::extract(&["CC", "RB"], 1, 1).unwrap(),
            word: TargetWord::Then,
        };

        assert!(trainer.push_example(example).is_err());
    }

    #[test]
    fn test_train_empty_corpus() {
        let trainer = Trainer::new(2, 20).unwrap();
        let model = trainer.train();

        assert!(model.is_err());
        assert_eq!(
            "ConfigurationError: corpus: contains no occurrence of `then` or `than`",
            &model.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_train_single_class() {
        let mut trainer = Trainer::new(2, 20).unwrap();
        push_all(&mut trainer, &["and/CC then/RB we/PPSS left/VBD"]);
        let model = trainer.train();

        assert!(model.is_err());
        assert_eq!(
            "ConfigurationError: corpus: contains no occurrence of `than`",
            &model.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_train_degenerate_features() {
        let mut trainer = Trainer::new(2, 20).unwrap();
        push_all(&mut trainer, &["then/RB", "than/IN"]);
        let model = trainer.train();

        assert!(model.is_err());
        assert_eq!(
            "ConfigurationError: corpus: no context tags were observed",
            &model.err().unwrap().to_string()
        );
    }

    #[test]
    fn test_train_oracle() {
        let mut trainer = Trainer::new(2, 20).unwrap().seed(42);
        for _ in 0..10 {
            push_all(
                &mut trainer,
                &[
                    "he/PPS ran/VBD and/CC then/RB left/VBD ./.",
                    "he/PPS was/BEDZ taller/JJR than/IN me/PPO ./.",
                ],
            );
        }
        let model = trainer.train().unwrap();

        let then_ctx = ContextWindow::extract(&["VBD", "CC", "RB", "VBD", "."], 2, 2).unwrap();
        let than_ctx = ContextWindow::extract(&["BEDZ", "JJR", "IN", "PPO", "."], 2, 2).unwrap();
        let p = model
            .classifier()
            .predict_proba(&model.schema().encode(&then_ctx).unwrap());
        assert!(p[TargetWord::Then.label()] > 0.5);
        let p = model
            .classifier()
            .predict_proba(&model.schema().encode(&than_ctx).unwrap());
        assert!(p[TargetWord::Than.label()] > 0.5);
    }

    #[test]
    fn test_train_is_reproducible() {
        let lines = [
            "and/CC then/RB we/PPSS left/VBD",
            "bigger/JJR than/IN that/DT",
            "older/JJR than/IN we/PPSS thought/VBD",
            ",/, then/RB that/DT happened/VBD",
        ];
        let mut a = Trainer::new(1, 5).unwrap().seed(9);
        let mut b = Trainer::new(1, 5).unwrap().seed(9);
        push_all(&mut a, &lines);
        push_all(&mut b, &lines);

        assert_eq!(a.train().unwrap(), b.train().unwrap());
    }

    #[test]
    fn test_train_without_bootstrap_ignores_seed() {
        let lines = ["and/CC then/RB we/PPSS left/VBD", "bigger/JJR than/IN that/DT"];
        let context = ContextWindow::extract(&["CC", "IN", "PPSS"], 1, 1).unwrap();
        for seed in 0..50 {
            let mut trainer = Trainer::new(1, 20).unwrap().bootstrap(false).seed(seed);
            push_all(&mut trainer, &lines);
            let model = trainer.train().unwrap();
            let x = model.schema().encode(&context).unwrap();

            assert_eq!([1., 0.], model.classifier().predict_proba(&x));
        }
    }

    #[cfg(feature = "liblinear")]
    #[test]
    fn test_train_logistic() {
        let mut trainer = Trainer::new(1, 1).unwrap();
        for _ in 0..10 {
            push_all(
                &mut trainer,
                &["and/CC then/RB we/PPSS", "bigger/JJR than/IN we/PPSS"],
            );
        }
        let model = trainer.train_logistic(0.01, 1.).unwrap();

        let ctx = ContextWindow::extract(&["CC", "IN", "PPSS"], 1, 1).unwrap();
        let p = model
            .classifier()
            .predict_proba(&model.schema().encode(&ctx).unwrap());
        assert!(p[TargetWord::Then.label()] > 0.5);
    }
}
