#[cfg(feature = "multithreading")]
use std::sync::Arc;
#[cfg(feature = "multithreading")]
use std::thread;

#[cfg(feature = "multithreading")]
use crossbeam_channel::{Receiver, Sender};

use crate::classifier::ProbabilisticClassifier;
use crate::context::{window_range, ContextWindow};
use crate::errors::{Result, ThenThanError};
use crate::model::Model;
use crate::sentence::TargetWord;
use crate::tagger::{Tagger, Tokenizer};

/// Default confidence level.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.3;

/// Classifier output for one occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgement {
    word: TargetWord,
    probabilities: [f64; 2],
    flagged: bool,
}

impl Judgement {
    /// Gets the word that was written.
    pub const fn word(&self) -> TargetWord {
        self.word
    }

    /// Gets the predicted probability of a word.
    pub const fn probability(&self, word: TargetWord) -> f64 {
        self.probabilities[word.label()]
    }

    /// Gets the predicted probability of the word that was written.
    pub const fn confidence(&self) -> f64 {
        self.probability(self.word)
    }

    /// Returns `true` if the written word is likely wrong.
    pub const fn flagged(&self) -> bool {
        self.flagged
    }

    /// Gets the replacement for a flagged word.
    pub const fn suggestion(&self) -> Option<TargetWord> {
        if self.flagged {
            Some(self.word.other())
        } else {
            None
        }
    }
}

/// Result record for one evaluated occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The word that was written.
    pub original_word: TargetWord,

    /// The tokens around the word, joined by spaces.
    pub context_text: String,

    /// The context with the other word substituted, if the word was flagged.
    pub replacement_text: Option<String>,

    /// Whether the written word is likely wrong.
    pub flagged: bool,

    /// Predicted probability of the written word.
    pub confidence: f64,
}

/// Outcome of checking one target word in a comment.
#[derive(Debug)]
pub enum Outcome {
    /// The first occurrence was classified.
    Evaluated(Suggestion),

    /// The word does not occur in the comment.
    Absent,

    /// The occurrence could not be classified, e.g. because of an unknown tag.
    Failed(ThenThanError),
}

impl Outcome {
    /// Gets the suggestion if the word was evaluated and flagged.
    pub fn flagged(&self) -> Option<&Suggestion> {
        match self {
            Self::Evaluated(s) if s.flagged => Some(s),
            _ => None,
        }
    }
}

/// Detector of then/than mix-ups.
///
/// # Examples
///
/// ```
/// use thenthan::{
///     Detector, Outcome, TaggedSentence, TargetWord, Trainer, UnigramTagger, WordTokenizer,
/// };
///
/// let corpus = vec![
///     TaggedSentence::from_tagged("and/CC then/RB we/PPSS left/VBD").unwrap(),
///     TaggedSentence::from_tagged("bigger/JJR than/IN that/DT").unwrap(),
/// ];
/// let mut trainer = Trainer::new(1, 20).unwrap().bootstrap(false);
/// for s in &corpus {
///     trainer.push_sentence(s).unwrap();
/// }
/// let detector = Detector::new(trainer.train().unwrap(), 0.3).unwrap();
/// let tagger = UnigramTagger::train(&corpus);
///
/// let results = detector.check_comment("and than we left", &WordTokenizer, &tagger);
/// let (word, outcome) = &results[1];
/// assert_eq!(TargetWord::Than, *word);
/// let suggestion = outcome.flagged().unwrap();
/// assert_eq!(Some("and then we"), suggestion.replacement_text.as_deref());
/// ```
pub struct Detector {
    model: Model,
    confidence_level: f64,
}

impl Detector {
    /// Creates a new detector.
    ///
    /// # Arguments
    ///
    /// * `model` - A trained model.
    /// * `confidence_level` - A written word whose predicted probability is below this value
    ///   is flagged.
    ///
    /// # Errors
    ///
    /// If `confidence_level` is not in the open interval (0, 1), an error variant will be
    /// returned.
    pub fn new(model: Model, confidence_level: f64) -> Result<Self> {
        if !(confidence_level > 0. && confidence_level < 1.) {
            return Err(ThenThanError::configuration(
                "confidence_level",
                "must be in (0, 1)",
            ));
        }
        Ok(Self {
            model,
            confidence_level,
        })
    }

    /// Gets the model.
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Gets the confidence level.
    pub const fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Classifies one occurrence.
    ///
    /// # Arguments
    ///
    /// * `word` - The word that was written.
    /// * `context` - Its context window.
    ///
    /// # Returns
    ///
    /// The predicted probabilities and whether `word` is flagged.
    ///
    /// # Errors
    ///
    /// * [`ThenThanError::UnknownTag`] if the context has a tag the model never saw at
    ///   that slot.
    /// * [`ThenThanError::Configuration`] if the context was extracted with a window size
    ///   other than the model's.
    pub fn evaluate(&self, word: TargetWord, context: &ContextWindow) -> Result<Judgement> {
        let x = self.model.schema.encode(context)?;
        let probabilities = self.model.classifier.predict_proba(&x);
        let flagged = probabilities[word.label()] < self.confidence_level;
        Ok(Judgement {
            word,
            probabilities,
            flagged,
        })
    }

    /// Checks the first occurrence of `word` in a tokenized comment.
    ///
    /// Only the tokens inside the window are passed to `tagger`.
    pub fn check_tokens<G>(&self, word: TargetWord, tokens: &[&str], tagger: &G) -> Outcome
    where
        G: Tagger + ?Sized,
    {
        let Some(index) = word.find(tokens) else {
            return Outcome::Absent;
        };
        match self.check_occurrence(word, tokens, index, tagger) {
            Ok(suggestion) => Outcome::Evaluated(suggestion),
            Err(e) => Outcome::Failed(e),
        }
    }

    fn check_occurrence<G>(
        &self,
        word: TargetWord,
        tokens: &[&str],
        index: usize,
        tagger: &G,
    ) -> Result<Suggestion>
    where
        G: Tagger + ?Sized,
    {
        let window_size = self.model.window_size();
        let range = window_range(tokens.len(), index, window_size);
        let rel_index = index - range.start;
        let words = &tokens[range];
        let tags = tagger.tag(words);
        if tags.len() != words.len() {
            return Err(ThenThanError::invalid_format(format!(
                "the tagger returned {} tags for {} tokens",
                tags.len(),
                words.len()
            )));
        }
        let context = ContextWindow::extract(&tags[..], rel_index, window_size)?;
        let judgement = self.evaluate(word, &context)?;
        let replacement_text = judgement.suggestion().map(|other| {
            let mut replaced = words.to_vec();
            replaced[rel_index] = other.as_str();
            replaced.join(" ")
        });
        Ok(Suggestion {
            original_word: word,
            context_text: words.join(" "),
            replacement_text,
            flagged: judgement.flagged(),
            confidence: judgement.confidence(),
        })
    }

    /// Checks a comment for both target words.
    ///
    /// Only the first occurrence of each word is evaluated. A failure on one word does
    /// not affect the other.
    ///
    /// # Returns
    ///
    /// One outcome per target word, "then" first.
    pub fn check_comment<T, G>(
        &self,
        text: &str,
        tokenizer: &T,
        tagger: &G,
    ) -> Vec<(TargetWord, Outcome)>
    where
        T: Tokenizer + ?Sized,
        G: Tagger + ?Sized,
    {
        let tokens = tokenizer.tokenize(text);
        TargetWord::ALL
            .into_iter()
            .map(|word| (word, self.check_tokens(word, &tokens, tagger)))
            .collect()
    }

    /// Creates a multithreading detector. This function is the alias of
    /// [`MultithreadDetector::new()`].
    ///
    /// # Errors
    ///
    /// If `n_threads` is 0, an error variant will be returned.
    #[cfg(feature = "multithreading")]
    #[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
    pub fn multithreading<T, G>(
        self,
        tokenizer: T,
        tagger: G,
        n_threads: usize,
    ) -> Result<MultithreadDetector>
    where
        T: Tokenizer + Send + Sync + 'static,
        G: Tagger + Send + Sync + 'static,
    {
        MultithreadDetector::new(self, tokenizer, tagger, n_threads)
    }
}

#[cfg(feature = "multithreading")]
type CommentResult = (usize, Vec<(TargetWord, Outcome)>);

/// Detector that checks comments on worker threads.
#[cfg(feature = "multithreading")]
#[cfg_attr(docsrs, doc(cfg(feature = "multithreading")))]
pub struct MultithreadDetector {
    task_tx: Sender<(usize, String)>,
    result_rx: Receiver<CommentResult>,
}

#[cfg(feature = "multithreading")]
impl MultithreadDetector {
    /// Creates a multithreading detector.
    ///
    /// # Arguments
    ///
    /// * `detector` - A normal detector.
    /// * `tokenizer` - Tokenizer shared by the workers.
    /// * `tagger` - Tagger shared by the workers.
    /// * `n_threads` - The number of threads.
    ///
    /// # Errors
    ///
    /// If `n_threads` is 0, an error variant will be returned.
    pub fn new<T, G>(detector: Detector, tokenizer: T, tagger: G, n_threads: usize) -> Result<Self>
    where
        T: Tokenizer + Send + Sync + 'static,
        G: Tagger + Send + Sync + 'static,
    {
        if n_threads == 0 {
            return Err(ThenThanError::configuration(
                "n_threads",
                "must be at least 1",
            ));
        }
        let detector = Arc::new(detector);
        let tokenizer = Arc::new(tokenizer);
        let tagger = Arc::new(tagger);

        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<(usize, String)>();
        for _ in 0..n_threads {
            let detector = Arc::clone(&detector);
            let tokenizer = Arc::clone(&tokenizer);
            let tagger = Arc::clone(&tagger);
            let result_tx = result_tx.clone();
            let task_rx = task_rx.clone();
            thread::spawn(move || {
                for (i, text) in task_rx {
                    let outcomes = detector.check_comment(&text, &*tokenizer, &*tagger);
                    if result_tx.send((i, outcomes)).is_err() {
                        break;
                    }
                }
            });
        }

        Ok(Self { task_tx, result_rx })
    }

    /// Checks comments in parallel.
    ///
    /// # Returns
    ///
    /// The outcomes of each comment, in input order.
    ///
    /// # Errors
    ///
    /// If the worker threads have terminated, an error variant will be returned.
    pub fn check_comments<I, S>(&self, comments: I) -> Result<Vec<Vec<(TargetWord, Outcome)>>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut n_comments = 0;
        for (i, text) in comments.into_iter().enumerate() {
            self.task_tx
                .send((i, text.into()))
                .map_err(|_| worker_terminated())?;
            n_comments += 1;
        }
        let mut results: Vec<Option<Vec<(TargetWord, Outcome)>>> =
            (0..n_comments).map(|_| None).collect();
        for _ in 0..n_comments {
            let (i, outcomes) = self.result_rx.recv().map_err(|_| worker_terminated())?;
            results[i] = Some(outcomes);
        }
        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(feature = "multithreading")]
fn worker_terminated() -> ThenThanError {
    ThenThanError::IOError(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "worker threads terminated",
    ))
}
