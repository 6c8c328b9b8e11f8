#![cfg_attr(docsrs, feature(doc_cfg))]

//! # thenthan
//!
//! thenthan detects mix-ups of "then" and "than" from the part-of-speech tags around
//! the word.
//!
//! ## Examples
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{prelude::*, stdin, BufReader};
//!
//! use thenthan::{Detector, Model, UnigramTagger, WordTokenizer};
//!
//! let mut f = BufReader::new(File::open("model.bin").unwrap());
//! let model = Model::read(&mut f).unwrap();
//! let mut f = BufReader::new(File::open("tagger.bin").unwrap());
//! let tagger = UnigramTagger::read(&mut f).unwrap();
//! let detector = Detector::new(model, 0.3).unwrap();
//!
//! for line in stdin().lock().lines() {
//!     let line = line.unwrap();
//!     for (_, outcome) in detector.check_comment(&line, &WordTokenizer, &tagger) {
//!         if let Some(s) = outcome.flagged() {
//!             println!("{} -> {}", s.context_text, s.replacement_text.as_ref().unwrap());
//!         }
//!     }
//! }
//! ```
//!
//! Models are trained with [`Trainer`]. Logistic regression models require **crate feature**
//! `liblinear`.

pub mod errors;

mod classifier;
mod context;
mod detector;
mod feature;
mod forest;
mod linear;
mod model;
mod sentence;
mod tagger;
mod trainer;

pub use classifier::{Classifier, ProbabilisticClassifier};
pub use context::{column_name, window_range, ContextWindow, Slot, MAX_WINDOW_SIZE};
pub use detector::{Detector, Judgement, Outcome, Suggestion, DEFAULT_CONFIDENCE_LEVEL};
pub use feature::{FeatureColumn, FeatureSchema, FeatureVector, LABEL_COLUMN};
pub use forest::{DecisionTree, RandomForest};
pub use linear::LogisticModel;
pub use model::Model;
pub use sentence::{TaggedSentence, TaggedToken, TargetWord};
pub use tagger::{SuffixTagger, Tagger, Tokenizer, UnigramTagger, WordTokenizer};
pub use trainer::{LabeledExample, Trainer, DEFAULT_N_ESTIMATORS, DEFAULT_WINDOW_SIZE};

#[cfg(feature = "multithreading")]
pub use detector::MultithreadDetector;
