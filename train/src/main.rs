use std::fs::File;
use std::io::{prelude::*, stderr, BufReader};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thenthan::{TaggedSentence, TargetWord, Trainer, UnigramTagger};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Solver {
    /// Random forest
    Forest,

    /// L2-regularized logistic regression (requires the `liblinear` feature)
    Logistic,
}

#[derive(Parser, Debug)]
#[command(about = "A program to train then/than models.")]
struct Args {
    /// A POS-tagged training corpus (one sentence per line, `word/TAG` tokens)
    #[arg(long, required = true)]
    corpus: Vec<PathBuf>,

    /// The file to write the trained model to
    #[arg(long)]
    model: PathBuf,

    /// The file to write a unigram tagger learned from the corpus to
    #[arg(long)]
    tagger: Option<PathBuf>,

    /// The number of tags taken on each side of the target word
    #[arg(long, default_value = "2")]
    window: u8,

    /// The number of trees in the forest
    #[arg(long, default_value = "20")]
    n_estimators: usize,

    /// Train every tree on the full dataset instead of a bootstrap sample
    #[arg(long)]
    no_bootstrap: bool,

    /// The seed of the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// The classifier to train
    #[arg(long, value_enum, default_value = "forest")]
    solver: Solver,

    /// The epsilon stopping criterion for the logistic solver
    #[arg(long, default_value = "0.01")]
    eps: f64,

    /// The cost hyperparameter for the logistic solver
    #[arg(long, default_value = "1.0")]
    cost: f64,

    /// The number of workers for zstd (0 means multithreaded will be disabled)
    #[arg(long, default_value = "0")]
    zstd_workers: u32,
}

#[cfg(feature = "liblinear")]
fn train_logistic(
    trainer: Trainer,
    eps: f64,
    cost: f64,
) -> thenthan::errors::Result<thenthan::Model> {
    trainer.train_logistic(eps, cost)
}

#[cfg(not(feature = "liblinear"))]
fn train_logistic(
    _trainer: Trainer,
    _eps: f64,
    _cost: f64,
) -> Result<thenthan::Model, Box<dyn std::error::Error>> {
    Err("the logistic solver requires the `liblinear` feature".into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Loading dataset...");
    let mut train_sents = vec![];
    for path in args.corpus {
        eprintln!("Loading {path:?} ...");
        let f = File::open(path)?;
        let f = BufReader::new(f);
        for (i, line) in f.lines().enumerate() {
            if i % 10000 == 0 {
                eprint!("# of sentences: {i}\r");
                stderr().flush()?;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            train_sents.push(TaggedSentence::from_tagged(&line)?);
        }
        eprintln!("# of sentences: {}", train_sents.len());
    }

    if let Some(path) = args.tagger {
        eprintln!("Training tagger...");
        let tagger = UnigramTagger::train(&train_sents);
        eprintln!("# of words: {}", tagger.n_words());
        let mut f = zstd::Encoder::new(File::create(path)?, 19)?;
        tagger.write(&mut f)?;
        f.finish()?;
    }

    eprintln!("Extracting examples...");
    let mut trainer = Trainer::new(args.window, args.n_estimators)?.bootstrap(!args.no_bootstrap);
    if let Some(seed) = args.seed {
        trainer = trainer.seed(seed);
    }
    for (i, s) in train_sents.iter().enumerate() {
        if i % 10000 == 0 {
            eprint!("# of examples: {}\r", trainer.examples().len());
            stderr().flush()?;
        }
        trainer.push_sentence(s)?;
    }
    eprintln!("# of examples: {}", trainer.examples().len());
    for word in TargetWord::ALL {
        eprintln!("  {word}: {}", trainer.n_examples(word));
    }

    eprintln!("Start training...");
    let model = match args.solver {
        Solver::Forest => trainer.train()?,
        Solver::Logistic => train_logistic(trainer, args.eps, args.cost)?,
    };
    eprintln!("Finish training.");
    eprintln!("# of features: {}", model.schema().len());

    let mut f = zstd::Encoder::new(File::create(args.model)?, 19)?;
    f.multithread(args.zstd_workers)?;
    model.write(&mut f)?;
    f.finish()?;

    Ok(())
}
