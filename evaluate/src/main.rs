use std::fs::File;
use std::io::{prelude::*, stderr, stdin};
use std::path::PathBuf;

use clap::Parser;
use thenthan::errors::ThenThanError;
use thenthan::{Detector, LabeledExample, Model, TaggedSentence, TargetWord};

#[derive(Parser, Debug)]
#[command(about = "A program to evaluate the accuracy of then/than models.")]
struct Args {
    /// The model file to evaluate
    #[arg(long)]
    model: PathBuf,

    /// A word whose predicted probability is below this value is counted as flagged
    #[arg(long, default_value = "0.3")]
    confidence_level: f64,
}

#[derive(Default)]
struct Scores {
    // confusion[reference][predicted]
    confusion: [[usize; 2]; 2],
    n_flagged: usize,
    n_skipped: usize,
}

impl Scores {
    fn add(&mut self, reference: TargetWord, probabilities: [f64; 2], flagged: bool) {
        let predicted = if probabilities[0] >= probabilities[1] {
            TargetWord::Then
        } else {
            TargetWord::Than
        };
        self.confusion[reference.label()][predicted.label()] += 1;
        if flagged {
            self.n_flagged += 1;
        }
    }

    fn n_total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    fn accuracy(&self) -> Option<f64> {
        let n_total = self.n_total();
        let n_correct = self.confusion[0][0] + self.confusion[1][1];
        (n_total != 0).then(|| n_correct as f64 / n_total as f64)
    }

    fn false_alarm_rate(&self) -> Option<f64> {
        let n_total = self.n_total();
        (n_total != 0).then(|| self.n_flagged as f64 / n_total as f64)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Loading model file...");
    let mut f = zstd::Decoder::new(File::open(args.model)?)?;
    let model = Model::read(&mut f)?;
    let window_size = model.window_size();
    let detector = Detector::new(model, args.confidence_level)?;

    eprintln!("Start evaluation");

    let mut scores = Scores::default();
    for (i, line) in stdin().lock().lines().enumerate() {
        if i % 10000 == 0 {
            eprint!("# of sentences: {i}\r");
            stderr().flush()?;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let s = TaggedSentence::from_tagged(&line)?;
        for example in LabeledExample::extract_all(&s, window_size)? {
            match detector.evaluate(example.word(), example.context()) {
                Ok(j) => scores.add(
                    example.word(),
                    [
                        j.probability(TargetWord::Then),
                        j.probability(TargetWord::Than),
                    ],
                    j.flagged(),
                ),
                Err(ThenThanError::UnknownTag(_)) => scores.n_skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    let (Some(accuracy), Some(false_alarm_rate)) = (scores.accuracy(), scores.false_alarm_rate())
    else {
        return Err(format!(
            "no `then` or `than` could be evaluated ({} skipped)",
            scores.n_skipped
        )
        .into());
    };
    println!("Accuracy: {accuracy}");
    println!("False alarm rate: {false_alarm_rate}");
    println!(
        "# of examples: {}, # of skipped: {}",
        scores.n_total(),
        scores.n_skipped
    );
    println!("reference \\ predicted\tthen\tthan");
    for word in TargetWord::ALL {
        let row = scores.confusion[word.label()];
        println!("{word}\t{}\t{}", row[0], row[1]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_empty() {
        let scores = Scores {
            n_skipped: 3,
            ..Scores::default()
        };

        assert_eq!(0, scores.n_total());
        assert_eq!(None, scores.accuracy());
        assert_eq!(None, scores.false_alarm_rate());
    }

    #[test]
    fn test_scores() {
        let mut scores = Scores::default();
        scores.add(TargetWord::Then, [0.9, 0.1], false);
        scores.add(TargetWord::Than, [0.2, 0.8], false);
        scores.add(TargetWord::Than, [0.8, 0.2], true);
        scores.add(TargetWord::Then, [0.5, 0.5], false);

        assert_eq!([[2, 0], [1, 1]], scores.confusion);
        assert_eq!(Some(0.75), scores.accuracy());
        assert_eq!(Some(0.25), scores.false_alarm_rate());
    }
}
