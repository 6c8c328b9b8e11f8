use std::fs::File;
use std::io::{prelude::*, stdin, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use thenthan::{Detector, Model, Outcome, TargetWord, UnigramTagger, WordTokenizer};

#[derive(Parser, Debug)]
#[command(about = "A program to detect then/than mix-ups in comments.")]
struct Args {
    /// The model file to use when checking comments
    #[arg(long)]
    model: PathBuf,

    /// The tagger file written by the training program
    #[arg(long)]
    tagger: PathBuf,

    /// A word whose predicted probability is below this value is flagged
    #[arg(long, default_value = "0.3")]
    confidence_level: f64,

    /// Number of threads (0 means the comments are checked on the main thread)
    #[arg(long, default_value = "0")]
    n_threads: usize,
}

fn report<W>(
    out: &mut W,
    outcomes: &[(TargetWord, Outcome)],
) -> Result<usize, Box<dyn std::error::Error>>
where
    W: Write,
{
    let mut n_flagged = 0;
    for (word, outcome) in outcomes {
        match outcome {
            Outcome::Evaluated(s) => match &s.replacement_text {
                Some(replacement) if s.flagged => {
                    writeln!(out, "You said '{}'.", s.context_text)?;
                    writeln!(out, "Did you mean '{replacement}'?")?;
                    n_flagged += 1;
                }
                _ => writeln!(out, "Commenter (probably) correctly used '{word}'")?,
            },
            Outcome::Failed(e) => writeln!(out, "Can't process '{word}' in this comment: {e}")?,
            Outcome::Absent => (),
        }
    }
    Ok(n_flagged)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Loading model file...");
    let mut f = zstd::Decoder::new(File::open(args.model)?)?;
    let model = Model::read(&mut f)?;
    eprintln!("Loading tagger file...");
    let mut f = zstd::Decoder::new(File::open(args.tagger)?)?;
    let tagger = UnigramTagger::read(&mut f)?;
    let detector = Detector::new(model, args.confidence_level)?;

    eprintln!("Start checking");
    let mut out = BufWriter::new(std::io::stdout().lock());
    let mut n_comments = 0;
    let mut n_flagged = 0;
    let start = Instant::now();
    if args.n_threads == 0 {
        for line in stdin().lock().lines() {
            let outcomes = detector.check_comment(&line?, &WordTokenizer, &tagger);
            n_flagged += report(&mut out, &outcomes)?;
            n_comments += 1;
        }
    } else {
        let detector = detector.multithreading(WordTokenizer, tagger, args.n_threads)?;
        let lines = stdin().lock().lines().collect::<Result<Vec<_>, _>>()?;
        for outcomes in detector.check_comments(lines)? {
            n_flagged += report(&mut out, &outcomes)?;
            n_comments += 1;
        }
    }
    out.flush()?;
    let duration = start.elapsed();
    eprintln!("# of comments: {n_comments}");
    eprintln!("# of flagged words: {n_flagged}");
    eprintln!("Elapsed: {} [sec]", duration.as_secs_f64());

    Ok(())
}
