use std::fs;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use thenthan::{Classifier, Model};

#[derive(Parser, Debug)]
#[command(about = "A program to inspect trained then/than models.")]
struct Args {
    /// Input path of the model file
    #[arg(long)]
    model_in: PathBuf,

    /// Output the feature columns and their importances, most important first.
    #[arg(long)]
    dump_features: Option<PathBuf>,
}

#[derive(Serialize)]
struct FeatureRecord<'a> {
    column: String,
    offset: i8,
    tag: &'a str,
    importance: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Loading model file...");
    let mut f = zstd::Decoder::new(fs::File::open(args.model_in)?)?;
    let model = Model::read(&mut f)?;

    let schema = model.schema();
    match model.classifier() {
        Classifier::RandomForest(forest) => {
            let n_nodes: usize = forest.trees().iter().map(|t| t.n_nodes()).sum();
            let n_leaves: usize = forest.trees().iter().map(|t| t.n_leaves()).sum();
            eprintln!("Classifier: random forest");
            eprintln!("# of trees: {}", forest.trees().len());
            eprintln!("# of nodes: {n_nodes}");
            eprintln!("# of leaves: {n_leaves}");
        }
        Classifier::Logistic(_) => eprintln!("Classifier: logistic regression"),
    }
    eprintln!("Window size: {}", model.window_size());
    eprintln!("# of features: {}", schema.len());

    if let Some(path) = args.dump_features {
        eprintln!("Saving feature file...");
        let mut records: Vec<_> = schema
            .columns()
            .iter()
            .zip(model.classifier().feature_importances())
            .map(|(col, importance)| FeatureRecord {
                column: col.name(),
                offset: col.offset(),
                tag: col.tag(),
                importance,
            })
            .collect();
        records.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        let file = fs::File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
    }

    Ok(())
}
