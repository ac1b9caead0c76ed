use anyhow::{Context, Result};
use clap::Parser;
use image_class_data::{collect, CollectConfig, DataSource, Split};
use itertools::Itertools;
use prettytable::{cell, row, Table};
use std::{env, path::PathBuf};
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
/// Inspect zipped image classification datasets
enum Opts {
    /// Collect the dataset and print its summary
    Info {
        /// configuration file
        config_file: PathBuf,
        /// print the summary as JSON
        #[clap(long)]
        json: bool,
    },
    /// Collect the dataset and read it batch by batch
    Iterate {
        /// configuration file
        config_file: PathBuf,
        /// the split to read, 'train' or 'test'
        #[clap(long, default_value = "train")]
        split: Split,
        #[clap(long, default_value = "32")]
        batch_size: usize,
        /// stop after this many batches
        #[clap(long)]
        max_batches: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Opts::parse() {
        Opts::Info { config_file, json } => {
            let source = load(config_file).await?;
            info(&source, json)?;
        }
        Opts::Iterate {
            config_file,
            split,
            batch_size,
            max_batches,
        } => {
            let source = load(config_file).await?;
            iterate(&source, split, batch_size, max_batches)
                .instrument(info_span!("iterate"))
                .await?;
        }
    }

    Ok(())
}

async fn load(config_file: PathBuf) -> Result<DataSource> {
    let config = CollectConfig::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    collect(config).instrument(info_span!("collect")).await
}

fn info(source: &DataSource, json: bool) -> Result<()> {
    let meta = source.meta();

    if json {
        println!("{}", serde_json::to_string_pretty(meta)?);
        return Ok(());
    }

    // print summary
    {
        let mut table = Table::new();
        table.add_row(row!["train images", meta.size.train]);
        table.add_row(row!["test images", meta.size.test]);
        table.add_row(row![
            "dimension",
            format!(
                "{}x{}x{}",
                meta.dimension.x, meta.dimension.y, meta.dimension.z
            )
        ]);
        table.printstd();
    }

    // print label map with per-split counts
    {
        let train_counts = source.train().entries().iter().counts_by(|entry| entry.label);
        let test_counts = source.test().entries().iter().counts_by(|entry| entry.label);

        let mut table = Table::new();
        table.add_row(row!["label", "category", "train", "test"]);
        meta.label_map.iter().enumerate().for_each(|(label, name)| {
            table.add_row(row![
                label,
                name,
                train_counts.get(&label).copied().unwrap_or(0),
                test_counts.get(&label).copied().unwrap_or(0),
            ]);
        });
        table.printstd();
    }

    Ok(())
}

async fn iterate(
    source: &DataSource,
    split: Split,
    batch_size: usize,
    max_batches: Option<usize>,
) -> Result<()> {
    let cursor = source.split(split);
    let label_map = source.label_map();
    let mut num_batches = 0;
    let mut num_samples = 0;

    while max_batches.map_or(true, |max| num_batches < max) {
        let batch = cursor.next_batch(batch_size).await?;
        let samples: Vec<_> = batch.into_iter().flatten().collect();
        if samples.is_empty() {
            break;
        }

        let histogram = samples
            .iter()
            .counts_by(|sample| sample.label)
            .into_iter()
            .sorted()
            .map(|(label, count)| {
                let name = label_map.name_of(label).unwrap_or("?");
                format!("{}={}", name, count)
            })
            .join(" ");
        println!("batch {}: {}", num_batches, histogram);

        num_batches += 1;
        num_samples += samples.len();
    }

    info!(
        "read {} samples in {} batches from {} split",
        num_samples, num_batches, split
    );
    Ok(())
}
