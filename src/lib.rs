pub mod config;
pub mod distance;
pub mod evaluate;
pub mod fasta;
pub mod merge;
pub mod otu;
pub mod pool;
pub mod stats;
pub mod table;

use anyhow::Result;
use clap::{builder::PossibleValue, Parser, ValueEnum};
use log::info;
use std::{path::PathBuf, time::Instant};

use crate::{
    config::Config,
    fasta::read_fasta,
    merge::merge_otus,
    otu::build_observations,
    pool::EvaluationPool,
    table::{read_otu_table, write_outputs},
};

/// Distribution-based OTU merging
#[derive(Debug, Parser)]
#[command(author, version, about, disable_version_flag = true)]
pub struct Args {
    /// Input OTU count table (BIOM TSV)
    #[arg(
        short = 'c',
        long,
        alias = "input_otu_table",
        value_name = "COUNTS"
    )]
    pub input_otu_table: PathBuf,

    /// FASTA file of representative OTU sequences
    #[arg(short = 'f', long, alias = "input_fasta", value_name = "FASTA")]
    pub input_fasta: PathBuf,

    /// Output merged OTU count table
    #[arg(
        short = 'o',
        long,
        alias = "output_otu_table",
        value_name = "OUTPUT"
    )]
    pub output_otu_table: PathBuf,

    /// Output membership file
    #[arg(
        short = 'm',
        long,
        alias = "output_membership",
        value_name = "MEMBERSHIP"
    )]
    pub output_membership: PathBuf,

    /// Maximum sequence distance for merging [default: 0.1]
    #[arg(short, long, value_name = "FLOAT")]
    pub distance: Option<f64>,

    /// Minimum fold abundance for merging [default: 10.0]
    #[arg(short, long, value_name = "FLOAT")]
    pub abundance: Option<f64>,

    /// Maximum p value for merging [default: 0.0005]
    #[arg(short, long, value_name = "FLOAT")]
    pub pvalue: Option<f64>,

    /// Number of threads to use [default: 1]
    #[arg(short, long, value_name = "THREADS")]
    pub threads: Option<usize>,

    /// TOML file with distance/abundance/pvalue/threads
    #[arg(long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long)]
    pub log: Option<LogLevel>,

    /// Log file, default is STDERR
    #[arg(long, value_name = "LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum LogLevel {
    Info,
    Debug,
    Trace,
}

impl ValueEnum for LogLevel {
    fn value_variants<'a>() -> &'a [Self] {
        &[LogLevel::Info, LogLevel::Debug, LogLevel::Trace]
    }

    fn to_possible_value<'a>(&self) -> Option<PossibleValue> {
        Some(match self {
            LogLevel::Info => PossibleValue::new("info"),
            LogLevel::Debug => PossibleValue::new("debug"),
            LogLevel::Trace => PossibleValue::new("trace"),
        })
    }
}

// --------------------------------------------------
pub fn run(args: Args) -> Result<()> {
    let start = Instant::now();
    let config = Config::from_args(&args)?;
    config.validate(num_cpus::get())?;
    info!("config = {config:#?}");

    let table = read_otu_table(&args.input_otu_table)?;
    info!(
        r#"Read {} OTUs across {} samples from "{}""#,
        table.otu_names.len(),
        table.sample_names.len(),
        args.input_otu_table.display()
    );

    let sequences = read_fasta(&args.input_fasta)?;

    let observations = build_observations(&table, &sequences)?;
    let pool = EvaluationPool::new(config.threads)?;
    info!("Merging with {} threads", pool.num_threads());
    let clusters = merge_otus(&observations, &config.thresholds, &pool)?;

    write_outputs(
        &args.output_otu_table,
        &args.output_membership,
        &table,
        &clusters,
    )?;

    info!(
        r#"Finished in {} seconds, see "{}" and "{}""#,
        start.elapsed().as_secs(),
        args.output_otu_table.display(),
        args.output_membership.display()
    );

    Ok(())
}
