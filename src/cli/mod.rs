use clap::{Parser, Subcommand};

pub mod apply;

#[derive(Debug, Parser)]
#[command(name = "snapfix")]
#[command(version)]
#[command(about = "Rewrite failing test assertions with their observed values")]
#[command(
    long_about = "Reads fix requests collected from a failing test run and rewrites each expect(subject, label[, expected]) call with the value that was actually observed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Apply a batch of fix requests to test files")]
    Apply(apply::ApplyArgs),
}
