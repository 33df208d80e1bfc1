//! # AATLib
//!
//! AATLib turns the miss rates of a cache simulator sweep into comparison charts
//!
//! It joins each result file with a CACTI timing table to derive average access time, collects
//! the values of one experiment into a matrix, and renders that matrix as a PNG line chart.
//!
//! Every input problem is fatal: a run either produces the complete chart or nothing

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Average access time formulas for one and two cache levels
pub mod aat;

/// The pipeline joining result files with the timing table
pub mod analysis;

/// PNG rendering of a series matrix
pub mod chart;

/// Analysis constants, loadable from JSON
pub mod config;

/// The error taxonomy shared by every stage
pub mod error;

/// The three sweeps, their variants and how each is presented
pub mod experiment;

/// Result file naming, reading and discovery
pub mod results;

/// The matrix of values plotted for one experiment
pub mod series;

/// The CACTI timing table and its lookups
pub mod timing;


/// Contains utilities for running tests and benchmarks.
pub mod util;

/// Sets up logging to stderr. `RUST_LOG` overrides the default level
pub fn init_logger(default_level: LevelFilter) {
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();
}
