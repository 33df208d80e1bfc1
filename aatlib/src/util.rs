use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{AnalysisError, Result};
use crate::experiment::Experiment;
use crate::results::ResultKey;
use crate::timing::TimingTable;

const BLOCK_SIZE: u64 = 32;
const TABLE_FILE: &str = "cacti_table.csv";

/// A synthetic results tree and timing table, shaped like a real sweep
///
/// The table covers 1KiB to 1MiB caches with 32 byte blocks at 1, 2, 4 and 8 ways and fully
/// associative, minus the 8-way 1KiB row which CACTI doesn't produce. Every result file of all
/// three experiments is written, including the 8-way 1KiB one
pub struct Fixture {
    pub table_path: PathBuf,
    pub table: TimingTable,
}

impl Fixture {
    /// Writes the fixture under `root` and loads the table back
    pub fn write(root: &Path) -> Result<Self> {
        let table_path = root.join(TABLE_FILE);
        write_file(&table_path, &Self::table_csv())?;
        for experiment in [Experiment::Associativity, Experiment::Replacement, Experiment::Inclusion] {
            let directory = root.join(experiment.directory());
            fs::create_dir_all(&directory).map_err(|source| AnalysisError::Io { path: directory.clone(), source })?;
            for exponent in experiment.size_exponents() {
                let size = 1u64 << exponent;
                for (column, variant) in experiment.variants().iter().enumerate() {
                    let key = ResultKey::new(experiment, variant.file_value(size, BLOCK_SIZE), size);
                    let line = match experiment {
                        Experiment::Inclusion => format!("{} {}\n", Self::miss_rate(column, exponent), Self::l2_miss_rate(column, exponent)),
                        _ => format!("{}\n", Self::miss_rate(column, exponent)),
                    };
                    write_file(&key.path(root), &line)?;
                }
            }
        }
        let table = TimingTable::from_path(&table_path)?;
        Ok(Self { table_path, table })
    }

    /// L1 miss rate written for a column at a swept size. Falls with size and with the column
    pub fn miss_rate(column: usize, exponent: u32) -> f64 {
        0.4 / (exponent as f64 - 7.0) * (1.0 - 0.1 * column as f64)
    }

    pub fn l2_miss_rate(column: usize, exponent: u32) -> f64 {
        0.5 / (exponent as f64 - 9.0) * (1.0 - 0.2 * column as f64)
    }

    /// Timing table in the CACTI export layout. Fully associative rows alternate between `FA` and
    /// ` FA`, as real exports do
    pub fn table_csv() -> String {
        let mut csv = String::from("Cache Size(bytes), Block Size(bytes), Associativity, Access Time(ns)\n");
        for exponent in 10..=20u32 {
            let size = 1u64 << exponent;
            for (index, ways) in [1u64, 2, 4, 8].into_iter().enumerate() {
                if size == 1024 && ways == 8 {
                    continue;
                }
                let _ = writeln!(csv, "{size}, {BLOCK_SIZE}, {ways}, {:.4}", Self::access_time(exponent, index));
            }
            let sentinel = if exponent % 2 == 0 { "FA" } else { " FA" };
            let _ = writeln!(csv, "{size}, {BLOCK_SIZE},{sentinel}, {:.4}", Self::access_time(exponent, 4));
        }
        csv
    }

    fn access_time(exponent: u32, index: usize) -> f64 {
        0.5 + 0.1 * exponent as f64 + 0.05 * index as f64
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| AnalysisError::Io { path: path.to_path_buf(), source })
}
