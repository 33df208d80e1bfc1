use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use crate::aat;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::experiment::{Experiment, Metric, Variant};
use crate::results::{read_miss_rates, ResultKey};
use crate::series::SeriesMatrix;
use crate::timing::{Associativity, TimingTable};

/// The analysis joins the result files of one experiment with the timing table and collects the
/// values to plot.
///
/// Every cell is computed before anything is returned, so a missing or malformed input fails the
/// whole run and no partial matrix is ever produced
pub struct Analysis<'a> {
    experiment: Experiment,
    metric: Metric,
    config: &'a AnalysisConfig,
    table: &'a TimingTable,
    execution_time: Duration,
}

impl<'a> Analysis<'a> {
    /// Creates a new analysis for an experiment
    ///
    /// # Arguments
    ///
    /// * `experiment`: The sweep to analyse
    /// * `average_access_time`: Plot AAT instead of the L1 miss rate. Only the associativity sweep
    /// honours this, the other sweeps always plot AAT
    /// * `config`: Analysis constants
    /// * `table`: The loaded timing table
    ///
    /// returns: Analysis
    pub fn new(experiment: Experiment, average_access_time: bool, config: &'a AnalysisConfig, table: &'a TimingTable) -> Self {
        let metric = experiment.metric(average_access_time);
        if metric == Metric::AverageAccessTime && !average_access_time {
            debug!(%experiment, "This experiment always plots average access time");
        }
        Self {
            experiment,
            metric,
            config,
            table,
            execution_time: Duration::new(0, 0),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn experiment(&self) -> Experiment {
        self.experiment
    }

    /// Every result file the sweep reads, row by row. Known gaps are not read
    pub fn expected_results(&self) -> Vec<ResultKey> {
        let mut keys = Vec::new();
        for exponent in self.experiment.size_exponents() {
            let size = 1u64 << exponent;
            for variant in self.experiment.variants() {
                if !self.experiment.is_known_gap(self.metric, variant, size, self.config) {
                    keys.push(self.result_key(variant, size));
                }
            }
        }
        keys
    }

    /// Result files present in the results directory which the sweep doesn't use
    pub fn unused_results(&self, present: &[ResultKey]) -> Vec<ResultKey> {
        let expected: HashSet<ResultKey> = self.expected_results().into_iter().collect();
        present.iter().filter(|key| !expected.contains(key)).copied().collect()
    }

    /// Reads every result file and builds the matrix
    ///
    /// May be called more than once; the execution time accumulates across calls
    ///
    /// # Arguments
    ///
    /// * `root`: The results root, containing the `exp1`, `exp2` and `exp3` directories
    ///
    /// returns: Result<SeriesMatrix, AnalysisError>
    pub fn build(&mut self, root: &Path) -> Result<SeriesMatrix> {
        let start = Instant::now();
        let columns = self.experiment.variants().iter().map(|v| v.label().to_string()).collect();
        let mut matrix = SeriesMatrix::new(self.experiment, self.metric, columns);
        // The inclusion sweep keeps L1 fixed, so its hit time is shared by every cell
        let fixed_l1_hit_time = match self.experiment {
            Experiment::Inclusion => Some(self.hit_time(
                "L1",
                self.config.inclusion_l1_size,
                Associativity::Ways(self.config.l1_associativity),
            )?),
            _ => None,
        };
        for exponent in self.experiment.size_exponents() {
            let size = 1u64 << exponent;
            let row = self
                .experiment
                .variants()
                .iter()
                .map(|variant| self.cell(root, variant, size, fixed_l1_hit_time))
                .collect::<Result<Vec<_>>>()?;
            matrix.push_row(exponent, row);
        }
        self.execution_time += start.elapsed();
        info!(
            experiment = %self.experiment,
            metric = ?self.metric,
            rows = matrix.row_count(),
            columns = matrix.column_count(),
            "Built series matrix"
        );
        Ok(matrix)
    }

    /// Gets the wall-clock time spent building matrices
    pub fn get_execution_time(&self) -> &Duration {
        &self.execution_time
    }

    fn result_key(&self, variant: &Variant, size: u64) -> ResultKey {
        ResultKey::new(self.experiment, variant.file_value(size, self.config.block_size), size)
    }

    fn cell(&self, root: &Path, variant: &Variant, size: u64, fixed_l1_hit_time: Option<f64>) -> Result<Option<f64>> {
        if self.experiment.is_known_gap(self.metric, variant, size, self.config) {
            debug!(%variant, size, "No timing data, leaving the cell empty");
            return Ok(None);
        }
        let path = self.result_key(variant, size).path(root);
        let rates = read_miss_rates(&path, self.experiment.miss_rates_per_file())?;
        let value = match (self.metric, fixed_l1_hit_time) {
            (Metric::MissRate, _) => rates[0],
            (Metric::AverageAccessTime, None) => {
                let associativity = match variant {
                    Variant::Associativity(associativity) => *associativity,
                    _ => Associativity::Ways(self.config.l1_associativity),
                };
                let l1_hit_time = self.hit_time(variant.label(), size, associativity)?;
                aat::single_level(l1_hit_time, rates[0], self.config.miss_penalty_ns)
            }
            (Metric::AverageAccessTime, Some(l1_hit_time)) => {
                let l2_hit_time = self.hit_time(variant.label(), size, Associativity::Ways(self.config.l2_associativity))?;
                aat::two_level(l1_hit_time, rates[0], l2_hit_time, rates[1], self.config.miss_penalty_ns)
            }
        };
        debug!(path = %path.display(), ?rates, value, "Read result");
        Ok(Some(value))
    }

    // `cache` names what was looked up in errors: a variant's label, or the fixed L1
    fn hit_time(&self, cache: &str, size: u64, associativity: Associativity) -> Result<f64> {
        self.table
            .lookup(size, self.config.block_size, associativity)
            .map_err(|source| AnalysisError::Lookup { variant: cache.to_string(), size, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::util::Fixture;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn matrix_shapes_match_the_sweeps() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        for (experiment, rows, columns) in [
            (Experiment::Associativity, 11, 5),
            (Experiment::Replacement, 9, 3),
            (Experiment::Inclusion, 6, 2),
        ] {
            let matrix = Analysis::new(experiment, true, &config, &fixture.table).build(dir.path()).unwrap();
            assert_eq!(matrix.row_count(), rows, "{experiment}");
            assert_eq!(matrix.column_count(), columns, "{experiment}");
            assert_eq!(matrix.x[0], *experiment.size_exponents().start());
        }
    }

    #[test]
    fn miss_rate_matrix_holds_raw_rates() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        let matrix = Analysis::new(Experiment::Associativity, false, &config, &fixture.table).build(dir.path()).unwrap();
        assert_eq!(matrix.metric, Metric::MissRate);
        assert_eq!(matrix.rows[0][0], Some(Fixture::miss_rate(0, 10)));
        // No gap without AAT
        assert!(matrix.rows.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn aat_combines_hit_time_and_miss_rate() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        let matrix = Analysis::new(Experiment::Replacement, false, &config, &fixture.table).build(dir.path()).unwrap();
        let size = 1u64 << 12;
        let hit = fixture.table.lookup(size, 32, Associativity::Ways(4)).unwrap();
        let expected = hit + Fixture::miss_rate(1, 12) * 100.0;
        let actual = matrix.rows[2][1].unwrap();
        assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn inclusion_uses_fixed_l1_and_swept_l2() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        let matrix = Analysis::new(Experiment::Inclusion, true, &config, &fixture.table).build(dir.path()).unwrap();
        let l1_hit = fixture.table.lookup(1024, 32, Associativity::Ways(4)).unwrap();
        let l2_hit = fixture.table.lookup(1 << 11, 32, Associativity::Ways(8)).unwrap();
        let expected = aat::two_level(l1_hit, Fixture::miss_rate(0, 11), l2_hit, Fixture::l2_miss_rate(0, 11), 100.0);
        assert!((matrix.rows[0][0].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn known_gap_is_left_empty() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        // The gap's result file isn't needed
        fs::remove_file(ResultKey::new(Experiment::Associativity, 8, 1024).path(dir.path())).unwrap();
        let matrix = Analysis::new(Experiment::Associativity, true, &config, &fixture.table).build(dir.path()).unwrap();
        assert_eq!(matrix.rows[0][3], None);
        assert_eq!(matrix.rows.iter().flatten().filter(|cell| cell.is_none()).count(), 1);
    }

    #[test]
    fn missing_timing_row_names_the_variant_and_size() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig { block_size: 64, ..AnalysisConfig::default() };
        let err = Analysis::new(Experiment::Replacement, true, &config, &fixture.table).build(dir.path()).unwrap_err();
        match err {
            AnalysisError::Lookup { variant, size, source: LookupError::Missing(key) } => {
                assert_eq!(variant, "LRU");
                assert_eq!(size, 1024);
                assert_eq!(key.block_size, 64);
            }
            other => panic!("expected a lookup error, got {other:?}"),
        }
    }

    #[test]
    fn missing_fixed_l1_row_is_reported_as_l1() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        let csv = Fixture::table_csv()
            .lines()
            .filter(|line| !line.replace(' ', "").starts_with("1024,32,4,"))
            .collect::<Vec<_>>()
            .join("\n");
        let table = TimingTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), fixture.table.len() - 1);
        let err = Analysis::new(Experiment::Inclusion, true, &config, &table).build(dir.path()).unwrap_err();
        match err {
            AnalysisError::Lookup { variant, size, source: LookupError::Missing(key) } => {
                assert_eq!(variant, "L1");
                assert_eq!(size, 1024);
                assert_eq!(key.associativity, Associativity::Ways(4));
            }
            other => panic!("expected a lookup error, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_fails_the_run() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        fs::remove_file(ResultKey::new(Experiment::Replacement, 2, 1 << 18).path(dir.path())).unwrap();
        let result = Analysis::new(Experiment::Replacement, true, &config, &fixture.table).build(dir.path());
        assert!(matches!(result, Err(AnalysisError::MissingResult { .. })));
    }

    #[test]
    fn unused_results_are_reported() {
        let config = AnalysisConfig::default();
        let table = TimingTable::default();
        let analysis = Analysis::new(Experiment::Associativity, true, &config, &table);
        let expected = analysis.expected_results();
        assert_eq!(expected.len(), 11 * 5 - 1);
        let stray = ResultKey::new(Experiment::Associativity, 16, 1024);
        let gap = ResultKey::new(Experiment::Associativity, 8, 1024);
        let present = vec![expected[0], stray, gap];
        assert_eq!(analysis.unused_results(&present), vec![stray, gap]);
    }
}
