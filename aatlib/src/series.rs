use serde::Serialize;
use crate::experiment::{Experiment, Metric};

/// Values of every variant at every swept size
///
/// Rows are the swept sizes as log2 exponents, columns are the variants in legend order. An empty
/// cell is a known gap in the timing data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesMatrix {
    pub experiment: Experiment,
    pub metric: Metric,
    pub x: Vec<u32>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl SeriesMatrix {
    pub fn new(experiment: Experiment, metric: Metric, columns: Vec<String>) -> Self {
        Self {
            experiment,
            metric,
            x: Vec::new(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends the values at one swept size, one per column
    pub fn push_row(&mut self, exponent: u32, row: Vec<Option<f64>>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.x.push(exponent);
        self.rows.push(row);
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The points of one variant, in x order
    pub fn column(&self, index: usize) -> impl Iterator<Item = (u32, Option<f64>)> + '_ {
        self.x.iter().copied().zip(self.rows.iter().map(move |row| row[index]))
    }

    /// Unbroken runs of a column, splitting wherever a cell is empty
    pub fn segments(&self, index: usize) -> Vec<Vec<(u32, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (x, value) in self.column(index) {
            match value {
                Some(y) => current.push((x, y)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}
