use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;
use crate::error::{AnalysisError, LookupError, Result};

/// Associativity as written in the timing table: a way count, or `FA` for fully associative
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Associativity {
    Ways(u64),
    Full,
}

impl Associativity {
    /// Parses a table cell. Surrounding whitespace is ignored, so `"FA"` and `" FA"` are the same
    ///
    /// # Examples
    ///
    /// ```
    /// use aatlib::timing::Associativity;
    /// assert_eq!(Associativity::parse(" FA"), Some(Associativity::Full));
    /// assert_eq!(Associativity::parse("8"), Some(Associativity::Ways(8)));
    /// assert_eq!(Associativity::parse("eight"), None);
    /// ```
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.eq_ignore_ascii_case("FA") {
            return Some(Associativity::Full);
        }
        cell.parse::<u64>().ok().map(Associativity::Ways)
    }
}

impl Display for Associativity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Associativity::Ways(ways) => write!(f, "{ways}-way"),
            Associativity::Full => write!(f, "FA"),
        }
    }
}

/// The key of a timing table row
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TimingKey {
    pub size: u64,
    pub block_size: u64,
    pub associativity: Associativity,
}

impl Display for TimingKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(size {} B, block {} B, {})", self.size, self.block_size, self.associativity)
    }
}

// Column names as CACTI writes them, three of the four with a leading space
#[derive(Debug, Deserialize)]
struct TimingRecord {
    #[serde(rename = "Cache Size(bytes)")]
    size: u64,
    #[serde(rename = " Block Size(bytes)", alias = "Block Size(bytes)")]
    block_size: u64,
    #[serde(rename = " Associativity", alias = "Associativity")]
    associativity: String,
    #[serde(rename = " Access Time(ns)", alias = "Access Time(ns)")]
    access_time: f64,
}

impl TimingRecord {
    fn into_row(self, row: usize) -> Result<TimingRow> {
        let associativity = Associativity::parse(&self.associativity)
            .ok_or(AnalysisError::BadAssociativity { row, value: self.associativity })?;
        Ok(TimingRow {
            key: TimingKey {
                size: self.size,
                block_size: self.block_size,
                associativity,
            },
            access_time_ns: self.access_time,
        })
    }
}

// The same columns, trimmed, for matching spreadsheet headers
const COLUMNS: [&str; 4] = ["Cache Size(bytes)", "Block Size(bytes)", "Associativity", "Access Time(ns)"];

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Trimmed text of a cell. Whole numbers print without a fraction, so a numeric `4` reads as `"4"`
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.trim().to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn cell_u64(cell: &Data) -> Option<u64> {
    match cell {
        Data::Int(i) => u64::try_from(*i).ok(),
        Data::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One row of the timing table
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimingRow {
    pub key: TimingKey,
    pub access_time_ns: f64,
}

/// Cache access times keyed by size, block size and associativity. Read-only once loaded
#[derive(Debug, Default, Clone)]
pub struct TimingTable {
    rows: Vec<TimingRow>,
}

impl TimingTable {
    /// Loads a timing table, as a spreadsheet (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.ods`) or
    /// otherwise as CSV
    pub fn from_path(path: &Path) -> Result<Self> {
        let is_spreadsheet = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SPREADSHEET_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
            .unwrap_or(false);
        let table = if is_spreadsheet {
            Self::from_spreadsheet(path)?
        } else {
            let file = File::open(path).map_err(|source| AnalysisError::Io { path: path.to_path_buf(), source })?;
            Self::from_reader(file).map_err(|e| match e {
                AnalysisError::Csv { source, .. } => AnalysisError::Csv { path: path.to_path_buf(), source },
                other => other,
            })?
        };
        debug!(path = %path.display(), rows = table.len(), spreadsheet = is_spreadsheet, "Loaded timing table");
        Ok(table)
    }

    /// Loads a timing table from any CSV source. Values are trimmed, header names are not
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Fields)
            .from_reader(reader);
        let mut rows = Vec::new();
        for (row, record) in reader.deserialize::<TimingRecord>().enumerate() {
            let record = record.map_err(|source| AnalysisError::Csv { path: Default::default(), source })?;
            rows.push(record.into_row(row + 1)?);
        }
        Ok(Self { rows })
    }

    /// Loads the first sheet of a workbook. The header row is matched on trimmed names, so the
    /// CACTI spellings with a leading space work too
    pub fn from_spreadsheet(path: &Path) -> Result<Self> {
        let layout = |reason: String| AnalysisError::Spreadsheet { path: path.to_path_buf(), reason };
        let mut workbook = open_workbook_auto(path).map_err(|source| AnalysisError::Workbook { path: path.to_path_buf(), source })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| layout("the workbook has no sheets".to_string()))?
            .map_err(|source| AnalysisError::Workbook { path: path.to_path_buf(), source })?;
        let mut sheet_rows = range.rows();
        let header = sheet_rows.next().ok_or_else(|| layout("the first sheet is empty".to_string()))?;
        let column = |name: &str| {
            header
                .iter()
                .position(|cell| cell_text(cell).as_deref() == Some(name))
                .ok_or_else(|| layout(format!("no {name:?} column")))
        };
        let (size, block_size, associativity, access_time) = (
            column(COLUMNS[0])?,
            column(COLUMNS[1])?,
            column(COLUMNS[2])?,
            column(COLUMNS[3])?,
        );

        let mut rows = Vec::new();
        for (index, cells) in sheet_rows.enumerate() {
            let row = index + 1;
            if cells.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            let cell = |column: usize| cells.get(column).unwrap_or(&Data::Empty);
            let bad = |name: &str, column: usize| layout(format!("row {row}: {name} {:?} is not a number", cell(column)));
            let record = TimingRecord {
                size: cell_u64(cell(size)).ok_or_else(|| bad(COLUMNS[0], size))?,
                block_size: cell_u64(cell(block_size)).ok_or_else(|| bad(COLUMNS[1], block_size))?,
                associativity: cell_text(cell(associativity)).unwrap_or_default(),
                access_time: cell_f64(cell(access_time)).ok_or_else(|| bad(COLUMNS[3], access_time))?,
            };
            rows.push(record.into_row(row)?);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gets the access time for a key. Exactly one row must match
    ///
    /// # Arguments
    ///
    /// * `size`: Cache size in bytes
    /// * `block_size`: Block size in bytes
    /// * `associativity`: Way count or fully associative
    ///
    /// returns: Result<f64, LookupError>, the access time in nanoseconds
    pub fn lookup(&self, size: u64, block_size: u64, associativity: Associativity) -> std::result::Result<f64, LookupError> {
        let key = TimingKey { size, block_size, associativity };
        let mut matches = self.rows.iter().filter(|row| row.key == key);
        match (matches.next(), matches.count()) {
            (None, _) => Err(LookupError::Missing(key)),
            (Some(row), 0) => Ok(row.access_time_ns),
            (Some(_), rest) => Err(LookupError::Ambiguous { key, matches: rest + 1 }),
        }
    }
}
