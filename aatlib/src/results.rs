use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use regex::Regex;
use tracing::debug;
use crate::error::{AnalysisError, Result};
use crate::experiment::Experiment;

/// Identifies one result file, `exp{N}/{LABEL}_{VALUE}_L{LEVEL}Size_{SIZE}.txt`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ResultKey {
    pub experiment: Experiment,
    /// Way count, replacement policy code or inclusion policy code
    pub value: u64,
    /// Size of the swept cache level in bytes
    pub size: u64,
}

fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<label>[A-Z]+)_(?P<value>[0-9]+)_L(?P<level>[12])Size_(?P<size>[0-9]+)\.txt$")
            .expect("result file name pattern is valid")
    })
}

impl ResultKey {
    pub fn new(experiment: Experiment, value: u64, size: u64) -> Self {
        Self { experiment, value, size }
    }

    /// # Examples
    ///
    /// ```
    /// use aatlib::experiment::Experiment;
    /// use aatlib::results::ResultKey;
    /// let key = ResultKey::new(Experiment::Inclusion, 1, 4096);
    /// assert_eq!(key.file_name(), "INCL_1_L2Size_4096.txt");
    /// ```
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_L{}Size_{}.txt",
            self.experiment.file_label(),
            self.value,
            self.experiment.swept_level(),
            self.size
        )
    }

    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(self.experiment.directory()).join(self.file_name())
    }

    /// Recovers the key from a result file name. Returns None for anything not following the
    /// naming convention, including a level that doesn't match the label's experiment
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = file_name_pattern().captures(file_name)?;
        let experiment = Experiment::from_file_label(captures.name("label")?.as_str())?;
        let level: u8 = captures.name("level")?.as_str().parse().ok()?;
        if level != experiment.swept_level() {
            return None;
        }
        Some(Self {
            experiment,
            value: captures.name("value")?.as_str().parse().ok()?,
            size: captures.name("size")?.as_str().parse().ok()?,
        })
    }
}

/// Reads the miss rates on the first line of a result file
///
/// # Arguments
///
/// * `path`: The result file
/// * `expected`: How many rates the experiment needs. One value must be exactly one value; more
/// than one takes the leading values and ignores the rest
///
/// returns: Result<Vec<f64>, AnalysisError>, exactly `expected` long
pub fn read_miss_rates(path: &Path, expected: usize) -> Result<Vec<f64>> {
    let contents = fs::read_to_string(path)
        .map_err(|source| AnalysisError::MissingResult { path: path.to_path_buf(), source })?;
    let malformed = |reason: String| AnalysisError::MalformedResult { path: path.to_path_buf(), reason };
    let first_line = contents.lines().next().ok_or_else(|| malformed("the file is empty".to_string()))?;
    let rates = first_line
        .split_whitespace()
        .map(|token| token.parse::<f64>().map_err(|e| malformed(format!("{token:?} is not a number: {e}"))))
        .collect::<Result<Vec<f64>>>()?;
    if rates.len() < expected || (expected == 1 && rates.len() != 1) {
        return Err(malformed(format!("expected {expected} miss rate(s) on the first line, found {}", rates.len())));
    }
    Ok(rates.into_iter().take(expected).collect())
}

/// Lists the result files present for an experiment, sorted by name
///
/// Files that don't follow the naming convention are skipped. A missing experiment directory
/// gives an empty list; the sweep itself reports the missing files
pub fn scan(root: &Path, experiment: Experiment) -> Result<Vec<ResultKey>> {
    let directory = root.join(experiment.directory());
    let entries = match fs::read_dir(&directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(AnalysisError::Io { path: directory, source }),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AnalysisError::Io { path: directory.clone(), source })?;
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    let keys: Vec<ResultKey> = names
        .iter()
        .filter_map(|name| ResultKey::parse(name))
        .filter(|key| key.experiment == experiment)
        .collect();
    debug!(directory = %directory.display(), files = names.len(), results = keys.len(), "Scanned result directory");
    Ok(keys)
}
