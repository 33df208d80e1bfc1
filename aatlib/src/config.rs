use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde::Deserialize;
use crate::aat::MISS_PENALTY_NS;
use crate::error::{AnalysisError, Result};

/// Constants of the analysis. Every field has a default, so a JSON file only needs the fields it
/// changes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Block size of every cache in bytes
    pub block_size: u64,
    pub miss_penalty_ns: f64,
    /// L1 associativity when it isn't the swept variable
    pub l1_associativity: u64,
    pub l2_associativity: u64,
    /// L1 size in bytes for the inclusion sweep, which only varies L2
    pub inclusion_l1_size: u64,
    pub dpi: u32,
    /// Figure width and height in inches
    pub figure_inches: (f64, f64),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            block_size: 32,
            miss_penalty_ns: MISS_PENALTY_NS,
            l1_associativity: 4,
            l2_associativity: 8,
            inclusion_l1_size: 1024,
            dpi: 300,
            figure_inches: (6.4, 4.8),
        }
    }
}

impl AnalysisConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| AnalysisError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| AnalysisError::Config { path: path.to_path_buf(), source })
    }

    /// Chart size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let (width, height) = self.figure_inches;
        ((width * self.dpi as f64).round() as u32, (height * self.dpi as f64).round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"miss_penalty_ns": 50.0, "dpi": 100}"#).unwrap();
        assert_eq!(config.miss_penalty_ns, 50.0);
        assert_eq!(config.dpi, 100);
        assert_eq!(config.block_size, 32);
        assert_eq!(config.l2_associativity, 8);
    }

    #[test]
    fn default_pixel_size() {
        assert_eq!(AnalysisConfig::default().pixel_size(), (1920, 1440));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"figure_inches": [4.0, 3.0], "dpi": 200}"#).unwrap();
        let config = AnalysisConfig::from_path(&path).unwrap();
        assert_eq!(config.pixel_size(), (800, 600));
        fs::write(&path, r#"{"dpi": "high"}"#).unwrap();
        assert!(matches!(AnalysisConfig::from_path(&path), Err(AnalysisError::Config { .. })));
    }
}
