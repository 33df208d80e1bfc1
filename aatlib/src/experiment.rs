use std::fmt::{Display, Formatter};
use std::ops::{Range, RangeInclusive};
use std::path::PathBuf;
use serde::Serialize;
use crate::config::AnalysisConfig;
use crate::timing::Associativity;

/// The three sweeps the simulator was run for
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub enum Experiment {
    /// L1 associativity against L1 size
    Associativity,
    /// L1 replacement policy against L1 size
    Replacement,
    /// Inclusion property against L2 size
    Inclusion,
}

/// What goes on the y axis
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum Metric {
    MissRate,
    AverageAccessTime,
}

/// The replacement policy codes used in the result file names
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReplacementPolicy {
    LeastRecentlyUsed = 0,
    FirstInFirstOut = 1,
    Optimal = 2,
}

/// The inclusion property codes used in the result file names
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InclusionPolicy {
    NonInclusive = 0,
    Inclusive = 1,
}

/// One column of an experiment: one line on the chart
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Variant {
    Associativity(Associativity),
    Replacement(ReplacementPolicy),
    Inclusion(InclusionPolicy),
}

impl Variant {
    /// The number written into the result file name for this variant at a given size.
    /// Fully associative results are named by their way count, which is the number of lines
    pub fn file_value(&self, size: u64, block_size: u64) -> u64 {
        match self {
            Variant::Associativity(Associativity::Ways(ways)) => *ways,
            Variant::Associativity(Associativity::Full) => size / block_size,
            Variant::Replacement(policy) => *policy as u64,
            Variant::Inclusion(policy) => *policy as u64,
        }
    }

    /// The legend entry
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Associativity(Associativity::Ways(1)) => "Direct-mapped",
            Variant::Associativity(Associativity::Ways(2)) => "2-way Set Associative",
            Variant::Associativity(Associativity::Ways(4)) => "4-way Set Associative",
            Variant::Associativity(Associativity::Ways(8)) => "8-way Set Associative",
            Variant::Associativity(Associativity::Ways(_)) => "Set Associative",
            Variant::Associativity(Associativity::Full) => "Fully Associative",
            Variant::Replacement(ReplacementPolicy::LeastRecentlyUsed) => "LRU",
            Variant::Replacement(ReplacementPolicy::FirstInFirstOut) => "FIFO",
            Variant::Replacement(ReplacementPolicy::Optimal) => "Optimal",
            Variant::Inclusion(InclusionPolicy::NonInclusive) => "Non-inclusive",
            Variant::Inclusion(InclusionPolicy::Inclusive) => "Inclusive",
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed presentation of one experiment and metric
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub y_range: Range<f64>,
    pub legend_title: &'static str,
    /// Relative to the results root
    pub output: PathBuf,
}

const ASSOCIATIVITIES: [Variant; 5] = [
    Variant::Associativity(Associativity::Ways(1)),
    Variant::Associativity(Associativity::Ways(2)),
    Variant::Associativity(Associativity::Ways(4)),
    Variant::Associativity(Associativity::Ways(8)),
    Variant::Associativity(Associativity::Full),
];

const REPLACEMENT_POLICIES: [Variant; 3] = [
    Variant::Replacement(ReplacementPolicy::LeastRecentlyUsed),
    Variant::Replacement(ReplacementPolicy::FirstInFirstOut),
    Variant::Replacement(ReplacementPolicy::Optimal),
];

const INCLUSION_POLICIES: [Variant; 2] = [
    Variant::Inclusion(InclusionPolicy::NonInclusive),
    Variant::Inclusion(InclusionPolicy::Inclusive),
];

impl Experiment {
    /// Maps the experiment number used on the command line and in directory names
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Experiment::Associativity),
            2 => Some(Experiment::Replacement),
            3 => Some(Experiment::Inclusion),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Experiment::Associativity => 1,
            Experiment::Replacement => 2,
            Experiment::Inclusion => 3,
        }
    }

    pub fn directory(&self) -> String {
        format!("exp{}", self.number())
    }

    pub fn file_label(&self) -> &'static str {
        match self {
            Experiment::Associativity => "ASSOC",
            Experiment::Replacement => "REPL",
            Experiment::Inclusion => "INCL",
        }
    }

    pub fn from_file_label(label: &str) -> Option<Self> {
        match label {
            "ASSOC" => Some(Experiment::Associativity),
            "REPL" => Some(Experiment::Replacement),
            "INCL" => Some(Experiment::Inclusion),
            _ => None,
        }
    }

    /// The cache level whose size is swept, which is also the level in the result file names
    pub fn swept_level(&self) -> u8 {
        match self {
            Experiment::Inclusion => 2,
            _ => 1,
        }
    }

    /// Miss rates per result file: L1 only, or L1 and L2
    pub fn miss_rates_per_file(&self) -> usize {
        self.swept_level() as usize
    }

    /// log2 of the swept cache sizes
    pub fn size_exponents(&self) -> RangeInclusive<u32> {
        match self {
            Experiment::Associativity => 10..=20,
            Experiment::Replacement => 10..=18,
            Experiment::Inclusion => 11..=16,
        }
    }

    pub fn variants(&self) -> &'static [Variant] {
        match self {
            Experiment::Associativity => &ASSOCIATIVITIES,
            Experiment::Replacement => &REPLACEMENT_POLICIES,
            Experiment::Inclusion => &INCLUSION_POLICIES,
        }
    }

    /// Only the associativity sweep can plot raw miss rates; the others always plot AAT
    pub fn metric(&self, average_access_time: bool) -> Metric {
        match self {
            Experiment::Associativity if !average_access_time => Metric::MissRate,
            _ => Metric::AverageAccessTime,
        }
    }

    /// Cells with no timing data which are left empty instead of failing the run.
    /// The timing table has no 8-way entry for a 1KiB cache
    pub fn is_known_gap(&self, metric: Metric, variant: &Variant, size: u64, config: &AnalysisConfig) -> bool {
        matches!(
            (self, metric, variant),
            (Experiment::Associativity, Metric::AverageAccessTime, Variant::Associativity(Associativity::Ways(8)))
        ) && size == 1024
            && config.block_size == 32
    }

    pub fn layout(&self, metric: Metric) -> ChartLayout {
        const AAT_LABEL: &str = "Average Access Time (ns)";
        match (self, metric) {
            (Experiment::Associativity, Metric::MissRate) => ChartLayout {
                title: "L1 Miss Rate vs. L1 Size for 5 Associativities",
                x_label: "log2(L1 Size)",
                y_label: "L1 Miss Rate",
                y_range: 0.023..0.2,
                legend_title: "ASSOCIATIVITIES",
                output: PathBuf::from("exp1").join("exp1a.png"),
            },
            (Experiment::Associativity, Metric::AverageAccessTime) => ChartLayout {
                title: "Average Access Time (ns) vs. L1 Size for 5 Associativities",
                x_label: "log2(L1 Size)",
                y_label: AAT_LABEL,
                y_range: 2.0..20.0,
                legend_title: "ASSOCIATIVITIES",
                output: PathBuf::from("exp1").join("exp1b.png"),
            },
            (Experiment::Replacement, _) => ChartLayout {
                title: "Average Access Time (ns) vs. L1 Size for 3 Replacement Policies",
                x_label: "log2(L1 Size)",
                y_label: AAT_LABEL,
                y_range: 2.0..16.0,
                legend_title: "REPLACEMENT POLICIES",
                output: PathBuf::from("exp2").join("exp2.png"),
            },
            (Experiment::Inclusion, _) => ChartLayout {
                title: "Average Access Time (ns) vs. L2 Size for 2 Inclusion Policies",
                x_label: "log2(L2 Size)",
                y_label: AAT_LABEL,
                y_range: 2.0..10.0,
                legend_title: "INCLUSION PROPERTIES",
                output: PathBuf::from("exp3").join("exp3.png"),
            },
        }
    }
}

impl Display for Experiment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "exp{}", self.number())
    }
}
