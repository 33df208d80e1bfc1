use std::path::PathBuf;
use std::time::Instant;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use aatlib::analysis::Analysis;
use aatlib::chart;
use aatlib::config::AnalysisConfig;
use aatlib::experiment::Experiment;
use aatlib::results::scan;
use aatlib::timing::TimingTable;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Plots miss rate and average access time for the cache simulator experiments"))]
struct Args {
    /// CACTI timing table, as CSV or a spreadsheet (.xls, .xlsx, .xlsm, .xlsb, .ods)
    table: PathBuf,
    /// Directory holding the exp1, exp2 and exp3 result directories
    results: PathBuf,

    /// 1: associativity, 2: replacement policy, 3: inclusion property
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    exp: u8,

    /// Plot average access time instead of the L1 miss rate (experiment 1 only)
    #[arg(short, long)]
    aat: bool,

    /// JSON file overriding the analysis constants
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the chart, instead of the experiment's default under the results directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    aatlib::init_logger(if args.debug { LevelFilter::DEBUG } else { LevelFilter::INFO });
    let experiment = Experiment::from_number(args.exp).ok_or(format!("Unknown experiment {}", args.exp))?;
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_path(path).map_err(|e| e.to_string())?,
        None => AnalysisConfig::default(),
    };
    let table = TimingTable::from_path(&args.table).map_err(|e| e.to_string())?;
    let load_time = start.elapsed();

    let mut analysis = Analysis::new(experiment, args.aat, &config, &table);
    let matrix = analysis.build(&args.results).map_err(|e| e.to_string())?;
    println!("{}", serde_json::to_string_pretty(&matrix).map_err(|e| format!("Couldn't serialise the output {e}"))?);

    let layout = experiment.layout(analysis.metric());
    let output = args.output.clone().unwrap_or_else(|| args.results.join(&layout.output));
    let render_start = Instant::now();
    chart::render(&matrix, &layout, &config, &output).map_err(|e| e.to_string())?;
    let render_time = render_start.elapsed();

    if args.performance {
        let total_time = start.elapsed();
        eprintln!("Table load time: {}s", load_time.as_nanos() as f64 / 1e9);
        eprintln!("Analysis time: {}s", analysis.get_execution_time().as_nanos() as f64 / 1e9);
        eprintln!("Render time: {}s", render_time.as_nanos() as f64 / 1e9);
        eprintln!("Total execution time: {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        eprintln!("Debug build: the debug report is on by default. Build with --release for timings you want to compare");
        eprintln!("Parsed analysis configuration: {config:?}");
        eprintln!("Timing table rows: {}", table.len());
        let present = scan(&args.results, experiment).map_err(|e| e.to_string())?;
        let unused = analysis.unused_results(&present);
        if !unused.is_empty() {
            let formatted = unused
                .iter()
                .map(|key| key.file_name())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(count = unused.len(), "Result files not used by {experiment}: {formatted}");
        }
        eprintln!("Result files present: {}, unused: {}", present.len(), unused.len());
    }
    Ok(())
}
