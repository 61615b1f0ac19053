use clap::{CommandFactory, Parser, Subcommand};
use raster_hist_common::Config;
use raster_hist_core::{
    export_report_json, print_summary, run_histogram, HistogramParams, TableFormat, TableLabel,
    MIN_BINS,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn parse_bins(s: &str) -> Result<usize, String> { // validate bin count at CLI parse time
    let v: usize = s.parse().map_err(|_| format!("not an integer: {s}"))?;
    if v >= MIN_BINS { Ok(v) } else { Err(format!("bins must be at least {MIN_BINS}, got {v}")) }
}

#[derive(Parser)]
#[command(name = "raster-hist", version, about = "Raster layer histogram")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin a raster band and write the frequency table and plot
    Histogram {
        input: PathBuf,
        #[arg(long, value_parser = parse_bins)] bins: Option<usize>,
        #[arg(long)] band: Option<String>,
        #[arg(long, allow_hyphen_values = true)] nodata: Option<f64>,
        #[arg(long)] table: Option<PathBuf>,
        #[arg(long)] format: Option<String>,
        #[arg(long)] label: Option<String>,
        /// HTML page; the image is written next to it
        #[arg(long)] plot: Option<PathBuf>,
        /// full JSON report
        #[arg(long)] report: Option<PathBuf>,
    },
    /// Print the histogram summary without writing any files
    Summary {
        input: PathBuf,
        #[arg(long, value_parser = parse_bins)] bins: Option<usize>,
        #[arg(long)] band: Option<String>,
        #[arg(long, allow_hyphen_values = true)] nodata: Option<f64>,
    },
    /// Show the effective configuration
    Config { #[arg(long)] save: bool },
    Completions { shell: clap_complete::Shell },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring config {}: {e}", Config::config_path().display());
        Config::default()
    });
    match cli.command {
        Commands::Histogram { input, bins, band, nodata, table, format, label, plot, report } => {
            let mut params = HistogramParams::from_config(input, &config)?;
            if let Some(b) = bins { params.bins = b; }
            if band.is_some() { params.band = band; }
            if nodata.is_some() { params.nodata = nodata; }
            if let Some(f) = format { params.table_format = f.parse::<TableFormat>()?; }
            if let Some(l) = label { params.table_label = l.parse::<TableLabel>()?; }
            params.table = table;
            params.plot = plot;
            if params.table.is_none() && params.plot.is_none() {
                let out_dir = PathBuf::from(&config.export.output_dir);
                std::fs::create_dir_all(&out_dir)?;
                params.table = Some(out_dir.join(format!("histogram.{}", params.table_format.extension())));
                params.plot = Some(out_dir.join("histogram.html"));
            }
            run_histogram_cmd(params, report)?
        }
        Commands::Summary { input, bins, band, nodata } => {
            let mut params = HistogramParams::from_config(input, &config)?;
            if let Some(b) = bins { params.bins = b; }
            if band.is_some() { params.band = band; }
            if nodata.is_some() { params.nodata = nodata; }
            let report = run_histogram(&params, Some(install_cancel_handler()?))?;
            print_summary(&report);
            for bin in &report.bins {
                println!("  {:>24} {}", bin.label(), bin.count);
            }
        }
        Commands::Config { save } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if save {
                let path = config.save()?;
                println!("Config saved to {}", path.display());
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "raster-hist", &mut std::io::stdout());
        }
    }
    Ok(())
}

/// Ctrl-C raises the flag; the scan checks it between blocks
fn install_cancel_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
    Ok(cancel)
}

fn run_histogram_cmd(params: HistogramParams, report_path: Option<PathBuf>) -> anyhow::Result<()> {
    for p in [&params.table, &params.plot, &report_path].into_iter().flatten() {
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
        }
    }
    let report = run_histogram(&params, Some(install_cancel_handler()?))?;
    print_summary(&report);
    if let Some(path) = report_path {
        export_report_json(&path, &report)?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}
