use anyhow::{Context, Result};
use clap::Parser;
use kintai::bundle::OutputBundle;
use kintai::cli::{Cli, OutputFormat};
use kintai::findings;
use kintai::metrics::MetricKey;
use kintai::pipeline::{Pipeline, RunOptions};
use kintai::policy::Policy;
use kintai::view::KpiCatalog;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the metric table to stdout, one row per metric, one column per month
fn print_text_report(bundle: &OutputBundle) {
    if bundle.months.is_empty() {
        println!("No months resolved.");
        return;
    }

    print!("{:<30}", "metric");
    for month in &bundle.months {
        print!(" {month:>10}");
    }
    println!();
    print!("{:-<30}", "");
    for _ in &bundle.months {
        print!(" {:->10}", "");
    }
    println!();

    for key in MetricKey::ALL {
        print!("{:<30}", key.as_str());
        for snapshot in &bundle.metrics {
            let value = snapshot.get(key);
            if key.is_rate() {
                print!(" {value:>9.1}%");
            } else {
                print!(" {:>10}", value as i64);
            }
        }
        println!();
    }
    println!();
    println!(
        "{} employee timeline(s), {} finding(s)",
        bundle.timelines.len(),
        bundle.findings.len()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let policy = match &cli.policy {
        Some(path) => Policy::from_file(path)
            .with_context(|| format!("loading policy from {}", path.display()))?,
        None => Policy::default(),
    };
    let catalog = match &cli.catalog {
        Some(path) => KpiCatalog::from_file(path)
            .with_context(|| format!("loading KPI catalog from {}", path.display()))?,
        None => KpiCatalog::standard(),
    };

    let pipeline = Pipeline::new(policy, catalog).context("assembling pipeline")?;
    let options = RunOptions {
        data_dir: cli.data_dir.clone(),
        window_start: cli.window_start(),
        window_end: cli.month,
        include_views: cli.views,
    };
    let bundle = pipeline.run(&options).context("generation run failed")?;

    if cli.summary {
        findings::print_summary(&bundle.findings);
    }

    match cli.format {
        OutputFormat::Json => {
            let json = bundle.to_json()?;
            match &cli.output {
                Some(path) => std::fs::write(path, json)
                    .with_context(|| format!("writing bundle to {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        OutputFormat::Text => print_text_report(&bundle),
    }

    Ok(())
}
