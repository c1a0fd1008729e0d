mod aggregator;
mod cli;
mod config;
mod metrics;
mod payload;
mod prober;
mod progress;
mod report;
mod scheduler;
mod timestamp;
mod util;

use cli::CommandLine;
use config::RunConfig;
use payload::load_payload;
use progress::ConsoleProgress;
use report::save_report;
use scheduler::Scheduler;

use tracing::{debug, info};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    if std::env::args_os().len() == 1 {
        print!("{}", CommandLine::help());
        std::process::exit(1);
    }

    let cli = CommandLine::parse_args();
    let config = RunConfig::from_cli(&cli)?;
    let log_level = config.get_tracing_level()?;

    // Logs go to stderr; stdout carries the progress report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                format!("cdn_speed_probe={}", log_level.as_str().to_lowercase()).parse()?,
            ),
        )
        .init();

    let Some(plan) = load_payload(&config.payload).await? else {
        info!("payload {} not found, nothing to probe", config.payload.display());
        return Ok(());
    };

    let targets: usize = plan
        .iter()
        .flat_map(|service| service.ips.iter())
        .map(|(_, group)| group.len())
        .sum();
    info!(
        "loaded {} services with {} targets; timeout {:?}, {} workers, {} rounds",
        plan.len(),
        targets,
        config.timeout,
        config.concurrent,
        config.testing_times
    );

    let scheduler = Scheduler::from_config(&config)?;
    let progress = ConsoleProgress::stdout();
    let report = scheduler.run(plan, &progress).await?;

    save_report(&report, &config.output).await?;

    let (successes, failures) = metrics::totals();
    info!(
        "wrote {} ({} successful probes, {} failed)",
        config.output.display(),
        successes,
        failures
    );
    debug!("probe metrics:\n{}", metrics::render());

    Ok(())
}
