use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use logmfd::host::{LangevinHost, RunFile};
use logmfd::investigation::record::FileSink;
use logmfd::platform::comm::{Communicator, ReplicaGroup, SingleReplica};
use logmfd::{LogMfd, LogMfdError};

/// Runs LogMFD (or LogPD with several replicas) on a model Langevin system.
#[derive(Parser, Debug)]
#[command(name = "logmfd", version)]
struct Cli {
    /// RON run file with `host`, `logmfd` and `steps` sections.
    config: PathBuf,

    /// Number of replicas. More than one runs LogPD, one thread per replica.
    #[arg(short, long, default_value_t = 1)]
    replicas: usize,

    /// Directory for logmfd.out and replica.out.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Overrides the number of MD steps in the run file.
    #[arg(long)]
    steps: Option<u64>,

    /// Seconds a replica waits for its peers at each reduction.
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut run = RunFile::load(&cli.config)
        .with_context(|| format!("failed to load run file {}", cli.config.display()))?;
    if let Some(steps) = cli.steps {
        run.steps = steps;
    }
    if cli.replicas == 0 {
        return Err(anyhow!("--replicas must be at least 1"));
    }
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    if cli.replicas == 1 {
        return run_replica(&run, Box::new(SingleReplica), &cli.output);
    }

    let handles = ReplicaGroup::new(cli.replicas, Duration::from_secs(cli.timeout));
    let results: Vec<Result<()>> = thread::scope(|scope| {
        let workers: Vec<_> = handles
            .into_iter()
            .map(|handle| {
                let run = &run;
                let output = cli.output.as_path();
                scope.spawn(move || run_replica(run, Box::new(handle), output))
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().unwrap_or_else(|_| Err(anyhow!("replica thread panicked"))))
            .collect()
    });

    first_failure(results)
}

fn run_replica(run: &RunFile, comm: Box<dyn Communicator>, output: &Path) -> Result<()> {
    let rank = comm.rank();
    let units = run.units();
    let sink = FileSink::create(output, rank, comm.size())
        .with_context(|| format!("replica {rank}: cannot open logs in {}", output.display()))?;
    let mut host = LangevinHost::new(&run.host, units.kboltzmann, rank as u64)?;
    let mut logmfd = LogMfd::from_config(&run.logmfd, host.collective_variables(), &units, comm, Box::new(sink))
        .with_context(|| format!("replica {rank}: invalid LOGMFD input"))?;

    for step in 0..=run.steps {
        let restraint = logmfd.calculate(host.cvs())?;
        logmfd
            .update(step)
            .with_context(|| format!("replica {rank}: MFD update failed at step {step}"))?;
        host.step(&restraint.forces);
    }

    tracing::info!(rank, flog = logmfd.flog(), components = ?logmfd.components(), "run finished");
    Ok(())
}

/// The root cause among the replica results. A failing replica breaks the
/// group, so its peers report a secondary fault that hides the real error.
fn first_failure(results: Vec<Result<()>>) -> Result<()> {
    let mut errors: Vec<anyhow::Error> = results.into_iter().filter_map(|r| r.err()).collect();
    let primary = errors.iter().position(|e| {
        !matches!(
            e.downcast_ref::<LogMfdError>(),
            Some(LogMfdError::ReplicaFault(_))
        )
    });
    match primary {
        Some(i) => Err(errors.swap_remove(i)),
        None => errors.into_iter().next().map_or(Ok(()), Err),
    }
}

fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}
