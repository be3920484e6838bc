use cpu_sched_sim::{
    config::{Config, WorkloadSource},
    logger, report,
    scheduler::{PolicyRun, ProcessDescriptor, ReplayRunner},
    workload::{self, SimRng},
};
use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use log::info;
use std::{error::Error, io};

fn workloads(config: &Config) -> Result<Vec<(String, Vec<ProcessDescriptor>)>, Box<dyn Error>> {
    let mut rng = SimRng::new(config.seed);
    let generated = |kind: workload::WorkloadKind, rng: &mut SimRng| {
        (kind.to_string(), workload::generate(kind, config.count, rng))
    };

    Ok(match &config.workload {
        WorkloadSource::File(path) => vec![(path.display().to_string(), workload::load(path)?)],
        WorkloadSource::Generated(kind) => vec![generated(*kind, &mut rng)],
        WorkloadSource::AllGenerated => workload::WorkloadKind::ALL
            .into_iter()
            .map(|kind| generated(kind, &mut rng))
            .collect(),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_args()?;
    // The replay view owns the terminal, so keep log output out of it
    if !config.tui {
        logger::init(config.log_level)?;
    }

    let mut runs = Vec::new();
    let mut stdout = io::stdout().lock();
    for (name, workload) in workloads(&config)? {
        info!("workload {name}: {} processes (seed {})", workload.len(), config.seed);
        if !config.tui {
            report::write_banner(&mut stdout, &name)?;
        }

        for policy in &config.policies {
            let outcome = policy.simulate(&workload, config.simulator)?;
            let run = PolicyRun::new(format!("{policy} / {name}"), outcome);
            if config.tui {
                runs.push(run);
            } else {
                report::write_run(&mut stdout, &run)?;
            }
        }
    }
    drop(stdout);

    if config.tui {
        execute!(io::stdout(), Clear(ClearType::All))?;
        let mut runner = ReplayRunner::new(runs)?;
        while runner.run()? {}
        drop(runner);
        execute!(io::stdout(), Clear(ClearType::All))?;
    }
    Ok(())
}
