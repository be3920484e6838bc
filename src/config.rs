//! Run configuration: policy specifications and command-line parsing.

use std::{fmt, path::PathBuf, str::FromStr};

use clap::{App, Arg, ArgMatches};
use log::LevelFilter;

use crate::{
    scheduler::{
        simulate, ConfigError, FcfsScheduler, FinishConvention, MlfqScheduler,
        PriorityScheduler, ProcessDescriptor, RoundRobinScheduler, SimError, SimOutcome,
        SimulatorConfig, SrtfScheduler, Tick,
    },
    workload::WorkloadKind,
};

/// A scheduling policy and its parameters, e.g. `rr:4` or `mlfq:3:2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicySpec {
    Fcfs,
    Srtf,
    RoundRobin { quantum: Tick },
    Priority,
    Mlfq {
        queues: usize,
        quantum_base: Tick,
        boost: Option<Tick>,
    },
}

impl PolicySpec {
    pub fn defaults() -> Vec<PolicySpec> {
        vec![
            PolicySpec::Fcfs,
            PolicySpec::Srtf,
            PolicySpec::RoundRobin { quantum: 2 },
            PolicySpec::RoundRobin { quantum: 4 },
            PolicySpec::Priority,
            PolicySpec::Mlfq {
                queues: 3,
                quantum_base: 2,
                boost: None,
            },
            PolicySpec::Mlfq {
                queues: 4,
                quantum_base: 2,
                boost: None,
            },
        ]
    }

    /// Builds a fresh policy instance and runs `workload` under it.
    pub fn simulate(
        &self,
        workload: &[ProcessDescriptor],
        config: SimulatorConfig,
    ) -> Result<SimOutcome, SimError> {
        match *self {
            PolicySpec::Fcfs => simulate(FcfsScheduler::new(), workload, config),
            PolicySpec::Srtf => simulate(SrtfScheduler::new(), workload, config),
            PolicySpec::RoundRobin { quantum } => {
                simulate(RoundRobinScheduler::new(quantum)?, workload, config)
            }
            PolicySpec::Priority => simulate(PriorityScheduler::new(), workload, config),
            PolicySpec::Mlfq {
                queues,
                quantum_base,
                boost,
            } => {
                let mut mlfq = MlfqScheduler::new(queues, quantum_base)?;
                if let Some(period) = boost {
                    mlfq = mlfq.with_priority_boost(period)?;
                }
                simulate(mlfq, workload, config)
            }
        }
    }
}

impl fmt::Display for PolicySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySpec::Fcfs => write!(f, "FCFS"),
            PolicySpec::Srtf => write!(f, "SRTF"),
            PolicySpec::RoundRobin { quantum } => write!(f, "Round Robin (q={quantum})"),
            PolicySpec::Priority => write!(f, "Priority"),
            PolicySpec::Mlfq {
                queues,
                quantum_base,
                boost: None,
            } => write!(f, "MLFQ ({queues}q, base={quantum_base})"),
            PolicySpec::Mlfq {
                queues,
                quantum_base,
                boost: Some(period),
            } => write!(f, "MLFQ ({queues}q, base={quantum_base}, boost={period})"),
        }
    }
}

impl FromStr for PolicySpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownPolicy { spec: s.to_owned() };
        let lowered = s.to_ascii_lowercase();
        let mut parts = lowered.split(':');
        let name = parts.next().unwrap_or_default();
        let params = parts
            .map(|part| part.parse::<u64>().map_err(|_| unknown()))
            .collect::<Result<Vec<_>, _>>()?;

        let spec = match (name, params.as_slice()) {
            ("fcfs", []) => PolicySpec::Fcfs,
            ("srtf", []) => PolicySpec::Srtf,
            ("priority" | "prio", []) => PolicySpec::Priority,
            ("rr", []) => PolicySpec::RoundRobin {
                quantum: RoundRobinScheduler::DEFAULT_QUANTUM,
            },
            ("rr", &[quantum]) => PolicySpec::RoundRobin { quantum },
            ("mlfq", []) => PolicySpec::Mlfq {
                queues: MlfqScheduler::DEFAULT_QUEUES,
                quantum_base: MlfqScheduler::DEFAULT_QUANTUM_BASE,
                boost: None,
            },
            ("mlfq", &[queues, quantum_base]) => PolicySpec::Mlfq {
                queues: queues as usize,
                quantum_base,
                boost: None,
            },
            ("mlfq", &[queues, quantum_base, period]) => PolicySpec::Mlfq {
                queues: queues as usize,
                quantum_base,
                boost: Some(period),
            },
            _ => return Err(unknown()),
        };

        // Reject degenerate parameters here rather than mid-run
        match spec {
            PolicySpec::RoundRobin { quantum } => {
                RoundRobinScheduler::new(quantum)?;
            }
            PolicySpec::Mlfq {
                queues,
                quantum_base,
                boost,
            } => {
                let mlfq = MlfqScheduler::new(queues, quantum_base)?;
                if let Some(period) = boost {
                    mlfq.with_priority_boost(period)?;
                }
            }
            _ => {}
        }
        Ok(spec)
    }
}

/// Where the simulated processes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkloadSource {
    /// Generate every built-in workload kind.
    AllGenerated,
    Generated(WorkloadKind),
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub policies: Vec<PolicySpec>,
    pub workload: WorkloadSource,
    pub count: Option<usize>,
    pub seed: u64,
    pub simulator: SimulatorConfig,
    pub tui: bool,
    pub log_level: LevelFilter,
}

impl Config {
    pub const DEFAULT_SEED: u64 = 0x5EED;

    pub fn from_args() -> Result<Self, ConfigError> {
        Config::from_matches(&app().get_matches())
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = app()
            .get_matches_from_safe(args)
            .map_err(|err| ConfigError::InvalidArgument {
                detail: err.message,
            })?;
        Config::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches<'_>) -> Result<Self, ConfigError> {
        let policies = match matches.values_of("policy") {
            Some(values) => values
                .map(PolicySpec::from_str)
                .collect::<Result<Vec<_>, _>>()?,
            None => PolicySpec::defaults(),
        };

        let workload = match (matches.value_of("input"), matches.value_of("workload")) {
            (Some(path), _) => WorkloadSource::File(PathBuf::from(path)),
            (None, Some(kind)) => WorkloadSource::Generated(kind.parse()?),
            (None, None) => WorkloadSource::AllGenerated,
        };

        let count = matches
            .value_of("count")
            .map(|count| parse_number("count", count))
            .transpose()?
            .map(|count| count as usize);
        let seed = matches
            .value_of("seed")
            .map(|seed| parse_number("seed", seed))
            .transpose()?
            .unwrap_or(Config::DEFAULT_SEED);
        let tick_limit = matches
            .value_of("tick-limit")
            .map(|limit| parse_number("tick-limit", limit))
            .transpose()?;
        let finish_convention = match matches.value_of("finish") {
            Some("last") => FinishConvention::LastTick,
            _ => FinishConvention::NextTick,
        };

        let log_level = match matches.occurrences_of("verbose") {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        Ok(Self {
            policies,
            workload,
            count,
            seed,
            simulator: SimulatorConfig {
                finish_convention,
                tick_limit,
                ..SimulatorConfig::default()
            },
            tui: matches.is_present("tui"),
            log_level,
        })
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidArgument {
        detail: format!("--{name} expects a non-negative integer, got `{value}`"),
    })
}

fn valid_policy(value: String) -> Result<(), String> {
    value
        .parse::<PolicySpec>()
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn app() -> App<'static, 'static> {
    App::new("cpu-sched-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Evaluates CPU scheduling policies on synthetic workloads")
        .arg(
            Arg::with_name("policy")
                .short("p")
                .long("policy")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .validator(valid_policy)
                .help("Policy to evaluate: fcfs, srtf, priority, rr:<q>, mlfq:<n>:<base>[:<boost>]"),
        )
        .arg(
            Arg::with_name("workload")
                .short("w")
                .long("workload")
                .takes_value(true)
                .possible_values(&["cpu", "io", "mixed"])
                .help("Generated workload kind (default: all three)"),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .conflicts_with("workload")
                .help("Workload file: `pid priority burst arrival [offset:wait ...]` per line"),
        )
        .arg(
            Arg::with_name("count")
                .short("n")
                .long("count")
                .takes_value(true)
                .help("Number of generated processes (default: random 50-100)"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("Seed for workload generation"),
        )
        .arg(
            Arg::with_name("finish")
                .long("finish")
                .takes_value(true)
                .possible_values(&["next", "last"])
                .default_value("next")
                .help("Record finish time as the tick after the last CPU tick, or that tick itself"),
        )
        .arg(
            Arg::with_name("tick-limit")
                .long("tick-limit")
                .takes_value(true)
                .help("Abort a run that has not finished after this many ticks"),
        )
        .arg(
            Arg::with_name("tui")
                .long("tui")
                .help("Replay the runs in an interactive terminal view"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity"),
        )
}
