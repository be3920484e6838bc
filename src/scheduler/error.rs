//! Error types for policy construction, workload validation and simulation.
//!
//! Configuration problems are reported before a run starts. Anything the
//! simulator detects mid-run is a defect in a policy, never a recoverable
//! condition, so there is no retry path.

use std::{error::Error, fmt, io};

use super::process::{Pid, ProcessState, Tick};

/// Errors raised while building policies or validating a workload.
#[derive(Debug)]
pub enum ConfigError {
    /// Round-robin quantum of zero.
    InvalidQuantum,
    /// MLFQ configured with zero queues.
    InvalidQueueCount,
    /// MLFQ base quantum of zero.
    InvalidQuantumBase,
    /// MLFQ boost period of zero.
    InvalidBoostPeriod,
    DuplicatePid { pid: Pid },
    ZeroBurst { pid: Pid },
    IoOffsetNotIncreasing { pid: Pid, offset: Tick, previous: Tick },
    IoOffsetOutOfRange { pid: Pid, offset: Tick, burst: Tick },
    UnknownPolicy { spec: String },
    UnknownWorkload { name: String },
    MalformedWorkload { line: usize, detail: String },
    InvalidArgument { detail: String },
    Io(io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuantum => write!(f, "round-robin quantum must be positive"),
            Self::InvalidQueueCount => write!(f, "MLFQ needs at least one queue"),
            Self::InvalidQuantumBase => write!(f, "MLFQ base quantum must be positive"),
            Self::InvalidBoostPeriod => write!(f, "MLFQ boost period must be positive"),
            Self::DuplicatePid { pid } => write!(f, "pid {pid} appears more than once"),
            Self::ZeroBurst { pid } => write!(f, "process {pid} has a zero burst time"),
            Self::IoOffsetNotIncreasing {
                pid,
                offset,
                previous,
            } => write!(
                f,
                "process {pid}: I/O offset {offset} does not follow {previous}"
            ),
            Self::IoOffsetOutOfRange { pid, offset, burst } => write!(
                f,
                "process {pid}: I/O offset {offset} outside [1, {burst})"
            ),
            Self::UnknownPolicy { spec } => write!(
                f,
                "unknown policy `{spec}` (expected fcfs, srtf, priority, rr:<q> or mlfq:<n>:<base>[:<boost>])"
            ),
            Self::UnknownWorkload { name } => {
                write!(f, "unknown workload `{name}` (expected cpu, io or mixed)")
            }
            Self::MalformedWorkload { line, detail } => {
                write!(f, "workload line {line}: {detail}")
            }
            Self::InvalidArgument { detail } => f.write_str(detail),
            Self::Io(err) => write!(f, "workload I/O error: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// A state change outside the legal lifecycle edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IllegalTransition {
    pub pid: Pid,
    pub from: ProcessState,
    pub to: ProcessState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "process {}: illegal transition {} -> {}",
            self.pid, self.from, self.to
        )
    }
}

impl Error for IllegalTransition {}

/// Errors that abort a simulation run.
#[derive(Debug)]
pub enum SimError {
    Config(ConfigError),
    IllegalTransition { tick: Tick, transition: IllegalTransition },
    InvariantViolation { tick: Tick, detail: String },
    TickLimitExceeded { limit: Tick },
}

impl SimError {
    pub(crate) fn invariant(tick: Tick, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            tick,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::IllegalTransition { tick, transition } => {
                write!(f, "tick {tick}: {transition}")
            }
            Self::InvariantViolation { tick, detail } => {
                write!(f, "tick {tick}: scheduler invariant violated: {detail}")
            }
            Self::TickLimitExceeded { limit } => {
                write!(f, "simulation did not finish within {limit} ticks")
            }
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::IllegalTransition { transition, .. } => Some(transition),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
