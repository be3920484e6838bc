//! Workload synthesis and loading.
//!
//! Generation is driven by an explicitly seeded [`SimRng`], so a seed fully
//! determines the workload.

use std::{fmt, fs, path::Path, str::FromStr};

use crate::scheduler::{ConfigError, IoRequest, Pid, ProcessDescriptor, Tick};

/// Deterministic xorshift64* generator.
#[derive(Clone, Debug)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// A zero seed is remapped to a non-zero constant to avoid the xorshift
    /// lockup state.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform value in `[lo, hi]`.
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        debug_assert!(lo <= hi);
        let span = hi - lo + 1;
        lo + self.next_u64() % span
    }

    /// Index into `weights`, chosen proportionally to each weight.
    pub fn weighted(&mut self, weights: &[u64]) -> usize {
        let total: u64 = weights.iter().sum();
        debug_assert!(total > 0);
        let mut roll = self.next_u64() % total;
        for (index, &weight) in weights.iter().enumerate() {
            if roll < weight {
                return index;
            }
            roll -= weight;
        }
        weights.len() - 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkloadKind {
    CpuBound,
    IoBound,
    Mixed,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 3] = [
        WorkloadKind::CpuBound,
        WorkloadKind::IoBound,
        WorkloadKind::Mixed,
    ];
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkloadKind::CpuBound => "CPU-bound",
            WorkloadKind::IoBound => "IO-bound",
            WorkloadKind::Mixed => "Mixed-bound",
        })
    }
}

impl FromStr for WorkloadKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" | "cpu-bound" => Ok(WorkloadKind::CpuBound),
            "io" | "io-bound" => Ok(WorkloadKind::IoBound),
            "mixed" | "mixed-bound" => Ok(WorkloadKind::Mixed),
            _ => Err(ConfigError::UnknownWorkload { name: s.to_owned() }),
        }
    }
}

const COUNT: (u64, u64) = (50, 100);
const ARRIVAL: (u64, u64) = (0, 50);
const PRIORITY: (u64, u64) = (1, 5);
const CPU_BURST: (u64, u64) = (80, 120);
const IO_BURST: (u64, u64) = (5, 20);

/// Shape of the I/O schedule of an I/O-heavy process.
struct IoProfile {
    /// Weights for having 0, 1 or 2 I/O requests.
    count_weights: [u64; 3],
    wait: (u64, u64),
}

const IO_BOUND_PROFILE: IoProfile = IoProfile {
    count_weights: [20, 50, 30],
    wait: (1, 10),
};

const MIXED_IO_PROFILE: IoProfile = IoProfile {
    count_weights: [30, 50, 20],
    wait: (3, 5),
};

/// Generates a workload of `count` processes, or a random 50..=100 when
/// `count` is `None`. Pids are assigned from 1 in generation order.
pub fn generate(kind: WorkloadKind, count: Option<usize>, rng: &mut SimRng) -> Vec<ProcessDescriptor> {
    let count = count.unwrap_or_else(|| rng.range_inclusive(COUNT.0, COUNT.1) as usize);

    (1..=count as Pid)
        .map(|pid| {
            let arrival = rng.range_inclusive(ARRIVAL.0, ARRIVAL.1);
            let priority = rng.range_inclusive(PRIORITY.0, PRIORITY.1) as i32;
            let io_profile = match kind {
                WorkloadKind::CpuBound => None,
                WorkloadKind::IoBound => Some(&IO_BOUND_PROFILE),
                WorkloadKind::Mixed if rng.weighted(&[50, 50]) == 0 => None,
                WorkloadKind::Mixed => Some(&MIXED_IO_PROFILE),
            };

            match io_profile {
                None => {
                    let burst = rng.range_inclusive(CPU_BURST.0, CPU_BURST.1);
                    ProcessDescriptor::with_priority(pid, arrival, burst, priority)
                }
                Some(profile) => {
                    let burst = rng.range_inclusive(IO_BURST.0, IO_BURST.1);
                    let mut descriptor =
                        ProcessDescriptor::with_priority(pid, arrival, burst, priority);
                    descriptor.io = io_schedule(profile, burst, rng);
                    descriptor
                }
            }
        })
        .collect()
}

fn io_schedule(profile: &IoProfile, burst: Tick, rng: &mut SimRng) -> Vec<IoRequest> {
    let requests = rng.weighted(&profile.count_weights);
    let mut offsets: Vec<Tick> = (0..requests)
        .map(|_| rng.range_inclusive(2, burst - 2))
        .collect();
    offsets.sort_unstable();
    offsets.dedup();

    offsets
        .into_iter()
        .map(|offset| IoRequest::new(offset, rng.range_inclusive(profile.wait.0, profile.wait.1)))
        .collect()
}

/// Parses a workload file.
///
/// Lines starting with `#` and blank lines are ignored. Every other line is
/// `pid priority burst arrival [offset:wait ...]`.
pub fn parse(contents: &str) -> Result<Vec<ProcessDescriptor>, ConfigError> {
    let mut workload = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = |detail: String| ConfigError::MalformedWorkload {
            line: index + 1,
            detail,
        };

        let mut fields = line.split_whitespace();
        let mut number = |name: &str| -> Result<i64, ConfigError> {
            let field = fields
                .next()
                .ok_or_else(|| malformed(format!("missing {name}")))?;
            field
                .parse()
                .map_err(|_| malformed(format!("invalid {name} `{field}`")))
        };
        let pid = number("pid")?;
        let priority = number("priority")?;
        let burst = number("burst")?;
        let arrival = number("arrival")?;

        let pid = Pid::try_from(pid).map_err(|_| malformed(format!("invalid pid `{pid}`")))?;
        let burst =
            Tick::try_from(burst).map_err(|_| malformed(format!("negative burst `{burst}`")))?;
        let arrival = Tick::try_from(arrival)
            .map_err(|_| malformed(format!("negative arrival `{arrival}`")))?;
        let priority = i32::try_from(priority)
            .map_err(|_| malformed(format!("priority `{priority}` out of range")))?;

        let mut descriptor = ProcessDescriptor::with_priority(pid, arrival, burst, priority);
        for field in fields {
            let request = field
                .split_once(':')
                .and_then(|(offset, wait)| Some(IoRequest::new(offset.parse().ok()?, wait.parse().ok()?)))
                .ok_or_else(|| malformed(format!("invalid I/O request `{field}`")))?;
            descriptor.io.push(request);
        }
        descriptor.validate()?;
        workload.push(descriptor);
    }
    Ok(workload)
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<ProcessDescriptor>, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}
