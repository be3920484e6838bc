//! Scheduling metrics derived from a finished run.

use crate::scheduler::{Pid, Process, SimOutcome, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessMetrics {
    pub pid: Pid,
    pub arrival_time: Tick,
    pub burst_time: Tick,
    pub start_time: Tick,
    pub finish_time: Tick,
    pub response_time: i64,
    /// Turnaround minus burst. Signed because the last-tick finish convention
    /// can make it -1 for a process that never waited.
    pub waiting_time: i64,
    pub turnaround_time: i64,
}

impl ProcessMetrics {
    /// `None` for a process that never started or never finished.
    pub fn of(process: &Process) -> Option<Self> {
        let start_time = process.start_time()?;
        let finish_time = process.finish_time()?;
        let arrival_time = process.arrival_time();
        let burst_time = process.burst_time();

        let turnaround_time = finish_time as i64 - arrival_time as i64;
        Some(Self {
            pid: process.pid(),
            arrival_time,
            burst_time,
            start_time,
            finish_time,
            response_time: start_time as i64 - arrival_time as i64,
            waiting_time: turnaround_time - burst_time as i64,
            turnaround_time,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Summary {
    pub processes: usize,
    pub avg_response: f64,
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
    /// Processes per tick. `None` when nothing was simulated.
    pub throughput: Option<f64>,
    pub completion_time: Tick,
}

impl Summary {
    pub fn from_metrics(metrics: &[ProcessMetrics], completion_time: Tick) -> Self {
        let count = metrics.len();
        if count == 0 {
            return Self {
                completion_time,
                ..Self::default()
            };
        }

        let average = |field: fn(&ProcessMetrics) -> i64| {
            metrics.iter().map(field).sum::<i64>() as f64 / count as f64
        };
        Self {
            processes: count,
            avg_response: average(|m| m.response_time),
            avg_waiting: average(|m| m.waiting_time),
            avg_turnaround: average(|m| m.turnaround_time),
            throughput: (completion_time > 0).then(|| count as f64 / completion_time as f64),
            completion_time,
        }
    }
}

/// Per-process metrics and the aggregate summary for one run.
pub fn evaluate(outcome: &SimOutcome) -> (Vec<ProcessMetrics>, Summary) {
    let metrics: Vec<_> = outcome
        .processes
        .iter()
        .filter_map(ProcessMetrics::of)
        .collect();
    let summary = Summary::from_metrics(&metrics, outcome.completion_time);
    (metrics, summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pid: Pid, arrival: Tick, burst: Tick, start: Tick, finish: Tick) -> ProcessMetrics {
        let turnaround = (finish - arrival) as i64;
        ProcessMetrics {
            pid,
            arrival_time: arrival,
            burst_time: burst,
            start_time: start,
            finish_time: finish,
            response_time: (start - arrival) as i64,
            waiting_time: turnaround - burst as i64,
            turnaround_time: turnaround,
        }
    }

    #[test]
    fn averages_and_throughput() {
        let all = [metrics(1, 0, 5, 0, 5), metrics(2, 0, 3, 5, 8), metrics(3, 0, 8, 8, 16)];
        let summary = Summary::from_metrics(&all, 16);
        assert_eq!(summary.processes, 3);
        assert!((summary.avg_response - 13.0 / 3.0).abs() < 1e-9);
        assert!((summary.avg_waiting - 13.0 / 3.0).abs() < 1e-9);
        assert!((summary.avg_turnaround - 29.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.throughput, Some(3.0 / 16.0));
    }

    #[test]
    fn empty_run_has_no_throughput() {
        let summary = Summary::from_metrics(&[], 0);
        assert_eq!(summary.processes, 0);
        assert_eq!(summary.throughput, None);
        assert_eq!(summary.avg_waiting, 0.0);
    }

    #[test]
    fn unfinished_process_has_no_metrics() {
        assert_eq!(ProcessMetrics::of(&Process::new(1, 4)), None);
    }
}
