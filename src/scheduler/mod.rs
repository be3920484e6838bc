mod display;
mod error;
mod fcfs;
mod mlfq;
mod priority;
mod process;
mod replay;
mod round_robin;
mod simulator;
mod srtf;

use std::collections::VecDeque;

pub use error::{ConfigError, IllegalTransition, SimError};
pub use fcfs::FcfsScheduler;
pub use mlfq::MlfqScheduler;
pub use priority::PriorityScheduler;
pub use process::{
    IoProgress, IoRequest, Pid, Process, ProcessDescriptor, ProcessState, ProcessTable, Tick,
};
pub use replay::{PolicyRun, ReplayRunner};
pub use round_robin::RoundRobinScheduler;
pub use simulator::{simulate, FinishConvention, SimOutcome, SimStats, Simulator, SimulatorConfig};
pub use srtf::SrtfScheduler;

/// A CPU scheduling policy.
///
/// Policies keep their own ready bookkeeping as pids and only ever read
/// processes. The simulator owns every state change.
pub trait Scheduler {
    const NAME: &'static str;

    /// Admits a process that just became ready. Admitting twice is a no-op.
    fn add_process(&mut self, process: &Process);

    /// Forgets a process. Safe to call for processes that are not tracked.
    fn remove_process(&mut self, process: &Process);

    /// Picks the process for this tick. `running` is the process that held
    /// the CPU during the previous tick; returning it means it continues.
    /// Returning anything else preempts it, in which case the policy must
    /// already have re-queued it.
    fn schedule(&mut self, running: Option<Pid>, processes: &ProcessTable, time: Tick)
        -> Option<Pid>;

    fn on_tick_end(&mut self, _running: Option<&Process>, _time: Tick) {}

    /// The running process just blocked on I/O.
    fn on_process_waiting(&mut self) {}
}

pub(crate) fn enqueue(queue: &mut VecDeque<Pid>, pid: Pid) {
    if !queue.contains(&pid) {
        queue.push_back(pid);
    }
}

pub(crate) fn dequeue(queue: &mut VecDeque<Pid>, pid: Pid) -> bool {
    match queue.iter().position(|&queued| queued == pid) {
        Some(index) => queue.remove(index).is_some(),
        None => false,
    }
}

/// Removes and returns the first runnable pid in FIFO order.
pub(crate) fn take_first_runnable(
    queue: &mut VecDeque<Pid>,
    processes: &ProcessTable,
) -> Option<Pid> {
    let index = queue
        .iter()
        .position(|&pid| processes.get(pid).is_some_and(Process::is_runnable))?;
    queue.remove(index)
}

/// The incumbent, if it still holds the CPU.
pub(crate) fn still_running(running: Option<Pid>, processes: &ProcessTable) -> Option<Pid> {
    running.filter(|&pid| processes.get(pid).is_some_and(Process::is_running))
}

/// Preemptive selection shared by SRTF and priority scheduling: the ready
/// process with the smallest key wins, ties go to the earliest queued, and
/// the incumbent is only displaced by a strictly smaller key.
pub(crate) fn preemptive_select<K, F>(
    queue: &mut VecDeque<Pid>,
    running: Option<Pid>,
    processes: &ProcessTable,
    key: F,
) -> Option<Pid>
where
    K: Ord,
    F: Fn(&Process) -> K,
{
    let incumbent = still_running(running, processes).and_then(|pid| processes.get(pid));
    let candidate = queue
        .iter()
        .filter_map(|&pid| processes.get(pid))
        .filter(|process| process.is_ready())
        .min_by_key(|process| key(*process));

    match (incumbent, candidate) {
        (None, None) => None,
        (Some(incumbent), None) => Some(incumbent.pid()),
        (Some(incumbent), Some(candidate)) if key(candidate) >= key(incumbent) => {
            Some(incumbent.pid())
        }
        (incumbent, Some(candidate)) => {
            let chosen = candidate.pid();
            if let Some(incumbent) = incumbent {
                log::debug!("pid {} preempts pid {}", chosen, incumbent.pid());
                enqueue(queue, incumbent.pid());
            }
            dequeue(queue, chosen);
            Some(chosen)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Builds a table where the given pids are already ready.
    pub fn ready_table(processes: Vec<Process>) -> ProcessTable {
        let mut table = ProcessTable::new();
        for mut process in processes {
            process.transition(ProcessState::Ready).unwrap();
            table.insert(process).unwrap();
        }
        table
    }

    pub fn set_running(table: &mut ProcessTable, pid: Pid) {
        table.get_mut(pid).unwrap().dispatch(0).unwrap();
    }

    pub fn set_ready(table: &mut ProcessTable, pid: Pid) {
        table
            .get_mut(pid)
            .unwrap()
            .transition(ProcessState::Ready)
            .unwrap();
    }
}
