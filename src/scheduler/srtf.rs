use super::{dequeue, enqueue, preemptive_select, Pid, Process, ProcessTable, Scheduler, Tick};
use std::collections::VecDeque;

/// Shortest remaining time first, preemptive.
#[derive(Debug, Default)]
pub struct SrtfScheduler {
    ready: VecDeque<Pid>,
}

impl SrtfScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for SrtfScheduler {
    const NAME: &'static str = "SRTF Scheduler";

    fn add_process(&mut self, process: &Process) {
        enqueue(&mut self.ready, process.pid());
    }

    fn remove_process(&mut self, process: &Process) {
        dequeue(&mut self.ready, process.pid());
    }

    fn schedule(
        &mut self,
        running: Option<Pid>,
        processes: &ProcessTable,
        _time: Tick,
    ) -> Option<Pid> {
        preemptive_select(&mut self.ready, running, processes, Process::remaining_time)
    }
}
