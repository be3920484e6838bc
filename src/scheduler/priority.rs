use super::{dequeue, enqueue, preemptive_select, Pid, Process, ProcessTable, Scheduler, Tick};
use std::collections::VecDeque;

/// Preemptive priority scheduling. A lower value means higher precedence.
#[derive(Debug, Default)]
pub struct PriorityScheduler {
    ready: VecDeque<Pid>,
}

impl PriorityScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for PriorityScheduler {
    const NAME: &'static str = "Priority Scheduler";

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
        // Find the ready process with the lowest priority value
        preemptive_select(&mut self.ready, running, processes, Process::priority)
    }
}
