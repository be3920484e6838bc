use super::{
    dequeue, enqueue, still_running, take_first_runnable, Pid, Process, ProcessTable, Scheduler,
    Tick,
};
use std::collections::VecDeque;

/// First come, first served. Never preempts.
#[derive(Debug, Default)]
pub struct FcfsScheduler {
    ready: VecDeque<Pid>,
}

impl FcfsScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for FcfsScheduler {
    const NAME: &'static str = "FCFS Scheduler";

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
        still_running(running, processes).or_else(|| take_first_runnable(&mut self.ready, processes))
    }
}
