use super::{
    dequeue, enqueue, still_running, take_first_runnable, ConfigError, Pid, Process, ProcessTable,
    Scheduler, Tick,
};
use std::collections::VecDeque;

pub struct RoundRobinScheduler {
    ready: VecDeque<Pid>,
    quantum: Tick,
    quantum_used: Tick,
}

impl RoundRobinScheduler {
    pub const DEFAULT_QUANTUM: Tick = 2;

    pub fn new(quantum: Tick) -> Result<Self, ConfigError> {
        if quantum == 0 {
            return Err(ConfigError::InvalidQuantum);
        }
        Ok(Self {
            ready: VecDeque::new(),
            quantum,
            quantum_used: 0,
        })
    }

    fn poll_process(&mut self, processes: &ProcessTable) -> Option<Pid> {
        let next = take_first_runnable(&mut self.ready, processes)?;
        self.quantum_used = 0;
        Some(next)
    }
}

impl Scheduler for RoundRobinScheduler {
    const NAME: &'static str = "Round Robin Scheduler";

    fn add_process(&mut self, process: &Process) {
        enqueue(&mut self.ready, process.pid());
    }

    fn remove_process(&mut self, process: &Process) {
        dequeue(&mut self.ready, process.pid());
        self.quantum_used = 0;
    }

    fn schedule(
        &mut self,
        running: Option<Pid>,
        processes: &ProcessTable,
        _time: Tick,
    ) -> Option<Pid> {
        if let Some(pid) = still_running(running, processes) {
            if self.quantum_used < self.quantum {
                return Some(pid);
            }
            // Quantum expired, back of the line
            enqueue(&mut self.ready, pid);
            self.quantum_used = 0;
        }
        self.poll_process(processes)
    }

    fn on_tick_end(&mut self, running: Option<&Process>, _time: Tick) {
        if running.is_some_and(Process::is_running) {
            self.quantum_used += 1;
        }
    }

    fn on_process_waiting(&mut self) {
        self.quantum_used = 0;
    }
}
