use super::{
    IoProgress, Pid, Process, ProcessDescriptor, ProcessState, ProcessTable, Scheduler, SimError,
    Tick,
};
use log::{debug, info, trace};

/// Which tick is recorded as a process's finish time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FinishConvention {
    /// The tick after the last executed tick. The latest finish time equals
    /// the completion time.
    #[default]
    NextTick,
    /// The tick in which the last unit of CPU time was executed.
    LastTick,
}

#[derive(Clone, Copy, Debug)]
pub struct SimulatorConfig {
    pub finish_convention: FinishConvention,
    /// Abort once this many ticks have elapsed. `None` runs until every
    /// process terminates, however long that takes.
    pub tick_limit: Option<Tick>,
    pub check_invariants: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            finish_convention: FinishConvention::NextTick,
            tick_limit: None,
            check_invariants: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Ticks in which some process held the CPU.
    pub busy_ticks: Tick,
    pub idle_ticks: Tick,
    /// Ticks that started a new stint on the CPU.
    pub dispatches: u64,
    /// Dispatches that replaced a different process from the previous tick.
    pub context_switches: u64,
    pub preemptions: u64,
    pub io_blocks: u64,
}

#[derive(Clone, Debug)]
pub struct SimOutcome {
    pub policy: &'static str,
    pub completion_time: Tick,
    pub processes: Vec<Process>,
    /// Which process held the CPU in each tick.
    pub timeline: Vec<Option<Pid>>,
    /// State of every process during each tick, in `processes` order.
    pub states: Vec<Vec<ProcessState>>,
    pub stats: SimStats,
}

impl SimOutcome {
    /// Lifecycle state of `pid` while `tick` executed.
    pub fn state_at(&self, pid: Pid, tick: Tick) -> Option<ProcessState> {
        let slot = self.processes.iter().position(|p| p.pid() == pid)?;
        self.states.get(tick as usize)?.get(slot).copied()
    }
}

pub struct Simulator<S> {
    scheduler: S,
    config: SimulatorConfig,
    processes: ProcessTable,
    time: Tick,
    running: Option<Pid>,
    previous: Option<Pid>,
    active: usize,
    timeline: Vec<Option<Pid>>,
    states: Vec<Vec<ProcessState>>,
    stats: SimStats,
}

impl<S: Scheduler> Simulator<S> {
    pub fn new(scheduler: S, processes: ProcessTable) -> Self {
        Simulator::with_config(scheduler, processes, SimulatorConfig::default())
    }

    pub fn with_config(scheduler: S, processes: ProcessTable, config: SimulatorConfig) -> Self {
        let active = processes.active_count();
        Self {
            scheduler,
            config,
            processes,
            time: 0,
            running: None,
            previous: None,
            active,
            timeline: Vec::new(),
            states: Vec::new(),
            stats: SimStats::default(),
        }
    }

    pub fn time(&self) -> Tick {
        self.time
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn running(&self) -> Option<&Process> {
        self.running.and_then(|pid| self.processes.get(pid))
    }

    pub fn is_finished(&self) -> bool {
        self.active == 0
    }

    /// Runs until no process is active and returns the completion time along
    /// with the final state of every process.
    pub fn run(mut self) -> Result<SimOutcome, SimError> {
        while self.step()? {}

        info!(
            "{} finished {} processes at tick {}",
            S::NAME,
            self.processes.len(),
            self.time
        );
        Ok(SimOutcome {
            policy: S::NAME,
            completion_time: self.time,
            processes: self.processes.into_processes(),
            timeline: self.timeline,
            states: self.states,
            stats: self.stats,
        })
    }

    /// Advances the simulation by one tick. Returns false once every process
    /// has terminated, without consuming a tick.
    pub fn step(&mut self) -> Result<bool, SimError> {
        if self.is_finished() {
            return Ok(false);
        }
        if let Some(limit) = self.config.tick_limit {
            if self.time >= limit {
                return Err(SimError::TickLimitExceeded { limit });
            }
        }

        let time = self.time;
        trace!("tick {time}");
        self.admit_arrivals(time)?;
        self.advance_io(time)?;
        self.dispatch(time)?;
        self.record_states();
        self.execute(time)?;

        if self.config.check_invariants {
            let running = self.processes.running_count();
            if running > 1 {
                return Err(SimError::invariant(
                    time,
                    format!("{running} processes are running"),
                ));
            }
        }

        let running = self.running.and_then(|pid| self.processes.get(pid));
        self.scheduler.on_tick_end(running, time);
        self.time += 1;
        Ok(true)
    }

    fn admit_arrivals(&mut self, time: Tick) -> Result<(), SimError> {
        for slot in 0..self.processes.len() {
            let process = self.processes.slot_mut(slot);
            if process.state() != ProcessState::New || process.arrival_time() != time {
                continue;
            }
            process
                .transition(ProcessState::Ready)
                .map_err(|transition| SimError::IllegalTransition { tick: time, transition })?;
            debug!("tick {time}: pid {} arrived", process.pid());
            self.scheduler.add_process(process);
        }
        Ok(())
    }

    fn advance_io(&mut self, time: Tick) -> Result<(), SimError> {
        for slot in 0..self.processes.len() {
            let process = self.processes.slot_mut(slot);
            if !process.is_waiting() {
                continue;
            }
            match process.tick_io() {
                Some(IoProgress::Pending) => {}
                Some(IoProgress::Complete) => {
                    process
                        .transition(ProcessState::Ready)
                        .map_err(|transition| SimError::IllegalTransition {
                            tick: time,
                            transition,
                        })?;
                    debug!("tick {time}: pid {} finished I/O", process.pid());
                    self.scheduler.add_process(process);
                }
                None => {
                    return Err(SimError::invariant(
                        time,
                        format!("pid {} is waiting with no pending I/O", process.pid()),
                    ))
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, time: Tick) -> Result<(), SimError> {
        let incumbent = self.running;
        let next = self.scheduler.schedule(incumbent, &self.processes, time);

        if let Some(pid) = next {
            let process = self.processes.get(pid).ok_or_else(|| {
                SimError::invariant(time, format!("scheduler picked unknown pid {pid}"))
            })?;
            let valid = process.is_ready() || (process.is_running() && incumbent == Some(pid));
            if !valid {
                return Err(SimError::invariant(
                    time,
                    format!("scheduler picked pid {pid} in state {}", process.state()),
                ));
            }
        }

        if let Some(previous) = incumbent.filter(|&pid| next != Some(pid)) {
            if let Some(process) = self.processes.get_mut(previous) {
                if process.is_running() {
                    process
                        .transition(ProcessState::Ready)
                        .map_err(|transition| SimError::IllegalTransition {
                            tick: time,
                            transition,
                        })?;
                    debug!("tick {time}: pid {previous} preempted");
                    self.stats.preemptions += 1;
                }
            }
        }

        if let Some(pid) = next {
            if incumbent != Some(pid) {
                self.stats.dispatches += 1;
                if self.previous.is_some_and(|previous| previous != pid) {
                    self.stats.context_switches += 1;
                }
                debug!("tick {time}: dispatching pid {pid}");
            }
        }
        self.running = next;
        Ok(())
    }

    fn record_states(&mut self) {
        let running = self.running;
        let states = self
            .processes
            .iter()
            .map(|process| match running {
                Some(pid) if pid == process.pid() => ProcessState::Running,
                _ => process.state(),
            })
            .collect();
        self.states.push(states);
    }

    fn execute(&mut self, time: Tick) -> Result<(), SimError> {
        let Some(pid) = self.running else {
            self.stats.idle_ticks += 1;
            self.timeline.push(None);
            self.previous = None;
            return Ok(());
        };
        self.stats.busy_ticks += 1;
        self.timeline.push(Some(pid));
        self.previous = Some(pid);

        let finish_time = match self.config.finish_convention {
            FinishConvention::NextTick => time + 1,
            FinishConvention::LastTick => time,
        };
        let process = self
            .processes
            .get_mut(pid)
            .ok_or_else(|| SimError::invariant(time, format!("running pid {pid} vanished")))?;
        let illegal = |transition| SimError::IllegalTransition { tick: time, transition };

        process.dispatch(time).map_err(illegal)?;
        if !process.run_tick() {
            return Err(SimError::invariant(
                time,
                format!("pid {pid} ran with no remaining time"),
            ));
        }

        if process.io_due() {
            process.transition(ProcessState::Waiting).map_err(illegal)?;
            debug!(
                "tick {time}: pid {pid} blocked on I/O after {} ticks of CPU",
                process.cpu_consumed()
            );
            self.stats.io_blocks += 1;
            self.running = None;
            self.scheduler.on_process_waiting();
        } else if process.remaining_time() == 0 {
            process.terminate(finish_time).map_err(illegal)?;
            debug!("tick {time}: pid {pid} terminated");
            self.active -= 1;
            self.running = None;
            self.scheduler.remove_process(process);
        }
        Ok(())
    }
}

/// Validates a workload and runs it to completion under `scheduler`.
pub fn simulate<S: Scheduler>(
    scheduler: S,
    workload: &[ProcessDescriptor],
    config: SimulatorConfig,
) -> Result<SimOutcome, SimError> {
    let processes = ProcessTable::from_descriptors(workload)?;
    Simulator::with_config(scheduler, processes, config).run()
}
