use super::error::{ConfigError, IllegalTransition};
use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

pub type Pid = u32;
pub type Tick = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl ProcessState {
    pub fn can_become(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (New, Ready)
                | (Ready, Running)
                | (Running, Ready)
                | (Running, Waiting)
                | (Waiting, Ready)
                | (Running, Terminated)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Terminated => "TERMINATED",
        })
    }
}

/// One I/O request: block once `offset` ticks of CPU time have been consumed,
/// then wait `duration` ticks before becoming ready again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoRequest {
    pub offset: Tick,
    pub duration: Tick,
}

impl IoRequest {
    pub fn new(offset: Tick, duration: Tick) -> Self {
        Self { offset, duration }
    }
}

/// Static description of a process, as produced by a workload generator or
/// loaded from a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub pid: Pid,
    pub priority: i32,
    pub burst_time: Tick,
    pub arrival_time: Tick,
    pub io: Vec<IoRequest>,
}

impl ProcessDescriptor {
    pub fn new(pid: Pid, arrival_time: Tick, burst_time: Tick) -> Self {
        Self::with_priority(pid, arrival_time, burst_time, Process::DEFAULT_PRIORITY)
    }

    pub fn with_priority(pid: Pid, arrival_time: Tick, burst_time: Tick, priority: i32) -> Self {
        Self {
            pid,
            priority,
            burst_time,
            arrival_time,
            io: Vec::new(),
        }
    }

    pub fn io(mut self, offset: Tick, duration: Tick) -> Self {
        self.io.push(IoRequest::new(offset, duration));
        self
    }

    /// Checks the burst and the I/O schedule. Offsets count consumed CPU time,
    /// so they must be strictly increasing and inside `[1, burst_time)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.burst_time == 0 {
            return Err(ConfigError::ZeroBurst { pid: self.pid });
        }

        let mut previous = 0;
        for request in &self.io {
            if request.offset == 0 || request.offset >= self.burst_time {
                return Err(ConfigError::IoOffsetOutOfRange {
                    pid: self.pid,
                    offset: request.offset,
                    burst: self.burst_time,
                });
            }
            if request.offset <= previous {
                return Err(ConfigError::IoOffsetNotIncreasing {
                    pid: self.pid,
                    offset: request.offset,
                    previous,
                });
            }
            previous = request.offset;
        }
        Ok(())
    }
}

/// Outcome of one tick spent waiting on I/O.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoProgress {
    Pending,
    Complete,
}

#[derive(Clone, Debug)]
pub struct Process {
    pid: Pid,
    priority: i32,
    arrival_time: Tick,
    burst_time: Tick,

    state: ProcessState,
    remaining_time: Tick,
    start_time: Option<Tick>,
    finish_time: Option<Tick>,
    io: VecDeque<IoRequest>,
}

impl Process {
    pub const DEFAULT_PRIORITY: i32 = 0;

    pub fn new(pid: Pid, burst_time: Tick) -> Self {
        Process::arriving(pid, 0, burst_time)
    }

    pub fn arriving(pid: Pid, arrival_time: Tick, burst_time: Tick) -> Self {
        Process::with_priority(pid, arrival_time, burst_time, Process::DEFAULT_PRIORITY)
    }

    pub fn with_priority(pid: Pid, arrival_time: Tick, burst_time: Tick, priority: i32) -> Self {
        Self {
            pid,
            priority,
            arrival_time,
            burst_time,
            state: ProcessState::New,
            remaining_time: burst_time,
            start_time: None,
            finish_time: None,
            io: VecDeque::new(),
        }
    }

    pub fn from_descriptor(descriptor: &ProcessDescriptor) -> Result<Self, ConfigError> {
        descriptor.validate()?;
        let mut process = Process::with_priority(
            descriptor.pid,
            descriptor.arrival_time,
            descriptor.burst_time,
            descriptor.priority,
        );
        process.io = descriptor.io.iter().copied().collect();
        Ok(process)
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn arrival_time(&self) -> Tick {
        self.arrival_time
    }

    pub fn burst_time(&self) -> Tick {
        self.burst_time
    }

    pub fn remaining_time(&self) -> Tick {
        self.remaining_time
    }

    pub fn cpu_consumed(&self) -> Tick {
        self.burst_time - self.remaining_time
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn start_time(&self) -> Option<Tick> {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<Tick> {
        self.finish_time
    }

    pub fn pending_io(&self) -> impl Iterator<Item = &IoRequest> {
        self.io.iter()
    }

    pub fn is_ready(&self) -> bool {
        self.state == ProcessState::Ready
    }

    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    pub fn is_waiting(&self) -> bool {
        self.state == ProcessState::Waiting
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ProcessState::Terminated
    }

    /// Ready, or still holding the CPU from the previous tick.
    pub fn is_runnable(&self) -> bool {
        self.is_ready() || self.is_running()
    }

    pub(crate) fn transition(&mut self, next: ProcessState) -> Result<(), IllegalTransition> {
        if !self.state.can_become(next) {
            return Err(IllegalTransition {
                pid: self.pid,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Puts the process on the CPU for `time`. A process that is already
    /// running just continues.
    pub(crate) fn dispatch(&mut self, time: Tick) -> Result<(), IllegalTransition> {
        if !self.is_running() {
            self.transition(ProcessState::Running)?;
        }
        self.start_time.get_or_insert(time);
        Ok(())
    }

    /// Consumes one tick of CPU time. Returns false if nothing was left.
    pub(crate) fn run_tick(&mut self) -> bool {
        match self.remaining_time.checked_sub(1) {
            Some(remaining) => {
                self.remaining_time = remaining;
                true
            }
            None => false,
        }
    }

    /// True when the head of the I/O schedule is due at the current
    /// consumed CPU time.
    pub(crate) fn io_due(&self) -> bool {
        self.io
            .front()
            .is_some_and(|request| request.offset == self.cpu_consumed())
    }

    /// Advances the head I/O wait by one tick. The head entry is popped on the
    /// tick its remaining wait is already zero.
    pub(crate) fn tick_io(&mut self) -> Option<IoProgress> {
        let head = self.io.front_mut()?;
        if head.duration == 0 {
            self.io.pop_front();
            Some(IoProgress::Complete)
        } else {
            head.duration -= 1;
            Some(IoProgress::Pending)
        }
    }

    pub(crate) fn terminate(&mut self, finish_time: Tick) -> Result<(), IllegalTransition> {
        self.transition(ProcessState::Terminated)?;
        self.finish_time = Some(finish_time);
        Ok(())
    }
}

/// All processes of one run, in workload order, addressable by pid.
#[derive(Clone, Debug, Default)]
pub struct ProcessTable {
    processes: Vec<Process>,
    index: HashMap<Pid, usize>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: &[ProcessDescriptor]) -> Result<Self, ConfigError> {
        let mut table = ProcessTable::new();
        for descriptor in descriptors {
            table.insert(Process::from_descriptor(descriptor)?)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, process: Process) -> Result<(), ConfigError> {
        let pid = process.pid();
        if self.index.contains_key(&pid) {
            return Err(ConfigError::DuplicatePid { pid });
        }
        self.index.insert(pid, self.processes.len());
        self.processes.push(process);
        Ok(())
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.index.get(&pid).map(|&slot| &self.processes[slot])
    }

    pub(crate) fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.index.get(&pid).map(|&slot| &mut self.processes[slot])
    }

    pub(crate) fn slot_mut(&mut self, slot: usize) -> &mut Process {
        &mut self.processes[slot]
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    pub fn running_count(&self) -> usize {
        self.processes.iter().filter(|p| p.is_running()).count()
    }

    pub fn active_count(&self) -> usize {
        self.processes.iter().filter(|p| !p.is_terminated()).count()
    }

    pub fn into_processes(self) -> Vec<Process> {
        self.processes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lifecycle_edges_are_legal() {
        let mut process = Process::new(1, 3);
        assert!(process.transition(ProcessState::Running).is_err());
        process.transition(ProcessState::Ready).unwrap();
        process.dispatch(4).unwrap();
        process.dispatch(5).unwrap();
        assert_eq!(process.start_time(), Some(4));
        assert!(process.transition(ProcessState::New).is_err());
        process.transition(ProcessState::Waiting).unwrap();
        assert!(process.terminate(9).is_err());
        assert_eq!(process.finish_time(), None);
    }

    #[test]
    fn io_head_is_consumed_once_its_wait_elapses() {
        let descriptor = ProcessDescriptor::new(7, 0, 6).io(3, 2);
        let mut process = Process::from_descriptor(&descriptor).unwrap();
        for _ in 0..3 {
            assert!(!process.io_due());
            assert!(process.run_tick());
        }
        assert!(process.io_due());
        assert_eq!(process.tick_io(), Some(IoProgress::Pending));
        assert_eq!(process.tick_io(), Some(IoProgress::Pending));
        assert_eq!(process.tick_io(), Some(IoProgress::Complete));
        assert_eq!(process.tick_io(), None);
        assert!(!process.io_due());
    }

    #[test]
    fn remaining_time_never_goes_negative() {
        let mut process = Process::new(1, 1);
        assert!(process.run_tick());
        assert!(!process.run_tick());
        assert_eq!(process.remaining_time(), 0);
    }

    #[test]
    fn descriptor_validation() {
        assert!(matches!(
            ProcessDescriptor::new(1, 0, 0).validate(),
            Err(ConfigError::ZeroBurst { pid: 1 })
        ));
        assert!(matches!(
            ProcessDescriptor::new(2, 0, 5).io(5, 1).validate(),
            Err(ConfigError::IoOffsetOutOfRange { offset: 5, .. })
        ));
        assert!(matches!(
            ProcessDescriptor::new(3, 0, 5).io(0, 1).validate(),
            Err(ConfigError::IoOffsetOutOfRange { offset: 0, .. })
        ));
        assert!(matches!(
            ProcessDescriptor::new(4, 0, 9).io(3, 1).io(3, 2).validate(),
            Err(ConfigError::IoOffsetNotIncreasing { offset: 3, previous: 3, .. })
        ));
        assert!(ProcessDescriptor::new(5, 2, 9).io(1, 0).io(8, 4).validate().is_ok());
    }

    #[test]
    fn table_rejects_duplicate_pids() {
        let workload = [ProcessDescriptor::new(1, 0, 2), ProcessDescriptor::new(1, 3, 4)];
        assert!(matches!(
            ProcessTable::from_descriptors(&workload),
            Err(ConfigError::DuplicatePid { pid: 1 })
        ));
    }
}
