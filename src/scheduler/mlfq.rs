use super::{
    dequeue, enqueue, still_running, take_first_runnable, ConfigError, Pid, Process, ProcessTable,
    Scheduler, Tick,
};
use std::collections::{HashMap, VecDeque};

/// Multi-level feedback queue.
///
/// Level 0 is dispatched first. A process that uses up the quantum of its
/// level, `quantum_base * 2^level`, drops one level (never below the last)
/// and keeps that level across I/O waits until it terminates. Demotion is
/// monotonic unless a priority boost period is configured.
pub struct MlfqScheduler {
    queues: Vec<VecDeque<Pid>>,
    quantum_base: Tick,
    levels: HashMap<Pid, usize>,
    quantum_used: Tick,
    boost_period: Option<Tick>,
}

impl MlfqScheduler {
    pub const DEFAULT_QUEUES: usize = 3;
    pub const DEFAULT_QUANTUM_BASE: Tick = 2;

    pub fn new(num_queues: usize, quantum_base: Tick) -> Result<Self, ConfigError> {
        if num_queues == 0 {
            return Err(ConfigError::InvalidQueueCount);
        }
        if quantum_base == 0 {
            return Err(ConfigError::InvalidQuantumBase);
        }
        Ok(Self {
            queues: vec![VecDeque::new(); num_queues],
            quantum_base,
            levels: HashMap::new(),
            quantum_used: 0,
            boost_period: None,
        })
    }

    /// Every `period` ticks, lift every tracked process back to level 0.
    pub fn with_priority_boost(mut self, period: Tick) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::InvalidBoostPeriod);
        }
        self.boost_period = Some(period);
        Ok(self)
    }

    pub fn level_of(&self, pid: Pid) -> Option<usize> {
        self.levels.get(&pid).copied()
    }

    /// Ticks a process may run at `level` before it is demoted.
    pub fn allotment(&self, level: usize) -> Tick {
        let factor = 1u64.checked_shl(level as u32).unwrap_or(Tick::MAX);
        self.quantum_base.saturating_mul(factor)
    }

    fn demote(&mut self, pid: Pid, level: usize) {
        let lower = (level + 1).min(self.queues.len() - 1);
        log::debug!("pid {pid} used its level {level} quantum, moving to level {lower}");
        self.levels.insert(pid, lower);
        dequeue(&mut self.queues[level], pid);
        enqueue(&mut self.queues[lower], pid);
        self.quantum_used = 0;
    }

    fn boost(&mut self) {
        let mut lifted = VecDeque::new();
        for queue in self.queues.iter_mut() {
            lifted.extend(queue.drain(..));
        }
        self.queues[0] = lifted;
        for level in self.levels.values_mut() {
            *level = 0;
        }
    }
}

impl Scheduler for MlfqScheduler {
    const NAME: &'static str = "MLFQ Scheduler";

    fn add_process(&mut self, process: &Process) {
        let level = *self.levels.entry(process.pid()).or_insert(0);
        enqueue(&mut self.queues[level], process.pid());
    }

    fn remove_process(&mut self, process: &Process) {
        for queue in self.queues.iter_mut() {
            dequeue(queue, process.pid());
        }
        self.levels.remove(&process.pid());
        self.quantum_used = 0;
    }

    fn schedule(
        &mut self,
        running: Option<Pid>,
        processes: &ProcessTable,
        _time: Tick,
    ) -> Option<Pid> {
        if let Some(pid) = still_running(running, processes) {
            let level = self.levels.get(&pid).copied().unwrap_or(0);
            if self.quantum_used < self.allotment(level) {
                return Some(pid);
            }
            self.demote(pid, level);
        }

        let next = self
            .queues
            .iter_mut()
            .find_map(|queue| take_first_runnable(queue, processes))?;
        self.quantum_used = 0;
        Some(next)
    }

    fn on_tick_end(&mut self, running: Option<&Process>, time: Tick) {
        if running.is_some_and(Process::is_running) {
            self.quantum_used += 1;
        }
        if let Some(period) = self.boost_period {
            if (time + 1) % period == 0 {
                log::debug!("tick {time}: boosting every process to level 0");
                self.boost();
            }
        }
    }

    fn on_process_waiting(&mut self) {
        self.quantum_used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{ready_table, set_running};

    fn run_ticks(mlfq: &mut MlfqScheduler, table: &ProcessTable, pid: Pid, ticks: Tick) {
        for tick in 0..ticks {
            assert_eq!(mlfq.schedule(Some(pid), table, tick), Some(pid));
            mlfq.on_tick_end(table.get(pid), tick);
        }
    }

    #[test]
    fn rejects_degenerate_configuration() {
        assert!(matches!(
            MlfqScheduler::new(0, 2),
            Err(ConfigError::InvalidQueueCount)
        ));
        assert!(matches!(
            MlfqScheduler::new(3, 0),
            Err(ConfigError::InvalidQuantumBase)
        ));
        assert!(matches!(
            MlfqScheduler::new(3, 2).unwrap().with_priority_boost(0),
            Err(ConfigError::InvalidBoostPeriod)
        ));
    }

    #[test]
    fn allotment_doubles_per_level() {
        let mlfq = MlfqScheduler::new(4, 3).unwrap();
        assert_eq!(
            (0..4).map(|level| mlfq.allotment(level)).collect::<Vec<_>>(),
            vec![3, 6, 12, 24]
        );
        assert_eq!(mlfq.allotment(200), Tick::MAX);
    }

    #[test]
    fn demotes_after_allotment_and_stays_at_the_last_level() {
        let mut table = ready_table(vec![Process::new(1, 100), Process::new(2, 100)]);
        let mut mlfq = MlfqScheduler::new(2, 1).unwrap();
        mlfq.add_process(table.get(1).unwrap());
        mlfq.add_process(table.get(2).unwrap());

        assert_eq!(mlfq.schedule(None, &table, 0), Some(1));
        set_running(&mut table, 1);
        mlfq.on_tick_end(table.get(1), 0);

        assert_eq!(mlfq.schedule(Some(1), &table, 1), Some(2));
        assert_eq!(mlfq.level_of(1), Some(1));
        assert_eq!(mlfq.queues[1], VecDeque::from(vec![1]));

        // pid 2 is still at level 0 and runs its single tick, then both sit
        // at the last level
        crate::scheduler::testing::set_ready(&mut table, 1);
        set_running(&mut table, 2);
        mlfq.on_tick_end(table.get(2), 1);
        assert_eq!(mlfq.schedule(Some(2), &table, 2), Some(1));
        assert_eq!(mlfq.level_of(2), Some(1));

        crate::scheduler::testing::set_ready(&mut table, 2);
        set_running(&mut table, 1);
        run_ticks(&mut mlfq, &table, 1, 2);
        assert_eq!(mlfq.schedule(Some(1), &table, 4), Some(2));
        assert_eq!(mlfq.level_of(1), Some(1));
    }

    #[test]
    fn level_survives_readmission_until_removal() {
        let mut table = ready_table(vec![Process::new(1, 100)]);
        let mut mlfq = MlfqScheduler::new(3, 1).unwrap();
        mlfq.add_process(table.get(1).unwrap());
        assert_eq!(mlfq.schedule(None, &table, 0), Some(1));
        set_running(&mut table, 1);
        mlfq.on_tick_end(table.get(1), 0);
        assert_eq!(mlfq.schedule(Some(1), &table, 1), Some(1));
        assert_eq!(mlfq.level_of(1), Some(1));

        mlfq.on_process_waiting();
        mlfq.add_process(table.get(1).unwrap());
        assert_eq!(mlfq.queues[1], VecDeque::from(vec![1]));

        mlfq.remove_process(table.get(1).unwrap());
        assert_eq!(mlfq.level_of(1), None);
        assert!(mlfq.queues.iter().all(VecDeque::is_empty));
    }

    #[test]
    fn boost_lifts_everything_to_level_zero() {
        let table = ready_table(vec![Process::new(1, 100), Process::new(2, 100)]);
        let mut mlfq = MlfqScheduler::new(3, 1).unwrap().with_priority_boost(5).unwrap();
        mlfq.add_process(table.get(1).unwrap());
        mlfq.add_process(table.get(2).unwrap());
        mlfq.levels.insert(1, 2);
        mlfq.queues[0].clear();
        mlfq.queues[2].push_back(1);
        mlfq.queues[1].push_back(2);
        mlfq.levels.insert(2, 1);

        mlfq.on_tick_end(None, 3);
        assert_eq!(mlfq.level_of(1), Some(2));
        mlfq.on_tick_end(None, 4);
        assert_eq!(mlfq.level_of(1), Some(0));
        assert_eq!(mlfq.queues[0], VecDeque::from(vec![2, 1]));
    }
}
