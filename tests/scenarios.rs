//! End-to-end runs of small hand-checked workloads.

use cpu_sched_sim::{
    config::PolicySpec,
    metrics,
    scheduler::{
        simulate, FcfsScheduler, FinishConvention, MlfqScheduler, Pid, PriorityScheduler,
        Process, ProcessDescriptor, ProcessState, RoundRobinScheduler, SimOutcome,
        SimulatorConfig, SrtfScheduler, Tick,
    },
};

fn last_tick() -> SimulatorConfig {
    SimulatorConfig {
        finish_convention: FinishConvention::LastTick,
        ..SimulatorConfig::default()
    }
}

fn process(outcome: &SimOutcome, pid: Pid) -> &Process {
    outcome
        .processes
        .iter()
        .find(|p| p.pid() == pid)
        .expect("pid in outcome")
}

fn finish_times(outcome: &SimOutcome) -> Vec<Tick> {
    outcome
        .processes
        .iter()
        .map(|p| p.finish_time().expect("finished"))
        .collect()
}

fn timeline(slots: &[Pid]) -> Vec<Option<Pid>> {
    slots.iter().map(|&pid| (pid != 0).then_some(pid)).collect()
}

#[test]
fn fcfs_runs_in_arrival_order() {
    let workload = [
        ProcessDescriptor::new(1, 0, 5),
        ProcessDescriptor::new(2, 0, 3),
        ProcessDescriptor::new(3, 0, 8),
    ];

    let outcome = simulate(FcfsScheduler::new(), &workload, SimulatorConfig::default()).unwrap();
    assert_eq!(outcome.completion_time, 16);
    assert_eq!(finish_times(&outcome), [5, 8, 16]);
    assert_eq!(outcome.stats.preemptions, 0);
    assert!(outcome
        .processes
        .iter()
        .all(|p| p.state() == ProcessState::Terminated && p.remaining_time() == 0));

    let outcome = simulate(FcfsScheduler::new(), &workload, last_tick()).unwrap();
    assert_eq!(outcome.completion_time, 16);
    assert_eq!(finish_times(&outcome), [4, 7, 15]);
}

#[test]
fn srtf_preempts_for_a_shorter_arrival() {
    let workload = [ProcessDescriptor::new(1, 0, 10), ProcessDescriptor::new(2, 2, 3)];

    let outcome = simulate(SrtfScheduler::new(), &workload, SimulatorConfig::default()).unwrap();
    assert_eq!(
        outcome.timeline,
        timeline(&[1, 1, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1])
    );
    assert_eq!(outcome.stats.preemptions, 1);
    assert_eq!(process(&outcome, 2).start_time(), Some(2));
    assert_eq!(process(&outcome, 2).finish_time(), Some(5));
    assert_eq!(process(&outcome, 1).finish_time(), Some(13));

    let outcome = simulate(SrtfScheduler::new(), &workload, last_tick()).unwrap();
    assert_eq!(process(&outcome, 1).finish_time(), Some(12));
    assert_eq!(outcome.completion_time, 13);
}

#[test]
fn round_robin_interleaves_by_quantum() {
    let workload = [ProcessDescriptor::new(1, 0, 4), ProcessDescriptor::new(2, 0, 4)];

    let outcome = simulate(
        RoundRobinScheduler::new(2).unwrap(),
        &workload,
        SimulatorConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.completion_time, 8);
    assert_eq!(outcome.timeline, timeline(&[1, 1, 2, 2, 1, 1, 2, 2]));

    let (metrics, _) = metrics::evaluate(&outcome);
    let responses: Vec<_> = metrics.iter().map(|m| m.response_time).collect();
    assert_eq!(responses, [0, 2]);
}

#[test]
fn io_wait_leaves_the_cpu_idle() {
    let workload = [ProcessDescriptor::new(1, 0, 6).io(3, 2)];

    let outcome = simulate(FcfsScheduler::new(), &workload, last_tick()).unwrap();
    assert_eq!(outcome.timeline, timeline(&[1, 1, 1, 0, 0, 1, 1, 1]));
    assert_eq!(outcome.completion_time, 8);
    assert_eq!(process(&outcome, 1).finish_time(), Some(7));
    assert_eq!(outcome.stats.io_blocks, 1);
    assert_eq!(outcome.stats.idle_ticks, 2);
    assert_eq!(process(&outcome, 1).pending_io().count(), 0);

    let outcome = simulate(FcfsScheduler::new(), &workload, SimulatorConfig::default()).unwrap();
    assert_eq!(process(&outcome, 1).finish_time(), Some(8));
}

#[test]
fn round_robin_with_io() {
    let workload = [ProcessDescriptor::new(1, 0, 4).io(1, 1), ProcessDescriptor::new(2, 0, 3)];

    let outcome = simulate(
        RoundRobinScheduler::new(2).unwrap(),
        &workload,
        SimulatorConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.timeline, timeline(&[1, 2, 2, 1, 1, 2, 1]));
    assert_eq!(outcome.completion_time, 7);
    assert_eq!(outcome.stats.io_blocks, 1);
    assert_eq!(outcome.stats.preemptions, 2);
    assert_eq!(outcome.stats.dispatches, 5);
    assert_eq!(outcome.stats.context_switches, 4);
}

#[test]
fn priority_preempts_and_breaks_ties_by_queue_order() {
    let workload = [
        ProcessDescriptor::with_priority(1, 0, 4, 3),
        ProcessDescriptor::with_priority(2, 1, 2, 1),
        ProcessDescriptor::with_priority(3, 1, 1, 3),
    ];

    let outcome = simulate(PriorityScheduler::new(), &workload, SimulatorConfig::default()).unwrap();
    assert_eq!(outcome.timeline, timeline(&[1, 2, 2, 3, 1, 1, 1]));
    assert_eq!(outcome.completion_time, 7);
}

#[test]
fn mlfq_demotes_through_the_levels() {
    let workload = [ProcessDescriptor::new(1, 0, 4), ProcessDescriptor::new(2, 0, 4)];

    let outcome = simulate(
        MlfqScheduler::new(3, 1).unwrap(),
        &workload,
        SimulatorConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.timeline, timeline(&[1, 2, 1, 1, 2, 2, 1, 2]));
    assert_eq!(outcome.completion_time, 8);
}

#[test]
fn mlfq_allotment_doubles_until_the_last_level() {
    let workload = [ProcessDescriptor::new(1, 0, 30), ProcessDescriptor::new(2, 0, 30)];

    let outcome = simulate(
        MlfqScheduler::new(3, 2).unwrap(),
        &workload,
        SimulatorConfig::default(),
    )
    .unwrap();

    let mut stints: Vec<(Pid, usize)> = Vec::new();
    for pid in outcome.timeline.iter().flatten() {
        match stints.last_mut() {
            Some((last, len)) if *last == *pid => *len += 1,
            _ => stints.push((*pid, 1)),
        }
    }
    assert_eq!(
        stints,
        [
            (1, 2),
            (2, 2),
            (1, 4),
            (2, 4),
            (1, 8),
            (2, 8),
            (1, 8),
            (2, 8),
            (1, 8),
            (2, 8),
        ]
    );
    assert_eq!(outcome.stats.preemptions, 8);
    assert_eq!(outcome.completion_time, 60);
}

#[test]
fn mlfq_without_boost_starves_the_bottom_level() {
    // pid 1 sinks to the last level; a one-tick job arriving every tick keeps
    // level 0 busy until tick 15
    let mut workload = vec![ProcessDescriptor::new(1, 0, 10)];
    workload.extend((2..=15).map(|pid| ProcessDescriptor::new(pid, pid as Tick - 1, 1)));

    let outcome = simulate(
        MlfqScheduler::new(2, 1).unwrap(),
        &workload,
        SimulatorConfig::default(),
    )
    .unwrap();
    let boosted = simulate(
        MlfqScheduler::new(2, 1).unwrap().with_priority_boost(4).unwrap(),
        &workload,
        SimulatorConfig::default(),
    )
    .unwrap();

    let ran_by = |outcome: &SimOutcome, tick: usize| {
        outcome.timeline[..tick]
            .iter()
            .filter(|&&slot| slot == Some(1))
            .count()
    };
    assert_eq!(ran_by(&outcome, 15), 1);
    assert!(ran_by(&boosted, 15) > 1);
    assert_eq!(outcome.completion_time, 24);
    assert_eq!(boosted.completion_time, 24);
}

#[test]
fn processes_arriving_later_leave_the_cpu_idle() {
    let workload = [ProcessDescriptor::new(1, 3, 2)];
    let outcome = simulate(SrtfScheduler::new(), &workload, SimulatorConfig::default()).unwrap();
    assert_eq!(outcome.timeline, timeline(&[0, 0, 0, 1, 1]));
    assert_eq!(process(&outcome, 1).start_time(), Some(3));
    assert_eq!(outcome.stats.idle_ticks, 3);
}

#[test]
fn every_default_policy_handles_an_empty_workload() {
    for policy in PolicySpec::defaults() {
        let outcome = policy.simulate(&[], SimulatorConfig::default()).unwrap();
        assert_eq!(outcome.completion_time, 0, "{policy}");
        let (metrics, summary) = metrics::evaluate(&outcome);
        assert!(metrics.is_empty());
        assert_eq!(summary.throughput, None);
    }
}
