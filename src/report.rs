//! Plain-text rendering of finished runs.

use std::io::{self, Write};

use crate::scheduler::PolicyRun;

const RULE: usize = 80;

pub fn write_banner<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "\n{}", "#".repeat(60))?;
    writeln!(out, "# {title}")?;
    writeln!(out, "{}", "#".repeat(60))
}

pub fn write_run<W: Write>(out: &mut W, run: &PolicyRun) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(RULE))?;
    writeln!(out, "Scheduler: {}", run.label)?;
    writeln!(out, "{}", "=".repeat(RULE))?;
    writeln!(
        out,
        "{:<6} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<12}",
        "PID", "Arrival", "Burst", "Start", "Finish", "Response", "Waiting", "Turnaround"
    )?;
    writeln!(out, "{}", "-".repeat(RULE))?;

    for m in &run.metrics {
        writeln!(
            out,
            "{:<6} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<12}",
            m.pid,
            m.arrival_time,
            m.burst_time,
            m.start_time,
            m.finish_time,
            m.response_time,
            m.waiting_time,
            m.turnaround_time
        )?;
    }

    let summary = &run.summary;
    let stats = &run.outcome.stats;
    let throughput = summary
        .throughput
        .map_or_else(|| "n/a".to_owned(), |t| format!("{t:.4}"));

    writeln!(out, "{}", "-".repeat(RULE))?;
    writeln!(out, "{:<30} {:<20}", "Metric", "Value")?;
    writeln!(out, "{}", "-".repeat(RULE))?;
    writeln!(out, "{:<30} {:<20.2}", "Average Response Time:", summary.avg_response)?;
    writeln!(out, "{:<30} {:<20.2}", "Average Waiting Time:", summary.avg_waiting)?;
    writeln!(out, "{:<30} {:<20.2}", "Average Turnaround Time:", summary.avg_turnaround)?;
    writeln!(out, "{:<30} {:<20}", "Throughput (processes/tick):", throughput)?;
    writeln!(out, "{:<30} {:<20}", "Total Completion Time:", summary.completion_time)?;
    writeln!(out, "{:<30} {:<20}", "Context Switches:", stats.context_switches)?;
    writeln!(out, "{:<30} {:<20}", "Preemptions:", stats.preemptions)?;
    writeln!(out, "{:<30} {:<20}", "I/O Blocks:", stats.io_blocks)?;
    writeln!(out, "{:<30} {:<20}", "Busy Ticks:", stats.busy_ticks)?;
    writeln!(out, "{:<30} {:<20}", "Idle Ticks:", stats.idle_ticks)?;
    writeln!(out, "{}", "=".repeat(RULE))
}
