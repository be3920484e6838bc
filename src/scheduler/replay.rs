use super::{display::DisplayTerminal, SimOutcome, Tick};
use crate::metrics::{self, ProcessMetrics, Summary};
use std::io;

pub enum RunnerEvent {
    Quit,
    Pause,
    Resume,
    Step,
    Next,
    Previous,
    /// A display tick with no input.
    None,
    Ignored,
}

/// A finished simulation together with its derived metrics.
pub struct PolicyRun {
    pub label: String,
    pub outcome: SimOutcome,
    pub metrics: Vec<ProcessMetrics>,
    pub summary: Summary,
}

impl PolicyRun {
    pub fn new(label: impl Into<String>, outcome: SimOutcome) -> Self {
        let (metrics, summary) = metrics::evaluate(&outcome);
        Self {
            label: label.into(),
            outcome,
            metrics,
            summary,
        }
    }

    /// Last tick that can be shown.
    pub fn last_tick(&self) -> Tick {
        self.outcome.completion_time.saturating_sub(1)
    }
}

/// Replays finished runs tick by tick in the terminal.
pub struct ReplayRunner {
    terminal: DisplayTerminal,
    runs: Vec<PolicyRun>,
    selected: usize,
    cursor: Tick,
    paused: bool,
}

impl ReplayRunner {
    pub fn new(runs: Vec<PolicyRun>) -> Result<Self, io::Error> {
        let terminal = DisplayTerminal::new()?;

        Ok(Self {
            terminal,
            runs,
            selected: 0,
            cursor: 0,
            paused: false,
        })
    }

    fn advance(&mut self) {
        if let Some(run) = self.runs.get(self.selected) {
            self.cursor = (self.cursor + 1).min(run.last_tick());
        }
    }

    fn select(&mut self, selected: usize) {
        self.selected = selected;
        self.cursor = 0;
    }

    // Returns false if the viewer should quit
    pub fn run(&mut self) -> Result<bool, io::Error> {
        let Some(run) = self.runs.get(self.selected) else {
            return Ok(false);
        };
        self.terminal
            .draw(run, self.cursor, (self.selected, self.runs.len()), self.paused)?;

        match self.terminal.get_input() {
            RunnerEvent::Quit => return Ok(false),
            RunnerEvent::Pause if !self.paused => self.paused = true,
            RunnerEvent::Resume if self.paused => self.paused = false,
            RunnerEvent::Step if self.paused => self.advance(),
            RunnerEvent::Next => self.select((self.selected + 1) % self.runs.len()),
            RunnerEvent::Previous => {
                self.select((self.selected + self.runs.len() - 1) % self.runs.len())
            }
            RunnerEvent::None if !self.paused => self.advance(),
            _ => {}
        }
        Ok(true)
    }
}
