use super::{replay::PolicyRun, replay::RunnerEvent, Tick};
use crossterm::event::{self, Event, KeyCode, KeyEvent};
use std::{
    io::{self, Stdout},
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};
use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
    Terminal,
};

pub enum DisplayEvent {
    Input(KeyEvent),
    Tick,
}

const TICK_RATE: Duration = Duration::from_millis(200);

pub struct DisplayTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    input_rx: Receiver<DisplayEvent>,
}

impl DisplayTerminal {
    pub fn new() -> Result<Self, io::Error> {
        crossterm::terminal::enable_raw_mode()?;

        // Set up the input handling thread
        let (input_tx, input_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = TICK_RATE
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);

                // A dead terminal ends input; the runner then sees a closed channel
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) => {
                            if input_tx.send(DisplayEvent::Input(key)).is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(_) => return,
                    },
                    Ok(false) => {}
                    Err(_) => return,
                }

                if last_tick.elapsed() >= TICK_RATE {
                    if input_tx.send(DisplayEvent::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        // Set up the terminal-user-interface
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        Ok(Self { terminal, input_rx })
    }

    pub fn draw(
        &mut self,
        run: &PolicyRun,
        cursor: Tick,
        (selected, total): (usize, usize),
        paused: bool,
    ) -> Result<(), io::Error> {
        let current = run.outcome.timeline.get(cursor as usize).copied().flatten();

        // Draw the tui to the terminal
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(5),
                    Constraint::Length(4),
                ])
                .split(f.size());

            let header = Paragraph::new(format!(
                "Tick {}/{} | {} | Policy {}/{}{} | q quit, p/r/s pause/resume/step, n/b switch",
                cursor,
                run.last_tick(),
                match current {
                    Some(pid) => format!("Running: pid {pid}"),
                    None => "CPU idle".to_owned(),
                },
                selected + 1,
                total,
                if paused { " (paused)" } else { "" },
            ))
            .style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::LightBlue),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Replay")
                    .border_type(BorderType::Rounded),
            );

            f.render_widget(header, chunks[0]);

            let items = run.metrics.iter().map(|m| {
                let state = run
                    .outcome
                    .state_at(m.pid, cursor)
                    .map_or_else(|| "-".to_owned(), |state| state.to_string());
                let style = if current == Some(m.pid) {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(m.pid.to_string())
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                    Cell::from(state),
                    Cell::from(m.arrival_time.to_string()),
                    Cell::from(m.burst_time.to_string()),
                    Cell::from(m.start_time.to_string()),
                    Cell::from(m.finish_time.to_string()),
                    Cell::from(m.response_time.to_string()),
                    Cell::from(m.waiting_time.to_string()),
                    Cell::from(m.turnaround_time.to_string()),
                ])
                .style(style)
            });

            let table = Table::new(items)
                .header(
                    Row::new(vec![
                        "PID", "State", "Arrival", "Burst", "Start", "Finish", "Response",
                        "Waiting", "Turnaround",
                    ])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .widths(&[
                    Constraint::Length(5),
                    Constraint::Length(10),
                    Constraint::Length(8),
                    Constraint::Length(6),
                    Constraint::Length(6),
                    Constraint::Length(7),
                    Constraint::Length(9),
                    Constraint::Length(8),
                    Constraint::Length(11),
                ])
                .block(
                    Block::default()
                        .title(format!("{} ({})", run.label, run.outcome.policy))
                        .borders(Borders::ALL),
                )
                .style(Style::default().fg(Color::LightGreen))
                .column_spacing(1);

            f.render_widget(table, chunks[1]);

            let summary = &run.summary;
            let stats = &run.outcome.stats;
            let footer = Paragraph::new(format!(
                "avg response {:.2} | avg waiting {:.2} | avg turnaround {:.2} | throughput {} | completion {}\n\
                 dispatches {} | context switches {} | preemptions {} | I/O blocks {} | busy/idle ticks {}/{}",
                summary.avg_response,
                summary.avg_waiting,
                summary.avg_turnaround,
                summary
                    .throughput
                    .map_or_else(|| "n/a".to_owned(), |t| format!("{t:.4}")),
                summary.completion_time,
                stats.dispatches,
                stats.context_switches,
                stats.preemptions,
                stats.io_blocks,
                stats.busy_ticks,
                stats.idle_ticks,
            ))
            .block(Block::default().title("Summary").borders(Borders::ALL));

            f.render_widget(footer, chunks[2]);
        })?;
        Ok(())
    }

    pub fn get_input(&self) -> RunnerEvent {
        // Get the user's input and return a matching event
        let Ok(event) = self.input_rx.recv() else {
            return RunnerEvent::Quit;
        };
        match event {
            DisplayEvent::Input(key) => {
                if key.modifiers.is_empty() {
                    match key.code {
                        KeyCode::Char('q') => return RunnerEvent::Quit,
                        KeyCode::Char('p') => return RunnerEvent::Pause,
                        KeyCode::Char('r') => return RunnerEvent::Resume,
                        KeyCode::Char('s') => return RunnerEvent::Step,
                        KeyCode::Char('n') | KeyCode::Right => return RunnerEvent::Next,
                        KeyCode::Char('b') | KeyCode::Left => return RunnerEvent::Previous,
                        _ => {}
                    };
                }
                RunnerEvent::Ignored
            }
            DisplayEvent::Tick => RunnerEvent::None,
        }
    }
}

impl Drop for DisplayTerminal {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = self.terminal.show_cursor();
    }
}
