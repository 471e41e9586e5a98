//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};
use std::io::{stdout, Stdout};

use crate::db::KeyValueStore;
use crate::format::{format_date, format_duration, format_status, format_week};
use crate::mesocycle::MesocycleProgress;
use crate::models::Workout;
use crate::tracker::Tracker;

type Tui = Terminal<CrosstermBackend<Stdout>>;

const RECENT_WORKOUTS: usize = 20;

/// App state for TUI
pub struct App<S> {
    tracker: Tracker<S>,
    mesocycles: Vec<(String, MesocycleProgress)>,
    workouts: Vec<Workout>,
    selected: TableState,
    status: String,
    should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(tracker: Tracker<S>) -> Result<Self> {
        let mut app = Self {
            tracker,
            mesocycles: Vec::new(),
            workouts: Vec::new(),
            selected: TableState::default(),
            status: String::new(),
            should_quit: false,
        };
        app.refresh()?;
        Ok(app)
    }

    fn refresh(&mut self) -> Result<()> {
        self.mesocycles = self
            .tracker
            .mesocycle_names()?
            .into_iter()
            .map(|name| {
                let progress = self.tracker.progress(&name)?;
                Ok((name, progress))
            })
            .collect::<Result<_>>()?;
        self.workouts = self.tracker.workouts()?;
        self.workouts.truncate(RECENT_WORKOUTS);

        if self.mesocycles.is_empty() {
            self.selected.select(None);
        } else {
            let i = self.selected.selected().unwrap_or(0).min(self.mesocycles.len() - 1);
            self.selected.select(Some(i));
        }
        Ok(())
    }

    fn selected_name(&self) -> Option<String> {
        self.selected
            .selected()
            .and_then(|i| self.mesocycles.get(i))
            .map(|(name, _)| name.clone())
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(self.mesocycles.len() as u16 + 3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new("mesotrack - Gym Tracker")
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Mesocycle progress
        let rows: Vec<Row> = self.mesocycles.iter().map(|(name, p)| {
            let style = if p.is_mesocycle_complete {
                Style::default().fg(Color::Green)
            } else if p.is_week_complete {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(name.clone()),
                Cell::from(format_week(p)),
                Cell::from(format!("{}/{}", p.completed_count(), p.total_routines)),
                Cell::from(format_status(p)),
            ])
            .style(style)
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(20),
                Constraint::Length(16),
                Constraint::Length(10),
                Constraint::Min(14),
            ],
        )
        .header(Row::new(vec!["Mesocycle", "Week", "Routines", "Status"])
            .style(Style::default().bold()))
        .row_highlight_style(Style::default().reversed())
        .block(Block::default().borders(Borders::ALL).title("Mesocycles"));

        frame.render_stateful_widget(table, chunks[1], &mut self.selected);

        // Workout history
        let rows: Vec<Row> = self.workouts.iter().map(|w| {
            Row::new(vec![
                Cell::from(format_date(&w.date)),
                Cell::from(w.routine_name.clone()),
                Cell::from(format_duration(w.duration)),
                Cell::from(format!("{:.0} kg", w.volume())),
            ])
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(18),
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Min(10),
            ],
        )
        .header(Row::new(vec!["Date", "Routine", "Duration", "Volume"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Workouts"));

        frame.render_widget(table, chunks[2]);

        // Footer
        let help = "q: quit | r: refresh | j/k: select | w: complete week | n: new block";
        let footer_text = if self.status.is_empty() {
            help.to_string()
        } else {
            format!("{} | {}", self.status, help)
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('r') => {
                            self.status.clear();
                            self.refresh()?;
                        }
                        KeyCode::Char('j') | KeyCode::Down => self.selected.select_next(),
                        KeyCode::Char('k') | KeyCode::Up => self.selected.select_previous(),
                        KeyCode::Char('w') => {
                            if let Some(name) = self.selected_name() {
                                let config = self.tracker.complete_week(&name, Utc::now())?;
                                self.status = format!("{}: week {} closed", name, config.completed_weeks_in_cycle);
                                self.refresh()?;
                            }
                        }
                        KeyCode::Char('n') => {
                            if let Some(name) = self.selected_name() {
                                let config = self.tracker.reset_block(&name, None)?;
                                self.status = format!("{}: block {} ready", name, config.completed_cycle_count.saturating_add(1));
                                self.refresh()?;
                            }
                        }
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
