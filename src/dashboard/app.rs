//! Dashboard application state, key handling and rendering.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use tokio::runtime::Handle;
use tracing::debug;

use crate::analytics::net_position;
use crate::insight::{unavailable_message, InsightClient, InsightError};
use crate::models::{AnalyticsSummary, CleaningReport, Transaction};
use crate::pipeline::Ledger;

const ACCENT: Color = Color::Cyan;
const POSITIVE: Color = Color::Green;
const NEGATIVE: Color = Color::Red;
const TEXT_DIM: Color = Color::Gray;
const BORDER_DIM: Color = Color::DarkGray;

/// Tab views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Traders,
    Time,
    Transactions,
    Lookup,
    Insight,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[
            Tab::Overview,
            Tab::Traders,
            Tab::Time,
            Tab::Transactions,
            Tab::Lookup,
            Tab::Insight,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "OVERVIEW",
            Tab::Traders => "TRADERS",
            Tab::Time => "TIME",
            Tab::Transactions => "TRANSACTIONS",
            Tab::Lookup => "LOOKUP",
            Tab::Insight => "INSIGHT",
        }
    }

    fn position(&self) -> usize {
        Tab::all().iter().position(|t| t == self).unwrap_or(0)
    }
}

/// Where the insight request stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightState {
    Idle,
    Pending,
    Ready(String),
    Failed(String),
}

type InsightResult = Result<String, InsightError>;

/// Read-only view over one pipeline run plus UI state.
pub struct DashboardApp {
    pub running: bool,
    pub current_tab: Tab,
    pub show_help: bool,

    ledger: Ledger,
    report: CleaningReport,
    summary: AnalyticsSummary,
    tickers: Vec<String>,

    selected_ticker: usize,
    transactions_offset: usize,
    lookup_offset: usize,
    insight_scroll: u16,

    insight: InsightState,
    insight_client: Option<InsightClient>,
    insight_rx: Option<Receiver<InsightResult>>,
    insight_started: Option<Instant>,
    runtime: Handle,
}

impl DashboardApp {
    pub fn new(
        ledger: Ledger,
        report: CleaningReport,
        summary: AnalyticsSummary,
        insight_client: Option<InsightClient>,
        runtime: Handle,
    ) -> Self {
        let tickers = ledger.tickers().into_iter().map(str::to_string).collect();
        Self {
            running: true,
            current_tab: Tab::Overview,
            show_help: false,
            ledger,
            report,
            summary,
            tickers,
            selected_ticker: 0,
            transactions_offset: 0,
            lookup_offset: 0,
            insight_scroll: 0,
            insight: InsightState::Idle,
            insight_client,
            insight_rx: None,
            insight_started: None,
            runtime,
        }
    }

    pub fn insight_state(&self) -> &InsightState {
        &self.insight
    }

    pub fn selected_ticker(&self) -> Option<&str> {
        self.tickers.get(self.selected_ticker).map(String::as_str)
    }

    /// Poll for a finished insight request.
    pub fn tick(&mut self) {
        let Some(rx) = &self.insight_rx else {
            return;
        };

        let next = match rx.try_recv() {
            Ok(Ok(text)) => InsightState::Ready(text),
            Ok(Err(e)) => InsightState::Failed(unavailable_message(&e)),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                InsightState::Failed("Insight unavailable: request was dropped".to_string())
            }
        };

        if let Some(started) = self.insight_started.take() {
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Insight request finished");
        }
        self.insight = next;
        self.insight_rx = None;
        self.insight_scroll = 0;
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = !self.show_help,
            KeyCode::Tab | KeyCode::Right => self.next_tab(),
            KeyCode::BackTab | KeyCode::Left => self.prev_tab(),
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                self.current_tab = Tab::all()[idx];
            }
            KeyCode::Char('g') => self.request_insight(),
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(20),
            KeyCode::PageDown => self.scroll_down(20),
            _ => {}
        }
    }

    fn next_tab(&mut self) {
        let tabs = Tab::all();
        self.current_tab = tabs[(self.current_tab.position() + 1) % tabs.len()];
    }

    fn prev_tab(&mut self) {
        let tabs = Tab::all();
        self.current_tab = tabs[(self.current_tab.position() + tabs.len() - 1) % tabs.len()];
    }

    fn scroll_up(&mut self, step: usize) {
        match self.current_tab {
            Tab::Transactions => self.transactions_offset = self.transactions_offset.saturating_sub(step),
            Tab::Lookup if step == 1 => {
                self.selected_ticker = self.selected_ticker.saturating_sub(1);
                self.lookup_offset = 0;
            }
            Tab::Lookup => self.lookup_offset = self.lookup_offset.saturating_sub(step),
            Tab::Insight => self.insight_scroll = self.insight_scroll.saturating_sub(step as u16),
            _ => {}
        }
    }

    fn scroll_down(&mut self, step: usize) {
        match self.current_tab {
            Tab::Transactions => {
                let max = self.ledger.len().saturating_sub(1);
                self.transactions_offset = (self.transactions_offset + step).min(max);
            }
            Tab::Lookup if step == 1 => {
                let max = self.tickers.len().saturating_sub(1);
                self.selected_ticker = (self.selected_ticker + 1).min(max);
                self.lookup_offset = 0;
            }
            Tab::Lookup => {
                let rows = self
                    .selected_ticker()
                    .map_or(0, |t| self.ledger.index().positions(t).len());
                self.lookup_offset = (self.lookup_offset + step).min(rows.saturating_sub(1));
            }
            Tab::Insight => self.insight_scroll = self.insight_scroll.saturating_add(step as u16),
            _ => {}
        }
    }

    /// Start an insight request in the background. The UI keeps running
    /// on the analytics already computed.
    pub fn request_insight(&mut self) {
        self.current_tab = Tab::Insight;
        if self.insight == InsightState::Pending {
            return;
        }

        let Some(client) = self.insight_client.clone() else {
            self.insight = InsightState::Failed(unavailable_message(&InsightError::NotConfigured));
            return;
        };

        let summary = self.summary.clone();
        let (tx, rx) = mpsc::channel();
        self.runtime.spawn(async move {
            let result = client.generate(&summary).await;
            let _ = tx.send(result);
        });

        self.insight = InsightState::Pending;
        self.insight_rx = Some(rx);
        self.insight_started = Some(Instant::now());
    }

    // ==================== Rendering ====================

    /// Render the application
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Content
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.current_tab {
            Tab::Overview => self.render_overview(frame, chunks[1]),
            Tab::Traders => self.render_traders(frame, chunks[1]),
            Tab::Time => self.render_time(frame, chunks[1]),
            Tab::Transactions => self.render_transactions(frame, chunks[1]),
            Tab::Lookup => self.render_lookup(frame, chunks[1]),
            Tab::Insight => self.render_insight(frame, chunks[1]),
        }
        self.render_footer(frame, chunks[2]);

        if self.show_help {
            self.render_help(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::all()
            .iter()
            .map(|t| Line::from(format!(" {} ", t.title())))
            .collect();

        let tabs = Tabs::new(titles)
            .block(panel(" PORTFOLIO INSIGHTS "))
            .select(self.current_tab.position())
            .style(Style::default().fg(TEXT_DIM))
            .highlight_style(
                Style::default()
                    .fg(ACCENT)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::UNDERLINED),
            );
        frame.render_widget(tabs, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let status = match &self.insight {
            InsightState::Idle => "insight: press g",
            InsightState::Pending => "insight: waiting...",
            InsightState::Ready(_) => "insight: ready",
            InsightState::Failed(_) => "insight: unavailable",
        };
        let line = Line::from(vec![
            Span::styled(" Tab/←/→ switch  ↑/↓ scroll  g insight  ? help  q quit ", Style::default().fg(TEXT_DIM)),
            Span::styled(format!(" {status} "), Style::default().fg(ACCENT)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(12), Constraint::Min(5)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let s = &self.summary;
        let stats = vec![
            stat_line("Transactions", s.total_transactions.to_string()),
            stat_line("Buys / Sells", format!("{} / {}", s.total_buys, s.total_sells)),
            stat_line("Dollar Volume", format!("${:.2}", s.total_dollar_volume)),
            stat_line(
                "Tickers / Traders",
                format!("{} / {}", s.unique_tickers.len(), s.active_trader_count),
            ),
        ];
        frame.render_widget(Paragraph::new(stats).block(panel(" KEY STATISTICS ")), top[0]);

        let cleaning = if self.report.is_empty_result() {
            format!("NO VALID TRANSACTIONS\n{}", self.report)
        } else {
            self.report.to_string()
        };
        frame.render_widget(
            Paragraph::new(cleaning)
                .wrap(Wrap { trim: false })
                .block(panel(" CLEANING ")),
            top[1],
        );

        let volume_rows: Vec<Row> = s
            .volume_by_ticker
            .iter()
            .map(|v| {
                Row::new(vec![
                    v.ticker.clone(),
                    v.count.to_string(),
                    format!("${:.2}", v.dollar_volume),
                ])
            })
            .collect();
        let volume = Table::new(
            volume_rows,
            [Constraint::Length(8), Constraint::Length(8), Constraint::Min(12)],
        )
        .header(header_row(&["Ticker", "Trades", "Volume"]))
        .block(panel(" VOLUME BY TICKER "));
        frame.render_widget(volume, bottom[0]);

        let position_rows: Vec<Row> = s
            .net_position_by_ticker
            .iter()
            .map(|p| {
                let color = if p.net_quantity.is_sign_negative() { NEGATIVE } else { POSITIVE };
                Row::new(vec![
                    Cell::from(p.ticker.clone()),
                    Cell::from(p.net_quantity.to_string()).style(Style::default().fg(color)),
                ])
            })
            .collect();
        let positions = Table::new(position_rows, [Constraint::Length(8), Constraint::Min(10)])
            .header(header_row(&["Ticker", "Net Shares"]))
            .block(panel(" NET POSITION "));
        frame.render_widget(positions, bottom[1]);
    }

    fn render_traders(&self, frame: &mut Frame, area: Rect) {
        let data: Vec<(&str, u64)> = self
            .summary
            .most_active_traders
            .iter()
            .map(|t| (t.trader_id.as_str(), t.transactions as u64))
            .collect();

        let chart = BarChart::default()
            .block(panel(" MOST ACTIVE TRADERS "))
            .data(data.as_slice())
            .bar_width(9)
            .bar_gap(2)
            .bar_style(Style::default().fg(ACCENT))
            .value_style(Style::default().fg(Color::Black).bg(ACCENT));
        frame.render_widget(chart, area);
    }

    fn render_time(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(8)])
            .split(area);
        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let t = &self.summary.time_analysis;
        let period = match (t.first, t.last) {
            (Some(first), Some(last)) => format!(
                "{} to {}",
                first.format("%Y-%m-%d %H:%M"),
                last.format("%Y-%m-%d %H:%M")
            ),
            _ => "n/a".to_string(),
        };
        let lines = vec![
            stat_line("Period", period),
            stat_line("Trading Days", t.trading_days.to_string()),
            stat_line(
                "Peak Day",
                t.peak_day
                    .as_ref()
                    .map_or("n/a".to_string(), |d| format!("{d} (${:.2})", t.peak_day_volume)),
            ),
        ];
        frame.render_widget(Paragraph::new(lines).block(panel(" TIME ")), rows[0]);

        let distribution: Vec<(&str, u64)> = t
            .distribution
            .iter()
            .map(|(label, count)| (label.as_str(), *count as u64))
            .collect();
        let per_bucket = BarChart::default()
            .block(panel(&format!(" PER {} ", t.bucket.as_str().to_uppercase())))
            .data(distribution.as_slice())
            .bar_width(8)
            .bar_gap(1)
            .bar_style(Style::default().fg(ACCENT));
        frame.render_widget(per_bucket, charts[0]);

        let hour_labels: Vec<String> = t.hourly.keys().map(|h| format!("{h:02}h")).collect();
        let hourly: Vec<(&str, u64)> = hour_labels
            .iter()
            .zip(t.hourly.values())
            .map(|(label, count)| (label.as_str(), *count as u64))
            .collect();
        let peak_hour = t.peak_hour.map_or("n/a".to_string(), |h| format!("{h}:00"));
        let per_hour = BarChart::default()
            .block(panel(&format!(" BY HOUR (peak {peak_hour}) ")))
            .data(hourly.as_slice())
            .bar_width(4)
            .bar_gap(1)
            .bar_style(Style::default().fg(POSITIVE));
        frame.render_widget(per_hour, charts[1]);
    }

    fn render_transactions(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(3) as usize;
        let rows = self
            .ledger
            .transactions()
            .iter()
            .skip(self.transactions_offset)
            .take(visible)
            .map(|tx| transaction_row(tx, true));

        let title = format!(
            " TRANSACTIONS {}-{} of {} ",
            (self.transactions_offset + 1).min(self.ledger.len()),
            (self.transactions_offset + visible).min(self.ledger.len()),
            self.ledger.len()
        );
        let table = Table::new(rows, transaction_widths(true))
            .header(header_row(&["Time", "Ticker", "Action", "Qty", "Price", "Trader"]))
            .block(panel(&title));
        frame.render_widget(table, area);
    }

    fn render_lookup(&self, frame: &mut Frame, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(14), Constraint::Min(20)])
            .split(area);

        let items: Vec<ListItem> = self
            .tickers
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let style = if i == self.selected_ticker {
                    Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!(" {t}")).style(style)
            })
            .collect();
        frame.render_widget(List::new(items).block(panel(" TICKERS ")), cols[0]);

        let Some(ticker) = self.selected_ticker() else {
            frame.render_widget(
                Paragraph::new("No tickers loaded.").block(panel(" LOOKUP ")),
                cols[1],
            );
            return;
        };

        let visible = cols[1].height.saturating_sub(3) as usize;
        let count = self.ledger.index().positions(ticker).len();
        let rows = self
            .ledger
            .ticker_transactions(ticker)
            .skip(self.lookup_offset)
            .take(visible)
            .map(|tx| transaction_row(tx, false));

        let title = format!(
            " {count} transactions for {ticker} (net {}) ",
            net_position(&self.ledger, ticker)
        );
        let table = Table::new(rows, transaction_widths(false))
            .header(header_row(&["Time", "Action", "Qty", "Price", "Trader"]))
            .block(panel(&title));
        frame.render_widget(table, cols[1]);
    }

    fn render_insight(&self, frame: &mut Frame, area: Rect) {
        let (text, color) = match &self.insight {
            InsightState::Idle => {
                let hint = if self.insight_client.is_some() {
                    "Press g to generate insights from the analytics summary."
                } else {
                    "Insight generation is disabled (OPENAI_API_KEY not set)."
                };
                (hint.to_string(), TEXT_DIM)
            }
            InsightState::Pending => ("Thinking...".to_string(), ACCENT),
            InsightState::Ready(text) => (text.clone(), Color::White),
            InsightState::Failed(msg) => (msg.clone(), NEGATIVE),
        };

        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false })
            .scroll((self.insight_scroll, 0))
            .block(panel(" AI INSIGHTS "));
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let width = 50.min(area.width);
        let height = 12.min(area.height);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };

        let lines = vec![
            Line::from("Tab / → / ←   switch tab"),
            Line::from("1-6           jump to tab"),
            Line::from("↑ / ↓         scroll, select ticker"),
            Line::from("PgUp / PgDn   scroll faster"),
            Line::from("g             generate AI insight"),
            Line::from("?             toggle this help"),
            Line::from("q / Esc       quit"),
        ];
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(panel(" HELP ")), popup);
    }
}

fn panel(title: &str) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_DIM))
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<18}"), Style::default().fg(TEXT_DIM)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.to_vec()).style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
}

fn transaction_widths(with_ticker: bool) -> Vec<Constraint> {
    let mut widths = vec![Constraint::Length(17)];
    if with_ticker {
        widths.push(Constraint::Length(8));
    }
    widths.extend([
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Min(8),
    ]);
    widths
}

fn transaction_row(tx: &Transaction, with_ticker: bool) -> Row<'static> {
    let action_color = if tx.is_buy() { POSITIVE } else { NEGATIVE };
    let mut cells = vec![Cell::from(tx.timestamp.format("%Y-%m-%d %H:%M").to_string())];
    if with_ticker {
        cells.push(Cell::from(tx.ticker.clone()));
    }
    cells.extend([
        Cell::from(tx.action.as_str()).style(Style::default().fg(action_color)),
        Cell::from(tx.quantity.to_string()),
        Cell::from(format!("${:.2}", tx.price)),
        Cell::from(tx.trader_id.clone()),
    ]);
    Row::new(cells)
}
