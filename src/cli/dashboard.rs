use chrono::{Datelike, Local};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use super::Context;
use crate::error::Result;
use crate::fmt::money_compact;
use crate::models::{Kind, LedgerEntry};
use crate::reports::{self, CardDebt, Filter, MonthFlow, Share, Summary};
use crate::tui::{
    money_span, truncate, wrap_text, AMOUNT_NEG_STYLE, AMOUNT_POS_STYLE, FOOTER_STYLE,
    HEADER_STYLE, PENDING_STYLE,
};

const MONTHS_SHOWN: usize = 12;
const BARS_SHOWN: usize = 8;

const MONTH_ABBR: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Figures for the current period, recomputed on every reload or navigation.
struct HomeData {
    summary: Summary,
    categories: Vec<Share>,
    methods: Vec<Share>,
    monthly: Vec<MonthFlow>,
    cards: CardDebt,
}

struct Dashboard {
    greeting: String,
    source_label: String,
    entries: Vec<LedgerEntry>,
    skipped: usize,
    credit_cards: Vec<String>,
    /// `None` shows all time.
    period: Option<(i32, u32)>,
    breakdown_kind: Kind,
    data: HomeData,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(ctx: &Context) -> Result<Self> {
        let first_name = ctx
            .settings
            .user_name
            .split_whitespace()
            .next()
            .unwrap_or("");
        let greeting = if first_name.is_empty() {
            "Mis finanzas".to_string()
        } else {
            format!("Hola, {first_name}")
        };
        let mut dashboard = Self {
            greeting,
            source_label: ctx.source.to_string(),
            entries: Vec::new(),
            skipped: 0,
            credit_cards: ctx.settings.credit_cards.clone(),
            period: None,
            breakdown_kind: Kind::Expense,
            data: HomeData {
                summary: Summary::default(),
                categories: Vec::new(),
                methods: Vec::new(),
                monthly: Vec::new(),
                cards: CardDebt::default(),
            },
            status_message: None,
        };
        dashboard.reload(ctx)?;
        Ok(dashboard)
    }

    fn reload(&mut self, ctx: &Context) -> Result<()> {
        let ledger = ctx.source.load()?;
        self.skipped = ledger.skipped();
        self.entries = ledger.entries().to_vec();
        self.recompute();
        Ok(())
    }

    fn filter(&self) -> Filter {
        match self.period {
            Some((y, m)) => Filter::month_of(y, m),
            None => Filter::default(),
        }
    }

    fn recompute(&mut self) {
        let filter = self.filter();
        let monthly = reports::monthly(&self.entries, &Filter::default());
        let skip = monthly.len().saturating_sub(MONTHS_SHOWN);
        self.data = HomeData {
            summary: reports::summary(&self.entries, &filter),
            categories: reports::by_category(&self.entries, &filter, self.breakdown_kind),
            methods: reports::by_method(&self.entries, &filter, self.breakdown_kind),
            monthly: monthly.into_iter().skip(skip).collect(),
            cards: reports::card_debt(&self.entries, &self.credit_cards),
        };
    }

    /// Latest month with data, or the current month for an empty ledger.
    fn latest_month(&self) -> (i32, u32) {
        self.entries
            .iter()
            .map(|e| e.movement.date)
            .max()
            .map(|d| (d.year(), d.month()))
            .unwrap_or_else(|| {
                let today = Local::now().date_naive();
                (today.year(), today.month())
            })
    }

    /// From all time the first press lands on the latest month with data.
    fn shift_month(&mut self, delta: i32) {
        self.period = Some(match self.period {
            None => self.latest_month(),
            Some((y, m)) => {
                let index = y * 12 + (m as i32 - 1) + delta;
                (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
            }
        });
        self.recompute();
    }

    fn period_label(&self) -> String {
        match self.period {
            Some((y, m)) => format!("{} {y}", MONTH_ABBR[(m as usize - 1) % 12]),
            None => "Todo".to_string(),
        }
    }

    /// Returns true when the dashboard should close.
    fn handle_key(&mut self, code: KeyCode, ctx: &Context) -> bool {
        self.status_message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('r') => match self.reload(ctx) {
                Ok(()) => self.status_message = Some("Reloaded.".to_string()),
                Err(e) => self.status_message = Some(format!("Error: {e}")),
            },
            KeyCode::Tab => {
                self.breakdown_kind = self.breakdown_kind.toggle();
                self.recompute();
            }
            KeyCode::Left => self.shift_month(-1),
            KeyCode::Right => self.shift_month(1),
            KeyCode::Char('a') => {
                self.period = None;
                self.recompute();
            }
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut Frame) {
        let [header_area, metrics_area, charts_area, bottom_area, footer_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_header(frame, header_area);
        self.draw_metrics(frame, metrics_area);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(charts_area);
        let kind_label = match self.breakdown_kind {
            Kind::Income => "Ingresos",
            Kind::Expense => "Gastos",
        };
        draw_shares(frame, left, &format!("{kind_label} por categoría"), &self.data.categories);
        draw_shares(frame, right, &format!("{kind_label} por medio de pago"), &self.data.methods);

        let [monthly_area, cards_area] =
            Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                .areas(bottom_area);
        self.draw_monthly(frame, monthly_area);
        self.draw_cards(frame, cards_area);

        let hints = match &self.status_message {
            Some(msg) => Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
            None => Paragraph::new(
                " Left/Right=month  a=all time  Tab=income/expense  r=reload  q=quit",
            )
            .style(FOOTER_STYLE),
        };
        frame.render_widget(hints, footer_area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(format!(" {}", self.greeting), HEADER_STYLE),
            Span::raw("  "),
            Span::styled(self.period_label(), Style::default().add_modifier(Modifier::BOLD)),
        ]);
        let mut source = format!(" {}", self.source_label);
        if self.skipped > 0 {
            source.push_str(&format!("  ({} rows skipped)", self.skipped));
        }
        let (source, _) = wrap_text(&source, area.width.saturating_sub(1) as usize);
        let first_line = source.lines().next().unwrap_or("").to_string();
        frame.render_widget(
            Paragraph::new(vec![title, Line::from(Span::styled(first_line, FOOTER_STYLE))]),
            area,
        );
    }

    fn draw_metrics(&self, frame: &mut Frame, area: Rect) {
        let s = &self.data.summary;
        let tiles = [
            ("Ingresos", Span::styled(money_compact(s.income), AMOUNT_POS_STYLE)),
            ("Gastos", Span::styled(money_compact(s.realized_expense), AMOUNT_NEG_STYLE)),
            ("Pendiente", Span::styled(money_compact(s.pending_expense), PENDING_STYLE)),
            ("Balance", money_span(s.balance)),
        ];
        let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
        for ((label, value), tile_area) in tiles.into_iter().zip(areas.iter()) {
            let mut lines = vec![Line::from(value)];
            if label == "Balance" {
                lines.push(Line::from(vec![
                    Span::styled("tras pendientes ", FOOTER_STYLE),
                    money_span(s.projected_balance),
                ]));
            }
            let block = Block::default()
                .title(label)
                .title_style(Style::default().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL);
            frame.render_widget(Paragraph::new(lines).block(block), *tile_area);
        }
    }

    fn draw_monthly(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Flujo mensual")
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .borders(Borders::ALL);
        if self.data.monthly.is_empty() {
            frame.render_widget(Paragraph::new(" Sin movimientos").block(block), area);
            return;
        }

        let income_style = Style::default().fg(Color::Rgb(80, 220, 100));
        let expense_style = Style::default().fg(Color::Rgb(220, 80, 80));
        let groups: Vec<BarGroup> = self
            .data
            .monthly
            .iter()
            .map(|m| {
                let month_idx = m.month[5..].parse::<usize>().unwrap_or(1).clamp(1, 12) - 1;
                let bars = vec![
                    Bar::default()
                        .value(m.income.max(0.0) as u64)
                        .text_value(String::new())
                        .style(income_style),
                    Bar::default()
                        .value(m.expense.max(0.0) as u64)
                        .text_value(String::new())
                        .style(expense_style),
                ];
                BarGroup::default()
                    .label(Line::from(MONTH_ABBR[month_idx]))
                    .bars(&bars)
            })
            .collect();

        let mut chart = BarChart::default()
            .block(block)
            .bar_width(2)
            .bar_gap(0)
            .group_gap(1);
        for group in groups {
            chart = chart.data(group);
        }
        frame.render_widget(chart, area);
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Tarjetas de crédito")
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .borders(Borders::ALL);
        let debt = &self.data.cards;
        let mut lines = Vec::new();
        if debt.cards.is_empty() {
            lines.push(Line::from(Span::styled(" Sin deuda pendiente", FOOTER_STYLE)));
        } else {
            let width = area.width.saturating_sub(16) as usize;
            for card in &debt.cards {
                lines.push(Line::from(vec![
                    Span::raw(format!(" {:<width$} ", truncate(&card.method, width))),
                    money_span(-card.pending),
                ]));
            }
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<width$} ", "Total"), HEADER_STYLE),
                money_span(-debt.total),
            ]));
        }
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Horizontal bar chart of the largest shares.
fn draw_shares(frame: &mut Frame, area: Rect, title: &str, shares: &[Share]) {
    let block = Block::default()
        .title(title.to_string())
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::ALL);
    if shares.is_empty() {
        frame.render_widget(Paragraph::new(" Sin movimientos").block(block), area);
        return;
    }

    let label_width = (area.width / 3).max(6) as usize;
    let bars: Vec<Bar> = shares
        .iter()
        .take(BARS_SHOWN)
        .map(|s| {
            Bar::default()
                .value(s.total.max(0.0) as u64)
                .label(Line::from(truncate(&s.name, label_width)))
                .text_value(format!("{} ({:.0}%)", money_compact(s.total), s.pct))
                .style(Style::default().fg(Color::Cyan))
                .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

pub fn run(ctx: &Context) -> Result<()> {
    let mut dashboard = Dashboard::new(ctx)?;

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                if dashboard.handle_key(key.code, ctx) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
