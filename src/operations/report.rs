use crate::error::{LedgerError, Result};
use crate::models::expense::Expense;
use crate::models::summary::{TrendBucket, TrendReport};
use chrono::{Duration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::io;

/// Draws a trend report somewhere. Absent renderers report themselves as unavailable.
pub trait ChartRenderer {
    fn render(&self, report: &TrendReport) -> Result<()>;
}

/// Used when charts are switched off in the configuration.
#[derive(Debug, Default)]
pub struct NoCharts;

impl ChartRenderer for NoCharts {
    fn render(&self, _report: &TrendReport) -> Result<()> {
        Err(LedgerError::Capability(
            "Charts are disabled. Set `charts = \"terminal\"` in the configuration to enable them."
                .to_string(),
        ))
    }
}

/// Full-screen stacked bar chart, category pie and category table.
#[derive(Debug, Default)]
pub struct TerminalCharts;

impl ChartRenderer for TerminalCharts {
    fn render(&self, report: &TrendReport) -> Result<()> {
        let title = format!(
            "{} - {} ({}-day buckets)",
            report.start.format("%d.%m.%Y"),
            report.end.format("%d.%m.%Y"),
            report.bucket_days
        );
        render_report(&title, report)
    }
}

/// Bucket width for a range: daily up to a week, weekly up to a quarter,
/// fortnightly up to a year, then about twenty buckets.
pub fn bucket_days_for(total_days: i64) -> i64 {
    if total_days <= 7 {
        1
    } else if total_days <= 90 {
        7
    } else if total_days <= 365 {
        14
    } else {
        (total_days + 19) / 20
    }
}

/// Spending between `start` and `end` (inclusive) split into equal day buckets.
pub fn build_trend<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<TrendReport> {
    if start > end {
        return Err(LedgerError::InvalidDate(format!(
            "{start}..{end} (start date must not be after end date)"
        )));
    }

    let total_days = (end - start).num_days() + 1;
    let bucket_days = bucket_days_for(total_days);
    let bucket_count = ((total_days + bucket_days - 1) / bucket_days).max(1) as usize;

    let mut bucket_maps: Vec<HashMap<String, Decimal>> = vec![HashMap::new(); bucket_count];
    let mut category_totals: HashMap<String, Decimal> = HashMap::new();

    for expense in expenses {
        if expense.date < start || expense.date > end {
            continue;
        }
        let idx = bucket_index(start, expense.date, bucket_days, bucket_count);
        *bucket_maps[idx]
            .entry(expense.category.clone())
            .or_insert(Decimal::ZERO) += expense.amount;
        *category_totals
            .entry(expense.category.clone())
            .or_insert(Decimal::ZERO) += expense.amount;
    }

    let buckets = bucket_maps
        .into_iter()
        .enumerate()
        .map(|(i, totals)| {
            let bucket_start = start + Duration::days(i as i64 * bucket_days);
            let bucket_end = (bucket_start + Duration::days(bucket_days - 1)).min(end);
            let totals = largest_first(totals);
            let total = totals.iter().map(|(_, v)| *v).sum();
            TrendBucket {
                start: bucket_start,
                end: bucket_end,
                totals,
                total,
            }
        })
        .collect();

    let category_totals = largest_first(category_totals);
    let total = category_totals.iter().map(|(_, v)| *v).sum();

    Ok(TrendReport {
        start,
        end,
        bucket_days,
        buckets,
        category_totals,
        total,
    })
}

/// Ties are broken by name so the output is stable.
fn largest_first(totals: HashMap<String, Decimal>) -> Vec<(String, Decimal)> {
    let mut totals: Vec<(String, Decimal)> = totals.into_iter().collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    totals
}

fn bucket_index(start: NaiveDate, date: NaiveDate, bucket_days: i64, bucket_count: usize) -> usize {
    if date < start {
        return 0;
    }
    let idx = ((date - start).num_days() / bucket_days) as usize;
    idx.min(bucket_count.saturating_sub(1))
}

fn assign_colors(report: &TrendReport) -> HashMap<String, Color> {
    let palette = [
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Red,
        Color::LightCyan,
        Color::LightMagenta,
        Color::LightYellow,
        Color::LightGreen,
        Color::LightBlue,
    ];

    let mut categories: Vec<&String> = report.category_totals.iter().map(|(c, _)| c).collect();
    categories.sort();
    categories
        .into_iter()
        .enumerate()
        .map(|(idx, category)| (category.clone(), palette[idx % palette.len()]))
        .collect()
}

fn terminal_error(action: &str) -> impl Fn(io::Error) -> LedgerError + '_ {
    move |e| LedgerError::Terminal(format!("Failed to {action}: {e}"))
}

fn render_report(title: &str, report: &TrendReport) -> Result<()> {
    enable_raw_mode().map_err(terminal_error("enable raw mode"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(terminal_error("enter alternate screen"))?;

    let colors = assign_colors(report);
    let result: Result<()> = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal =
            ratatui::Terminal::new(backend).map_err(terminal_error("initialize terminal"))?;

        loop {
            terminal
                .draw(|frame| {
                    let layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .split(frame.area());

                    render_bar_chart(frame, layout[0], title, report, &colors);

                    let bottom = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                        .split(layout[1]);

                    render_pie_chart(frame, bottom[0], report, &colors);
                    render_category_table(frame, bottom[1], report, &colors);
                })
                .map_err(terminal_error("draw terminal UI"))?;

            if event::poll(std::time::Duration::from_millis(250))
                .map_err(terminal_error("poll input"))?
            {
                match event::read().map_err(terminal_error("read input"))? {
                    Event::Key(key) if key.kind == KeyEventKind::Release => {}
                    Event::Key(key) if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) => {
                        break;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode().map_err(terminal_error("disable raw mode"))?;
    execute!(io::stdout(), LeaveAlternateScreen).map_err(terminal_error("leave alternate screen"))?;

    result
}

fn render_bar_chart(
    frame: &mut ratatui::Frame,
    area: Rect,
    title: &str,
    report: &TrendReport,
    colors: &HashMap<String, Color>,
) {
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(area);

    let block = Block::default()
        .title(Line::from(vec![Span::styled(
            format!("{title}  (press q to exit)"),
            Style::default().fg(Color::White),
        )]))
        .borders(Borders::ALL);

    let chart_area = block.inner(inner[0]);
    frame.render_widget(block, inner[0]);

    let bar_height = chart_area.height.saturating_sub(1) as usize;
    if bar_height == 0 || report.buckets.is_empty() {
        return;
    }

    let bucket_width = std::cmp::max(1, chart_area.width as usize / report.buckets.len());
    let max_total = report
        .buckets
        .iter()
        .map(|b| b.total.to_f64().unwrap_or(0.0))
        .fold(0.0_f64, f64::max)
        .max(1.0);

    // Per bucket: stacked category heights, computed once for every row.
    let stacks: Vec<Vec<(String, usize)>> = report
        .buckets
        .iter()
        .map(|b| {
            let total = b.total.to_f64().unwrap_or(0.0);
            let scaled = (total / max_total * bar_height as f64).ceil() as usize;
            compute_category_heights(&b.totals, total, scaled)
        })
        .collect();

    let mut lines: Vec<Line> = Vec::new();
    for row in 0..bar_height {
        let level = bar_height - row;
        let spans: Vec<Span> = stacks
            .iter()
            .map(|stack| {
                let mut reached = 0usize;
                for (category, height) in stack {
                    reached += height;
                    if level <= reached {
                        let color = colors.get(category).copied().unwrap_or(Color::White);
                        return Span::styled("█".repeat(bucket_width), Style::default().fg(color));
                    }
                }
                Span::raw(" ".repeat(bucket_width))
            })
            .collect();
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), chart_area);

    let labels = build_bucket_labels(&report.buckets, chart_area.width as usize, bucket_width);
    frame.render_widget(Paragraph::new(labels).alignment(Alignment::Left), inner[1]);
}

fn build_bucket_labels(buckets: &[TrendBucket], width: usize, bucket_width: usize) -> Vec<Line<'static>> {
    if buckets.is_empty() {
        return vec![Line::from("")];
    }
    if bucket_width < 4 {
        return vec![Line::from(" ".repeat(width))];
    }

    let spans: Vec<Span> = buckets
        .iter()
        .map(|bucket| {
            let mut label = bucket.start.format("%m-%d").to_string();
            label.truncate(bucket_width);
            Span::raw(format!("{label:bucket_width$}"))
        })
        .collect();

    vec![Line::from(spans)]
}

/// Splits `bar_height` rows between categories proportionally to their totals
/// using largest remainders, so the stack always fills the bar exactly.
fn compute_category_heights(
    totals: &[(String, Decimal)],
    bucket_total: f64,
    bar_height: usize,
) -> Vec<(String, usize)> {
    if bucket_total <= 0.0 {
        return totals.iter().map(|(c, _)| (c.clone(), 0)).collect();
    }

    let mut heights: Vec<(String, usize, f64)> = totals
        .iter()
        .map(|(c, v)| {
            let exact = v.to_f64().unwrap_or(0.0) / bucket_total * bar_height as f64;
            let floor = exact.floor() as usize;
            (c.clone(), floor, exact - floor as f64)
        })
        .collect();

    let used: usize = heights.iter().map(|(_, h, _)| *h).sum();
    let mut remaining = bar_height.saturating_sub(used);
    heights.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    for entry in heights.iter_mut() {
        if remaining == 0 {
            break;
        }
        entry.1 += 1;
        remaining -= 1;
    }

    heights.into_iter().map(|(c, h, _)| (c, h)).collect()
}

fn render_pie_chart(
    frame: &mut ratatui::Frame,
    area: Rect,
    report: &TrendReport,
    colors: &HashMap<String, Color>,
) {
    let block = Block::default().title("Category Share").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if report.total <= Decimal::ZERO {
        let empty = Paragraph::new("No expenses in this range").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let total = report.total.to_f64().unwrap_or(1.0);
    let mut slices = Vec::new();
    let mut start_angle = 0.0_f64;
    for (category, amount) in &report.category_totals {
        let sweep = amount.to_f64().unwrap_or(0.0) / total * std::f64::consts::TAU;
        slices.push((start_angle, start_angle + sweep, category.clone()));
        start_angle += sweep;
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (start, end, category) in &slices {
                let color = colors.get(category).copied().unwrap_or(Color::White);
                let mut points = Vec::new();
                let mut r = 0.0;
                while r <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((r * angle.cos(), r * angle.sin()));
                        angle += 0.05;
                    }
                    r += 0.04;
                }
                if !points.is_empty() {
                    ctx.draw(&Points {
                        coords: &points,
                        color,
                    });
                }
            }
        });

    frame.render_widget(canvas, inner);
}

fn render_category_table(
    frame: &mut ratatui::Frame,
    area: Rect,
    report: &TrendReport,
    colors: &HashMap<String, Color>,
) {
    let block = Block::default().title("Category Spend").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if report.category_totals.is_empty() {
        let empty = Paragraph::new("No expenses in this range").alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let bold = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:15}", "Category"), bold),
        Span::raw("  "),
        Span::styled(format!("{:>12}", "Amount"), bold),
    ])];

    for (category, amount) in &report.category_totals {
        let style = Style::default().fg(colors.get(category).copied().unwrap_or(Color::White));
        lines.push(Line::from(vec![
            Span::styled(format!("{category:15}"), style),
            Span::raw("  "),
            Span::styled(format!("{:>12}", amount.round_dp(2).to_string()), style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}
