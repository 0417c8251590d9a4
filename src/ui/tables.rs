use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use identiquiz::{
    record::{format_timestamp, ScoreRecord},
    view::{Dashboard, LeaderboardRow},
};

use crate::{
    ui::{centered, frame_chunks, render_chrome},
    App, AppState, LoginField,
};

/// Pure presenter for one ranking row
pub fn present_row(row: &LeaderboardRow) -> Row<'static> {
    let position = match row.medal {
        Some(medal) => format!("{medal} {}", row.position),
        None => row.position.to_string(),
    };
    let style = if row.medal.is_some() && row.position <= 3 {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(position),
        Cell::from(row.learner_name.clone()),
        Cell::from(row.points.clone()),
        Cell::from(row.percent.clone()),
        Cell::from(row.timestamp_utc.clone()),
    ])
    .style(style)
}

/// Raw history row; blank names are shown as a dash
pub fn present_record(record: &ScoreRecord) -> Row<'static> {
    let name = if record.learner_name.trim().is_empty() {
        "—".to_string()
    } else {
        record.learner_name.clone()
    };
    Row::new(vec![
        Cell::from(format_timestamp(&record.timestamp_utc)),
        Cell::from(name),
        Cell::from(record.score_label()),
        Cell::from(record.percent_label()),
    ])
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().map(|c| Cell::from(*c))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

fn ranking_table(title: &'static str, rows: &[LeaderboardRow]) -> Table<'static> {
    let widths = [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(20),
    ];
    Table::new(rows.iter().map(present_row), widths)
        .header(header(&["#", "Learner", "Points", "%", "When (UTC)"]))
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(2)
}

fn recent_table(records: &[ScoreRecord]) -> Table<'static> {
    let widths = [
        Constraint::Length(20),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(8),
    ];
    Table::new(records.iter().map(present_record), widths)
        .header(header(&["When (UTC)", "Learner", "Points", "%"]))
        .block(Block::default().borders(Borders::ALL).title("Recent attempts"))
        .column_spacing(2)
}

/// Render the instructor area: login form or dashboard
pub fn render_admin(app: &App, f: &mut Frame) {
    let chunks = frame_chunks(f.area());
    render_chrome(app, &chunks, f.buffer_mut());

    match (app.state, &app.dashboard) {
        (AppState::AdminDashboard, Some(dashboard)) if !dashboard.is_empty() => {
            render_dashboard(dashboard, f, chunks[1])
        }
        (AppState::AdminDashboard, _) => {
            let no_data = Paragraph::new("No score records yet.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray));
            f.render_widget(no_data, centered(chunks[1].width, 1, chunks[1]));
        }
        _ => render_login(app, f, chunks[1]),
    }
}

fn render_dashboard(dashboard: &Dashboard, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(2, 5),
            Constraint::Ratio(1, 5),
            Constraint::Ratio(2, 5),
        ])
        .split(area);

    f.render_widget(ranking_table("Ranking (best attempt)", &dashboard.ranking), chunks[0]);
    f.render_widget(ranking_table("Needs attention", &dashboard.bottom), chunks[1]);
    f.render_widget(recent_table(&dashboard.recent), chunks[2]);
}

fn render_login(app: &App, f: &mut Frame, area: Rect) {
    let rect = centered(40, 8, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(rect);

    let title = Paragraph::new("Instructor login")
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(title, chunks[0]);

    let focus_style = |field: LoginField| {
        if app.login.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let user = Paragraph::new(Line::from(Span::raw(app.login.user.clone()))).block(
        Block::default()
            .borders(Borders::ALL)
            .title("user")
            .border_style(focus_style(LoginField::User)),
    );
    f.render_widget(user, chunks[1]);

    let masked = "*".repeat(app.login.pass.chars().count());
    let pass = Paragraph::new(masked).block(
        Block::default()
            .borders(Borders::ALL)
            .title("password")
            .border_style(focus_style(LoginField::Pass)),
    );
    f.render_widget(pass, chunks[2]);
}
