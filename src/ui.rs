pub mod screen;
pub mod tables;

use std::rc::Rc;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use identiquiz::{
    rules::Verdict,
    view::{CompletionView, FeedbackView, QuestionView},
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

/// Header, body, notice line, legend.
pub(crate) fn frame_chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area)
}

/// Render the header, notice and legend lines around a body.
pub(crate) fn render_chrome(app: &App, chunks: &[Rect], buf: &mut Buffer) {
    let area_label = if app.state.is_admin() {
        "instructor area".to_string()
    } else {
        match app.session.learner() {
            Some(name) if !name.is_empty() => format!("learner: {name}"),
            _ => "learner area".to_string(),
        }
    };
    Paragraph::new(Line::from(vec![
        Span::styled("identiquiz", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  ·  "),
        Span::styled(area_label, Style::default().fg(Color::Cyan)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    if let Some(message) = &app.message {
        Paragraph::new(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled(
        legend(app),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

pub(crate) fn legend(app: &App) -> &'static str {
    match app.state {
        AppState::NameEntry => "(enter) start / (del) clear name / (tab) instructor area / (esc)ape",
        AppState::Question if app.session.is_revealed() => "(enter) next / (L) change learner / (esc)ape",
        AppState::Question => {
            "(1-3) classify / (a-d) justify / (enter) submit / (L) change learner / (tab) instructor / (esc)ape"
        }
        AppState::Completed => "(r)estart / (c)hange learner / (tab) instructor area / (esc)ape",
        AppState::AdminLogin => "(↑/↓) switch field / (enter) log in / (tab) back to quiz",
        AppState::AdminDashboard if app.admin.clear_pending() => {
            "delete ALL score records? (y)es / (n)o"
        }
        AppState::AdminDashboard => "(x) clear all / (u)pdate / (l)ogout / (tab) back to quiz",
    }
}

/// `width` x `height` box centred in `area`, clipped to it.
pub(crate) fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = frame_chunks(area);
        render_chrome(self, &chunks, buf);

        match self.state {
            AppState::NameEntry => render_name_entry(self, chunks[1], buf),
            AppState::Question => render_question(self, chunks[1], buf),
            AppState::Completed => render_completion(self, chunks[1], buf),
            // instructor screens render through ui::tables
            AppState::AdminLogin | AppState::AdminDashboard => {}
        }
    }
}

fn render_name_entry(app: &App, area: Rect, buf: &mut Buffer) {
    let width = (app.name_input.width() as u16 + 4).max(32);
    let rect = centered(width, 5, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(3)])
        .split(rect);

    Paragraph::new("What is your name?")
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .render(chunks[0], buf);

    Paragraph::new(Line::from(vec![
        Span::raw(app.name_input.as_str()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("name"))
    .render(chunks[1], buf);
}

fn render_question(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(view) = QuestionView::from_session(&app.session) else {
        return;
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // progress
            Constraint::Length(1),
            Constraint::Length(3), // identifier
            Constraint::Length(4), // choices
            Constraint::Min(1),    // justifications or feedback
        ])
        .split(area);

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(view.progress.clamp(0.0, 1.0))
        .label(format!(
            "question {}/{}  ·  score {}",
            view.position, view.total, view.score
        ))
        .render(chunks[0], buf);

    let identifier_width = (view.identifier.width() as u16 + 4).max(20);
    Paragraph::new(Span::styled(view.identifier.as_str(), bold))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(centered(identifier_width, 3, chunks[2]), buf);

    let feedback = app.session.last_outcome().map(FeedbackView::from);

    let choices: Vec<Line> = QuestionView::CHOICES
        .iter()
        .enumerate()
        .map(|(i, verdict)| {
            let picked = app.choice == Some(*verdict)
                || app.session.last_outcome().map(|o| o.chosen) == Some(*verdict);
            let style = match &feedback {
                Some(fb) if fb.expected == *verdict => bold.fg(Color::Green),
                Some(_) if picked => bold.fg(Color::Red),
                None if picked => bold.fg(Color::Cyan),
                _ => dim,
            };
            let marker = if picked { ">" } else { " " };
            Line::from(Span::styled(format!("{marker} {}) {verdict}", i + 1), style))
        })
        .collect();
    Paragraph::new(choices).render(chunks[3], buf);

    let lines = match &feedback {
        Some(fb) => feedback_lines(fb),
        None => justification_lines(app),
    };
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(chunks[4], buf);
}

fn justification_lines(app: &App) -> Vec<Line<'static>> {
    let Some(choice) = app.choice else {
        return Vec::new();
    };
    let options = QuestionView::options(choice);
    if options.is_empty() {
        return vec![Line::from("no justification needed, press enter to submit")];
    }

    let mut lines = vec![Line::from(Span::styled(
        "why? (pick at least one)",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(options.iter().enumerate().map(|(i, option)| {
        let key = (b'a' + i as u8) as char;
        let checked = if app.selected.contains(option) { "x" } else { " " };
        Line::from(format!("  {key}) [{checked}] {option}"))
    }));
    lines
}

fn feedback_lines(feedback: &FeedbackView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if feedback.correct {
        lines.push(Line::from(Span::styled(
            "Correct!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Not quite. The answer is: {}", feedback.expected),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    if feedback.expected == Verdict::Invalid && !feedback.reason_labels.is_empty() {
        lines.push(Line::from("Why it is invalid:"));
        lines.extend(
            feedback
                .reason_labels
                .iter()
                .map(|label| Line::from(format!("  • {label}"))),
        );
    }
    if let Some(note) = feedback.note {
        lines.push(Line::from(note));
    }
    if feedback.justification_warning {
        lines.push(Line::from(Span::styled(
            "None of the reasons you picked apply to this identifier.",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines
}

fn render_completion(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(view) = app.session.completion().map(CompletionView::from) else {
        Paragraph::new("This question bank is empty, nothing to score.")
            .alignment(Alignment::Center)
            .render(centered(area.width, 1, area), buf);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Well done, {}!", view.learner_name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("score {}/{}", view.score, view.total)),
        Line::from(Span::styled(
            view.percent_label(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(warning) = &view.warning {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("your score could not be saved: {warning}"),
            Style::default().fg(Color::Yellow),
        )));
    }

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered(area.width, height, area), buf);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::QuizSession;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use identiquiz::{
        admin::{AdminConsole, AdminCredentials},
        bank::QuestionBank,
        rules::RuleSet,
        session::{FixedOrder, QuestionOrder, Session},
        store::MemoryScoreStore,
    };
    use ratatui::{backend::TestBackend, Terminal};

    pub(crate) fn test_app(identifiers: &[&str]) -> App {
        let order: Box<dyn QuestionOrder> = Box::new(FixedOrder);
        let session: QuizSession = Session::new(
            QuestionBank::from_identifiers("test", identifiers.iter().copied()),
            RuleSet::default(),
            order,
        );
        App::new(
            session,
            Box::new(MemoryScoreStore::default()),
            AdminConsole::new(AdminCredentials::new("admin", "admin")),
        )
    }

    pub(crate) fn keys(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(KeyEvent::new(*code, KeyModifiers::NONE));
        }
    }

    pub(crate) fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    pub(crate) fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_centered_clips_to_area() {
        let area = Rect::new(0, 0, 10, 4);
        assert_eq!(centered(4, 2, area), Rect::new(3, 1, 4, 2));
        assert_eq!(centered(40, 10, area), area);
    }

    #[test]
    fn test_name_entry_screen() {
        let mut app = test_app(&["base"]);
        type_text(&mut app, "Ana");
        let content = rendered(&app);
        assert!(content.contains("What is your name?"));
        assert!(content.contains("Ana_"));
        assert!(content.contains("(del) clear name"));
    }

    #[test]
    fn test_question_screen_shows_identifier_and_options() {
        let mut app = test_app(&["nota_final", "x"]);
        type_text(&mut app, "Ana");
        keys(&mut app, &[KeyCode::Enter, KeyCode::Char('3'), KeyCode::Char('a')]);

        let content = rendered(&app);
        assert!(content.contains("nota_final"));
        assert!(content.contains("question 1/2"));
        assert!(content.contains("Valid, but poor practice"));
        assert!(content.contains("a) [x] Is generic"));
        assert!(content.contains("learner: Ana"));
    }

    #[test]
    fn test_feedback_screen() {
        let mut app = test_app(&["2 nota"]);
        type_text(&mut app, "Ana");
        keys(
            &mut app,
            &[KeyCode::Enter, KeyCode::Char('2'), KeyCode::Char('c'), KeyCode::Enter],
        );

        let content = rendered(&app);
        assert!(content.contains("Correct!"));
        assert!(content.contains("Starts with a number"));
        assert!(content.contains("Contains a space"));
        assert!(content.contains("None of the reasons you picked apply"));
        assert!(content.contains("(enter) next"));
    }

    #[test]
    fn test_completion_screen() {
        let mut app = test_app(&["base"]);
        type_text(&mut app, "Ana");
        keys(&mut app, &[KeyCode::Enter, KeyCode::Char('1'), KeyCode::Enter, KeyCode::Enter]);

        let content = rendered(&app);
        assert!(content.contains("Well done, Ana!"));
        assert!(content.contains("score 1/1"));
        assert!(content.contains("100.0%"));
    }

    #[test]
    fn test_empty_bank_completion_screen() {
        let mut app = test_app(&[]);
        type_text(&mut app, "Ana");
        keys(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state, AppState::Completed);
        assert!(rendered(&app).contains("bank is empty"));
    }
}
