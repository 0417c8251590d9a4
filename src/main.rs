pub mod ui;

use std::{
    collections::BTreeSet,
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

use identiquiz::{
    admin::AdminConsole,
    app_dirs::AppDirs,
    bank::QuestionBank,
    config::{Config, ConfigStore, FileConfigStore},
    justification::{options_for, JustificationOption},
    rules::{RuleSet, Verdict},
    runtime::{self, FixedTicker, QuizEvent, Runner},
    session::{Phase, Progress, QuestionOrder, RandomOrder, Session},
    store::{self, ScoreStore, StoreBackend},
    telemetry,
    view::Dashboard,
};

const TICK_RATE_MS: u64 = 250;
const MAX_INPUT_LEN: usize = 60;

/// terminal quiz on identifier naming rules
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Classify each identifier as valid, invalid or valid-but-poor-practice, justify your answer, and get your score recorded for the instructor leaderboard."
)]
pub struct Cli {
    /// question bank to play
    #[clap(short = 'b', long)]
    bank: Option<String>,

    /// where score records are kept
    #[clap(short = 's', long, value_enum)]
    store: Option<StoreBackend>,

    /// scores file (csv file or sqlite database, depending on --store)
    #[clap(long)]
    scores_path: Option<PathBuf>,

    /// learner name, skips the name prompt
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// print the verdict and reasons for each identifier, without the quiz
    Classify {
        #[clap(required = true)]
        identifiers: Vec<String>,
    },
    /// list the embedded question banks
    Banks,
}

impl Cli {
    /// Command line flags win over the config file.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(bank) = &self.bank {
            config.question_bank = bank.clone();
        }
        if let Some(backend) = self.store {
            config.store_backend = backend;
        }
        if let Some(path) = &self.scores_path {
            config.scores_path = Some(path.clone());
        }
        config
    }
}

pub type QuizSession = Session<Box<dyn QuestionOrder>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    NameEntry,
    Question,
    Completed,
    AdminLogin,
    AdminDashboard,
}

impl AppState {
    pub fn is_admin(&self) -> bool {
        matches!(self, AppState::AdminLogin | AppState::AdminDashboard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    User,
    Pass,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub user: String,
    pub pass: String,
    pub focus: LoginField,
}

impl LoginForm {
    fn focused(&mut self) -> &mut String {
        match self.focus {
            LoginField::User => &mut self.user,
            LoginField::Pass => &mut self.pass,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::User => LoginField::Pass,
            LoginField::Pass => LoginField::User,
        };
    }
}

pub struct App {
    pub session: QuizSession,
    pub store: Box<dyn ScoreStore>,
    pub admin: AdminConsole,
    pub state: AppState,
    pub name_input: String,
    pub choice: Option<Verdict>,
    pub selected: BTreeSet<JustificationOption>,
    pub login: LoginForm,
    pub dashboard: Option<Dashboard>,
    /// One-line notice: validation errors, save warnings, admin results
    pub message: Option<String>,
}

impl App {
    pub fn new(session: QuizSession, store: Box<dyn ScoreStore>, admin: AdminConsole) -> Self {
        let mut app = Self {
            session,
            store,
            admin,
            state: AppState::NameEntry,
            name_input: String::new(),
            choice: None,
            selected: BTreeSet::new(),
            login: LoginForm::default(),
            dashboard: None,
            message: None,
        };
        app.state = app.learner_state();
        app
    }

    pub fn from_config(config: &Config, name: Option<&str>) -> identiquiz::Result<Self> {
        let bank = QuestionBank::load(&config.question_bank)?;
        let store = store::open(config.store_backend, config.scores_path.clone())?;
        let order: Box<dyn QuestionOrder> = Box::new(RandomOrder::new());
        let session = Session::new(bank, config.rules(), order).with_min_name_len(config.min_name_len);
        let admin = AdminConsole::new(config.admin_credentials())
            .with_table_sizes(config.leaderboard_size, config.recent_size);

        let mut app = Self::new(session, store, admin);
        if let Some(name) = name {
            app.name_input = name.to_string();
            app.submit_name();
        }
        Ok(app)
    }

    /// Learner-side screen matching the session phase.
    pub fn learner_state(&self) -> AppState {
        match self.session.phase() {
            Phase::AwaitingName => AppState::NameEntry,
            Phase::InProgress => AppState::Question,
            Phase::Completed => AppState::Completed,
        }
    }

    /// Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match key.code {
            KeyCode::Tab => {
                self.toggle_admin();
                return false;
            }
            KeyCode::Esc if self.state.is_admin() => {
                self.state = self.learner_state();
                self.message = None;
                return false;
            }
            KeyCode::Esc => return true,
            _ => {}
        }

        match self.state {
            AppState::NameEntry => self.on_name_key(key),
            AppState::Question => self.on_question_key(key),
            AppState::Completed => self.on_completed_key(key),
            AppState::AdminLogin => self.on_login_key(key),
            AppState::AdminDashboard => self.on_dashboard_key(key),
        }
        false
    }

    fn toggle_admin(&mut self) {
        self.message = None;
        if self.state.is_admin() {
            self.state = self.learner_state();
        } else if self.admin.is_authenticated() {
            self.refresh_dashboard();
            self.state = AppState::AdminDashboard;
        } else {
            self.state = AppState::AdminLogin;
        }
    }

    fn on_name_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_name(),
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Delete => self.clear_learner(),
            KeyCode::Char(c) if self.name_input.chars().count() < MAX_INPUT_LEN => self.name_input.push(c),
            _ => {}
        }
    }

    fn submit_name(&mut self) {
        match self.session.start(&self.name_input) {
            Ok(()) => {
                self.reset_answer();
                self.message = None;
                self.state = self.learner_state();
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn clear_learner(&mut self) {
        self.session.change_learner();
        self.name_input.clear();
        self.reset_answer();
        self.message = None;
        self.state = AppState::NameEntry;
    }

    fn reset_answer(&mut self) {
        self.choice = None;
        self.selected.clear();
    }

    fn on_question_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('L') => return self.clear_learner(),
            KeyCode::Char('R') => return self.restart(),
            _ => {}
        }

        if self.session.is_revealed() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('n')) {
                self.advance();
            }
            return;
        }

        match key.code {
            KeyCode::Char(c @ '1'..='3') => {
                let idx = (c as u8 - b'1') as usize;
                self.choice = Verdict::CHOICES.get(idx).copied();
                self.selected.clear();
                self.message = None;
            }
            KeyCode::Char(c @ 'a'..='d') => {
                let Some(choice) = self.choice else { return };
                if let Some(option) = options_for(choice).get((c as u8 - b'a') as usize) {
                    if !self.selected.remove(option) {
                        self.selected.insert(*option);
                    }
                }
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some(choice) = self.choice else {
            self.message = Some("choose a classification first (1, 2 or 3)".to_string());
            return;
        };
        self.message = match self.session.submit_answer(choice, &self.selected) {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
    }

    fn advance(&mut self) {
        match self.session.advance(self.store.as_ref()) {
            Ok(Progress::Next) => {
                self.reset_answer();
                self.message = None;
            }
            Ok(Progress::Completed(completion)) => {
                self.reset_answer();
                self.message = None;
                info!(target: "identiquiz", learner = %completion.learner_name, saved = completion.save_warning.is_none(), "quiz finished");
                self.state = AppState::Completed;
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn restart(&mut self) {
        match self.session.restart() {
            Ok(()) => {
                self.reset_answer();
                self.message = None;
                self.state = self.learner_state();
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn on_completed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => self.restart(),
            KeyCode::Char('c') | KeyCode::Char('L') => self.clear_learner(),
            _ => {}
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Down => self.login.toggle_focus(),
            KeyCode::Backspace => {
                self.login.focused().pop();
            }
            KeyCode::Enter if self.login.focus == LoginField::User => self.login.focus = LoginField::Pass,
            KeyCode::Enter => {
                let result = self.admin.login(&self.login.user, &self.login.pass);
                self.login.pass.clear();
                match result {
                    Ok(()) => {
                        self.login = LoginForm::default();
                        self.message = None;
                        self.refresh_dashboard();
                        self.state = AppState::AdminDashboard;
                    }
                    Err(e) => self.message = Some(e.to_string()),
                }
            }
            KeyCode::Char(c) => {
                let field = self.login.focused();
                if field.chars().count() < MAX_INPUT_LEN {
                    field.push(c);
                }
            }
            _ => {}
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) {
        if self.admin.clear_pending() {
            match key.code {
                KeyCode::Char('y') => {
                    self.message = Some(match self.admin.confirm_clear(self.store.as_ref()) {
                        Ok(()) => "all score records deleted".to_string(),
                        Err(e) => e.to_string(),
                    });
                    self.refresh_dashboard();
                }
                KeyCode::Char('n') => {
                    self.admin.cancel_clear();
                    self.message = Some("clear cancelled".to_string());
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('x') => {
                self.message = match self.admin.request_clear() {
                    Ok(()) => None,
                    Err(e) => Some(e.to_string()),
                };
            }
            KeyCode::Char('u') => self.refresh_dashboard(),
            KeyCode::Char('l') => {
                self.admin.logout();
                self.dashboard = None;
                self.message = None;
                self.state = AppState::AdminLogin;
            }
            _ => {}
        }
    }

    fn refresh_dashboard(&mut self) {
        match self.admin.dashboard(self.store.as_ref()) {
            Ok(dashboard) => self.dashboard = Some(dashboard),
            Err(e) => self.message = Some(e.to_string()),
        }
    }
}

fn classify<W: Write>(rules: &RuleSet, identifiers: &[String], out: &mut W) -> io::Result<()> {
    for identifier in identifiers {
        writeln!(out, "{identifier:?}: {}", rules.assess(identifier))?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply(config_store.load());

    match &cli.command {
        Some(Command::Classify { identifiers }) => {
            classify(&config.rules(), identifiers, &mut io::stdout().lock())?;
            return Ok(());
        }
        Some(Command::Banks) => {
            for name in QuestionBank::available() {
                println!("{name}");
            }
            return Ok(());
        }
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        if let Err(e) = telemetry::init_tracing(&log_path) {
            eprintln!("logging disabled: {e}");
        }
    }

    let mut app = match App::from_config(&config, cli.name.as_deref()) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };
    info!(target: "identiquiz", bank = %config.question_bank, store = %config.store_backend, "starting quiz");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        runtime::terminal_events(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            QuizEvent::Tick => {}
            QuizEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            QuizEvent::Key(key) => {
                if app.handle_key(key) {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use identiquiz::admin::AdminCredentials;
    use identiquiz::error::QuizError;
    use identiquiz::record::ScoreRecord;
    use identiquiz::session::FixedOrder;
    use identiquiz::store::MemoryScoreStore;
    use std::sync::Arc;

    /// Shares one memory store between the app and the test.
    struct SharedStore(Arc<MemoryScoreStore>);

    impl ScoreStore for SharedStore {
        fn append(&self, record: &ScoreRecord) -> identiquiz::Result<()> {
            self.0.append(record)
        }
        fn load_all(&self) -> identiquiz::Result<Vec<ScoreRecord>> {
            self.0.load_all()
        }
        fn clear_all(&self) -> identiquiz::Result<()> {
            self.0.clear_all()
        }
    }

    fn app_with(identifiers: &[&str]) -> (App, Arc<MemoryScoreStore>) {
        let records = Arc::new(MemoryScoreStore::default());
        let order: Box<dyn QuestionOrder> = Box::new(FixedOrder);
        let session = Session::new(
            QuestionBank::from_identifiers("test", identifiers.iter().copied()),
            RuleSet::default(),
            order,
        );
        let app = App::new(
            session,
            Box::new(SharedStore(records.clone())),
            AdminConsole::new(AdminCredentials::new("admin", "admin")),
        );
        (app, records)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn press(app: &mut App, codes: &[KeyCode]) {
        for code in codes {
            app.handle_key(key(*code));
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["identiquiz"]);
        assert_eq!(cli.bank, None);
        assert_eq!(cli.store, None);
        assert_eq!(cli.name, None);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "identiquiz",
            "--bank",
            "basic",
            "--store",
            "sqlite",
            "--scores-path",
            "/tmp/s.db",
        ]);
        let config = cli.apply(Config::default());
        assert_eq!(config.question_bank, "basic");
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.scores_path, Some(PathBuf::from("/tmp/s.db")));
        assert_eq!(config.min_name_len, 3);
    }

    #[test]
    fn test_cli_classify_subcommand() {
        let cli = Cli::parse_from(["identiquiz", "classify", "3base", "total"]);
        assert_eq!(
            cli.command,
            Some(Command::Classify {
                identifiers: vec!["3base".to_string(), "total".to_string()]
            })
        );
        assert!(Cli::try_parse_from(["identiquiz", "classify"]).is_err());
    }

    #[test]
    fn test_classify_output() {
        let mut out = Vec::new();
        classify(
            &RuleSet::default(),
            &["3base".to_string(), "x".to_string()],
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"3base\": Invalid (Starts with a number)"));
        assert!(text.contains("\"x\": Valid, but poor practice"));
    }

    #[test]
    fn test_short_name_is_rejected() {
        let (mut app, _) = app_with(&["base"]);
        assert_eq!(app.state, AppState::NameEntry);
        type_text(&mut app, " al ");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state, AppState::NameEntry);
        assert!(app.message.is_some());

        press(&mut app, &[KeyCode::Delete]);
        assert!(app.name_input.is_empty());
        type_text(&mut app, "Ana");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state, AppState::Question);
        assert_eq!(app.session.learner(), Some("Ana"));
    }

    #[test]
    fn test_play_through_records_score() {
        let (mut app, records) = app_with(&["base", "3base", "x"]);
        type_text(&mut app, "Ana Lima");
        press(&mut app, &[KeyCode::Enter]);

        // base: valid
        press(&mut app, &[KeyCode::Char('1'), KeyCode::Enter]);
        assert!(app.session.is_revealed());
        press(&mut app, &[KeyCode::Enter]);

        // 3base: invalid, justified with "starts with a number"
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Enter]);
        assert!(!app.session.is_revealed());
        assert!(app.message.is_some());
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Enter]);
        assert_eq!(app.session.last_outcome().unwrap().justification_matched, Some(true));
        press(&mut app, &[KeyCode::Char('n')]);

        // x: answered valid, wrong
        press(&mut app, &[KeyCode::Char('1'), KeyCode::Enter, KeyCode::Enter]);

        assert_eq!(app.state, AppState::Completed);
        let saved = records.load_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].learner_name, "Ana Lima");
        assert_eq!(saved[0].score, 2);
        assert_eq!(saved[0].total, 3);

        press(&mut app, &[KeyCode::Char('r')]);
        assert_eq!(app.state, AppState::Question);
        assert_eq!(app.session.score(), 0);
        assert_eq!(records.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_option_keys_follow_the_choice() {
        let (mut app, _) = app_with(&["x"]);
        type_text(&mut app, "Ana");
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('a')]);
        assert!(app.selected.is_empty());

        press(&mut app, &[KeyCode::Char('3'), KeyCode::Char('a'), KeyCode::Char('d')]);
        assert_eq!(
            app.selected.iter().copied().collect::<Vec<_>>(),
            vec![JustificationOption::IsGeneric]
        );
        press(&mut app, &[KeyCode::Char('a')]);
        assert!(app.selected.is_empty());

        press(&mut app, &[KeyCode::Char('b'), KeyCode::Char('2')]);
        assert!(app.selected.is_empty());
    }

    #[test]
    fn test_change_learner_discards_progress() {
        let (mut app, records) = app_with(&["base", "total"]);
        type_text(&mut app, "Ana");
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('1'), KeyCode::Enter]);
        press(&mut app, &[KeyCode::Char('L')]);

        assert_eq!(app.state, AppState::NameEntry);
        assert_eq!(app.session.learner(), None);
        assert!(records.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_admin_login_dashboard_and_clear() {
        let (mut app, records) = app_with(&["base"]);
        records.append(&ScoreRecord::now("Bruno", 1, 1)).unwrap();

        press(&mut app, &[KeyCode::Tab]);
        assert_eq!(app.state, AppState::AdminLogin);

        type_text(&mut app, "admin");
        press(&mut app, &[KeyCode::Enter]);
        type_text(&mut app, "nope");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state, AppState::AdminLogin);
        assert_eq!(app.message, Some(QuizError::NotAuthenticated.to_string()));
        assert!(app.login.pass.is_empty());

        type_text(&mut app, "admin");
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.state, AppState::AdminDashboard);
        assert_eq!(app.dashboard.as_ref().unwrap().ranking.len(), 1);

        press(&mut app, &[KeyCode::Char('x'), KeyCode::Char('n')]);
        assert_eq!(records.load_all().unwrap().len(), 1);

        press(&mut app, &[KeyCode::Char('x'), KeyCode::Char('y')]);
        assert!(records.load_all().unwrap().is_empty());
        assert!(app.dashboard.as_ref().unwrap().is_empty());

        press(&mut app, &[KeyCode::Tab]);
        assert_eq!(app.state, AppState::NameEntry);
        press(&mut app, &[KeyCode::Tab]);
        assert_eq!(app.state, AppState::AdminDashboard);

        press(&mut app, &[KeyCode::Char('l')]);
        assert_eq!(app.state, AppState::AdminLogin);
        assert!(!app.admin.is_authenticated());
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.state, AppState::NameEntry);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = app_with(&["base"]);
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.handle_key(key(KeyCode::Esc)));
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
    }
}
