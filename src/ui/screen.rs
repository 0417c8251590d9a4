use ratatui::Frame;

use crate::{ui::tables::render_admin, App, AppState};

/// A UI Screen boundary: responsible for rendering one area of the app
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Name entry, questions and completion, through the App widget
pub struct LearnerScreen;

impl Screen for LearnerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Login form and score tables
pub struct AdminScreen;

impl Screen for AdminScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_admin(app, f);
    }
}

pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    if state.is_admin() {
        Box::new(AdminScreen)
    } else {
        Box::new(LearnerScreen)
    }
}
