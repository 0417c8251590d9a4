use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

use crate::error::{QuizError, Result};

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/banks");

/// A fixed master list of identifiers. Verdicts are never stored here;
/// they are computed by the rules at question time.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct QuestionBank {
    pub name: String,
    pub size: usize,
    identifiers: Vec<String>,
}

impl QuestionBank {
    pub fn load(name: &str) -> Result<Self> {
        let file = BANK_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| QuizError::UnknownBank(name.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| QuizError::Content(format!("{name}.json is not UTF-8")))?;

        let bank: QuestionBank =
            from_str(contents).map_err(|e| QuizError::Content(format!("{name}.json: {e}")))?;

        if bank.identifiers.len() != bank.size {
            return Err(QuizError::Content(format!(
                "{name}.json declares {} identifiers but lists {}",
                bank.size,
                bank.identifiers.len()
            )));
        }
        Ok(bank)
    }

    /// Build a bank from an explicit list, e.g. for tests or custom drills.
    pub fn from_identifiers<I, S>(name: &str, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
        Self {
            name: name.to_string(),
            size: identifiers.len(),
            identifiers,
        }
    }

    /// Names of the embedded banks, sorted.
    pub fn available() -> Vec<String> {
        let mut names: Vec<String> = BANK_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|stem| stem.to_str())
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
