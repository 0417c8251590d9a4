use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};

use crate::error::{QuizError, Result};

/// Second-resolution UTC timestamps, as persisted.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column order for any tabular persistence.
pub const HEADERS: [&str; 5] = ["timestamp_utc", "learner_name", "score", "total", "percent"];

/// One completed play-through. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub timestamp_utc: DateTime<Utc>,
    pub learner_name: String,
    pub score: u32,
    pub total: u32,
    pub percent: f64,
}

/// `100 * score / total`, or 0 for an empty quiz.
pub fn percent_of(score: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(total) * 100.0
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| QuizError::MalformedRecord(format!("timestamp {raw:?}: {e}")))?;
    Ok(Utc.from_utc_datetime(&naive))
}

impl ScoreRecord {
    pub fn new(learner_name: &str, score: u32, total: u32, timestamp_utc: DateTime<Utc>) -> Self {
        Self {
            timestamp_utc: timestamp_utc.trunc_subsecs(0),
            learner_name: learner_name.to_string(),
            score,
            total,
            percent: percent_of(score, total),
        }
    }

    /// Stamped with the current time.
    pub fn now(learner_name: &str, score: u32, total: u32) -> Self {
        Self::new(learner_name, score, total, Utc::now())
    }

    /// Fields in `HEADERS` order, percent with two decimals.
    pub fn to_fields(&self) -> [String; 5] {
        [
            format_timestamp(&self.timestamp_utc),
            self.learner_name.clone(),
            self.score.to_string(),
            self.total.to_string(),
            format!("{:.2}", self.percent),
        ]
    }

    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fields = fields.into_iter();
        let mut next = |name: &str| {
            fields
                .next()
                .ok_or_else(|| QuizError::MalformedRecord(format!("missing field {name}")))
        };

        let timestamp_utc = parse_timestamp(next("timestamp_utc")?)?;
        let learner_name = next("learner_name")?.to_string();
        let score = parse_number::<u32>("score", next("score")?)?;
        let total = parse_number::<u32>("total", next("total")?)?;
        let percent = parse_number::<f64>("percent", next("percent")?)?;
        if !percent.is_finite() {
            return Err(QuizError::MalformedRecord(format!("percent {percent} is not finite")));
        }

        Ok(Self {
            timestamp_utc,
            learner_name,
            score,
            total,
            percent,
        })
    }

    /// Display form: `24/30`.
    pub fn score_label(&self) -> String {
        format!("{}/{}", self.score, self.total)
    }

    /// Display form: `80.0%`.
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| QuizError::MalformedRecord(format!("{name} {raw:?}: {e}")))
}
