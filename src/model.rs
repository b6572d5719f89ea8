use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed epsilon for every "weights sum to 100" check. Each sum is compared
/// independently against this; tolerances are never combined across checks.
pub const WEIGHT_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    /// 1, 2 or 3. Frozen at subject creation so the scheme stays in sync.
    pub evaluation_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub id: String,
    pub subject_id: String,
    pub evaluations: Vec<Evaluation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub name: String,
    pub position: i64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Percentage weight toward the subject final, 0-100.
    pub weight: f64,
    pub tests: Vec<TestDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDef {
    pub id: String,
    pub evaluation_id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    /// Percentage weight within the owning evaluation, 0-100.
    pub weight: f64,
    /// Authoring default for the scoring UI. Not used for normalization;
    /// the max recorded on each Score is authoritative.
    pub max_score: f64,
    pub min_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub student_id: String,
    pub test_id: String,
    pub evaluation_id: String,
    pub value: f64,
    /// The max the score was actually entered against.
    pub max_value: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub last_name: String,
    pub first_name: String,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// The caller-supplied session document: one subject, its scheme (absent while
/// the teacher has not configured one), the roster, and the recorded scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradebookDoc {
    pub subject: Subject,
    #[serde(default)]
    pub scheme: Option<Scheme>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub scores: Vec<Score>,
}

/// Storage-agnostic score supply: zero or one score per (student, test).
pub trait ScoreLookup {
    fn score(&self, student_id: &str, test_id: &str) -> Option<&Score>;
}

/// Map-backed lookup keyed by (student, test). Inserting a second score for
/// the same pair overwrites rather than duplicates.
#[derive(Debug, Clone, Default)]
pub struct ScoreBook {
    by_pair: HashMap<(String, String), Score>,
}

impl ScoreBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, score: Score) {
        self.by_pair
            .insert((score.student_id.clone(), score.test_id.clone()), score);
    }

    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

impl ScoreLookup for ScoreBook {
    fn score(&self, student_id: &str, test_id: &str) -> Option<&Score> {
        self.by_pair
            .get(&(student_id.to_string(), test_id.to_string()))
    }
}

impl FromIterator<Score> for ScoreBook {
    fn from_iter<I: IntoIterator<Item = Score>>(iter: I) -> Self {
        let mut book = ScoreBook::new();
        for s in iter {
            book.insert(s);
        }
        book
    }
}
