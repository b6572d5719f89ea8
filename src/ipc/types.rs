use serde::Deserialize;

use crate::model::{GradebookDoc, ScoreBook};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One loaded gradebook document plus the score lookup built from it.
pub struct Session {
    pub doc: GradebookDoc,
    pub book: ScoreBook,
}

impl Session {
    pub fn new(doc: GradebookDoc) -> Self {
        let book: ScoreBook = doc.scores.iter().cloned().collect();
        Self { doc, book }
    }
}

#[derive(Default)]
pub struct AppState {
    pub session: Option<Session>,
}
