//! Chat history database
//!
//! SQLite store of rated chat turns: one row per answer the user gave feedback
//! on, together with the evaluation metrics computed at save time.

use crate::metrics::{evaluate, Scores};
use crate::storage::StorageError;
use crate::types::message::Feedback;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chat_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    model TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    feedback TEXT NOT NULL,
    correct_answer TEXT NOT NULL DEFAULT '',
    is_correct REAL NOT NULL,
    response_time REAL NOT NULL,
    bleu_score REAL NOT NULL,
    similarity_score REAL NOT NULL,
    word_count INTEGER NOT NULL,
    relevance_score REAL NOT NULL
);
";

const SELECT_COLUMNS: &str = "id, timestamp, model, question, answer, feedback, correct_answer, \
    is_correct, response_time, bleu_score, similarity_score, word_count, relevance_score";

/// A rated turn ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub model: String,
    pub question: String,
    pub answer: String,
    /// Feedback label, with the user's comment appended when given
    pub feedback: String,
    pub correct_answer: String,
    pub is_correct: f64,
    /// Seconds taken to generate the answer
    pub response_time: f64,
    pub scores: Scores,
}

impl NewRecord {
    /// Build a record from user feedback, scoring the answer against the
    /// reference answer
    pub fn rated(
        model: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        feedback: Feedback,
        comment: &str,
        correct_answer: impl Into<String>,
        response_time: f64,
    ) -> Self {
        let answer = answer.into();
        let correct_answer = correct_answer.into();
        let scores = evaluate(&answer, &correct_answer);
        Self {
            model: model.into(),
            question: question.into(),
            answer,
            feedback: feedback.with_comment(comment),
            correct_answer,
            is_correct: feedback.score(),
            response_time,
            scores,
        }
    }
}

/// A stored turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub timestamp: String,
    pub model: String,
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub correct_answer: String,
    pub is_correct: f64,
    pub response_time: f64,
    pub bleu_score: f64,
    pub similarity_score: f64,
    pub word_count: i64,
    pub relevance_score: f64,
}

impl ChatRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            model: row.get(2)?,
            question: row.get(3)?,
            answer: row.get(4)?,
            feedback: row.get(5)?,
            correct_answer: row.get(6)?,
            is_correct: row.get(7)?,
            response_time: row.get(8)?,
            bleu_score: row.get(9)?,
            similarity_score: row.get(10)?,
            word_count: row.get(11)?,
            relevance_score: row.get(12)?,
        })
    }
}

/// Which records a history query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Rated(Feedback),
}

impl HistoryFilter {
    pub const ALL: [HistoryFilter; 4] = [
        HistoryFilter::All,
        HistoryFilter::Rated(Feedback::Correct),
        HistoryFilter::Rated(Feedback::PartiallyCorrect),
        HistoryFilter::Rated(Feedback::Incorrect),
    ];

    pub fn label(self) -> &'static str {
        match self {
            HistoryFilter::All => "All",
            HistoryFilter::Rated(feedback) => feedback.label(),
        }
    }

    fn score(self) -> Option<f64> {
        match self {
            HistoryFilter::All => None,
            HistoryFilter::Rated(feedback) => Some(feedback.score()),
        }
    }
}

/// Aggregate statistics over the whole history
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub correct: usize,
    pub partially_correct: usize,
    pub incorrect: usize,
    pub avg_response_time: f64,
    pub avg_bleu: f64,
    pub avg_similarity: f64,
    pub avg_relevance: f64,
    pub avg_word_count: f64,
}

impl HistorySummary {
    /// Mean feedback score: 1.0 all correct, 0.0 all incorrect
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.correct as f64 + 0.5 * self.partially_correct as f64) / self.total as f64
    }
}

fn insert(conn: &Connection, record: &NewRecord) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO chat_history (timestamp, model, question, answer, feedback, correct_answer,
            is_correct, response_time, bleu_score, similarity_score, word_count, relevance_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            record.model,
            record.question,
            record.answer,
            record.feedback,
            record.correct_answer,
            record.is_correct,
            record.response_time,
            record.scores.bleu,
            record.scores.similarity,
            record.scores.word_count as i64,
            record.scores.relevance,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Chat history store backed by SQLite
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (creating if needed) the database at `path` and initialise the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        store.init_db()?;
        tracing::debug!("Opened chat history at {:?}", path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_db()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Create the table if it does not exist. Safe to call repeatedly.
    pub fn init_db(&self) -> Result<(), StorageError> {
        self.conn()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert a rated turn, returning its row id
    pub fn save_turn(&self, record: &NewRecord) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        let id = insert(&conn, record)?;
        tracing::debug!("Saved chat turn {} ({})", id, record.feedback);
        Ok(id)
    }

    /// Insert every record in one transaction: all of them or none
    pub fn save_turns(&self, records: &[NewRecord]) -> Result<usize, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for record in records {
            insert(&tx, record)?;
        }
        tx.commit()?;
        tracing::debug!("Saved {} chat turns", records.len());
        Ok(records.len())
    }

    /// Records matching `filter`, newest first
    pub fn query_history(
        &self,
        filter: HistoryFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ChatRecord>, StorageError> {
        let conn = self.conn()?;
        let records = match filter.score() {
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM chat_history ORDER BY id DESC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt.query_map(
                    params![limit as i64, offset as i64],
                    ChatRecord::from_row,
                )?;
                let records = rows.collect::<Result<Vec<_>, _>>()?;
                records
            }
            Some(score) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM chat_history WHERE is_correct = ?1
                     ORDER BY id DESC LIMIT ?2 OFFSET ?3"
                ))?;
                let rows = stmt.query_map(
                    params![score, limit as i64, offset as i64],
                    ChatRecord::from_row,
                )?;
                let records = rows.collect::<Result<Vec<_>, _>>()?;
                records
            }
        };
        Ok(records)
    }

    /// Number of records matching `filter`
    pub fn count(&self, filter: HistoryFilter) -> Result<usize, StorageError> {
        let conn = self.conn()?;
        let count: i64 = match filter.score() {
            None => conn.query_row("SELECT COUNT(*) FROM chat_history", [], |row| row.get(0))?,
            Some(score) => conn.query_row(
                "SELECT COUNT(*) FROM chat_history WHERE is_correct = ?1",
                params![score],
                |row| row.get(0),
            )?,
        };
        Ok(count as usize)
    }

    pub fn summary(&self) -> Result<HistorySummary, StorageError> {
        let conn = self.conn()?;
        let summary = conn.query_row(
            "SELECT COUNT(*),
                    SUM(CASE WHEN is_correct = 1.0 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN is_correct = 0.5 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN is_correct = 0.0 THEN 1 ELSE 0 END),
                    AVG(response_time),
                    AVG(bleu_score),
                    AVG(similarity_score),
                    AVG(relevance_score),
                    AVG(word_count)
             FROM chat_history",
            [],
            |row| {
                Ok(HistorySummary {
                    total: row.get::<_, i64>(0)? as usize,
                    correct: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as usize,
                    partially_correct: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as usize,
                    incorrect: row.get::<_, Option<i64>>(3)?.unwrap_or(0) as usize,
                    avg_response_time: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                    avg_bleu: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                    avg_similarity: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                    avg_relevance: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                    avg_word_count: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
                })
            },
        )?;
        Ok(summary)
    }

    /// Delete every record, returning how many were removed
    pub fn clear(&self) -> Result<usize, StorageError> {
        let removed = self.conn()?.execute("DELETE FROM chat_history", [])?;
        tracing::info!("Cleared {} chat history records", removed);
        Ok(removed)
    }
}
