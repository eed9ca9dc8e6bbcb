//! Sample records
//!
//! A small set of rated question/answer pairs used to populate an empty
//! history so the history and analysis pages have something to show.

use crate::storage::database::{HistoryFilter, HistoryStore, NewRecord};
use crate::storage::StorageError;
use crate::types::message::Feedback;

/// Model name recorded on seeded rows
pub const SAMPLE_MODEL: &str = "sample-data";

struct Sample {
    question: &'static str,
    answer: &'static str,
    correct_answer: &'static str,
    feedback: Feedback,
    comment: &'static str,
    response_time: f64,
}

const SAMPLES: &[Sample] = &[
    Sample {
        question: "日本の首都はどこですか？",
        answer: "日本の首都は東京です。",
        correct_answer: "日本の首都は東京です。",
        feedback: Feedback::Correct,
        comment: "",
        response_time: 1.2,
    },
    Sample {
        question: "What is Python?",
        answer: "Python is a high-level programming language known for its readable syntax.",
        correct_answer: "Python is a high-level, general-purpose programming language that emphasizes code readability.",
        feedback: Feedback::Correct,
        comment: "",
        response_time: 2.4,
    },
    Sample {
        question: "富士山の高さは？",
        answer: "富士山の高さは約3000メートルです。",
        correct_answer: "富士山の高さは3776メートルです。",
        feedback: Feedback::PartiallyCorrect,
        comment: "数値が不正確",
        response_time: 1.6,
    },
    Sample {
        question: "What does HTTP stand for?",
        answer: "HTTP stands for High Transfer Text Protocol.",
        correct_answer: "HTTP stands for Hypertext Transfer Protocol.",
        feedback: Feedback::PartiallyCorrect,
        comment: "expansion is garbled",
        response_time: 1.9,
    },
    Sample {
        question: "光の速さはどれくらいですか？",
        answer: "光は音と同じ速さで進みます。",
        correct_answer: "光の速さは真空中で秒速約30万キロメートルです。",
        feedback: Feedback::Incorrect,
        comment: "",
        response_time: 2.1,
    },
    Sample {
        question: "Who wrote 'Norwegian Wood'?",
        answer: "It was written by Yukio Mishima.",
        correct_answer: "Norwegian Wood was written by Haruki Murakami.",
        feedback: Feedback::Incorrect,
        comment: "wrong author",
        response_time: 3.0,
    },
];

/// The sample set as rated records, metrics included
pub fn sample_records() -> Vec<NewRecord> {
    SAMPLES
        .iter()
        .map(|s| {
            NewRecord::rated(
                SAMPLE_MODEL,
                s.question,
                s.answer,
                s.feedback,
                s.comment,
                s.correct_answer,
                s.response_time,
            )
        })
        .collect()
}

/// Insert the whole sample set, returning how many rows were added
pub fn add_sample_records(store: &HistoryStore) -> Result<usize, StorageError> {
    let added = store.save_turns(&sample_records())?;
    tracing::info!("Added {} sample records", added);
    Ok(added)
}

/// Seed the store when it is empty. Returns whether anything was inserted.
pub fn ensure_initial_data(store: &HistoryStore) -> Result<bool, StorageError> {
    if store.count(HistoryFilter::All)? > 0 {
        return Ok(false);
    }
    tracing::info!("Chat history is empty, inserting sample records");
    add_sample_records(store)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_initial_data_seeds_once() {
        let store = HistoryStore::open_in_memory().unwrap();
        assert!(ensure_initial_data(&store).unwrap());
        assert!(!ensure_initial_data(&store).unwrap());
        assert_eq!(store.count(HistoryFilter::All).unwrap(), SAMPLES.len());
    }

    #[test]
    fn test_ensure_initial_data_leaves_existing_history() {
        let store = HistoryStore::open_in_memory().unwrap();
        store
            .save_turn(&NewRecord::rated(
                "google/gemma-2-2b-jpn-it",
                "q",
                "a",
                Feedback::Correct,
                "",
                "",
                0.5,
            ))
            .unwrap();
        assert!(!ensure_initial_data(&store).unwrap());
        assert_eq!(store.count(HistoryFilter::All).unwrap(), 1);
    }

    #[test]
    fn test_samples_cover_every_feedback() {
        let records = sample_records();
        for feedback in Feedback::ALL {
            assert!(records.iter().any(|r| r.is_correct == feedback.score()));
        }
        assert!(records.iter().all(|r| r.scores.word_count > 0));
    }

    #[test]
    fn test_add_sample_records_appends() {
        let store = HistoryStore::open_in_memory().unwrap();
        add_sample_records(&store).unwrap();
        add_sample_records(&store).unwrap();
        assert_eq!(store.count(HistoryFilter::All).unwrap(), 2 * SAMPLES.len());
    }
}
