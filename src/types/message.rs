//! Message types
//!
//! Defines chat message structures, roles and answer feedback.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Message from the user
    User,
}

impl Role {
    /// Role name as understood by chat templates
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The content of the message
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// User rating of a generated answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    Correct,
    PartiallyCorrect,
    Incorrect,
}

impl Feedback {
    pub const ALL: [Feedback; 3] = [
        Feedback::Correct,
        Feedback::PartiallyCorrect,
        Feedback::Incorrect,
    ];

    /// Score stored in the `is_correct` column
    pub fn score(self) -> f64 {
        match self {
            Feedback::Correct => 1.0,
            Feedback::PartiallyCorrect => 0.5,
            Feedback::Incorrect => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feedback::Correct => "Correct",
            Feedback::PartiallyCorrect => "Partially correct",
            Feedback::Incorrect => "Incorrect",
        }
    }

    /// Feedback text as stored: the label, plus the comment when there is one
    pub fn with_comment(self, comment: &str) -> String {
        let comment = comment.trim();
        if comment.is_empty() {
            self.label().to_string()
        } else {
            format!("{}: {}", self.label(), comment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, world!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, world!");
        assert_eq!(msg.role.as_str(), "user");
    }

    #[test]
    fn test_feedback_scores() {
        assert_eq!(Feedback::Correct.score(), 1.0);
        assert_eq!(Feedback::PartiallyCorrect.score(), 0.5);
        assert_eq!(Feedback::Incorrect.score(), 0.0);
    }

    #[test]
    fn test_feedback_with_comment() {
        assert_eq!(Feedback::Correct.with_comment("  "), "Correct");
        assert_eq!(
            Feedback::Incorrect.with_comment("wrong year"),
            "Incorrect: wrong year"
        );
    }
}
