//! Generation state of the chat page
//!
//! Held in [`AppState`](crate::app::AppState) so a running generation and its
//! unrated answer survive switching pages.

/// A generated answer awaiting feedback
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnswer {
    pub model: String,
    pub question: String,
    pub answer: String,
    /// Seconds
    pub response_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    generating: bool,
    pending: Option<PendingAnswer>,
    error: Option<String>,
}

impl ChatSession {
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn pending(&self) -> Option<&PendingAnswer> {
        self.pending.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start a generation, dropping the previous answer and error.
    /// Returns false while another generation is still running.
    pub fn begin(&mut self) -> bool {
        if self.generating {
            return false;
        }
        self.generating = true;
        self.pending = None;
        self.error = None;
        true
    }

    pub fn finish(&mut self, result: Result<PendingAnswer, String>) {
        self.generating = false;
        match result {
            Ok(answer) => self.pending = Some(answer),
            Err(message) => self.error = Some(message),
        }
    }

    /// Forget the answer once its feedback is stored
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}
