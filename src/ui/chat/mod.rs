//! Chat page
//!
//! One question at a time: the loaded model answers on a blocking thread, the
//! answer is shown with its response time, and the user rates it through the
//! feedback form before it is stored.

pub mod feedback;
pub mod input;
pub mod session;

use crate::app::AppState;
use crate::inference::LoadedModel;
use dioxus::prelude::*;
use feedback::FeedbackForm;
use input::QuestionInput;
use std::sync::Arc;

pub use session::{ChatSession, PendingAnswer};

#[component]
pub fn ChatPage(model: Arc<LoadedModel>) -> Element {
    let app_state = use_context::<AppState>();
    let mut chat = app_state.chat;
    let session = chat.read().clone();

    let model_id = model.identifier().to_string();

    let handle_send = {
        let app_state = app_state.clone();
        move |question: String| app_state.ask(Arc::clone(&model), question)
    };

    rsx! {
        div {
            h2 { "Chat" }
            p { class: "muted", "Answering with " span { class: "mono", "{model_id}" } }
        }

        QuestionInput {
            on_send: handle_send,
            is_generating: session.is_generating(),
        }

        if let Some(message) = session.error() {
            div { class: "notice notice-error", span { "Generation failed: {message}" } }
        }

        if let Some(answer) = session.pending() {
            div {
                class: "panel",
                div { class: "section-label", "Question" }
                p { class: "answer", "{answer.question}" }
                div { class: "section-label", "Answer" }
                p { class: "answer", "{answer.answer}" }
                p { class: "muted", "Response time: {answer.response_time:.2}s" }
            }

            FeedbackForm {
                answer: answer.clone(),
                on_saved: move |_| chat.write().clear_pending(),
            }
        }
    }
}
