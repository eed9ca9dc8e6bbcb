use crate::app::AppState;
use crate::report::Reporter;
use crate::storage::database::NewRecord;
use crate::types::message::Feedback;
use crate::ui::chat::PendingAnswer;
use dioxus::prelude::*;

#[component]
pub fn FeedbackForm(answer: PendingAnswer, on_saved: EventHandler<()>) -> Element {
    let app_state = use_context::<AppState>();
    let mut feedback = use_signal(|| Feedback::Correct);
    let mut correct_answer = use_signal(String::new);
    let mut comment = use_signal(String::new);

    let handle_submit = {
        let app_state = app_state.clone();
        let answer = answer.clone();
        move |_| {
            let record = NewRecord::rated(
                answer.model.clone(),
                answer.question.clone(),
                answer.answer.clone(),
                feedback(),
                &comment(),
                correct_answer(),
                answer.response_time,
            );
            let reporter = app_state.reporter();
            match app_state.store.save_turn(&record) {
                Ok(id) => {
                    tracing::debug!("Saved turn #{}", id);
                    reporter.success("Feedback saved. Thank you!");
                    app_state.history_changed();
                    on_saved.call(());
                }
                Err(e) => reporter.error(&format!("Failed to save feedback: {}", e)),
            }
        }
    };

    rsx! {
        div {
            class: "panel",
            style: "display: flex; flex-direction: column; gap: 10px;",
            div { class: "section-label", "Was this answer correct?" }
            div {
                class: "row",
                for choice in Feedback::ALL {
                    label {
                        key: "{choice.label()}",
                        class: "radio-row",
                        input {
                            r#type: "radio",
                            name: "feedback",
                            checked: feedback() == choice,
                            onchange: move |_| feedback.set(choice),
                        }
                        "{choice.label()}"
                    }
                }
            }

            label { "Correct answer (optional, used for scoring)" }
            textarea {
                class: "field",
                rows: "3",
                value: "{correct_answer}",
                oninput: move |evt| correct_answer.set(evt.value()),
            }

            label { "Comment (optional)" }
            input {
                class: "field",
                r#type: "text",
                value: "{comment}",
                oninput: move |evt| comment.set(evt.value()),
            }

            div {
                button {
                    class: "btn btn-primary",
                    onclick: handle_submit,
                    "Submit feedback"
                }
            }
        }
    }
}
