//! Question input: auto-growing textarea with a send button

use dioxus::prelude::*;

/// Estimate how many rows the textarea needs based on content
fn compute_rows(text: &str) -> usize {
    let newlines = text.chars().filter(|&c| c == '\n').count();
    // Each visual line ~ 70 chars for our input width
    let wrap_lines: usize = text
        .lines()
        .map(|line| line.chars().count().saturating_sub(1) / 70)
        .sum();
    let total = newlines + wrap_lines + 1;
    total.clamp(1, 8)
}

#[component]
pub fn QuestionInput(on_send: EventHandler<String>, is_generating: bool) -> Element {
    let mut text = use_signal(String::new);

    let handle_keydown = move |evt: KeyboardEvent| {
        if evt.key() == Key::Enter && !evt.modifiers().contains(Modifiers::SHIFT) {
            evt.prevent_default();
            if !is_generating && !text().trim().is_empty() {
                on_send.call(text());
                text.set(String::new());
            }
        }
    };

    let can_send = !is_generating && !text().trim().is_empty();
    let rows = compute_rows(&text());

    rsx! {
        div {
            class: "panel",
            textarea {
                class: "field",
                placeholder: "Ask a question (日本語 or English)...",
                value: "{text}",
                rows: "{rows}",
                disabled: is_generating,
                oninput: move |evt| text.set(evt.value()),
                onkeydown: handle_keydown,
            }
            div {
                class: "row",
                style: "justify-content: space-between; margin-top: 8px;",
                span { class: "muted", "Enter to send, Shift+Enter for a new line" }
                button {
                    class: "btn btn-primary",
                    disabled: !can_send,
                    onclick: move |_| {
                        if can_send {
                            on_send.call(text());
                            text.set(String::new());
                        }
                    },
                    if is_generating { "Generating..." } else { "Send" }
                }
            }
        }
    }
}
