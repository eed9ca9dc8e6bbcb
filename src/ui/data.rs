//! Sample data management page

use crate::app::AppState;
use crate::report::Reporter;
use crate::storage::database::HistoryFilter;
use crate::storage::seed::add_sample_records;
use dioxus::prelude::*;

#[component]
pub fn DataPage() -> Element {
    let app_state = use_context::<AppState>();
    let mut confirm_clear = use_signal(|| false);
    let _version = (app_state.history_version)();

    let count = app_state.store.count(HistoryFilter::All);

    let handle_add = {
        let app_state = app_state.clone();
        move |_| {
            let reporter = app_state.reporter();
            match add_sample_records(&app_state.store) {
                Ok(added) => {
                    reporter.success(&format!("Added {} sample records.", added));
                    app_state.history_changed();
                }
                Err(e) => reporter.error(&format!("Failed to add sample records: {}", e)),
            }
        }
    };

    let handle_clear = {
        let app_state = app_state.clone();
        move |_| {
            if !confirm_clear() {
                return;
            }
            let reporter = app_state.reporter();
            match app_state.store.clear() {
                Ok(removed) => {
                    reporter.success(&format!("Deleted {} records.", removed));
                    app_state.history_changed();
                }
                Err(e) => reporter.error(&format!("Failed to clear history: {}", e)),
            }
            confirm_clear.set(false);
        }
    };

    rsx! {
        h2 { "Sample data" }

        div {
            class: "panel",
            match count {
                Ok(count) => rsx! {
                    div { class: "muted", "Stored records" }
                    div { class: "stat", div { class: "value", "{count}" } }
                },
                Err(e) => rsx! {
                    div { class: "notice notice-error", span { "Failed to count records: {e}" } }
                },
            }
        }

        div {
            class: "panel",
            style: "display: flex; flex-direction: column; gap: 8px;",
            div { class: "section-label", "Add samples" }
            p { class: "muted", "Insert a small set of rated Japanese and English question/answer pairs." }
            div {
                button { class: "btn btn-primary", onclick: handle_add, "Add sample records" }
            }
        }

        div {
            class: "panel",
            style: "display: flex; flex-direction: column; gap: 8px;",
            div { class: "section-label", "Clear history" }
            label {
                class: "radio-row",
                input {
                    r#type: "checkbox",
                    checked: confirm_clear(),
                    onchange: move |evt| confirm_clear.set(evt.checked()),
                }
                "I understand that every stored record will be deleted"
            }
            div {
                button {
                    class: "btn btn-danger",
                    disabled: !confirm_clear(),
                    onclick: handle_clear,
                    "Clear history"
                }
            }
        }
    }
}
