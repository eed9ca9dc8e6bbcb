use crate::app::{AppState, ModelState};
use crate::ui::components::loading::Spinner;
use dioxus::prelude::*;

#[component]
pub fn ModelPicker(model_state: ModelState) -> Element {
    let app_state = use_context::<AppState>();
    let mut selected_model = app_state.selected_model;
    let current = selected_model.read().label().to_string();
    let labels: Vec<String> = app_state.registry.labels().map(str::to_string).collect();
    let labels_len = labels.len();
    let current_id = app_state.registry.resolve(&current).clone();
    let in_memory = app_state.models.loaded_count();

    rsx! {
        div {
            div { class: "section-label", "Model" }
            select {
                class: "field",
                style: "color-scheme: dark;",
                value: "{current}",
                disabled: matches!(model_state, ModelState::Loading),
                onchange: move |evt| {
                    let label = evt.value();
                    if selected_model.peek().label() != label {
                        tracing::info!("Model selection changed to {}", label);
                        selected_model.write().select(&label);
                    }
                },
                for label in labels {
                    option {
                        value: "{label}",
                        selected: label == current,
                        "{label}"
                    }
                }
            }

            p {
                class: "muted",
                "Current model: "
                span { class: "mono", "{current_id}" }
            }
            p { class: "muted", "{in_memory} of {labels_len} models in memory" }

            match &model_state {
                ModelState::Loading => rsx! {
                    div {
                        class: "row muted",
                        Spinner { size: 12 }
                        "Loading into memory..."
                    }
                },
                ModelState::Loaded(model) => rsx! {
                    div {
                        class: "row muted",
                        span { class: "status-dot", style: "background: var(--success);" }
                        "Ready on {model.device()}"
                    }
                },
                ModelState::Failed => rsx! {
                    div {
                        class: "row muted",
                        span { class: "status-dot", style: "background: var(--error);" }
                        "Load failed"
                        button {
                            class: "btn",
                            onclick: move |_| {
                                tracing::info!("Retrying load of {}", selected_model.peek().label());
                                selected_model.write().retry();
                            },
                            "Retry"
                        }
                    }
                },
            }
        }
    }
}
