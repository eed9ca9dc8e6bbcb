use crate::app::AppState;
use crate::storage::settings::{save_settings, AppSettings};
use dioxus::prelude::*;

fn persist(settings: &AppSettings) {
    if let Err(error) = save_settings(settings) {
        tracing::error!("Failed to save settings: {}", error);
    }
}

#[component]
pub fn GenerationSettings() -> Element {
    let app_state = use_context::<AppState>();
    let mut settings_signal = app_state.settings;
    let mut expanded = use_signal(|| false);
    let settings = settings_signal.read().clone();
    let temperature = settings.temperature;
    let top_p = settings.top_p;
    let top_k = settings.top_k;
    let max_new_tokens = settings.max_new_tokens;
    let max_allowed = settings.context_size / 2;

    rsx! {
        div {
            button {
                class: "btn",
                style: "width: 100%;",
                onclick: move |_| expanded.toggle(),
                if expanded() { "Hide generation settings" } else { "Generation settings" }
            }

            if expanded() {
                div {
                    class: "panel",
                    style: "margin-top: 8px; display: flex; flex-direction: column; gap: 12px;",

                    div {
                        div { class: "row", style: "justify-content: space-between;",
                            label { "Temperature" }
                            span { class: "mono muted", "{temperature:.2}" }
                        }
                        input {
                            r#type: "range",
                            min: "0",
                            max: "2",
                            step: "0.1",
                            value: "{temperature}",
                            style: "width: 100%; accent-color: var(--accent-primary);",
                            oninput: move |e| {
                                let value: f32 = e.value().parse().unwrap_or(0.7);
                                let mut settings = settings_signal.write();
                                settings.temperature = value.clamp(0.0, 2.0);
                                persist(&settings);
                            },
                        }
                    }

                    div {
                        div { class: "row", style: "justify-content: space-between;",
                            label { "Top P" }
                            span { class: "mono muted", "{top_p:.2}" }
                        }
                        input {
                            r#type: "range",
                            min: "0",
                            max: "1",
                            step: "0.05",
                            value: "{top_p}",
                            style: "width: 100%; accent-color: var(--accent-primary);",
                            oninput: move |e| {
                                let value: f32 = e.value().parse().unwrap_or(0.9);
                                let mut settings = settings_signal.write();
                                settings.top_p = value.clamp(0.0, 1.0);
                                persist(&settings);
                            },
                        }
                    }

                    div {
                        label { "Top K" }
                        input {
                            class: "field",
                            r#type: "number",
                            min: "1",
                            max: "100",
                            value: "{top_k}",
                            oninput: move |e| {
                                let value: u32 = e.value().parse().unwrap_or(40);
                                let mut settings = settings_signal.write();
                                settings.top_k = value.max(1);
                                persist(&settings);
                            },
                        }
                    }

                    div {
                        label { "Max new tokens" }
                        input {
                            class: "field",
                            r#type: "number",
                            min: "1",
                            max: "{max_allowed}",
                            value: "{max_new_tokens}",
                            oninput: move |e| {
                                let value: u32 = e.value().parse().unwrap_or(512);
                                let mut settings = settings_signal.write();
                                settings.max_new_tokens = value.clamp(1, max_allowed.max(1));
                                persist(&settings);
                            },
                        }
                        p { class: "muted", "Up to half of the {settings.context_size}-token context." }
                    }
                }
            }
        }
    }
}
