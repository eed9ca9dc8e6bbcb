use dioxus::prelude::*;

#[component]
pub fn Spinner(#[props(default = 20)] size: u32) -> Element {
    rsx! {
        div {
            class: "spinner",
            style: "width: {size}px; height: {size}px;",
        }
    }
}

/// Shown in place of the chat page while the selected model loads
#[component]
pub fn LoadingPanel(label: String) -> Element {
    rsx! {
        div {
            class: "panel row",
            Spinner { size: 18 }
            span { class: "muted", "Loading {label}... The first start downloads the model weights." }
        }
    }
}
