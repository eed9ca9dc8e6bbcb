use crate::app::AppState;
use crate::types::page::Page;
use dioxus::prelude::*;

#[component]
pub fn PageSelector() -> Element {
    let app_state = use_context::<AppState>();
    let mut navigation = app_state.navigation;
    let current = navigation.read().current();

    rsx! {
        div {
            div { class: "section-label", "Page" }
            for page in Page::ALL {
                label {
                    key: "{page}",
                    class: "radio-row",
                    input {
                        r#type: "radio",
                        name: "page",
                        checked: page == current,
                        onchange: move |_| navigation.write().select(page),
                    }
                    "{page.label()}"
                }
            }
        }
    }
}
