//! Status notices rendered above the current page

use crate::app::AppState;
use crate::report::NoticeLevel;
use dioxus::prelude::*;

fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "notice notice-info",
        NoticeLevel::Success => "notice notice-success",
        NoticeLevel::Error => "notice notice-error",
    }
}

#[component]
pub fn NoticeList() -> Element {
    let app_state = use_context::<AppState>();
    let mut notices = app_state.notices;

    rsx! {
        for (index, notice) in notices.read().iter().enumerate() {
            div {
                key: "{index}",
                class: level_class(notice.level),
                span { "{notice.message}" }
                button {
                    title: "Dismiss",
                    onclick: move |_| {
                        let mut list = notices.write();
                        if index < list.len() {
                            list.remove(index);
                        }
                    },
                    "×"
                }
            }
        }
    }
}
