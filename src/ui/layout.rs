//! Window layout: sidebar on the left, the dispatched page on the right

use crate::app::{AppState, ModelState};
use crate::inference::LoadedModel;
use crate::navigation::{dispatch, PageHandlers};
use crate::types::page::Page;
use crate::ui::chat::ChatPage;
use crate::ui::components::loading::LoadingPanel;
use crate::ui::components::notices::NoticeList;
use crate::ui::data::DataPage;
use crate::ui::history::HistoryPage;
use crate::ui::sidebar::Sidebar;
use dioxus::prelude::*;
use std::sync::Arc;

/// Renders each page as a Dioxus element
struct PageView;

impl PageHandlers for PageView {
    type Output = Element;

    fn chat(&mut self, model: Arc<LoadedModel>) -> Element {
        rsx! { ChatPage { model } }
    }

    fn history(&mut self) -> Element {
        rsx! { HistoryPage {} }
    }

    fn data_management(&mut self) -> Element {
        rsx! { DataPage {} }
    }

    fn unavailable(&mut self, notice: &str) -> Element {
        rsx! {
            div {
                class: "notice notice-error",
                span { "{notice}" }
            }
        }
    }
}

#[component]
pub fn Layout(model_state: ModelState) -> Element {
    let app_state = use_context::<AppState>();
    let navigation = *app_state.navigation.read();

    let content = match &model_state {
        ModelState::Loading if navigation.current() == Page::Chat => {
            let label = app_state.selected_model.read().label().to_string();
            rsx! { LoadingPanel { label } }
        }
        _ => dispatch(&navigation, model_state.model(), &mut PageView),
    };

    rsx! {
        div {
            class: "app-shell",
            Sidebar { model_state }
            main {
                class: "page",
                div {
                    class: "page-inner",
                    NoticeList {}
                    {content}
                }
            }
        }
    }
}
