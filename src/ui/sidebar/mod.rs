//! Sidebar: model picker, page selector and generation settings

pub mod generation;
pub mod model_picker;
pub mod page_selector;

use crate::app::ModelState;
use dioxus::prelude::*;
use generation::GenerationSettings;
use model_picker::ModelPicker;
use page_selector::PageSelector;

#[component]
pub fn Sidebar(model_state: ModelState) -> Element {
    rsx! {
        aside {
            class: "sidebar",
            h1 { "DuoChat" }
            ModelPicker { model_state }
            PageSelector {}
            GenerationSettings {}
        }
    }
}
