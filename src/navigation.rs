//! Page navigation
//!
//! [`Navigation`] holds the page picked in the sidebar and [`dispatch`] routes
//! it, together with the loaded model (if any), to exactly one page handler.

use crate::inference::LoadedModel;
use crate::types::page::Page;
use std::sync::Arc;

/// Shown instead of the chat page when no model is loaded
pub const CHAT_UNAVAILABLE: &str = "Chat is unavailable: the model failed to load.";

/// Which page is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigation {
    current: Page,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Page {
        self.current
    }

    /// Switch pages. Selecting the current page changes nothing.
    pub fn select(&mut self, page: Page) {
        if self.current != page {
            tracing::debug!("Navigating {} -> {}", self.current, page);
            self.current = page;
        }
    }
}

/// One handler per page
pub trait PageHandlers {
    type Output;

    fn chat(&mut self, model: Arc<LoadedModel>) -> Self::Output;
    fn history(&mut self) -> Self::Output;
    fn data_management(&mut self) -> Self::Output;
    /// A page was requested whose requirements are not met
    fn unavailable(&mut self, notice: &str) -> Self::Output;
}

/// Invoke the handler for the current page.
///
/// The chat page needs a model; without one the unavailable notice is
/// produced instead and the generation capability is never touched.
pub fn dispatch<H: PageHandlers>(
    navigation: &Navigation,
    model: Option<Arc<LoadedModel>>,
    handlers: &mut H,
) -> H::Output {
    match navigation.current() {
        Page::Chat => match model {
            Some(model) => handlers.chat(model),
            None => {
                tracing::warn!("Chat page requested without a loaded model");
                handlers.unavailable(CHAT_UNAVAILABLE)
            }
        },
        Page::History => handlers.history(),
        Page::DataManagement => handlers.data_management(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::engine::{InferenceError, TextGenerator};
    use crate::types::config::GenerationParams;
    use crate::types::message::Message;
    use crate::types::model::{Device, ModelId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
    }

    impl TextGenerator for CountingGenerator {
        fn generate(
            &self,
            _messages: &[Message],
            _params: &GenerationParams,
        ) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("answer".to_string())
        }
    }

    #[derive(Debug, PartialEq)]
    enum Rendered {
        Chat(String),
        History,
        DataManagement,
        Unavailable(String),
    }

    /// Records which handler ran; the chat handler asks the model one question
    struct Recorder;

    impl PageHandlers for Recorder {
        type Output = Rendered;

        fn chat(&mut self, model: Arc<LoadedModel>) -> Rendered {
            let answer = model
                .generate("ping", &GenerationParams::default())
                .map(|g| g.text)
                .unwrap_or_default();
            Rendered::Chat(answer)
        }

        fn history(&mut self) -> Rendered {
            Rendered::History
        }

        fn data_management(&mut self) -> Rendered {
            Rendered::DataManagement
        }

        fn unavailable(&mut self, notice: &str) -> Rendered {
            Rendered::Unavailable(notice.to_string())
        }
    }

    fn counting_model() -> (Arc<LoadedModel>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = LoadedModel::new(
            ModelId::new("id-A"),
            Device::Cpu,
            Box::new(CountingGenerator {
                calls: Arc::clone(&calls),
            }),
        );
        (Arc::new(model), calls)
    }

    fn at(page: Page) -> Navigation {
        let mut navigation = Navigation::new();
        navigation.select(page);
        navigation
    }

    #[test]
    fn test_navigation_defaults_to_chat() {
        assert_eq!(Navigation::new().current(), Page::Chat);
    }

    #[test]
    fn test_select_then_current() {
        for page in Page::ALL {
            let mut navigation = Navigation::new();
            navigation.select(page);
            assert_eq!(navigation.current(), page);
        }
    }

    #[test]
    fn test_select_current_is_noop() {
        let mut navigation = at(Page::History);
        let before = navigation;
        navigation.select(navigation.current());
        assert_eq!(navigation, before);
    }

    #[test]
    fn test_dispatch_is_total() {
        for page in Page::ALL {
            for with_model in [true, false] {
                let (model, _) = counting_model();
                let model = with_model.then_some(model);
                let rendered = dispatch(&at(page), model, &mut Recorder);
                let expected = match (page, with_model) {
                    (Page::Chat, true) => Rendered::Chat("answer".to_string()),
                    (Page::Chat, false) => Rendered::Unavailable(CHAT_UNAVAILABLE.to_string()),
                    (Page::History, _) => Rendered::History,
                    (Page::DataManagement, _) => Rendered::DataManagement,
                };
                assert_eq!(rendered, expected);
            }
        }
    }

    #[test]
    fn test_chat_without_model_never_generates() {
        let (model, calls) = counting_model();
        let rendered = dispatch(&at(Page::Chat), None, &mut Recorder);
        assert_eq!(rendered, Rendered::Unavailable(CHAT_UNAVAILABLE.to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Other pages ignore the model entirely
        dispatch(&at(Page::History), Some(Arc::clone(&model)), &mut Recorder);
        dispatch(&at(Page::DataManagement), Some(model), &mut Recorder);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
