//! Page types
//!
//! The pages reachable from the sidebar.

use std::fmt;

/// A page of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Chat,
    History,
    DataManagement,
}

impl Page {
    /// All pages, in sidebar order
    pub const ALL: [Page; 3] = [Page::Chat, Page::History, Page::DataManagement];

    pub fn label(self) -> &'static str {
        match self {
            Page::Chat => "Chat",
            Page::History => "History",
            Page::DataManagement => "Sample data",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
