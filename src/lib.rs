// Export modules for use in tests
pub mod catalog;
pub mod event_source;
pub mod fetcher;
pub mod gesture;
pub mod html;
pub mod loader;
pub mod main_app;
pub mod markdown;
pub mod panic_handler;
pub mod preferences;
pub mod progress;
pub mod reader;
pub mod router;
pub mod scrollbar;
pub mod settings;
pub mod source;
pub mod store;
pub mod theme;
pub mod transform;
pub mod widget;
pub use widget::chapter_list;
pub use widget::chapter_view;
// Test utilities - only available when test-utils feature is enabled or during tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use main_app::{App, FocusedPanel, PopupWindow, run_app_with_event_source};
pub use reader::{Effect, PageContent, PageView, ReaderEvent, ReaderState};
