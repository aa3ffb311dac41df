// Export modules for use in tests
pub mod app;
pub mod command_source;
pub mod document;
pub mod error;
pub mod events;
pub mod find;
pub mod fragment;
pub mod host;
pub mod l10n;
pub mod nav_history;
pub mod page_labels;
pub mod panic_handler;
pub mod reconcile;
pub mod relay;
pub mod session;
pub mod settings;
pub mod sidebar;
pub mod toolbar;
pub mod view_history;
pub mod view_state;
pub mod viewer;
pub mod zoom;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the application entry points
pub use app::ViewerApp;
pub use events::{EventBus, ViewerEvent};
pub use settings::ViewerOptions;
