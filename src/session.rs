//! Per-document state
//!
//! A [`DocumentSession`] owns everything whose lifetime is one open
//! document. It is replaced wholesale on `open` and dropped on `close`.
//! [`Chrome`] holds the UI panels that outlive documents and are only reset.

use crate::document::LoadedDocument;
use crate::find::FindState;
use crate::fragment::Fragment;
use crate::nav_history::NavHistory;
use crate::reconcile::InitialViewPhase;
use crate::settings::CursorTool;
use crate::sidebar::Sidebar;
use crate::toolbar::Toolbar;
use crate::view_history::ViewStore;
use crate::view_state::{PersistedView, ViewDirective};
use crate::viewer::{PageViewer, PresentationModeState};

pub struct DocumentSession {
    pub document: Box<dyn LoadedDocument>,
    pub fingerprint: String,
    pub viewer: Box<dyn PageViewer>,
    pub file_name: String,
    /// URL the document was opened from, without fragment
    pub base_url: Option<String>,
    pub phase: InitialViewPhase,
    /// Working copy of the persisted view, written back on every change
    pub persisted: PersistedView,
    /// Bookmark that will be applied as part of the initial view
    pub initial_bookmark: Option<Fragment>,
    pub directive: Option<ViewDirective>,
    pub nav: NavHistory,
    pub corrective_passes: u32,
}

impl DocumentSession {
    pub fn new(
        document: Box<dyn LoadedDocument>,
        viewer: Box<dyn PageViewer>,
        file_name: String,
        base_url: Option<String>,
        nav: NavHistory,
    ) -> Self {
        let fingerprint = document.fingerprint().to_string();
        Self {
            document,
            fingerprint,
            viewer,
            file_name,
            base_url,
            phase: InitialViewPhase::NotInitialized,
            persisted: PersistedView::default(),
            initial_bookmark: None,
            directive: None,
            nav,
            corrective_passes: 0,
        }
    }

    pub fn is_initial_view_applied(&self) -> bool {
        self.phase.is_applied()
    }

    /// Best-effort write of the working copy. No-op during bootstrap.
    pub fn persist(&self, store: &mut dyn ViewStore) {
        if !self.phase.is_applied() {
            log::trace!("Skipping view write for {} during bootstrap", self.fingerprint);
            return;
        }
        if let Err(e) = store.write(&self.fingerprint, &self.persisted) {
            log::warn!("Failed to persist view for {}: {e}", self.fingerprint);
        }
    }
}

/// UI panels surrounding the page view
#[derive(Debug, Default)]
pub struct Chrome {
    pub sidebar: Sidebar,
    pub toolbar: Toolbar,
    pub find: FindState,
    pub presentation: PresentationModeState,
    pub cursor_tool: CursorTool,
}

impl Chrome {
    pub fn new(cursor_tool: CursorTool) -> Self {
        Self {
            cursor_tool,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.sidebar.reset();
        self.toolbar.reset();
        self.find.reset();
        self.presentation = PresentationModeState::Unknown;
    }
}
