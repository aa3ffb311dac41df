//! Typed event bus
//!
//! One variant per viewer event. Producers publish through an
//! [`EventBus`] (or a cloned [`flume::Sender`]); the application drains the
//! bus and hands each event to the relay.

use crate::find::FindCommand;
use crate::view_state::{Rotation, ScrollMode, SidebarView, SpreadMode, ViewLocation, ZoomSpec};
use crate::viewer::{PresentationModeState, ViewerEffect};

/// Named actions from link annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedAction {
    GoToPage,
    Find,
    GoBack,
    GoForward,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    Other(String),
}

impl NamedAction {
    pub fn from_name(name: &str) -> Self {
        match name {
            "GoToPage" => Self::GoToPage,
            "Find" => Self::Find,
            "GoBack" => Self::GoBack,
            "GoForward" => Self::GoForward,
            "NextPage" => Self::NextPage,
            "PrevPage" => Self::PrevPage,
            "FirstPage" => Self::FirstPage,
            "LastPage" => Self::LastPage,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Resize {
        width: f64,
        height: f64,
    },
    HashChange(String),
    PageChanging {
        page: u32,
        label: Option<String>,
    },
    ScaleChanging {
        scale: f64,
        preset: Option<ZoomSpec>,
    },
    RotationChanging {
        rotation: Rotation,
        page: u32,
    },
    SidebarViewChanged(SidebarView),
    PageMode(SidebarView),
    NamedAction(NamedAction),
    PresentationModeChanged(PresentationModeState),
    FirstPage,
    LastPage,
    NextPage,
    PreviousPage,
    ZoomIn {
        ticks: u32,
    },
    ZoomOut {
        ticks: u32,
    },
    /// Raw text typed into the page input
    PageNumberChanged(String),
    /// Raw value picked in the zoom selector
    ScaleChanged(String),
    RotateCw,
    RotateCcw,
    SwitchScrollMode(ScrollMode),
    SwitchSpreadMode(SpreadMode),
    DocumentProperties,
    Find(FindCommand),
    FindFromUrlHash {
        query: String,
        phrase_search: bool,
    },
    UpdateViewArea(ViewLocation),
    ScrollModeChanged(ScrollMode),
    SpreadModeChanged(SpreadMode),
}

impl ViewerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::HashChange(_) => "hashchange",
            Self::PageChanging { .. } => "pagechanging",
            Self::ScaleChanging { .. } => "scalechanging",
            Self::RotationChanging { .. } => "rotationchanging",
            Self::SidebarViewChanged(_) => "sidebarviewchanged",
            Self::PageMode(_) => "pagemode",
            Self::NamedAction(_) => "namedaction",
            Self::PresentationModeChanged(_) => "presentationmodechanged",
            Self::FirstPage => "firstpage",
            Self::LastPage => "lastpage",
            Self::NextPage => "nextpage",
            Self::PreviousPage => "previouspage",
            Self::ZoomIn { .. } => "zoomin",
            Self::ZoomOut { .. } => "zoomout",
            Self::PageNumberChanged(_) => "pagenumberchanged",
            Self::ScaleChanged(_) => "scalechanged",
            Self::RotateCw => "rotatecw",
            Self::RotateCcw => "rotateccw",
            Self::SwitchScrollMode(_) => "switchscrollmode",
            Self::SwitchSpreadMode(_) => "switchspreadmode",
            Self::DocumentProperties => "documentproperties",
            Self::Find(_) => "find",
            Self::FindFromUrlHash { .. } => "findfromurlhash",
            Self::UpdateViewArea(_) => "updateviewarea",
            Self::ScrollModeChanged(_) => "scrollmodechanged",
            Self::SpreadModeChanged(_) => "spreadmodechanged",
        }
    }
}

impl From<ViewerEffect> for ViewerEvent {
    fn from(effect: ViewerEffect) -> Self {
        match effect {
            ViewerEffect::PageChanging { page, label } => Self::PageChanging { page, label },
            ViewerEffect::ScaleChanging { scale, preset } => Self::ScaleChanging { scale, preset },
            ViewerEffect::RotationChanging { rotation, page } => {
                Self::RotationChanging { rotation, page }
            }
            ViewerEffect::ScrollModeChanged(mode) => Self::ScrollModeChanged(mode),
            ViewerEffect::SpreadModeChanged(mode) => Self::SpreadModeChanged(mode),
            ViewerEffect::UpdateViewArea(location) => Self::UpdateViewArea(location),
        }
    }
}

/// Unbounded FIFO of viewer events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: flume::Sender<ViewerEvent>,
    rx: flume::Receiver<ViewerEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    pub fn publish(&self, event: ViewerEvent) {
        log::trace!("publish {}", event.name());
        // Both ends live in self, so the channel cannot be disconnected
        let _ = self.tx.send(event);
    }

    /// Handle for producers living outside the application
    pub fn sender(&self) -> flume::Sender<ViewerEvent> {
        self.tx.clone()
    }

    /// Everything published so far, in order
    pub fn drain(&self) -> Vec<ViewerEvent> {
        self.rx.drain().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
