//! Notifications to the embedding host

use crate::document::DocumentProperties;
use crate::error::{ErrorReport, UnsupportedFeature};
use crate::find::FindCommand;
use crate::settings::RenderingOptions;
use crate::view_state::SidebarView;

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PageChange(u32),
    /// Load progress, 0..=100
    Progress(u8),
    Title(String),
    Fallback {
        feature: UnsupportedFeature,
        url: Option<String>,
    },
    Error(ErrorReport),
    PasswordRequest {
        incorrect: bool,
    },
    DocumentProperties(Box<DocumentProperties>),
    /// How pages of the freshly opened document should be drawn
    RenderingOptions(Box<RenderingOptions>),
    OutlineLoaded(usize),
    AttachmentsLoaded(usize),
    /// New "current view" anchor
    BookmarkHref(String),
    Find(FindCommand),
    FindBarOpened,
    FocusPageInput,
    SidebarChanged(SidebarView),
    /// Thumbnails should (or no longer need to) be rendered
    ThumbnailsVisible(bool),
    DocumentClosed,
}

/// Sending half of the host channel. A dropped receiver is not an error.
#[derive(Debug, Clone)]
pub struct HostSender {
    tx: flume::Sender<HostEvent>,
}

pub fn host_channel() -> (HostSender, flume::Receiver<HostEvent>) {
    let (tx, rx) = flume::unbounded();
    (HostSender { tx }, rx)
}

impl HostSender {
    pub fn send(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Host receiver dropped, notification discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_receiver_is_tolerated() {
        let (host, rx) = host_channel();
        host.send(HostEvent::Progress(10));
        assert_eq!(rx.try_recv().unwrap(), HostEvent::Progress(10));
        drop(rx);
        host.send(HostEvent::Progress(20));
    }
}
