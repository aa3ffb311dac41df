//! Event Relay
//!
//! One handler per [`ViewerEvent`] variant. Handlers forward to the viewer
//! and the chrome, notify the host, and write view changes back to the
//! persisted store once the initial view has been applied.

use crate::document::DocumentProperties;
use crate::events::{EventBus, NamedAction, ViewerEvent};
use crate::find::FindCommand;
use crate::fragment::{Fragment, view_bookmark_href};
use crate::host::{HostEvent, HostSender};
use crate::l10n::Localization;
use crate::session::{Chrome, DocumentSession};
use crate::settings::ViewerOptions;
use crate::view_history::ViewStore;
use crate::view_state::{
    Rotation, ScrollMode, SidebarView, SpreadMode, ViewLocation, ZoomSpec,
};
use crate::viewer::PresentationModeState;

/// Everything a handler may touch besides the session
pub struct RelayContext<'a> {
    pub options: &'a ViewerOptions,
    pub l10n: &'a Localization,
    pub store: &'a mut dyn ViewStore,
    pub bus: &'a EventBus,
    pub host: &'a HostSender,
    pub chrome: &'a mut Chrome,
}

pub struct EventRelay;

impl EventRelay {
    /// Route one event to its handler, then publish whatever the viewer
    /// reported while handling it.
    pub fn dispatch(session: &mut DocumentSession, ctx: &mut RelayContext<'_>, event: ViewerEvent) {
        log::debug!("dispatch {}", event.name());
        match event {
            ViewerEvent::Resize { width, height } => on_resize(session, width, height),
            ViewerEvent::HashChange(hash) => on_hash_change(session, ctx, &hash),
            ViewerEvent::PageChanging { page, label } => on_page_changing(ctx, page, label),
            ViewerEvent::ScaleChanging { .. } => on_scale_changing(session, ctx),
            ViewerEvent::RotationChanging { rotation, page } => {
                on_rotation_changing(session, rotation, page)
            }
            ViewerEvent::SidebarViewChanged(view) => on_sidebar_view_changed(session, ctx, view),
            ViewerEvent::PageMode(view) => on_page_mode(ctx, view),
            ViewerEvent::NamedAction(action) => on_named_action(session, ctx, action),
            ViewerEvent::PresentationModeChanged(state) => on_presentation_mode_changed(ctx, state),
            ViewerEvent::FirstPage => on_first_page(session),
            ViewerEvent::LastPage => on_last_page(session),
            ViewerEvent::NextPage => {
                session.viewer.next_page();
            }
            ViewerEvent::PreviousPage => {
                session.viewer.previous_page();
            }
            ViewerEvent::ZoomIn { ticks } => session.viewer.zoom_in(ticks),
            ViewerEvent::ZoomOut { ticks } => session.viewer.zoom_out(ticks),
            ViewerEvent::PageNumberChanged(value) => on_page_number_changed(session, ctx, &value),
            ViewerEvent::ScaleChanged(value) => on_scale_changed(session, ctx, &value),
            ViewerEvent::RotateCw => rotate_pages(session, 90),
            ViewerEvent::RotateCcw => rotate_pages(session, -90),
            ViewerEvent::SwitchScrollMode(mode) => session.viewer.set_scroll_mode(mode),
            ViewerEvent::SwitchSpreadMode(mode) => session.viewer.set_spread_mode(mode),
            ViewerEvent::DocumentProperties => on_document_properties(session, ctx),
            ViewerEvent::Find(command) => on_find(ctx, command),
            ViewerEvent::FindFromUrlHash {
                query,
                phrase_search,
            } => on_find(ctx, FindCommand::from_url_hash(query, phrase_search)),
            ViewerEvent::UpdateViewArea(location) => on_update_view_area(session, ctx, location),
            ViewerEvent::ScrollModeChanged(mode) => on_scroll_mode_changed(session, ctx, mode),
            ViewerEvent::SpreadModeChanged(mode) => on_spread_mode_changed(session, ctx, mode),
        }

        for effect in session.viewer.take_effects() {
            ctx.bus.publish(effect.into());
        }
    }
}

fn on_resize(session: &mut DocumentSession, width: f64, height: f64) {
    session.viewer.resize(width, height);
}

fn on_hash_change(session: &mut DocumentSession, ctx: &mut RelayContext<'_>, hash: &str) {
    let fragment = Fragment::parse(hash);
    if !session.is_initial_view_applied() {
        session.initial_bookmark = Some(fragment);
        return;
    }
    navigate_to_fragment(session, ctx, &fragment);
}

/// Follow a bookmark once the document is showing
pub fn navigate_to_fragment(
    session: &mut DocumentSession,
    ctx: &mut RelayContext<'_>,
    fragment: &Fragment,
) {
    if let Some(degrees) = fragment.rotation {
        match Rotation::from_degrees(degrees) {
            Some(rotation) => session.viewer.set_pages_rotation(rotation),
            None => log::warn!("Ignoring invalid rotation {degrees}"),
        }
    }
    if fragment.is_navigation() {
        let page = fragment.page.or_else(|| {
            fragment.named_dest.as_deref().and_then(|name| {
                let page = session.document.destination_page(name);
                if page.is_none() {
                    log::warn!("Unknown named destination {name:?}");
                }
                page
            })
        });
        let page_count = session.viewer.page_count();
        match (page, fragment.zoom) {
            (Some(page), zoom) if page_count > 0 => {
                session.nav.push(session.viewer.location());
                let (left, top) = zoom
                    .map(|z| (z.left.unwrap_or(0.0), z.top.unwrap_or(0.0)))
                    .unwrap_or((0.0, 0.0));
                session.viewer.scroll_page_into_view(
                    page.clamp(1, page_count),
                    zoom.map(|z| z.spec),
                    left,
                    top,
                );
            }
            (None, Some(zoom)) => session.viewer.set_current_scale_value(zoom.spec),
            _ => {}
        }
    }
    if let Some(view) = fragment.page_mode {
        ctx.bus.publish(ViewerEvent::PageMode(view));
    }
    if let Some(query) = &fragment.search {
        ctx.bus.publish(ViewerEvent::FindFromUrlHash {
            query: query.clone(),
            phrase_search: fragment.phrase,
        });
    }
}

fn on_page_changing(ctx: &mut RelayContext<'_>, page: u32, label: Option<String>) {
    ctx.chrome.toolbar.set_page_number(page, label);
    ctx.host.send(HostEvent::PageChange(page));
}

fn on_scale_changing(session: &DocumentSession, ctx: &mut RelayContext<'_>) {
    ctx.chrome.toolbar.set_zoom(session.viewer.current_scale());
}

fn on_rotation_changing(session: &mut DocumentSession, rotation: Rotation, page: u32) {
    log::debug!("Pages rotated to {rotation}");
    // Rotation relayouts the pages; stay on the page that was current
    session.viewer.set_current_page_number(page);
}

fn on_sidebar_view_changed(
    session: &mut DocumentSession,
    ctx: &mut RelayContext<'_>,
    view: SidebarView,
) {
    ctx.host
        .send(HostEvent::ThumbnailsVisible(ctx.chrome.sidebar.is_thumbnail_view_visible()));
    session.persisted.record_sidebar_view(view);
    session.persist(ctx.store);
}

fn on_page_mode(ctx: &mut RelayContext<'_>, view: SidebarView) {
    if let Some(visible) = ctx.chrome.sidebar.switch_view(view, true) {
        ctx.host.send(HostEvent::SidebarChanged(visible));
        ctx.bus.publish(ViewerEvent::SidebarViewChanged(visible));
    }
}

fn on_named_action(session: &mut DocumentSession, ctx: &mut RelayContext<'_>, action: NamedAction) {
    match action {
        NamedAction::GoToPage => ctx.host.send(HostEvent::FocusPageInput),
        NamedAction::Find => {
            ctx.chrome.find.open_bar();
            ctx.host.send(HostEvent::FindBarOpened);
        }
        NamedAction::GoBack => {
            let current = session.viewer.location();
            if let Some(target) = session.nav.back(Some(current)) {
                go_to_location(session, &target);
            }
        }
        NamedAction::GoForward => {
            if let Some(target) = session.nav.forward() {
                go_to_location(session, &target);
            }
        }
        NamedAction::NextPage => {
            session.viewer.next_page();
        }
        NamedAction::PrevPage => {
            session.viewer.previous_page();
        }
        NamedAction::FirstPage => on_first_page(session),
        NamedAction::LastPage => on_last_page(session),
        NamedAction::Other(name) => log::debug!("Ignoring named action {name}"),
    }
}

fn go_to_location(session: &mut DocumentSession, target: &ViewLocation) {
    session.viewer.set_pages_rotation(target.rotation);
    session.viewer.scroll_page_into_view(
        target.page,
        Some(target.zoom),
        target.scroll_left,
        target.scroll_top,
    );
}

fn on_presentation_mode_changed(ctx: &mut RelayContext<'_>, state: PresentationModeState) {
    ctx.chrome.presentation = state;
}

fn on_first_page(session: &mut DocumentSession) {
    if session.viewer.page_count() > 0 {
        session.nav.push(session.viewer.location());
        session.viewer.set_current_page_number(1);
    }
}

fn on_last_page(session: &mut DocumentSession) {
    let count = session.viewer.page_count();
    if count > 0 {
        session.nav.push(session.viewer.location());
        session.viewer.set_current_page_number(count);
    }
}

fn on_page_number_changed(session: &mut DocumentSession, ctx: &mut RelayContext<'_>, value: &str) {
    let before = session.viewer.location();
    if !value.is_empty() && session.viewer.set_current_page_label(value) {
        session.nav.push(before);
    }

    // Invalid input: put the toolbar back to the real position
    let current = session.viewer.current_page_number();
    let label = session.viewer.current_page_label();
    if value != current.to_string() && Some(value) != label.as_deref() {
        ctx.chrome.toolbar.set_page_number(current, label);
    }
}

fn on_scale_changed(session: &mut DocumentSession, ctx: &mut RelayContext<'_>, value: &str) {
    match ZoomSpec::parse(value) {
        Some(spec) => session.viewer.set_current_scale_value(spec),
        None => {
            log::warn!("Ignoring invalid scale value {value:?}");
            ctx.chrome.toolbar.set_zoom(session.viewer.current_scale());
        }
    }
}

fn rotate_pages(session: &mut DocumentSession, delta: i32) {
    if session.viewer.page_count() == 0 {
        return;
    }
    let page = session.viewer.current_page_number();
    let rotation = session.viewer.pages_rotation().rotate_by(delta);
    session.viewer.set_pages_rotation(rotation);
    session.viewer.set_current_page_number(page);
}

fn on_document_properties(session: &DocumentSession, ctx: &mut RelayContext<'_>) {
    let properties =
        DocumentProperties::collect(session.document.as_ref(), &session.file_name, ctx.l10n);
    ctx.host
        .send(HostEvent::DocumentProperties(Box::new(properties)));
}

fn on_find(ctx: &mut RelayContext<'_>, command: FindCommand) {
    if let Some(command) = ctx.chrome.find.execute(command) {
        ctx.host.send(HostEvent::Find(command));
    }
}

fn on_update_view_area(
    session: &mut DocumentSession,
    ctx: &mut RelayContext<'_>,
    location: ViewLocation,
) {
    if session.is_initial_view_applied() {
        session.persisted.record_location(&location);
        session.persist(ctx.store);
    }
    let hash = view_bookmark_href(&location);
    let href = match &session.base_url {
        Some(base) => format!("{base}{hash}"),
        None => hash,
    };
    ctx.host.send(HostEvent::BookmarkHref(href));
}

fn on_scroll_mode_changed(
    session: &mut DocumentSession,
    ctx: &mut RelayContext<'_>,
    mode: ScrollMode,
) {
    if session.is_initial_view_applied() {
        session.persisted.record_scroll_mode(mode);
        session.persist(ctx.store);
    }
}

fn on_spread_mode_changed(
    session: &mut DocumentSession,
    ctx: &mut RelayContext<'_>,
    mode: SpreadMode,
) {
    if session.is_initial_view_applied() {
        session.persisted.record_spread_mode(mode);
        session.persist(ctx.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageSize;
    use crate::host::host_channel;
    use crate::nav_history::NavHistory;
    use crate::test_utils::{FailingStore, FakeDocument, MemoryStore};
    use crate::viewer::{PageViewer, ViewerModel};

    struct Harness {
        session: DocumentSession,
        options: ViewerOptions,
        l10n: Localization,
        store: MemoryStore,
        bus: EventBus,
        host: HostSender,
        host_rx: flume::Receiver<HostEvent>,
        chrome: Chrome,
    }

    impl Harness {
        fn new(applied: bool) -> Self {
            let document = FakeDocument::new("abc", 12).with_destination("intro", 3);
            let mut viewer = ViewerModel::new();
            viewer.set_document(12, Some(PageSize::new(612.0, 792.0)));
            let _ = viewer.take_effects();
            let mut session = DocumentSession::new(
                Box::new(document),
                Box::new(viewer),
                "doc.pdf".into(),
                Some("file:///tmp/doc.pdf".into()),
                NavHistory::new(10, true),
            );
            session.phase.begin();
            if applied {
                session.phase.complete();
            }
            let (host, host_rx) = host_channel();
            Self {
                session,
                options: ViewerOptions::default(),
                l10n: Localization::default(),
                store: MemoryStore::default(),
                bus: EventBus::new(),
                host,
                host_rx,
                chrome: Chrome::default(),
            }
        }

        /// Dispatch an event and everything it causes
        fn send(&mut self, event: ViewerEvent) {
            let mut queue = vec![event];
            while !queue.is_empty() {
                for event in queue.drain(..) {
                    let mut ctx = RelayContext {
                        options: &self.options,
                        l10n: &self.l10n,
                        store: &mut self.store,
                        bus: &self.bus,
                        host: &self.host,
                        chrome: &mut self.chrome,
                    };
                    EventRelay::dispatch(&mut self.session, &mut ctx, event);
                }
                queue = self.bus.drain();
            }
        }

        fn host_events(&self) -> Vec<HostEvent> {
            self.host_rx.drain().collect()
        }
    }

    #[test]
    fn page_navigation_updates_toolbar_and_store() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::NextPage);

        assert_eq!(h.session.viewer.current_page_number(), 2);
        assert_eq!(h.chrome.toolbar.page_number(), 2);
        let stored = h.store.get("abc").unwrap();
        assert_eq!(stored.page, Some(2));

        let events = h.host_events();
        assert!(events.contains(&HostEvent::PageChange(2)));
        assert!(events.iter().any(
            |e| matches!(e, HostEvent::BookmarkHref(href) if href.starts_with("file:///tmp/doc.pdf#page=2&zoom="))
        ));
    }

    #[test]
    fn nothing_is_persisted_during_bootstrap() {
        let mut h = Harness::new(false);
        h.send(ViewerEvent::LastPage);
        h.send(ViewerEvent::SwitchScrollMode(ScrollMode::Horizontal));
        assert_eq!(h.store.writes(), 0);
        // The bookmark anchor is still kept current
        assert!(
            h.host_events()
                .iter()
                .any(|e| matches!(e, HostEvent::BookmarkHref(_)))
        );
    }

    #[test]
    fn store_failures_are_swallowed() {
        let mut h = Harness::new(true);
        let mut failing = FailingStore;
        let mut ctx = RelayContext {
            options: &h.options,
            l10n: &h.l10n,
            store: &mut failing,
            bus: &h.bus,
            host: &h.host,
            chrome: &mut h.chrome,
        };
        EventRelay::dispatch(&mut h.session, &mut ctx, ViewerEvent::NextPage);
        assert_eq!(h.session.viewer.current_page_number(), 2);
    }

    #[test]
    fn hash_change_before_initial_view_is_deferred() {
        let mut h = Harness::new(false);
        h.send(ViewerEvent::HashChange("#page=7".into()));
        assert_eq!(h.session.viewer.current_page_number(), 1);
        assert_eq!(
            h.session.initial_bookmark.as_ref().and_then(|b| b.page),
            Some(7)
        );
    }

    #[test]
    fn hash_change_navigates_after_initial_view() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::HashChange(
            "#nameddest=intro&pagemode=bookmarks".into(),
        ));
        assert_eq!(h.session.viewer.current_page_number(), 3);
        assert_eq!(h.chrome.sidebar.visible_view(), SidebarView::Outline);
        assert_eq!(h.store.get("abc").unwrap().sidebar_view, Some(2));
    }

    #[test]
    fn hash_search_reaches_the_host() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::HashChange("search=needle%20haystack&phrase=true".into()));
        let events = h.host_events();
        let find = events.iter().find_map(|e| match e {
            HostEvent::Find(command) => Some(command.clone()),
            _ => None,
        });
        let find = find.unwrap();
        assert_eq!(find.query, "needle haystack");
        assert!(find.phrase_search);
    }

    #[test]
    fn invalid_page_number_resets_toolbar() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::PageNumberChanged("5".into()));
        assert_eq!(h.session.viewer.current_page_number(), 5);

        h.chrome.toolbar.set_page_number(99, None);
        h.send(ViewerEvent::PageNumberChanged("99".into()));
        assert_eq!(h.session.viewer.current_page_number(), 5);
        assert_eq!(h.chrome.toolbar.page_number(), 5);
    }

    #[test]
    fn rotation_keeps_current_page() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::PageNumberChanged("4".into()));
        h.send(ViewerEvent::RotateCcw);
        assert_eq!(h.session.viewer.pages_rotation(), Rotation::Deg270);
        assert_eq!(h.session.viewer.current_page_number(), 4);
        assert_eq!(h.store.get("abc").unwrap().rotation, Some(270));

        h.send(ViewerEvent::RotateCw);
        h.send(ViewerEvent::RotateCw);
        assert_eq!(h.session.viewer.pages_rotation(), Rotation::Deg90);
    }

    #[test]
    fn invalid_scale_value_is_ignored() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::ScaleChanged("page-fit".into()));
        assert_eq!(h.session.viewer.current_scale().spec, ZoomSpec::PageFit);
        h.send(ViewerEvent::ScaleChanged("bogus".into()));
        assert_eq!(h.session.viewer.current_scale().spec, ZoomSpec::PageFit);
        assert_eq!(h.store.get("abc").unwrap().zoom.as_deref(), Some("page-fit"));
    }

    #[test]
    fn layout_mode_switches_are_persisted() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::SwitchScrollMode(ScrollMode::Wrapped));
        h.send(ViewerEvent::SwitchSpreadMode(SpreadMode::Even));
        let stored = h.store.get("abc").unwrap();
        assert_eq!(stored.scroll_mode, Some(2));
        assert_eq!(stored.spread_mode, Some(2));
    }

    #[test]
    fn go_back_returns_to_previous_jump() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::PageNumberChanged("6".into()));
        h.send(ViewerEvent::LastPage);
        assert_eq!(h.session.viewer.current_page_number(), 12);

        h.send(ViewerEvent::NamedAction(NamedAction::GoBack));
        assert_eq!(h.session.viewer.current_page_number(), 6);
        h.send(ViewerEvent::NamedAction(NamedAction::GoBack));
        assert_eq!(h.session.viewer.current_page_number(), 1);
        h.send(ViewerEvent::NamedAction(NamedAction::GoForward));
        assert_eq!(h.session.viewer.current_page_number(), 6);
    }

    #[test]
    fn find_named_action_opens_bar() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::NamedAction(NamedAction::Find));
        assert!(h.chrome.find.bar_open);
        assert!(h.host_events().contains(&HostEvent::FindBarOpened));
    }

    #[test]
    fn document_properties_are_sent_to_host() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::DocumentProperties);
        let properties = h.host_events().into_iter().find_map(|e| match e {
            HostEvent::DocumentProperties(p) => Some(p),
            _ => None,
        });
        let properties = properties.unwrap();
        assert_eq!(properties.file_name, "doc.pdf");
        assert_eq!(properties.page_count, 12);
    }

    #[test]
    fn presentation_mode_is_tracked() {
        let mut h = Harness::new(true);
        h.send(ViewerEvent::PresentationModeChanged(
            PresentationModeState::Fullscreen,
        ));
        assert!(h.chrome.presentation.is_active());
    }
}
