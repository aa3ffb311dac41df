use folioview::document::DocumentSource;
use folioview::events::NamedAction;
use folioview::host::{HostEvent, host_channel};
use folioview::settings::ViewerOptions;
use folioview::test_utils::{FakeDocument, FakeLoader, MemoryStore};
use folioview::view_state::{Rotation, ScrollMode, SidebarView, SpreadMode, ZoomSpec};
use folioview::viewer::PageViewer;
use folioview::{ViewerApp, ViewerEvent};

const URL: &str = "file:///docs/manual.pdf";

struct Fixture {
    app: ViewerApp,
    store: MemoryStore,
    host: flume::Receiver<HostEvent>,
}

impl Fixture {
    fn open(document: FakeDocument) -> Self {
        Self::open_with(document, ViewerOptions::default())
    }

    fn open_with(document: FakeDocument, options: ViewerOptions) -> Self {
        let store = MemoryStore::default();
        let (host_tx, host) = host_channel();
        let loader = FakeLoader::new().with_document(document);
        let mut app = ViewerApp::new(options, Box::new(loader), Box::new(store.clone()), host_tx);
        app.open(DocumentSource::Url(URL.into()), None)
            .expect("document should open");
        // Only look at what the tests themselves cause
        host.drain().for_each(drop);
        Self { app, store, host }
    }

    fn viewer(&self) -> &dyn PageViewer {
        self.app.session().unwrap().viewer.as_ref()
    }

    fn stored_page(&self) -> Option<i64> {
        self.store.get("abc").and_then(|v| v.page)
    }

    fn host_events(&self) -> Vec<HostEvent> {
        self.host.drain().collect()
    }
}

fn manual() -> FakeDocument {
    FakeDocument::new("abc", 12).with_destination("appendix", 11)
}

#[test]
fn test_page_navigation_is_persisted() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::NextPage);
    assert_eq!(f.viewer().current_page_number(), 2);
    assert_eq!(f.stored_page(), Some(2));

    f.app.handle(ViewerEvent::LastPage);
    assert_eq!(f.viewer().current_page_number(), 12);
    assert_eq!(f.stored_page(), Some(12));
    assert_eq!(f.app.chrome().toolbar.page_number(), 12);

    let events = f.host_events();
    assert!(events.contains(&HostEvent::PageChange(2)));
    assert!(events.contains(&HostEvent::PageChange(12)));
}

#[test]
fn test_view_area_updates_bookmark_link() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::PageNumberChanged("4".into()));

    let href = f
        .host_events()
        .into_iter()
        .filter_map(|e| match e {
            HostEvent::BookmarkHref(href) => Some(href),
            _ => None,
        })
        .last()
        .unwrap();
    assert!(href.starts_with("file:///docs/manual.pdf#page=4&zoom="), "{href}");
}

#[test]
fn test_back_and_forward_follow_jumps() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::PageNumberChanged("7".into()));
    assert_eq!(f.viewer().current_page_number(), 7);

    f.app
        .handle(ViewerEvent::NamedAction(NamedAction::GoBack));
    assert_eq!(f.viewer().current_page_number(), 1);

    f.app
        .handle(ViewerEvent::NamedAction(NamedAction::GoForward));
    assert_eq!(f.viewer().current_page_number(), 7);
}

#[test]
fn test_disabled_history_ignores_back() {
    let options = ViewerOptions {
        disable_history: true,
        ..Default::default()
    };
    let mut f = Fixture::open_with(manual(), options);

    f.app.handle(ViewerEvent::PageNumberChanged("7".into()));
    f.app
        .handle(ViewerEvent::NamedAction(NamedAction::GoBack));

    assert_eq!(f.viewer().current_page_number(), 7);
}

#[test]
fn test_invalid_page_input_resets_toolbar() {
    let mut f = Fixture::open(manual());
    f.app.handle(ViewerEvent::PageNumberChanged("3".into()));

    f.app.handle(ViewerEvent::PageNumberChanged("99".into()));

    assert_eq!(f.viewer().current_page_number(), 3);
    assert_eq!(f.app.chrome().toolbar.page_input(), "3");
}

#[test]
fn test_page_labels_accepted_as_input() {
    let labels = ["i", "ii", "iii", "1", "2", "3"];
    let document = FakeDocument::new("abc", 6).with_labels(&labels);
    let mut f = Fixture::open(document);

    f.app.handle(ViewerEvent::PageNumberChanged("2".into()));

    assert_eq!(f.viewer().current_page_number(), 5);
    assert_eq!(f.app.chrome().toolbar.page_input(), "2");
}

#[test]
fn test_rotation_keeps_page_and_is_persisted() {
    let mut f = Fixture::open(manual());
    f.app.handle(ViewerEvent::PageNumberChanged("5".into()));

    f.app.handle(ViewerEvent::RotateCw);
    assert_eq!(f.viewer().pages_rotation(), Rotation::Deg90);
    assert_eq!(f.viewer().current_page_number(), 5);
    assert_eq!(f.store.get("abc").unwrap().rotation, Some(90));

    f.app.handle(ViewerEvent::RotateCcw);
    f.app.handle(ViewerEvent::RotateCcw);
    assert_eq!(f.viewer().pages_rotation(), Rotation::Deg270);
    assert_eq!(f.store.get("abc").unwrap().rotation, Some(270));
}

#[test]
fn test_scale_changes() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::ScaleChanged("page-fit".into()));
    assert_eq!(f.viewer().current_scale().spec, ZoomSpec::PageFit);
    assert_eq!(
        f.store.get("abc").unwrap().zoom.as_deref(),
        Some("page-fit")
    );

    f.app.handle(ViewerEvent::ScaleChanged("enormous".into()));
    assert_eq!(f.viewer().current_scale().spec, ZoomSpec::PageFit);

    f.app.handle(ViewerEvent::ScaleChanged("150".into()));
    assert_eq!(f.viewer().current_scale().spec, ZoomSpec::Ratio(1.5));
    assert_eq!(f.store.get("abc").unwrap().zoom.as_deref(), Some("150"));
}

#[test]
fn test_layout_modes_are_persisted() {
    let mut f = Fixture::open(manual());

    f.app
        .handle(ViewerEvent::SwitchScrollMode(ScrollMode::Horizontal));
    f.app.handle(ViewerEvent::SwitchSpreadMode(SpreadMode::Even));

    let stored = f.store.get("abc").unwrap();
    assert_eq!(stored.scroll_mode, Some(1));
    assert_eq!(stored.spread_mode, Some(2));
}

#[test]
fn test_sidebar_switch_is_persisted() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::PageMode(SidebarView::Thumbs));

    assert_eq!(f.app.chrome().sidebar.visible_view(), SidebarView::Thumbs);
    assert_eq!(f.store.get("abc").unwrap().sidebar_view, Some(1));
    let events = f.host_events();
    assert!(events.contains(&HostEvent::SidebarChanged(SidebarView::Thumbs)));
    assert!(events.contains(&HostEvent::ThumbnailsVisible(true)));
}

#[test]
fn test_hash_change_after_open_navigates() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::HashChange("#nameddest=appendix".into()));
    assert_eq!(f.viewer().current_page_number(), 11);

    f.app.handle(ViewerEvent::HashChange("page=3&zoom=page-width".into()));
    assert_eq!(f.viewer().current_page_number(), 3);
    assert_eq!(f.viewer().current_scale().spec, ZoomSpec::PageWidth);

    f.app.handle(ViewerEvent::HashChange("page=400".into()));
    assert_eq!(f.viewer().current_page_number(), 12);
}

#[test]
fn test_document_properties_reach_host() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::DocumentProperties);

    let props = f
        .host_events()
        .into_iter()
        .find_map(|e| match e {
            HostEvent::DocumentProperties(props) => Some(props),
            _ => None,
        })
        .unwrap();
    assert_eq!(props.file_name, "manual.pdf");
    assert_eq!(props.page_count, 12);
}

#[test]
fn test_named_actions_for_chrome() {
    let mut f = Fixture::open(manual());

    f.app.handle(ViewerEvent::NamedAction(NamedAction::Find));
    f.app
        .handle(ViewerEvent::NamedAction(NamedAction::GoToPage));
    f.app
        .handle(ViewerEvent::NamedAction(NamedAction::Other("Print".into())));

    let events = f.host_events();
    assert!(events.contains(&HostEvent::FindBarOpened));
    assert!(events.contains(&HostEvent::FocusPageInput));
}

#[test]
fn test_external_sender_events_are_processed() {
    let mut f = Fixture::open(manual());
    let sender = f.app.event_sender();

    sender.send(ViewerEvent::ZoomIn { ticks: 1 }).unwrap();
    sender.send(ViewerEvent::NextPage).unwrap();
    f.app.process_events();

    assert_eq!(f.viewer().current_page_number(), 2);
    assert!(matches!(f.viewer().current_scale().spec, ZoomSpec::Ratio(_)));
}

#[test]
fn test_events_without_document_are_dropped() {
    let (host_tx, host) = host_channel();
    let mut app = ViewerApp::new(
        ViewerOptions::default(),
        Box::new(FakeLoader::new()),
        Box::new(MemoryStore::default()),
        host_tx,
    );

    app.handle(ViewerEvent::NextPage);
    app.handle(ViewerEvent::DocumentProperties);

    assert!(app.session().is_none());
    assert!(host.drain().next().is_none());
}
