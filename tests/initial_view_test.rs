use std::time::{Duration, Instant};

use folioview::ViewerApp;
use folioview::document::{DocumentInfo, DocumentSource, PageSize};
use folioview::error::{LoadError, UnsupportedFeature};
use folioview::host::{HostEvent, host_channel};
use folioview::settings::{Renderer, TextLayerMode, ViewerOptions};
use folioview::test_utils::{FailingStore, FakeDocument, FakeLoader, GeometryMode, MemoryStore};
use folioview::view_history::ViewStore;
use folioview::view_state::{
    PageModeHint, PersistedView, Rotation, ScrollMode, SidebarView, SpreadMode, ZoomSpec,
};
use folioview::viewer::PageViewer;

const URL: &str = "file:///docs/manual.pdf";

fn app_with(
    loader: FakeLoader,
    store: impl ViewStore + 'static,
    options: ViewerOptions,
) -> (ViewerApp, flume::Receiver<HostEvent>) {
    let (host, host_rx) = host_channel();
    let app = ViewerApp::new(options, Box::new(loader), Box::new(store), host);
    (app, host_rx)
}

fn open(app: &mut ViewerApp, url: &str) {
    app.open(DocumentSource::Url(url.to_string()), None)
        .expect("document should open");
}

fn page(app: &ViewerApp) -> u32 {
    app.session().unwrap().viewer.current_page_number()
}

#[test]
fn test_previous_view_is_restored() {
    let store = MemoryStore::default();
    store.insert(
        "abc",
        PersistedView {
            page: Some(5),
            zoom: Some("page-width".into()),
            rotation: Some(90),
            ..Default::default()
        },
    );
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 10));
    let (mut app, _host) = app_with(loader, store.clone(), ViewerOptions::default());

    open(&mut app, URL);

    let viewer = &app.session().unwrap().viewer;
    assert_eq!(viewer.current_page_number(), 5);
    assert_eq!(viewer.current_scale().spec, ZoomSpec::PageWidth);
    assert_eq!(viewer.pages_rotation(), Rotation::Deg90);
    assert_eq!(app.chrome().toolbar.page_number(), 5);

    let stored = store.get("abc").unwrap();
    assert_eq!(stored.page, Some(5));
    assert_eq!(stored.zoom.as_deref(), Some("page-width"));
}

#[test]
fn test_store_failure_falls_back_to_defaults() {
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 10));
    let options = ViewerOptions {
        default_zoom_value: "page-fit".into(),
        ..Default::default()
    };
    let (mut app, _host) = app_with(loader, FailingStore, options);

    open(&mut app, URL);

    assert_eq!(page(&app), 1);
    let viewer = &app.session().unwrap().viewer;
    assert_eq!(viewer.current_scale().spec, ZoomSpec::PageFit);
    assert!(app.session().unwrap().is_initial_view_applied());
}

#[test]
fn test_url_bookmark_beats_persisted_view() {
    let store = MemoryStore::default();
    store.insert(
        "abc",
        PersistedView {
            page: Some(5),
            ..Default::default()
        },
    );
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 10));
    let (mut app, _host) = app_with(loader, store, ViewerOptions::default());

    open(&mut app, &format!("{URL}#page=2&zoom=150"));

    assert_eq!(page(&app), 2);
    let viewer = &app.session().unwrap().viewer;
    assert_eq!(viewer.current_scale().spec, ZoomSpec::Ratio(1.5));
}

#[test]
fn test_explicit_hash_beats_url_fragment() {
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 10));
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    app.open(
        DocumentSource::Url(format!("{URL}#page=2")),
        Some("page=7"),
    )
    .unwrap();

    assert_eq!(page(&app), 7);
}

#[test]
fn test_bookmark_side_effects_apply_after_initial_view() {
    let document = FakeDocument::new("abc", 10).with_attachment("data.csv", 120);
    let loader = FakeLoader::new().with_document(document);
    let store = MemoryStore::default();
    let (mut app, host) = app_with(loader, store.clone(), ViewerOptions::default());

    open(&mut app, &format!("{URL}#page=3&pagemode=attachments&search=torque"));

    assert_eq!(page(&app), 3);
    assert_eq!(app.chrome().sidebar.visible_view(), SidebarView::Attachments);
    // The sidebar switch happened after bootstrap, so it is remembered
    assert_eq!(store.get("abc").unwrap().sidebar_view, Some(3));

    let find = host.drain().find_map(|e| match e {
        HostEvent::Find(command) => Some(command),
        _ => None,
    });
    assert_eq!(find.unwrap().query, "torque");
}

#[test]
fn test_page_mode_hint_opens_outline() {
    let document = FakeDocument::new("abc", 10)
        .with_page_mode(PageModeHint::UseOutlines)
        .with_outline(&["Intro", "Usage"]);
    let loader = FakeLoader::new().with_document(document);
    let (mut app, host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);

    assert_eq!(app.chrome().sidebar.visible_view(), SidebarView::Outline);
    let events: Vec<HostEvent> = host.drain().collect();
    assert!(events.contains(&HostEvent::SidebarChanged(SidebarView::Outline)));
    assert!(events.contains(&HostEvent::OutlineLoaded(2)));
}

#[test]
fn test_empty_outline_falls_back_to_thumbnails() {
    let document = FakeDocument::new("abc", 10).with_page_mode(PageModeHint::UseOutlines);
    let loader = FakeLoader::new().with_document(document);
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);

    assert_eq!(app.chrome().sidebar.visible_view(), SidebarView::Thumbs);
}

#[test]
fn test_disabled_page_mode_ignores_hint() {
    let document = FakeDocument::new("abc", 10)
        .with_page_mode(PageModeHint::UseThumbs);
    let loader = FakeLoader::new().with_document(document);
    let options = ViewerOptions {
        disable_page_mode: true,
        ..Default::default()
    };
    let (mut app, _host) = app_with(loader, MemoryStore::default(), options);

    open(&mut app, URL);

    assert_eq!(app.chrome().sidebar.visible_view(), SidebarView::None);
}

#[test]
fn test_bootstrap_writes_the_store_once() {
    let store = MemoryStore::default();
    store.insert(
        "abc",
        PersistedView {
            page: Some(4),
            scroll_mode: Some(2),
            spread_mode: Some(1),
            ..Default::default()
        },
    );
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 10));
    let (mut app, _host) = app_with(loader, store.clone(), ViewerOptions::default());

    open(&mut app, URL);

    assert_eq!(store.writes(), 1);
    let viewer = &app.session().unwrap().viewer;
    assert_eq!(viewer.scroll_mode(), ScrollMode::Wrapped);
    assert_eq!(viewer.spread_mode(), SpreadMode::Odd);
    let stored = store.get("abc").unwrap();
    assert_eq!(stored.page, Some(4));
    assert_eq!(stored.scroll_mode, Some(2));
}

#[test]
fn test_corrective_pass_for_mixed_page_sizes() {
    let document = FakeDocument::new("abc", 6).with_page_size(1, PageSize::new(1224.0, 792.0));
    let loader = FakeLoader::new().with_document(document);
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, &format!("{URL}#page=4&zoom=100,0,300"));

    let session = app.session().unwrap();
    assert_eq!(session.corrective_passes, 1);
    assert_eq!(session.viewer.current_page_number(), 4);
    assert_eq!(session.viewer.location().scroll_top, 300.0);
}

#[test]
fn test_no_corrective_pass_for_uniform_pages() {
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 6));
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, &format!("{URL}#page=4"));

    assert_eq!(app.session().unwrap().corrective_passes, 0);
}

#[test]
fn test_slow_page_geometry_does_not_block_open() {
    let document = FakeDocument::new("abc", 6)
        .with_page_size(1, PageSize::new(1224.0, 792.0))
        .with_geometry(GeometryMode::Partial(2));
    let loader = FakeLoader::new().with_document(document);
    let options = ViewerOptions {
        pages_loaded_timeout_ms: 50,
        ..Default::default()
    };
    let (mut app, _host) = app_with(loader, MemoryStore::default(), options);

    let started = Instant::now();
    open(&mut app, &format!("{URL}#page=3"));

    assert!(started.elapsed() < Duration::from_secs(5));
    let session = app.session().unwrap();
    assert_eq!(session.viewer.current_page_number(), 3);
    // The partial sizes already show the pages are uneven
    assert_eq!(session.corrective_passes, 1);
}

#[test]
fn test_hanging_page_geometry_times_out() {
    let document = FakeDocument::new("abc", 6).with_geometry(GeometryMode::Hang);
    let loader = FakeLoader::new().with_document(document);
    let options = ViewerOptions {
        pages_loaded_timeout_ms: 20,
        ..Default::default()
    };
    let (mut app, _host) = app_with(loader, MemoryStore::default(), options);

    open(&mut app, URL);

    assert!(app.session().unwrap().is_initial_view_applied());
}

#[test]
fn test_load_error_is_reported_and_returned() {
    let loader = FakeLoader::new().with_error(LoadError::invalid("bad xref"));
    let (mut app, host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    let result = app.open(DocumentSource::Url(URL.into()), None);

    assert!(matches!(result, Err(LoadError::Invalid { .. })));
    assert!(app.session().is_none());
    let report = host.drain().find_map(|e| match e {
        HostEvent::Error(report) => Some(report),
        _ => None,
    });
    let report = report.unwrap();
    assert_eq!(report.message, "Invalid or corrupted PDF file.");
    assert!(report.more_info.iter().any(|line| line.contains("bad xref")));
}

#[test]
fn test_password_request() {
    let loader = FakeLoader::new()
        .with_error(LoadError::PasswordRequired)
        .with_error(LoadError::IncorrectPassword);
    let (mut app, host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    assert!(app.open(DocumentSource::Url(URL.into()), None).is_err());
    let retry = DocumentSource::Url(URL.into()).with_password("wrong".into());
    assert!(app.open(retry, None).is_err());

    let requests: Vec<HostEvent> = host
        .drain()
        .filter(|e| matches!(e, HostEvent::PasswordRequest { .. }))
        .collect();
    assert_eq!(
        requests,
        vec![
            HostEvent::PasswordRequest { incorrect: false },
            HostEvent::PasswordRequest { incorrect: true },
        ]
    );
}

#[test]
fn test_progress_and_title_notifications() {
    let info = DocumentInfo {
        title: Some("Field Manual".into()),
        ..Default::default()
    };
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 2).with_info(info));
    let (mut app, host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);

    let events: Vec<HostEvent> = host.drain().collect();
    assert!(events.contains(&HostEvent::Progress(50)));
    assert!(events.contains(&HostEvent::Progress(100)));
    assert!(events.contains(&HostEvent::Title("manual.pdf".into())));
    assert!(events.contains(&HostEvent::Title("Field Manual - manual.pdf".into())));
}

#[test]
fn test_options_reach_loader_and_host() {
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 3));
    let load_options = loader.load_options.clone();
    let options = ViewerOptions {
        disable_stream: true,
        disable_auto_fetch: true,
        text_layer_mode: 0,
        renderer: Renderer::Svg,
        max_canvas_pixels: 4_000_000,
        ..Default::default()
    };
    let (mut app, host) = app_with(loader, MemoryStore::default(), options);

    open(&mut app, URL);

    let recorded = load_options.borrow();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].disable_stream);
    assert!(recorded[0].disable_auto_fetch);
    assert!(!recorded[0].disable_range);

    let events: Vec<HostEvent> = host.drain().collect();
    assert!(!events.contains(&HostEvent::Progress(50)));
    let progress_done = events
        .iter()
        .position(|e| *e == HostEvent::Progress(100))
        .unwrap();
    let hints_at = events
        .iter()
        .position(|e| matches!(e, HostEvent::RenderingOptions(_)))
        .unwrap();
    assert!(hints_at > progress_done);
    let HostEvent::RenderingOptions(hints) = &events[hints_at] else {
        unreachable!();
    };
    assert_eq!(hints.text_layer, TextLayerMode::Disable);
    assert_eq!(hints.renderer, Renderer::Svg);
    assert_eq!(hints.max_canvas_pixels, 4_000_000);
    assert!(hints.render_interactive_forms);
}

#[test]
fn test_acro_form_fallback_is_sent_once() {
    let forms = || {
        let info = DocumentInfo {
            is_acro_form_present: true,
            ..Default::default()
        };
        FakeDocument::new("abc", 2).with_info(info)
    };
    let loader = FakeLoader::new()
        .with_document(forms())
        .with_document(forms());
    let (mut app, host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);
    open(&mut app, URL);

    let fallbacks: Vec<HostEvent> = host
        .drain()
        .filter(|e| matches!(e, HostEvent::Fallback { .. }))
        .collect();
    assert_eq!(fallbacks.len(), 1);
    assert!(matches!(
        &fallbacks[0],
        HostEvent::Fallback {
            feature: UnsupportedFeature::Forms,
            ..
        }
    ));
}

#[test]
fn test_page_labels_are_applied() {
    let document = FakeDocument::new("abc", 4).with_labels(&["i", "ii", "1", "2"]);
    let loader = FakeLoader::new().with_document(document);
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);

    let viewer = &app.session().unwrap().viewer;
    assert_eq!(viewer.current_page_label().as_deref(), Some("i"));
    assert_eq!(app.chrome().toolbar.page_input(), "i");
}

#[test]
fn test_mismatched_or_disabled_page_labels_are_ignored() {
    let mismatched = FakeDocument::new("abc", 4).with_labels(&["i", "ii", "1"]);
    let standard = FakeDocument::new("def", 2).with_labels(&["1", "2"]);
    let loader = FakeLoader::new()
        .with_document(mismatched)
        .with_document(standard);
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);
    assert_eq!(app.session().unwrap().viewer.current_page_label(), None);
    open(&mut app, URL);
    assert_eq!(app.session().unwrap().viewer.current_page_label(), None);

    let disabled = FakeDocument::new("abc", 4).with_labels(&["i", "ii", "1", "2"]);
    let loader = FakeLoader::new().with_document(disabled);
    let options = ViewerOptions {
        disable_page_labels: true,
        ..Default::default()
    };
    let (mut app, _host) = app_with(loader, MemoryStore::default(), options);
    open(&mut app, URL);
    assert_eq!(app.session().unwrap().viewer.current_page_label(), None);
}

#[test]
fn test_reopen_replaces_session_and_resets_chrome() {
    let first = FakeDocument::new("abc", 10)
        .with_page_mode(PageModeHint::UseOutlines)
        .with_outline(&["Intro"]);
    let second = FakeDocument::new("def", 3);
    let loader = FakeLoader::new().with_document(first).with_document(second);
    let (mut app, host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);
    assert_eq!(app.chrome().sidebar.visible_view(), SidebarView::Outline);

    open(&mut app, "file:///docs/other.pdf");
    let session = app.session().unwrap();
    assert_eq!(session.fingerprint, "def");
    assert!(session.is_initial_view_applied());
    assert_eq!(app.chrome().sidebar.visible_view(), SidebarView::None);
    assert!(host.drain().any(|e| e == HostEvent::DocumentClosed));
}

#[test]
fn test_close_drops_the_session() {
    let loader = FakeLoader::new().with_document(FakeDocument::new("abc", 3));
    let (mut app, _host) = app_with(loader, MemoryStore::default(), ViewerOptions::default());

    open(&mut app, URL);
    app.close();

    assert!(app.session().is_none());
    assert_eq!(app.chrome().toolbar.pages_count(), 0);
}
