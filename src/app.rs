use std::time::{Duration, Instant};

use crate::document::{
    DocumentLoader, DocumentSource, PageGeometry, document_title, title_from_url,
};
use crate::error::{ErrorReport, LoadError, UnsupportedFeature};
use crate::events::{EventBus, ViewerEvent};
use crate::fragment::Fragment;
use crate::host::{HostEvent, HostSender};
use crate::l10n::Localization;
use crate::nav_history::{DEFAULT_CAPACITY, NavHistory};
use crate::page_labels::is_standard_numbering;
use crate::reconcile::{
    ReconcileInputs, apply_directive, apply_position, load_persisted, needs_corrective_pass,
    reconcile,
};
use crate::relay::{EventRelay, RelayContext};
use crate::session::{Chrome, DocumentSession};
use crate::settings::ViewerOptions;
use crate::view_history::ViewStore;
use crate::viewer::{PageViewer, ViewerModel};

/// Upper bound on cascading event rounds per `process_events` call
const MAX_EVENT_ROUNDS: usize = 64;
const DEFAULT_FILE_NAME: &str = "document.pdf";

/// The viewer shell: owns the options, the store, the chrome and at most
/// one open document.
pub struct ViewerApp {
    options: ViewerOptions,
    l10n: Localization,
    loader: Box<dyn DocumentLoader>,
    store: Box<dyn ViewStore>,
    bus: EventBus,
    host: HostSender,
    chrome: Chrome,
    session: Option<DocumentSession>,
    /// Set once the host has been told about an unsupported feature
    fellback: bool,
    viewport: Option<(f64, f64)>,
}

impl ViewerApp {
    pub fn new(
        options: ViewerOptions,
        loader: Box<dyn DocumentLoader>,
        store: Box<dyn ViewStore>,
        host: HostSender,
    ) -> Self {
        let l10n = Localization::new(&options.locale);
        log::info!(
            "Viewer ready (locale {}, {})",
            l10n.locale(),
            l10n.direction().as_str()
        );
        let chrome = Chrome::new(options.cursor_tool());
        Self {
            options,
            l10n,
            loader,
            store,
            bus: EventBus::new(),
            host,
            chrome,
            session: None,
            fellback: false,
            viewport: None,
        }
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn l10n(&self) -> &Localization {
        &self.l10n
    }

    pub fn chrome(&self) -> &Chrome {
        &self.chrome
    }

    pub fn session(&self) -> Option<&DocumentSession> {
        self.session.as_ref()
    }

    /// Producer handle for events originating outside the app
    pub fn event_sender(&self) -> flume::Sender<ViewerEvent> {
        self.bus.sender()
    }

    /// Open a document, replacing the current one.
    ///
    /// `hash` is the bookmark to honour; when `None` the fragment of the
    /// source URL is used. Load failures are reported to the host and
    /// returned.
    pub fn open(&mut self, source: DocumentSource, hash: Option<&str>) -> Result<(), LoadError> {
        if self.session.is_some() {
            self.close();
        }

        let url = source.display_url().map(str::to_string);
        let (base_url, url_hash) = match url.as_deref().map(|u| u.split_once('#')) {
            Some(Some((base, fragment))) => (Some(base.to_string()), Some(fragment.to_string())),
            Some(None) => (url.clone(), None),
            None => (None, None),
        };
        let file_name = base_url
            .as_deref()
            .map(title_from_url)
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        self.host.send(HostEvent::Title(file_name.clone()));

        let host = self.host.clone();
        let mut last_percent = None;
        let load_options = self.options.load_options();
        let loaded = self.loader.load(&source, load_options, &mut |progress| {
            let Some(percent) = progress.percent() else {
                return;
            };
            if last_percent.is_none_or(|last| percent > last) {
                last_percent = Some(percent);
                host.send(HostEvent::Progress(percent));
            }
        });
        let document = match loaded {
            Ok(document) => document,
            Err(e) => {
                self.report_load_error(&e);
                return Err(e);
            }
        };
        if last_percent != Some(100) {
            self.host.send(HostEvent::Progress(100));
        }

        let page_count = document.page_count();
        let info = document.info().clone();
        log::info!(
            "PDF {} [{} {} / {}]",
            document.fingerprint(),
            info.pdf_version.as_deref().unwrap_or("-"),
            info.producer.as_deref().unwrap_or("-").trim(),
            info.creator.as_deref().unwrap_or("-").trim(),
        );
        if let Some(title) = document_title(&info, Some(&file_name)) {
            self.host.send(HostEvent::Title(title));
        }
        if info.is_acro_form_present {
            log::warn!("AcroForm/XFA forms are not supported");
            self.fallback(UnsupportedFeature::Forms);
        }

        let mut viewer: Box<dyn PageViewer> = Box::new(ViewerModel::new());
        if let Some((width, height)) = self.viewport {
            viewer.resize(width, height);
        }
        viewer.set_document(page_count, document.first_page_size());
        self.host.send(HostEvent::RenderingOptions(Box::new(
            self.options.rendering_options(),
        )));

        let nav = if self.options.disable_history {
            NavHistory::disabled()
        } else {
            NavHistory::new(DEFAULT_CAPACITY, true)
        };
        let mut session = DocumentSession::new(document, viewer, file_name, base_url, nav);
        self.chrome.cursor_tool = self.options.cursor_tool();
        let has_labels = self.apply_page_labels(&mut session);
        self.chrome.toolbar.set_pages_count(page_count, has_labels);

        let bookmark = hash
            .map(str::to_string)
            .or(url_hash)
            .map(|h| Fragment::parse(&h))
            .filter(|f| *f != Fragment::default());
        session.initial_bookmark = bookmark;
        self.session = Some(session);
        self.process_events();

        self.set_initial_view();
        self.wait_for_page_geometry();
        self.announce_outline_and_attachments();
        self.process_events();
        Ok(())
    }

    /// Drop the current document and reset the chrome.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.viewer.clear_document();
        self.chrome.reset();
        let discarded = self.bus.drain();
        if !discarded.is_empty() {
            log::debug!("Discarded {} pending events on close", discarded.len());
        }
        self.host.send(HostEvent::DocumentClosed);
        log::info!("Closed {}", session.fingerprint);
    }

    /// Publish an event and run everything it causes.
    pub fn handle(&mut self, event: ViewerEvent) {
        self.bus.publish(event);
        self.process_events();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = Some((width, height));
        self.handle(ViewerEvent::Resize { width, height });
    }

    /// Drain the bus until it is quiet.
    pub fn process_events(&mut self) {
        for _ in 0..MAX_EVENT_ROUNDS {
            let Some(session) = self.session.as_mut() else {
                let dropped = self.bus.drain();
                if !dropped.is_empty() {
                    log::debug!("No document open, dropped {} events", dropped.len());
                }
                return;
            };
            for effect in session.viewer.take_effects() {
                self.bus.publish(effect.into());
            }
            let events = self.bus.drain();
            if events.is_empty() {
                return;
            }
            let mut ctx = RelayContext {
                options: &self.options,
                l10n: &self.l10n,
                store: self.store.as_mut(),
                bus: &self.bus,
                host: &self.host,
                chrome: &mut self.chrome,
            };
            for event in events {
                EventRelay::dispatch(session, &mut ctx, event);
            }
        }
        log::warn!("Event processing stopped after {MAX_EVENT_ROUNDS} rounds");
    }

    /// Notify the host about an unsupported feature, once per app lifetime.
    pub fn fallback(&mut self, feature: UnsupportedFeature) {
        if self.fellback {
            log::debug!("Fallback for {} already reported", feature.as_str());
            return;
        }
        self.fellback = true;
        let url = self.session.as_ref().and_then(|s| s.base_url.clone());
        self.host.send(HostEvent::Fallback { feature, url });
    }

    fn report_load_error(&self, error: &LoadError) {
        match error {
            LoadError::PasswordRequired => self
                .host
                .send(HostEvent::PasswordRequest { incorrect: false }),
            LoadError::IncorrectPassword => self
                .host
                .send(HostEvent::PasswordRequest { incorrect: true }),
            _ => {
                let report = ErrorReport::from_load_error(&self.l10n, error);
                log::error!("{}", report.to_log_string());
                self.host.send(HostEvent::Error(report));
            }
        }
    }

    /// Returns true when custom labels are in use
    fn apply_page_labels(&self, session: &mut DocumentSession) -> bool {
        if self.options.disable_page_labels {
            return false;
        }
        let Some(labels) = session.document.page_labels() else {
            return false;
        };
        let page_count = session.viewer.page_count();
        if labels.len() != page_count as usize {
            log::warn!(
                "Page labels ({}) do not match the page count ({page_count}), using numbers",
                labels.len()
            );
            return false;
        }
        if is_standard_numbering(&labels) {
            return false;
        }
        session.viewer.set_page_labels(Some(labels));
        true
    }

    fn set_initial_view(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.phase.begin() {
            return;
        }

        let stored = load_persisted(self.store.as_ref(), &session.fingerprint);
        let page_mode = session.document.page_mode();
        let bookmark = session.initial_bookmark.take();
        let directive = {
            let document = session.document.as_ref();
            let resolve = |name: &str| document.destination_page(name);
            reconcile(&ReconcileInputs {
                options: &self.options,
                stored: stored.as_ref(),
                bookmark: bookmark.as_ref(),
                page_mode: &page_mode,
                page_count: session.viewer.page_count(),
                resolve_destination: &resolve,
            })
        };
        log::debug!("Initial view {directive:?}");
        session.persisted = stored.unwrap_or_default();

        if let Some(view) =
            apply_directive(&directive, session.viewer.as_mut(), &mut self.chrome.sidebar)
        {
            self.host.send(HostEvent::SidebarChanged(view));
            self.bus.publish(ViewerEvent::SidebarViewChanged(view));
        }
        session.directive = Some(directive);
        // Still reconciling: transient values stay out of the store
        self.process_events();

        if let Some(bookmark) = &bookmark {
            if let Some(view) = bookmark.page_mode {
                self.bus.publish(ViewerEvent::PageMode(view));
            }
            if let Some(query) = &bookmark.search {
                self.bus.publish(ViewerEvent::FindFromUrlHash {
                    query: query.clone(),
                    phrase_search: bookmark.phrase,
                });
            }
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase.complete();
        let location = session.viewer.location();
        session.persisted.record_location(&location);
        session.persist(self.store.as_mut());
        self.process_events();
    }

    /// Feed page sizes to the viewer, bounded by the configured timeout,
    /// then re-apply the initial position if sizes turned out uneven.
    fn wait_for_page_geometry(&mut self) {
        let timeout = Duration::from_millis(self.options.pages_loaded_timeout_ms);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let geometry = session.document.page_geometry();
        let deadline = Instant::now() + timeout;
        let mut received = 0usize;
        loop {
            match geometry.recv_deadline(deadline) {
                Ok(PageGeometry::Page { index, size }) => {
                    session.viewer.set_page_size(index, size);
                    received += 1;
                }
                Ok(PageGeometry::Done) => break,
                Err(flume::RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Page sizes not loaded within {}ms ({received} of {} known), continuing",
                        timeout.as_millis(),
                        session.viewer.page_count()
                    );
                    break;
                }
                Err(flume::RecvTimeoutError::Disconnected) => {
                    log::debug!("Page geometry stream closed after {received} pages");
                    break;
                }
            }
        }

        let Some(directive) = session.directive.as_ref() else {
            return;
        };
        if needs_corrective_pass(directive, session.viewer.as_ref()) {
            log::debug!("Non-uniform page sizes, re-applying initial position");
            apply_position(directive, session.viewer.as_mut());
            session.corrective_passes += 1;
        }
        self.process_events();
    }

    fn announce_outline_and_attachments(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let outline_count: usize = session.document.outline().iter().map(|o| o.count()).sum();
        let attachments_count = session.document.attachments().len();

        let mut changed = self.chrome.sidebar.set_outline_count(outline_count);
        self.host.send(HostEvent::OutlineLoaded(outline_count));
        changed = self
            .chrome
            .sidebar
            .set_attachments_count(attachments_count)
            .or(changed);
        self.host
            .send(HostEvent::AttachmentsLoaded(attachments_count));

        if let Some(view) = changed {
            self.host.send(HostEvent::SidebarChanged(view));
            self.bus.publish(ViewerEvent::SidebarViewChanged(view));
        }
    }
}
