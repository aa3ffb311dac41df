//! In-memory fakes for the document, loader and store seams.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::document::{
    Attachment, DocumentInfo, DocumentLoader, DocumentSource, LoadOptions, LoadProgress,
    LoadedDocument, OutlineItem, PageGeometry, PageSize,
};
use crate::error::{LoadError, StoreError};
use crate::view_history::ViewStore;
use crate::view_state::{PageModeHint, PersistedView};

const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// How [`FakeDocument::page_geometry`] behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryMode {
    /// Every size followed by `Done`
    Immediate,
    /// Nothing is ever sent, the channel stays open
    Hang,
    /// Only the first `n` sizes, then the channel stays open
    Partial(usize),
}

pub struct FakeDocument {
    fingerprint: String,
    sizes: Vec<PageSize>,
    page_mode: PageModeHint,
    labels: Option<Vec<String>>,
    info: DocumentInfo,
    outline: Vec<OutlineItem>,
    attachments: Vec<Attachment>,
    destinations: HashMap<String, u32>,
    geometry: GeometryMode,
    /// Senders held open for hanging geometry streams
    held: RefCell<Vec<flume::Sender<PageGeometry>>>,
}

impl FakeDocument {
    pub fn new(fingerprint: &str, page_count: u32) -> Self {
        Self {
            fingerprint: fingerprint.to_string(),
            sizes: vec![LETTER; page_count as usize],
            page_mode: PageModeHint::UseNone,
            labels: None,
            info: DocumentInfo::default(),
            outline: Vec::new(),
            attachments: Vec::new(),
            destinations: HashMap::new(),
            geometry: GeometryMode::Immediate,
            held: RefCell::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, index: usize, size: PageSize) -> Self {
        if let Some(slot) = self.sizes.get_mut(index) {
            *slot = size;
        }
        self
    }

    pub fn with_page_mode(mut self, mode: PageModeHint) -> Self {
        self.page_mode = mode;
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_outline(mut self, titles: &[&str]) -> Self {
        self.outline = titles
            .iter()
            .enumerate()
            .map(|(i, title)| OutlineItem {
                title: title.to_string(),
                page: Some(i as u32 + 1),
                children: Vec::new(),
            })
            .collect();
        self
    }

    pub fn with_attachment(mut self, filename: &str, size: usize) -> Self {
        self.attachments.push(Attachment {
            filename: filename.to_string(),
            size: Some(size),
        });
        self
    }

    pub fn with_destination(mut self, name: &str, page: u32) -> Self {
        self.destinations.insert(name.to_string(), page);
        self
    }

    pub fn with_geometry(mut self, mode: GeometryMode) -> Self {
        self.geometry = mode;
        self
    }
}

impl LoadedDocument for FakeDocument {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn first_page_size(&self) -> Option<PageSize> {
        self.sizes.first().copied()
    }

    fn page_mode(&self) -> PageModeHint {
        self.page_mode.clone()
    }

    fn page_labels(&self) -> Option<Vec<String>> {
        self.labels.clone()
    }

    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    fn outline(&self) -> Vec<OutlineItem> {
        self.outline.clone()
    }

    fn attachments(&self) -> Vec<Attachment> {
        self.attachments.clone()
    }

    fn destination_page(&self, name: &str) -> Option<u32> {
        self.destinations.get(name).copied()
    }

    fn page_geometry(&self) -> flume::Receiver<PageGeometry> {
        let (tx, rx) = flume::unbounded();
        let sent = match self.geometry {
            GeometryMode::Immediate => self.sizes.len(),
            GeometryMode::Hang => 0,
            GeometryMode::Partial(n) => n.min(self.sizes.len()),
        };
        for (index, size) in self.sizes.iter().take(sent).enumerate() {
            let _ = tx.send(PageGeometry::Page { index, size: *size });
        }
        if self.geometry == GeometryMode::Immediate {
            let _ = tx.send(PageGeometry::Done);
        } else {
            self.held.borrow_mut().push(tx);
        }
        rx
    }
}

/// Loader returning queued results in order
#[derive(Default)]
pub struct FakeLoader {
    queue: VecDeque<Result<FakeDocument, LoadError>>,
    /// Display URLs of every load request
    pub requests: Rc<RefCell<Vec<String>>>,
    /// Options passed with every load request
    pub load_options: Rc<RefCell<Vec<LoadOptions>>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document: FakeDocument) -> Self {
        self.queue.push_back(Ok(document));
        self
    }

    pub fn with_error(mut self, error: LoadError) -> Self {
        self.queue.push_back(Err(error));
        self
    }
}

impl DocumentLoader for FakeLoader {
    fn load(
        &mut self,
        source: &DocumentSource,
        options: LoadOptions,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Box<dyn LoadedDocument>, LoadError> {
        self.requests
            .borrow_mut()
            .push(source.display_url().unwrap_or("<bytes>").to_string());
        self.load_options.borrow_mut().push(options);
        if !options.disable_stream {
            progress(LoadProgress {
                loaded: 512,
                total: Some(1024),
            });
        }
        progress(LoadProgress {
            loaded: 1024,
            total: Some(1024),
        });
        match self.queue.pop_front() {
            Some(Ok(document)) => Ok(Box::new(document)),
            Some(Err(e)) => Err(e),
            None => Err(LoadError::Missing {
                path: source.display_url().unwrap_or_default().to_string(),
            }),
        }
    }
}

/// Shared in-memory store. Clones see the same entries, so a test can keep
/// a handle after moving the store into the application.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    views: Rc<RefCell<HashMap<String, PersistedView>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn get(&self, fingerprint: &str) -> Option<PersistedView> {
        self.views.borrow().get(fingerprint).cloned()
    }

    pub fn insert(&self, fingerprint: &str, view: PersistedView) {
        self.views.borrow_mut().insert(fingerprint.to_string(), view);
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl ViewStore for MemoryStore {
    fn read(&self, fingerprint: &str) -> Result<Option<PersistedView>, StoreError> {
        Ok(self.get(fingerprint))
    }

    fn write(&mut self, fingerprint: &str, view: &PersistedView) -> Result<(), StoreError> {
        self.insert(fingerprint, view.clone());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Store whose every operation fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl ViewStore for FailingStore {
    fn read(&self, _fingerprint: &str) -> Result<Option<PersistedView>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }

    fn write(&mut self, _fingerprint: &str, _view: &PersistedView) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".into()))
    }
}
