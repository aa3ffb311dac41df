//! MuPDF-backed document loader

mod catalog;
mod geometry;
mod loader;

use std::collections::HashMap;
use std::sync::Arc;

pub use catalog::{CatalogInfo, decode_text};
pub use loader::PdfLoader;

use crate::document::{
    Attachment, DocumentInfo, LoadedDocument, OutlineItem, PageGeometry, PageSize,
};
use crate::view_state::PageModeHint;

/// Everything the shell needs from an opened PDF. The MuPDF handle itself
/// is not kept: page geometry is measured by a worker with its own copy.
pub struct PdfDocument {
    fingerprint: String,
    page_count: u32,
    first_page_size: Option<PageSize>,
    page_mode: PageModeHint,
    page_labels: Option<Vec<String>>,
    info: DocumentInfo,
    outline: Vec<OutlineItem>,
    attachments: Vec<Attachment>,
    destinations: HashMap<String, u32>,
    bytes: Arc<Vec<u8>>,
    password: Option<String>,
}

impl LoadedDocument for PdfDocument {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn first_page_size(&self) -> Option<PageSize> {
        self.first_page_size
    }

    fn page_mode(&self) -> PageModeHint {
        self.page_mode.clone()
    }

    fn page_labels(&self) -> Option<Vec<String>> {
        self.page_labels.clone()
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
        self.destinations
            .get(name)
            .copied()
            .filter(|page| *page >= 1 && *page <= self.page_count)
    }

    fn page_geometry(&self) -> flume::Receiver<PageGeometry> {
        let (tx, rx) = flume::unbounded();
        geometry::spawn_geometry_worker(Arc::clone(&self.bytes), self.password.clone(), tx);
        rx
    }
}
