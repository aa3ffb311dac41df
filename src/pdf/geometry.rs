//! Page geometry worker - measures every page on its own thread

use std::sync::Arc;
use std::thread;

use flume::Sender;
use mupdf::Document;

use crate::document::{PageGeometry, PageSize};

/// Spawn a worker that opens its own copy of the document and streams
/// page sizes, then `Done`. The worker stops early when the receiver is
/// dropped.
pub fn spawn_geometry_worker(
    bytes: Arc<Vec<u8>>,
    password: Option<String>,
    tx: Sender<PageGeometry>,
) {
    let spawned = thread::Builder::new()
        .name("folioview-geometry".into())
        .spawn(move || {
            if let Err(e) = measure_pages(&bytes, password.as_deref(), &tx) {
                log::warn!("Page geometry worker failed: {e}");
            }
        });
    if let Err(e) = spawned {
        log::error!("Could not start page geometry worker: {e}");
    }
}

fn measure_pages(
    bytes: &[u8],
    password: Option<&str>,
    tx: &Sender<PageGeometry>,
) -> Result<(), mupdf::error::Error> {
    let mut doc = Document::from_bytes(bytes, "application/pdf")?;
    if doc.needs_password()? {
        if let Some(password) = password {
            doc.authenticate(password)?;
        }
    }

    let count = doc.page_count()?;
    for index in 0..count {
        let page = doc.load_page(index)?;
        let bounds = page.bounds()?;
        let size = PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);
        if tx
            .send(PageGeometry::Page {
                index: index as usize,
                size,
            })
            .is_err()
        {
            log::debug!("Geometry receiver dropped at page {index}");
            return Ok(());
        }
    }
    let _ = tx.send(PageGeometry::Done);
    Ok(())
}
