use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mupdf::{Document, MetadataName};

use super::PdfDocument;
use super::catalog::CatalogInfo;
use crate::document::{
    DocumentInfo, DocumentLoader, DocumentSource, LoadOptions, LoadProgress, LoadedDocument, OutlineItem,
    PageSize, fingerprint_from_bytes, fingerprint_from_id, parse_pdf_date,
};
use crate::error::LoadError;
use crate::fragment::percent_decode;
use crate::page_labels::build_labels;

const READ_CHUNK: usize = 64 * 1024;

/// Opens local PDF files and byte buffers with MuPDF.
#[derive(Debug, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &mut self,
        source: &DocumentSource,
        options: LoadOptions,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Box<dyn LoadedDocument>, LoadError> {
        if options.disable_range || options.disable_auto_fetch {
            log::debug!("Range and auto-fetch switches have no effect on local reads");
        }
        let bytes = match source {
            DocumentSource::Bytes(bytes) => {
                let total = bytes.len() as u64;
                progress(LoadProgress {
                    loaded: total,
                    total: Some(total),
                });
                bytes.clone()
            }
            DocumentSource::Url(url) | DocumentSource::Descriptor { url, .. } => {
                read_file(&local_path(url)?, !options.disable_stream, progress)?
            }
        };
        let document = open_document(bytes, source.password())?;
        Ok(Box::new(document))
    }
}

/// Map a `file://` URL or plain path to a filesystem path
fn local_path(url: &str) -> Result<PathBuf, LoadError> {
    let url = url.split('#').next().unwrap_or(url);
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(percent_decode(path)));
    }
    if url.contains("://") {
        return Err(LoadError::UnsupportedSource(url.to_string()));
    }
    Ok(PathBuf::from(url))
}

/// Read a local file, reporting progress per chunk when `streamed`, else
/// once at the end.
fn read_file(
    path: &Path,
    streamed: bool,
    progress: &mut dyn FnMut(LoadProgress),
) -> Result<Vec<u8>, LoadError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::Missing {
            path: path.display().to_string(),
        },
        _ => LoadError::Io(e),
    })?;
    let total = file.metadata().ok().map(|m| m.len());
    if !streamed {
        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        file.read_to_end(&mut bytes)?;
        let loaded = bytes.len() as u64;
        progress(LoadProgress {
            loaded,
            total: Some(total.unwrap_or(loaded)),
        });
        return Ok(bytes);
    }
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress(LoadProgress {
            loaded: bytes.len() as u64,
            total,
        });
    }
    Ok(bytes)
}

fn open_document(bytes: Vec<u8>, password: Option<&str>) -> Result<PdfDocument, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::invalid("empty file"));
    }
    let mut doc = Document::from_bytes(&bytes, "application/pdf")
        .map_err(|e| LoadError::invalid(e.to_string()))?;

    if doc.needs_password().map_err(backend)? {
        let Some(password) = password else {
            return Err(LoadError::PasswordRequired);
        };
        if !doc.authenticate(password).map_err(backend)? {
            return Err(LoadError::IncorrectPassword);
        }
    }

    let page_count = doc.page_count().map_err(backend)?;
    let page_count = u32::try_from(page_count).unwrap_or(0);
    let first_page_size = if page_count > 0 {
        doc.load_page(0)
            .and_then(|page| page.bounds())
            .map(|b| PageSize::new(b.x1 - b.x0, b.y1 - b.y0))
            .ok()
    } else {
        None
    };

    let catalog = CatalogInfo::read(&bytes).unwrap_or_else(|e| {
        log::warn!("Could not read the document catalog: {e}");
        CatalogInfo::default()
    });

    let fingerprint = catalog
        .trailer_id
        .as_deref()
        .map(fingerprint_from_id)
        .unwrap_or_else(|| fingerprint_from_bytes(&bytes));

    let meta = |name: MetadataName| {
        doc.metadata(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let info = DocumentInfo {
        title: meta(MetadataName::Title),
        metadata_title: catalog.metadata_title.clone(),
        author: meta(MetadataName::Author),
        subject: meta(MetadataName::Subject),
        keywords: meta(MetadataName::Keywords),
        creation_date: meta(MetadataName::CreationDate).and_then(|d| parse_pdf_date(&d)),
        modification_date: meta(MetadataName::ModDate).and_then(|d| parse_pdf_date(&d)),
        creator: meta(MetadataName::Creator),
        producer: meta(MetadataName::Producer),
        pdf_version: meta(MetadataName::Format)
            .map(|format| format.trim_start_matches("PDF").trim().to_string()),
        is_acro_form_present: catalog.is_acro_form_present,
        is_linearized: catalog.is_linearized,
        file_size: Some(bytes.len() as u64),
    };

    let outline = match doc.outlines() {
        Ok(outlines) => convert_outlines(&outlines),
        Err(e) => {
            log::debug!("No outline: {e}");
            Vec::new()
        }
    };

    let page_labels = catalog
        .label_ranges
        .as_ref()
        .map(|ranges| build_labels(ranges, page_count as usize));

    Ok(PdfDocument {
        fingerprint,
        page_count,
        first_page_size,
        page_mode: catalog.page_mode,
        page_labels,
        info,
        outline,
        attachments: catalog.attachments,
        destinations: catalog.destinations,
        bytes: Arc::new(bytes),
        password: password.map(str::to_string),
    })
}

fn backend(e: mupdf::error::Error) -> LoadError {
    LoadError::backend(e.to_string())
}

fn convert_outlines(outlines: &[mupdf::Outline]) -> Vec<OutlineItem> {
    outlines
        .iter()
        .map(|outline| OutlineItem {
            title: outline.title.trim().to_string(),
            page: outline.dest.map(|dest| dest.loc.page_number as u32 + 1),
            children: convert_outlines(&outline.down),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_urls_map_to_paths() {
        assert_eq!(
            local_path("file:///tmp/My%20Book.pdf#page=3").unwrap(),
            PathBuf::from("/tmp/My Book.pdf")
        );
        assert_eq!(local_path("docs/a.pdf").unwrap(), PathBuf::from("docs/a.pdf"));
        assert!(matches!(
            local_path("https://example.com/a.pdf"),
            Err(LoadError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.pdf");
        let mut loader = PdfLoader::new();
        let result = loader.load(
            &DocumentSource::Url(path.display().to_string()),
            LoadOptions::default(),
            &mut |_| {},
        );
        assert!(matches!(result, Err(LoadError::Missing { .. })));
    }

    #[test]
    fn garbage_bytes_are_invalid() {
        let mut loader = PdfLoader::new();
        let result = loader.load(
            &DocumentSource::Bytes(b"not a pdf".to_vec()),
            LoadOptions::default(),
            &mut |_| {},
        );
        assert!(matches!(result, Err(LoadError::Invalid { .. })));
    }

    #[test]
    fn disabled_streaming_reports_progress_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![b'%'; READ_CHUNK * 3 + 10]).unwrap();

        let mut streamed = Vec::new();
        let bytes = read_file(&path, true, &mut |p| streamed.push(p)).unwrap();
        assert_eq!(bytes.len(), READ_CHUNK * 3 + 10);
        assert_eq!(streamed.len(), 4);

        let mut whole = Vec::new();
        let bytes = read_file(&path, false, &mut |p| whole.push(p)).unwrap();
        assert_eq!(bytes.len(), READ_CHUNK * 3 + 10);
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].percent(), Some(100));
    }
}
