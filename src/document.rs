//! Document sources and the loader seam.
//!
//! The viewer never parses PDF itself. A [`DocumentLoader`] turns a
//! [`DocumentSource`] into a [`LoadedDocument`] that answers the questions
//! the shell asks: fingerprint, page count, catalog hints, metadata and
//! page geometry.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::error::LoadError;
use crate::fragment::percent_decode;
use crate::l10n::Localization;
use crate::view_state::PageModeHint;

/// Bytes hashed when the trailer carries no `/ID`
pub const FINGERPRINT_PREFIX_LEN: usize = 1024;

/// What the host asked us to open
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    /// Filesystem path or `file://` URL
    Url(String),
    Bytes(Vec<u8>),
    Descriptor {
        url: String,
        original_url: Option<String>,
        password: Option<String>,
    },
}

impl DocumentSource {
    /// The URL used for the window title and the fallback file name
    pub fn display_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Bytes(_) => None,
            Self::Descriptor {
                url, original_url, ..
            } => Some(original_url.as_deref().unwrap_or(url)),
        }
    }

    pub fn password(&self) -> Option<&str> {
        match self {
            Self::Descriptor { password, .. } => password.as_deref(),
            _ => None,
        }
    }

    pub fn with_password(self, password: String) -> Self {
        match self {
            Self::Descriptor {
                url, original_url, ..
            } => Self::Descriptor {
                url,
                original_url,
                password: Some(password),
            },
            Self::Url(url) => Self::Descriptor {
                url,
                original_url: None,
                password: Some(password),
            },
            bytes => bytes,
        }
    }
}

/// Page dimensions in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn approx_eq(&self, other: &PageSize) -> bool {
        (self.width - other.width).abs() < 0.5 && (self.height - other.height).abs() < 0.5
    }

    pub fn is_portrait(&self) -> bool {
        self.width <= self.height
    }

    /// Human readable size, e.g. `8.5 × 11 in (Letter, portrait)`.
    /// Metric locales get millimetres.
    pub fn describe(&self, l10n: &Localization) -> String {
        let metric = !matches!(l10n.locale(), "en-US" | "en" | "my" | "lr");
        let (width, height, unit) = if metric {
            (
                format_dimension(f64::from(self.width) * 25.4 / 72.0, 0),
                format_dimension(f64::from(self.height) * 25.4 / 72.0, 0),
                "mm",
            )
        } else {
            (
                format_dimension(f64::from(self.width) / 72.0, 2),
                format_dimension(f64::from(self.height) / 72.0, 2),
                "in",
            )
        };
        let orientation = if self.is_portrait() {
            l10n.get("document_properties_portrait", &[], "portrait")
        } else {
            l10n.get("document_properties_landscape", &[], "landscape")
        };

        let args = [
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("unit", unit),
            ("orientation", orientation.as_str()),
        ];
        match self.standard_name() {
            Some(name) => {
                let mut named = args.to_vec();
                named.push(("name", name));
                l10n.get(
                    "document_properties_page_size_dimension_name",
                    &named,
                    "{{width}} × {{height}} {{unit}} ({{name}}, {{orientation}})",
                )
            }
            None => l10n.get(
                "document_properties_page_size_dimension",
                &args,
                "{{width}} × {{height}} {{unit}} ({{orientation}})",
            ),
        }
    }

    fn standard_name(&self) -> Option<&'static str> {
        const SIZES: &[(f32, f32, &str)] = &[
            (612.0, 792.0, "Letter"),
            (612.0, 1008.0, "Legal"),
            (595.0, 842.0, "A4"),
            (842.0, 1191.0, "A3"),
            (420.0, 595.0, "A5"),
        ];
        let (short, long) = if self.is_portrait() {
            (self.width.round(), self.height.round())
        } else {
            (self.height.round(), self.width.round())
        };
        SIZES
            .iter()
            .find(|(w, h, _)| (short - w).abs() <= 1.0 && (long - h).abs() <= 1.0)
            .map(|(_, _, name)| *name)
    }
}

fn format_dimension(value: f64, decimals: usize) -> String {
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlineItem {
    pub title: String,
    /// 1-based target page when the entry resolves to one
    pub page: Option<u32>,
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Number of entries in this subtree including itself
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineItem::count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub size: Option<usize>,
}

/// Emitted by the geometry stream of a loaded document
#[derive(Debug, Clone, PartialEq)]
pub enum PageGeometry {
    Page { index: usize, size: PageSize },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Percentage in 0..=100, `None` when the total is unknown
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let ratio = self.loaded.min(total) as f64 / total as f64;
        Some((ratio * 100.0).round() as u8)
    }
}

/// Transport switches handed to the loader with every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Read the whole source in one go, with a single progress report
    pub disable_stream: bool,
    pub disable_range: bool,
    pub disable_auto_fetch: bool,
}

/// Document information dictionary plus the bits of catalog state the
/// properties dialog shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    /// XMP `dc:title`, preferred over `title`
    pub metadata_title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub pdf_version: Option<String>,
    pub is_acro_form_present: bool,
    pub is_linearized: bool,
    pub file_size: Option<u64>,
}

impl DocumentInfo {
    /// Display title, ignoring the `Untitled` placeholder some producers write.
    pub fn display_title(&self) -> Option<&str> {
        self.metadata_title
            .as_deref()
            .filter(|t| !t.trim().is_empty() && *t != "Untitled")
            .or_else(|| self.title.as_deref().filter(|t| !t.trim().is_empty()))
    }
}

/// A parsed document as seen by the viewer shell.
pub trait LoadedDocument {
    fn fingerprint(&self) -> &str;

    fn page_count(&self) -> u32;

    fn first_page_size(&self) -> Option<PageSize>;

    fn page_mode(&self) -> PageModeHint;

    /// One label per page, `None` when the catalog has no `/PageLabels`
    fn page_labels(&self) -> Option<Vec<String>>;

    fn info(&self) -> &DocumentInfo;

    fn outline(&self) -> Vec<OutlineItem>;

    fn attachments(&self) -> Vec<Attachment>;

    /// Resolve a named destination to a 1-based page
    fn destination_page(&self, name: &str) -> Option<u32>;

    /// Stream of page sizes, terminated by [`PageGeometry::Done`]. May be
    /// slow for large documents.
    fn page_geometry(&self) -> flume::Receiver<PageGeometry>;
}

pub trait DocumentLoader {
    fn load(
        &mut self,
        source: &DocumentSource,
        options: LoadOptions,
        progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Box<dyn LoadedDocument>, LoadError>;
}

/// Fingerprint of a document without a trailer `/ID`.
pub fn fingerprint_from_bytes(bytes: &[u8]) -> String {
    let prefix = &bytes[..bytes.len().min(FINGERPRINT_PREFIX_LEN)];
    format!("{:x}", md5::compute(prefix))
}

/// Hex encoding of the first trailer `/ID` string.
pub fn fingerprint_from_id(id: &[u8]) -> String {
    id.iter().map(|b| format!("{b:02x}")).collect()
}

/// File name to show for a document URL: the last `*.pdf` segment if any,
/// else the last path segment, else the URL itself. Percent-decoded.
pub fn title_from_url(url: &str) -> String {
    let without_hash = url.split('#').next().unwrap_or(url);
    let (path, query) = match without_hash.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_hash, None),
    };

    let is_pdf = |segment: &&str| segment.to_ascii_lowercase().ends_with(".pdf");
    let pdf_segment = path
        .rsplit(['/', '\\'])
        .find(is_pdf)
        .or_else(|| {
            query.and_then(|q| {
                q.split('&')
                    .filter_map(|pair| pair.split_once('=').map(|(_, v)| v))
                    .flat_map(|v| v.rsplit('/'))
                    .find(is_pdf)
            })
        });
    if let Some(segment) = pdf_segment {
        return percent_decode(segment);
    }

    let last = path.rsplit(['/', '\\']).find(|s| !s.is_empty()).unwrap_or("");
    if last.is_empty() || last.ends_with(':') {
        url.to_string()
    } else {
        percent_decode(last)
    }
}

/// Window title for a loaded document.
pub fn document_title(info: &DocumentInfo, file_name: Option<&str>) -> Option<String> {
    match (info.display_title(), file_name) {
        (Some(title), Some(file)) => Some(format!("{title} - {file}")),
        (Some(title), None) => Some(title.to_string()),
        (None, Some(file)) => Some(file.to_string()),
        (None, None) => None,
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`). Missing trailing
/// components default to their minimum.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    let digits = |from: usize, len: usize, default: u32| -> Option<u32> {
        match s.get(from..from + len) {
            Some(part) if part.bytes().all(|b| b.is_ascii_digit()) => part.parse().ok(),
            Some(_) => None,
            None => Some(default),
        }
    };

    let year = i32::try_from(digits(0, 4, 0)?).ok()?;
    if s.len() < 4 {
        return None;
    }
    let month = digits(4, 2, 1)?.clamp(1, 12);
    let day = digits(6, 2, 1)?.clamp(1, 31);
    let hour = digits(8, 2, 0)?.min(23);
    let minute = digits(10, 2, 0)?.min(59);
    let second = digits(12, 2, 0)?.min(59);

    let mut offset_secs = 0i32;
    if let Some(sign) = s.get(14..15) {
        let tz = s.get(15..).unwrap_or("").replace('\'', "");
        let tz_hour: i32 = tz.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
        let tz_min: i32 = tz.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
        let magnitude = tz_hour * 3600 + tz_min * 60;
        offset_secs = match sign {
            "+" => magnitude,
            "-" => -magnitude,
            _ => 0,
        };
    }

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(offset_secs)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Values shown in the document properties dialog
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProperties {
    pub file_name: String,
    pub file_size: String,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creation_date: String,
    pub modification_date: String,
    pub creator: String,
    pub producer: String,
    pub version: String,
    pub page_count: u32,
    pub page_size: String,
    pub linearized: String,
}

impl DocumentProperties {
    pub fn collect(doc: &dyn LoadedDocument, file_name: &str, l10n: &Localization) -> Self {
        let info = doc.info();
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        let date = |value: &Option<DateTime<Utc>>| {
            value
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string())
        };

        Self {
            file_name: file_name.to_string(),
            file_size: info
                .file_size
                .map(|size| format_file_size(size, l10n))
                .unwrap_or_else(|| "-".to_string()),
            title: text(&info.title),
            author: text(&info.author),
            subject: text(&info.subject),
            keywords: text(&info.keywords),
            creation_date: date(&info.creation_date),
            modification_date: date(&info.modification_date),
            creator: text(&info.creator),
            producer: text(&info.producer),
            version: text(&info.pdf_version),
            page_count: doc.page_count(),
            page_size: doc
                .first_page_size()
                .map(|size| size.describe(l10n))
                .unwrap_or_else(|| "-".to_string()),
            linearized: if info.is_linearized {
                l10n.get("document_properties_linearized_yes", &[], "Yes")
            } else {
                l10n.get("document_properties_linearized_no", &[], "No")
            },
        }
    }
}

fn format_file_size(bytes: u64, l10n: &Localization) -> String {
    let size_b = bytes.to_string();
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        let size_kb = format_dimension(kb, 2);
        l10n.get(
            "document_properties_kb",
            &[("size_kb", size_kb.as_str()), ("size_b", size_b.as_str())],
            "{{size_kb}} KB ({{size_b}} bytes)",
        )
    } else {
        let size_mb = format_dimension(kb / 1024.0, 2);
        l10n.get(
            "document_properties_mb",
            &[("size_mb", size_mb.as_str()), ("size_b", size_b.as_str())],
            "{{size_mb}} MB ({{size_b}} bytes)",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn fingerprint_hashes_only_the_prefix() {
        let mut a = vec![7u8; 2048];
        let b = a.clone();
        a[1500] = 0;
        assert_eq!(fingerprint_from_bytes(&a), fingerprint_from_bytes(&b));
        assert_eq!(fingerprint_from_bytes(b"").len(), 32);
        assert_eq!(fingerprint_from_id(&[0xab, 0x01]), "ab01");
    }

    #[test]
    fn title_from_url_prefers_pdf_segment() {
        assert_eq!(title_from_url("file:///home/me/My%20Paper.pdf#page=2"), "My Paper.pdf");
        assert_eq!(
            title_from_url("https://host/viewer?file=/docs/report.pdf"),
            "report.pdf"
        );
        assert_eq!(title_from_url("https://host/download/1234"), "1234");
        assert_eq!(title_from_url("https://"), "https://");
    }

    #[test]
    fn untitled_metadata_falls_back_to_info_title() {
        let info = DocumentInfo {
            metadata_title: Some("Untitled".into()),
            title: Some("Annual Report".into()),
            ..Default::default()
        };
        assert_eq!(
            document_title(&info, Some("report.pdf")).as_deref(),
            Some("Annual Report - report.pdf")
        );
        assert_eq!(
            document_title(&DocumentInfo::default(), Some("report.pdf")).as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn pdf_dates_with_and_without_offsets() {
        let date = parse_pdf_date("D:20240315120000+02'00'").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-15T10:00:00+00:00");

        let date = parse_pdf_date("D:1999").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1999, 1, 1));

        assert!(parse_pdf_date("yesterday").is_none());
    }

    #[test]
    fn page_size_description_names_standard_sizes() {
        let l10n = Localization::new("en-US");
        assert_eq!(
            PageSize::new(612.0, 792.0).describe(&l10n),
            "8.5 × 11 in (Letter, portrait)"
        );
        let l10n = Localization::new("de");
        assert_eq!(
            PageSize::new(842.0, 595.0).describe(&l10n),
            "297 × 210 mm (A4, landscape)"
        );
    }

    #[test]
    fn progress_percent_needs_a_total() {
        let progress = LoadProgress {
            loaded: 50,
            total: Some(200),
        };
        assert_eq!(progress.percent(), Some(25));
        assert_eq!(
            LoadProgress {
                loaded: 5,
                total: None
            }
            .percent(),
            None
        );
    }
}
