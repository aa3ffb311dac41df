//! View state vocabulary shared by the reconciler, the viewer model and the
//! persisted view history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page rotation. Only quarter turns exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Validate a raw angle. Anything outside {0, 90, 180, 270} is rejected.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Rotate by `delta` degrees. Deltas that are not quarter turns leave
    /// the rotation unchanged.
    #[must_use]
    pub fn rotate_by(self, delta: i32) -> Self {
        let next = (i64::from(self.degrees()) + i64::from(delta)).rem_euclid(360);
        Self::from_degrees(next).unwrap_or(self)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Zoom request: either a layout preset or an explicit ratio (1.0 = 100%).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ZoomSpec {
    #[default]
    Auto,
    PageActual,
    PageFit,
    PageWidth,
    Ratio(f64),
}

impl ZoomSpec {
    /// Parse the textual form used by options, stored views and URL
    /// fragments. Numbers are percentages.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value {
            "auto" => Some(Self::Auto),
            "page-actual" => Some(Self::PageActual),
            "page-fit" | "Fit" | "FitB" => Some(Self::PageFit),
            "page-width" | "FitH" | "FitBH" => Some(Self::PageWidth),
            _ => {
                let percent: f64 = value.trim_end_matches('%').parse().ok()?;
                Self::from_ratio(percent / 100.0)
            }
        }
    }

    pub fn from_ratio(ratio: f64) -> Option<Self> {
        if ratio.is_finite() && ratio > 0.0 {
            Some(Self::Ratio(ratio))
        } else {
            None
        }
    }

    pub fn is_preset(&self) -> bool {
        !matches!(self, Self::Ratio(_))
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Ratio(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for ZoomSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::PageActual => f.write_str("page-actual"),
            Self::PageFit => f.write_str("page-fit"),
            Self::PageWidth => f.write_str("page-width"),
            Self::Ratio(r) => {
                let percent = (r * 100.0 * 100.0).round() / 100.0;
                if percent.fract() == 0.0 {
                    write!(f, "{}", percent as i64)
                } else {
                    write!(f, "{percent}")
                }
            }
        }
    }
}

/// Which panel the sidebar shows. `None` means the sidebar is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SidebarView {
    #[default]
    None,
    Thumbs,
    Outline,
    Attachments,
}

impl SidebarView {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Thumbs),
            2 => Some(Self::Outline),
            3 => Some(Self::Attachments),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Thumbs => 1,
            Self::Outline => 2,
            Self::Attachments => 3,
        }
    }

    /// Names accepted by the `pagemode` fragment parameter.
    pub fn from_page_mode_param(value: &str) -> Option<Self> {
        match value {
            "thumbs" => Some(Self::Thumbs),
            "bookmarks" | "outline" => Some(Self::Outline),
            "attachments" => Some(Self::Attachments),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollMode {
    #[default]
    Vertical,
    Horizontal,
    Wrapped,
}

impl ScrollMode {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Vertical),
            1 => Some(Self::Horizontal),
            2 => Some(Self::Wrapped),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Vertical => 0,
            Self::Horizontal => 1,
            Self::Wrapped => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            "wrapped" => Some(Self::Wrapped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpreadMode {
    #[default]
    None,
    Odd,
    Even,
}

impl SpreadMode {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Odd),
            2 => Some(Self::Even),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Odd => 1,
            Self::Even => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "odd" => Some(Self::Odd),
            "even" => Some(Self::Even),
            _ => None,
        }
    }
}

/// The document catalog's `/PageMode` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageModeHint {
    #[default]
    UseNone,
    UseThumbs,
    UseOutlines,
    UseAttachments,
    UseOc,
    Other(String),
}

impl PageModeHint {
    pub fn from_name(name: &str) -> Self {
        match name {
            "UseNone" => Self::UseNone,
            "UseThumbs" => Self::UseThumbs,
            "UseOutlines" => Self::UseOutlines,
            "UseAttachments" => Self::UseAttachments,
            "UseOC" => Self::UseOc,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn to_sidebar_view(&self) -> SidebarView {
        match self {
            Self::UseThumbs => SidebarView::Thumbs,
            Self::UseOutlines => SidebarView::Outline,
            Self::UseAttachments => SidebarView::Attachments,
            Self::UseNone | Self::UseOc | Self::Other(_) => SidebarView::None,
        }
    }
}

/// Where the winning page/zoom of a directive came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectiveSource {
    Bookmark,
    PreviousView,
    #[default]
    Defaults,
}

/// The resolved initial view for one document load.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewDirective {
    /// 1-based page, always within the document
    pub page: Option<u32>,
    /// Named destination requested by the bookmark, kept for diagnostics
    pub named_dest: Option<String>,
    pub zoom: ZoomSpec,
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub rotation: Rotation,
    pub sidebar_view: SidebarView,
    pub scroll_mode: ScrollMode,
    pub spread_mode: SpreadMode,
    pub source: DirectiveSource,
}

/// Current position as reported by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewLocation {
    pub page: u32,
    pub zoom: ZoomSpec,
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub rotation: Rotation,
}

/// Per-document view state as written to the history file.
///
/// Values are kept raw so that a corrupt or foreign entry can be discarded
/// field by field when the document is opened again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_view: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_mode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_mode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<DateTime<Utc>>,
}

impl PersistedView {
    pub fn record_location(&mut self, location: &ViewLocation) {
        self.page = Some(i64::from(location.page));
        self.zoom = Some(location.zoom.to_string());
        self.scroll_left = Some(location.scroll_left);
        self.scroll_top = Some(location.scroll_top);
        self.rotation = Some(i64::from(location.rotation.degrees()));
        self.touch();
    }

    pub fn record_sidebar_view(&mut self, view: SidebarView) {
        self.sidebar_view = Some(i64::from(view.index()));
        self.touch();
    }

    pub fn record_scroll_mode(&mut self, mode: ScrollMode) {
        self.scroll_mode = Some(i64::from(mode.index()));
        self.touch();
    }

    pub fn record_spread_mode(&mut self, mode: SpreadMode) {
        self.spread_mode = Some(i64::from(mode.index()));
        self.touch();
    }

    fn touch(&mut self) {
        self.last_viewed = Some(Utc::now());
    }

    pub fn valid_page(&self) -> Option<u32> {
        self.page
            .filter(|p| *p >= 1)
            .and_then(|p| u32::try_from(p).ok())
    }

    pub fn valid_zoom(&self) -> Option<ZoomSpec> {
        self.zoom.as_deref().and_then(ZoomSpec::parse)
    }

    pub fn valid_rotation(&self) -> Option<Rotation> {
        self.rotation.and_then(Rotation::from_degrees)
    }

    pub fn valid_sidebar_view(&self) -> Option<SidebarView> {
        self.sidebar_view.and_then(SidebarView::from_index)
    }

    pub fn valid_scroll_mode(&self) -> Option<ScrollMode> {
        self.scroll_mode.and_then(ScrollMode::from_index)
    }

    pub fn valid_spread_mode(&self) -> Option<SpreadMode> {
        self.spread_mode.and_then(SpreadMode::from_index)
    }
}
