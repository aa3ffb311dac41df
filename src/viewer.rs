//! Page viewer capability and the in-crate viewer model
//!
//! The shell only talks to the viewer through [`PageViewer`]. The
//! [`ViewerModel`] implementation keeps position, zoom, rotation and layout
//! modes, and reports every observable change as a [`ViewerEffect`] that the
//! application turns into bus events.

use crate::document::PageSize;
use crate::view_state::{Rotation, ScrollMode, SpreadMode, ViewLocation, ZoomSpec};
use crate::zoom::Zoom;

/// CSS pixels per PDF point
pub const CSS_UNITS: f64 = 96.0 / 72.0;
/// Upper bound for the `auto` preset
pub const MAX_AUTO_SCALE: f64 = 1.25;

const DEFAULT_VIEWPORT: (f64, f64) = (816.0, 1056.0);
const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// Operations the shell performs on the page viewer.
pub trait PageViewer {
    fn set_document(&mut self, page_count: u32, first_page: Option<PageSize>);

    fn clear_document(&mut self);

    fn page_count(&self) -> u32;

    fn current_page_number(&self) -> u32;

    /// Returns false when `page` is outside the document
    fn set_current_page_number(&mut self, page: u32) -> bool;

    fn current_page_label(&self) -> Option<String>;

    /// Accepts a page label, or a page number when no label matches
    fn set_current_page_label(&mut self, label: &str) -> bool;

    fn current_scale(&self) -> Zoom;

    fn set_current_scale_value(&mut self, spec: ZoomSpec);

    fn zoom_in(&mut self, ticks: u32);

    fn zoom_out(&mut self, ticks: u32);

    fn pages_rotation(&self) -> Rotation;

    fn set_pages_rotation(&mut self, rotation: Rotation);

    fn scroll_mode(&self) -> ScrollMode;

    fn set_scroll_mode(&mut self, mode: ScrollMode);

    fn spread_mode(&self) -> SpreadMode;

    fn set_spread_mode(&mut self, mode: SpreadMode);

    /// Navigate to `page`, optionally changing zoom, with offsets in page units
    fn scroll_page_into_view(&mut self, page: u32, zoom: Option<ZoomSpec>, left: f64, top: f64);

    fn next_page(&mut self) -> bool;

    fn previous_page(&mut self) -> bool;

    fn set_page_labels(&mut self, labels: Option<Vec<String>>);

    fn set_page_size(&mut self, index: usize, size: PageSize);

    fn has_equal_page_sizes(&self) -> bool;

    fn resize(&mut self, width: f64, height: f64);

    fn location(&self) -> ViewLocation;

    /// Drain changes produced since the last call
    fn take_effects(&mut self) -> Vec<ViewerEffect>;
}

/// Commands that modify viewer state
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SetDocument {
        page_count: u32,
        first_page: Option<PageSize>,
    },
    ClearDocument,
    GoToPage(u32),
    NextPage,
    PreviousPage,
    SetScale(ZoomSpec),
    ZoomIn(u32),
    ZoomOut(u32),
    SetRotation(Rotation),
    SetScrollMode(ScrollMode),
    SetSpreadMode(SpreadMode),
    ScrollTo {
        page: u32,
        zoom: Option<ZoomSpec>,
        left: f64,
        top: f64,
    },
    SetPageLabels(Option<Vec<String>>),
    SetPageSize {
        index: usize,
        size: PageSize,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

/// Observable changes produced by commands
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEffect {
    PageChanging {
        page: u32,
        label: Option<String>,
    },
    ScaleChanging {
        scale: f64,
        preset: Option<ZoomSpec>,
    },
    RotationChanging {
        rotation: Rotation,
        page: u32,
    },
    ScrollModeChanged(ScrollMode),
    SpreadModeChanged(SpreadMode),
    UpdateViewArea(ViewLocation),
}

/// Presentation (fullscreen) mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationModeState {
    #[default]
    Unknown,
    Normal,
    Changing,
    Fullscreen,
}

impl PresentationModeState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Changing | Self::Fullscreen)
    }
}

#[derive(Debug, Clone)]
pub struct ViewerModel {
    page_count: u32,
    /// 1-based, 0 when no document is set
    current_page: u32,
    zoom: Zoom,
    rotation: Rotation,
    scroll_mode: ScrollMode,
    spread_mode: SpreadMode,
    scroll_left: f64,
    scroll_top: f64,
    labels: Option<Vec<String>>,
    sizes: Vec<PageSize>,
    viewport: (f64, f64),
    pending: Vec<ViewerEffect>,
}

impl Default for ViewerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerModel {
    pub fn new() -> Self {
        Self {
            page_count: 0,
            current_page: 0,
            zoom: Zoom::default(),
            rotation: Rotation::Deg0,
            scroll_mode: ScrollMode::Vertical,
            spread_mode: SpreadMode::None,
            scroll_left: 0.0,
            scroll_top: 0.0,
            labels: None,
            sizes: Vec::new(),
            viewport: DEFAULT_VIEWPORT,
            pending: Vec::new(),
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<ViewerEffect> {
        match cmd {
            Command::SetDocument {
                page_count,
                first_page,
            } => {
                let size = first_page.unwrap_or(LETTER);
                self.page_count = page_count;
                self.sizes = vec![size; page_count as usize];
                self.labels = None;
                self.scroll_left = 0.0;
                self.scroll_top = 0.0;
                self.current_page = 0;
                if page_count == 0 {
                    return vec![];
                }
                self.go_to(1)
            }

            Command::ClearDocument => {
                *self = Self {
                    viewport: self.viewport,
                    ..Self::new()
                };
                vec![]
            }

            Command::GoToPage(page) => {
                if page == 0 || page > self.page_count {
                    return vec![];
                }
                self.go_to(page)
            }

            Command::NextPage => {
                let target = self.next_spread_page();
                match target {
                    Some(page) => self.go_to(page),
                    None => vec![],
                }
            }

            Command::PreviousPage => match self.previous_spread_page() {
                Some(page) => self.go_to(page),
                None => vec![],
            },

            Command::SetScale(spec) => self.set_scale(spec),

            Command::ZoomIn(ticks) => {
                let mut zoom = self.zoom;
                zoom.step_in(ticks);
                self.set_scale(zoom.spec)
            }

            Command::ZoomOut(ticks) => {
                let mut zoom = self.zoom;
                zoom.step_out(ticks);
                self.set_scale(zoom.spec)
            }

            Command::SetRotation(rotation) => {
                if self.rotation == rotation {
                    return vec![];
                }
                self.rotation = rotation;
                let mut effects = vec![ViewerEffect::RotationChanging {
                    rotation,
                    page: self.current_page,
                }];
                // Fitted presets depend on the rotated page box
                if self.zoom.spec.is_preset() {
                    effects.extend(self.refit());
                }
                effects.push(self.view_area());
                effects
            }

            Command::SetScrollMode(mode) => {
                if self.scroll_mode == mode {
                    return vec![];
                }
                self.scroll_mode = mode;
                vec![ViewerEffect::ScrollModeChanged(mode), self.view_area()]
            }

            Command::SetSpreadMode(mode) => {
                if self.spread_mode == mode {
                    return vec![];
                }
                self.spread_mode = mode;
                vec![ViewerEffect::SpreadModeChanged(mode), self.view_area()]
            }

            Command::ScrollTo {
                page,
                zoom,
                left,
                top,
            } => {
                if page == 0 || page > self.page_count {
                    log::warn!("scroll_page_into_view: {page} is not a valid page");
                    return vec![];
                }
                let mut effects = Vec::new();
                if let Some(spec) = zoom {
                    effects.extend(self.set_scale_quiet(spec));
                }
                let moved = self.scroll_left != left || self.scroll_top != top;
                self.scroll_left = left;
                self.scroll_top = top;
                if self.current_page != page {
                    self.current_page = page;
                    effects.push(self.page_changing());
                } else if !moved && effects.is_empty() {
                    return effects;
                }
                effects.push(self.view_area());
                effects
            }

            Command::SetPageLabels(labels) => {
                let labels = labels.filter(|l| !l.is_empty());
                if self.labels == labels {
                    return vec![];
                }
                self.labels = labels;
                // The current page keeps its number but not its label
                if self.current_page == 0 {
                    return vec![];
                }
                vec![self.page_changing()]
            }

            Command::SetPageSize { index, size } => {
                if let Some(slot) = self.sizes.get_mut(index) {
                    *slot = size;
                }
                vec![]
            }

            Command::Resize { width, height } => {
                if width <= 0.0 || height <= 0.0 || self.viewport == (width, height) {
                    return vec![];
                }
                self.viewport = (width, height);
                if self.zoom.spec.is_preset() && self.page_count > 0 {
                    let mut effects = self.refit();
                    if !effects.is_empty() {
                        effects.push(self.view_area());
                    }
                    effects
                } else {
                    vec![]
                }
            }
        }
    }

    fn go_to(&mut self, page: u32) -> Vec<ViewerEffect> {
        if self.current_page == page {
            return vec![];
        }
        self.current_page = page;
        self.scroll_left = 0.0;
        self.scroll_top = 0.0;
        vec![self.page_changing(), self.view_area()]
    }

    fn set_scale(&mut self, spec: ZoomSpec) -> Vec<ViewerEffect> {
        let mut effects = self.set_scale_quiet(spec);
        if !effects.is_empty() {
            effects.push(self.view_area());
        }
        effects
    }

    /// Scale change without the trailing view-area update
    fn set_scale_quiet(&mut self, spec: ZoomSpec) -> Vec<ViewerEffect> {
        let before = self.zoom;
        self.zoom.set_spec(spec);
        if spec.is_preset() {
            let fitted = self.fitted_scale(spec);
            self.zoom.report_factor(fitted);
        }
        if before == self.zoom {
            return vec![];
        }
        vec![self.scale_changing()]
    }

    fn refit(&mut self) -> Vec<ViewerEffect> {
        let before = self.zoom.factor();
        let fitted = self.fitted_scale(self.zoom.spec);
        self.zoom.report_factor(fitted);
        if (before - self.zoom.factor()).abs() < f64::EPSILON {
            vec![]
        } else {
            vec![self.scale_changing()]
        }
    }

    fn fitted_scale(&self, spec: ZoomSpec) -> f64 {
        let size = self
            .current_page
            .checked_sub(1)
            .and_then(|i| self.sizes.get(i as usize))
            .copied()
            .unwrap_or(LETTER);
        let (mut page_w, mut page_h) = (f64::from(size.width), f64::from(size.height));
        if matches!(self.rotation, Rotation::Deg90 | Rotation::Deg270) {
            std::mem::swap(&mut page_w, &mut page_h);
        }
        let (view_w, view_h) = self.viewport;
        let width_scale = view_w / (page_w * CSS_UNITS);
        let height_scale = view_h / (page_h * CSS_UNITS);
        match spec {
            ZoomSpec::PageActual => 1.0,
            ZoomSpec::PageWidth => width_scale,
            ZoomSpec::PageFit => width_scale.min(height_scale),
            ZoomSpec::Auto => {
                let landscape = page_w > page_h;
                let scale = if landscape {
                    width_scale.min(height_scale)
                } else {
                    width_scale
                };
                scale.min(MAX_AUTO_SCALE)
            }
            ZoomSpec::Ratio(r) => r,
        }
    }

    fn next_spread_page(&self) -> Option<u32> {
        let page = self.current_page;
        let advance = match self.spread_mode {
            SpreadMode::None => 1,
            SpreadMode::Odd if page % 2 == 1 => 2,
            SpreadMode::Even if page % 2 == 0 => 2,
            _ => 1,
        };
        let target = page + advance;
        (page > 0 && target <= self.page_count).then_some(target)
    }

    fn previous_spread_page(&self) -> Option<u32> {
        let page = self.current_page;
        if page <= 1 {
            return None;
        }
        let spread_start = match self.spread_mode {
            SpreadMode::None => page,
            SpreadMode::Odd if page % 2 == 0 => page - 1,
            SpreadMode::Even if page % 2 == 1 && page > 1 => page - 1,
            _ => page,
        };
        let target = match self.spread_mode {
            SpreadMode::None => page - 1,
            _ if spread_start <= 2 => 1,
            _ => spread_start - 2,
        };
        (target != page).then_some(target)
    }

    fn label_for(&self, page: u32) -> Option<String> {
        let labels = self.labels.as_ref()?;
        labels.get(page.checked_sub(1)? as usize).cloned()
    }

    fn page_changing(&self) -> ViewerEffect {
        ViewerEffect::PageChanging {
            page: self.current_page,
            label: self.label_for(self.current_page),
        }
    }

    fn scale_changing(&self) -> ViewerEffect {
        ViewerEffect::ScaleChanging {
            scale: self.zoom.factor(),
            preset: self.zoom.spec.is_preset().then_some(self.zoom.spec),
        }
    }

    fn view_area(&self) -> ViewerEffect {
        ViewerEffect::UpdateViewArea(self.location_snapshot())
    }

    fn location_snapshot(&self) -> ViewLocation {
        ViewLocation {
            page: self.current_page,
            zoom: self.zoom.spec,
            scroll_left: self.scroll_left,
            scroll_top: self.scroll_top,
            rotation: self.rotation,
        }
    }

    fn run(&mut self, cmd: Command) {
        let effects = self.apply(cmd);
        self.pending.extend(effects);
    }
}

impl PageViewer for ViewerModel {
    fn set_document(&mut self, page_count: u32, first_page: Option<PageSize>) {
        self.run(Command::SetDocument {
            page_count,
            first_page,
        });
    }

    fn clear_document(&mut self) {
        self.run(Command::ClearDocument);
        self.pending.clear();
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn current_page_number(&self) -> u32 {
        self.current_page
    }

    fn set_current_page_number(&mut self, page: u32) -> bool {
        if page == 0 || page > self.page_count {
            log::warn!("{page} is not a valid page number");
            return false;
        }
        self.run(Command::GoToPage(page));
        true
    }

    fn current_page_label(&self) -> Option<String> {
        self.label_for(self.current_page)
    }

    fn set_current_page_label(&mut self, label: &str) -> bool {
        let label = label.trim();
        let by_label = self
            .labels
            .as_ref()
            .and_then(|labels| labels.iter().position(|l| l == label))
            .map(|i| i as u32 + 1);
        match by_label.or_else(|| label.parse::<u32>().ok()) {
            Some(page) => self.set_current_page_number(page),
            None => {
                log::warn!("{label:?} is not a valid page label");
                false
            }
        }
    }

    fn current_scale(&self) -> Zoom {
        self.zoom
    }

    fn set_current_scale_value(&mut self, spec: ZoomSpec) {
        self.run(Command::SetScale(spec));
    }

    fn zoom_in(&mut self, ticks: u32) {
        self.run(Command::ZoomIn(ticks));
    }

    fn zoom_out(&mut self, ticks: u32) {
        self.run(Command::ZoomOut(ticks));
    }

    fn pages_rotation(&self) -> Rotation {
        self.rotation
    }

    fn set_pages_rotation(&mut self, rotation: Rotation) {
        self.run(Command::SetRotation(rotation));
    }

    fn scroll_mode(&self) -> ScrollMode {
        self.scroll_mode
    }

    fn set_scroll_mode(&mut self, mode: ScrollMode) {
        self.run(Command::SetScrollMode(mode));
    }

    fn spread_mode(&self) -> SpreadMode {
        self.spread_mode
    }

    fn set_spread_mode(&mut self, mode: SpreadMode) {
        self.run(Command::SetSpreadMode(mode));
    }

    fn scroll_page_into_view(&mut self, page: u32, zoom: Option<ZoomSpec>, left: f64, top: f64) {
        self.run(Command::ScrollTo {
            page,
            zoom,
            left,
            top,
        });
    }

    fn next_page(&mut self) -> bool {
        let before = self.current_page;
        self.run(Command::NextPage);
        before != self.current_page
    }

    fn previous_page(&mut self) -> bool {
        let before = self.current_page;
        self.run(Command::PreviousPage);
        before != self.current_page
    }

    fn set_page_labels(&mut self, labels: Option<Vec<String>>) {
        self.run(Command::SetPageLabels(labels));
    }

    fn set_page_size(&mut self, index: usize, size: PageSize) {
        self.run(Command::SetPageSize { index, size });
    }

    fn has_equal_page_sizes(&self) -> bool {
        match self.sizes.first() {
            Some(first) => self.sizes.iter().all(|s| s.approx_eq(first)),
            None => true,
        }
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.run(Command::Resize { width, height });
    }

    fn location(&self) -> ViewLocation {
        self.location_snapshot()
    }

    fn take_effects(&mut self) -> Vec<ViewerEffect> {
        std::mem::take(&mut self.pending)
    }
}
