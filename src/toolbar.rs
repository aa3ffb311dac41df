use crate::l10n::Localization;
use crate::view_state::ZoomSpec;
use crate::zoom::Zoom;

/// Toolbar display state: page indicator and zoom selector.
#[derive(Debug, Clone)]
pub struct Toolbar {
    page_number: u32,
    page_label: Option<String>,
    pages_count: u32,
    has_page_labels: bool,
    zoom: Zoom,
}

impl Default for Toolbar {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolbar {
    pub fn new() -> Self {
        Self {
            page_number: 1,
            page_label: None,
            pages_count: 0,
            has_page_labels: false,
            zoom: Zoom::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn set_page_number(&mut self, page: u32, label: Option<String>) {
        self.page_number = page;
        self.page_label = label;
    }

    pub fn set_pages_count(&mut self, count: u32, has_page_labels: bool) {
        self.pages_count = count;
        self.has_page_labels = has_page_labels;
    }

    pub fn set_zoom(&mut self, zoom: Zoom) {
        self.zoom = zoom;
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn pages_count(&self) -> u32 {
        self.pages_count
    }

    /// Contents of the page input: the label when labels are in use
    pub fn page_input(&self) -> String {
        match (&self.page_label, self.has_page_labels) {
            (Some(label), true) => label.clone(),
            _ => self.page_number.to_string(),
        }
    }

    /// Text next to the page input
    pub fn pages_count_text(&self, l10n: &Localization) -> String {
        let count = self.pages_count.to_string();
        if self.has_page_labels {
            let number = self.page_number.to_string();
            l10n.get(
                "page_of_pages",
                &[("pageNumber", number.as_str()), ("pagesCount", count.as_str())],
                "({{pageNumber}} of {{pagesCount}})",
            )
        } else {
            l10n.get("of_pages", &[("pagesCount", count.as_str())], "of {{pagesCount}}")
        }
    }

    /// Selected entry of the zoom selector
    pub fn scale_text(&self, l10n: &Localization) -> String {
        match self.zoom.spec {
            ZoomSpec::Auto => l10n.get("page_scale_auto", &[], "Automatic Zoom"),
            ZoomSpec::PageActual => l10n.get("page_scale_actual", &[], "Actual Size"),
            ZoomSpec::PageFit => l10n.get("page_scale_fit", &[], "Page Fit"),
            ZoomSpec::PageWidth => l10n.get("page_scale_width", &[], "Page Width"),
            ZoomSpec::Ratio(r) => {
                let percent = ((r * 10000.0).round() / 100.0).to_string();
                l10n.get(
                    "page_scale_percent",
                    &[("scale", percent.as_str())],
                    "{{scale}}%",
                )
            }
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.page_number < self.pages_count
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom.can_zoom_in()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom.can_zoom_out()
    }
}
