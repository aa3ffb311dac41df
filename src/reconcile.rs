//! Initial view reconciliation
//!
//! Merges the URL bookmark, the persisted view of the document and the
//! load-time options into one [`ViewDirective`], and applies it to the
//! viewer once per document load.
//!
//! Precedence, per field:
//!
//! | field          | 1st                | 2nd                         | 3rd                     | fallback |
//! |----------------|--------------------|-----------------------------|-------------------------|----------|
//! | page           | bookmark           | persisted (show previous)   |                         | none     |
//! | zoom           | bookmark           | persisted (show previous)   | `default_zoom_value`    | auto     |
//! | rotation       | bookmark           | persisted (show previous)   |                         | 0        |
//! | sidebar        | `sidebar_view_on_load` | persisted (show previous) | page-mode hint        | none     |
//! | scroll/spread  | `*_on_load` option | persisted                   |                         | vertical / none |
//!
//! Invalid values at any level are discarded and the next level is used.

use crate::fragment::Fragment;
use crate::settings::ViewerOptions;
use crate::sidebar::Sidebar;
use crate::view_history::ViewStore;
use crate::view_state::{
    DirectiveSource, PageModeHint, PersistedView, Rotation, ScrollMode, SidebarView, SpreadMode,
    ViewDirective, ZoomSpec,
};
use crate::viewer::PageViewer;

/// Everything the reconciler looks at
pub struct ReconcileInputs<'a> {
    pub options: &'a ViewerOptions,
    pub stored: Option<&'a PersistedView>,
    pub bookmark: Option<&'a Fragment>,
    pub page_mode: &'a PageModeHint,
    pub page_count: u32,
    /// Named destination lookup, 1-based page
    pub resolve_destination: &'a dyn Fn(&str) -> Option<u32>,
}

/// Per-document bootstrap progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialViewPhase {
    #[default]
    NotInitialized,
    Reconciling,
    InitialViewApplied,
}

impl InitialViewPhase {
    /// Enter `Reconciling`. Only valid from `NotInitialized`.
    pub fn begin(&mut self) -> bool {
        if *self != Self::NotInitialized {
            log::warn!("Initial view requested twice ({self:?})");
            return false;
        }
        *self = Self::Reconciling;
        true
    }

    pub fn complete(&mut self) {
        if *self == Self::Reconciling {
            *self = Self::InitialViewApplied;
        }
    }

    pub fn is_applied(self) -> bool {
        self == Self::InitialViewApplied
    }
}

/// Read the persisted view, treating any store failure as "no state".
pub fn load_persisted(store: &dyn ViewStore, fingerprint: &str) -> Option<PersistedView> {
    match store.read(fingerprint) {
        Ok(view) => view,
        Err(e) => {
            log::warn!("Ignoring persisted view for {fingerprint}: {e}");
            None
        }
    }
}

/// Resolve the initial view. Pure: the same inputs always give the same
/// directive.
pub fn reconcile(inputs: &ReconcileInputs<'_>) -> ViewDirective {
    let options = inputs.options;
    let previous = inputs
        .stored
        .filter(|_| options.show_previous_view_on_load);
    let bookmark = inputs.bookmark.filter(|b| b.is_navigation());

    let clamp = |page: u32| -> Option<u32> {
        (inputs.page_count > 0).then(|| page.clamp(1, inputs.page_count))
    };

    // Page
    let bookmark_page = bookmark.and_then(|b| {
        b.page.or_else(|| {
            b.named_dest.as_deref().and_then(|name| {
                let page = (inputs.resolve_destination)(name);
                if page.is_none() {
                    log::warn!("Unknown named destination {name:?}");
                }
                page
            })
        })
    });
    let previous_page = previous.and_then(PersistedView::valid_page);
    let (page, page_from_previous) = match (bookmark_page, previous_page) {
        (Some(page), _) => (clamp(page), false),
        (None, Some(page)) => (clamp(page), true),
        (None, None) => (None, false),
    };

    // Zoom
    let bookmark_zoom = bookmark.and_then(|b| b.zoom);
    let previous_zoom = previous.and_then(PersistedView::valid_zoom);
    let zoom = bookmark_zoom
        .map(|z| z.spec)
        .or(previous_zoom)
        .or_else(|| options.default_zoom())
        .unwrap_or(ZoomSpec::Auto);

    // Offsets travel with whoever supplied the position
    let (scroll_left, scroll_top) = match (bookmark_zoom, previous) {
        (Some(z), _) => (z.left.unwrap_or(0.0), z.top.unwrap_or(0.0)),
        (None, Some(view)) if page_from_previous => (
            view.scroll_left.filter(|v| v.is_finite()).unwrap_or(0.0),
            view.scroll_top.filter(|v| v.is_finite()).unwrap_or(0.0),
        ),
        _ => (0.0, 0.0),
    };

    // Rotation
    let bookmark_rotation = bookmark
        .and_then(|b| b.rotation)
        .and_then(|r| {
            let rotation = Rotation::from_degrees(r);
            if rotation.is_none() {
                log::warn!("Discarding invalid bookmark rotation {r}");
            }
            rotation
        });
    let rotation = bookmark_rotation
        .or_else(|| previous.and_then(PersistedView::valid_rotation))
        .unwrap_or_default();

    let sidebar_view = options
        .sidebar_view_override()
        .or_else(|| previous.and_then(PersistedView::valid_sidebar_view))
        .unwrap_or_else(|| {
            if options.disable_page_mode {
                SidebarView::None
            } else {
                inputs.page_mode.to_sidebar_view()
            }
        });

    let scroll_mode = options
        .scroll_mode_override()
        .or_else(|| inputs.stored.and_then(PersistedView::valid_scroll_mode))
        .unwrap_or(ScrollMode::Vertical);
    let spread_mode = options
        .spread_mode_override()
        .or_else(|| inputs.stored.and_then(PersistedView::valid_spread_mode))
        .unwrap_or(SpreadMode::None);

    let source = if bookmark_page.is_some() || bookmark_zoom.is_some() || bookmark_rotation.is_some()
    {
        DirectiveSource::Bookmark
    } else if page_from_previous || previous_zoom.is_some() {
        DirectiveSource::PreviousView
    } else {
        DirectiveSource::Defaults
    };

    ViewDirective {
        page,
        named_dest: bookmark.and_then(|b| b.named_dest.clone()),
        zoom,
        scroll_left,
        scroll_top,
        rotation,
        sidebar_view,
        scroll_mode,
        spread_mode,
        source,
    }
}

/// Apply a directive: layout modes and rotation first, then position.
///
/// Returns the sidebar view when it changed. Applying the same directive
/// again leaves the viewer unchanged.
pub fn apply_directive(
    directive: &ViewDirective,
    viewer: &mut dyn PageViewer,
    sidebar: &mut Sidebar,
) -> Option<SidebarView> {
    let sidebar_change = sidebar.set_initial_view(directive.sidebar_view);
    viewer.set_scroll_mode(directive.scroll_mode);
    viewer.set_spread_mode(directive.spread_mode);
    viewer.set_pages_rotation(directive.rotation);
    apply_position(directive, viewer);
    sidebar_change
}

/// Page, zoom and scroll offsets of a directive
pub fn apply_position(directive: &ViewDirective, viewer: &mut dyn PageViewer) {
    match directive.page {
        Some(page) => viewer.scroll_page_into_view(
            page,
            Some(directive.zoom),
            directive.scroll_left,
            directive.scroll_top,
        ),
        None => viewer.set_current_scale_value(directive.zoom),
    }
}

/// Whether the position must be re-applied once all page sizes are known.
pub fn needs_corrective_pass(directive: &ViewDirective, viewer: &dyn PageViewer) -> bool {
    directive.source != DirectiveSource::Defaults && !viewer.has_equal_page_sizes()
}
