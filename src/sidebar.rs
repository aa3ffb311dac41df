use crate::view_state::SidebarView;

/// Sidebar panel state.
///
/// Methods that can change what is visible return the new visible view when
/// it changed, so the caller can announce it.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    is_open: bool,
    /// Panel shown when open. Never `SidebarView::None`.
    active: Option<SidebarView>,
    /// `None` until the outline has been loaded
    outline_count: Option<usize>,
    attachments_count: Option<usize>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// What the user sees: `SidebarView::None` when closed
    pub fn visible_view(&self) -> SidebarView {
        match (self.is_open, self.active) {
            (true, Some(view)) => view,
            _ => SidebarView::None,
        }
    }

    pub fn is_thumbnail_view_visible(&self) -> bool {
        self.visible_view() == SidebarView::Thumbs
    }

    pub fn set_initial_view(&mut self, view: SidebarView) -> Option<SidebarView> {
        if view == SidebarView::None {
            return self.close();
        }
        self.switch_view(view, true)
    }

    pub fn switch_view(&mut self, view: SidebarView, force_open: bool) -> Option<SidebarView> {
        if view == SidebarView::None {
            return self.close();
        }
        let before = self.visible_view();
        let view = self.available(view);
        self.active = Some(view);
        if force_open {
            self.is_open = true;
        }
        self.changed(before)
    }

    pub fn toggle(&mut self) -> Option<SidebarView> {
        let before = self.visible_view();
        if self.is_open {
            self.is_open = false;
        } else {
            self.is_open = true;
            let view = self.available(self.active.unwrap_or(SidebarView::Thumbs));
            self.active = Some(view);
        }
        self.changed(before)
    }

    pub fn close(&mut self) -> Option<SidebarView> {
        let before = self.visible_view();
        self.is_open = false;
        self.changed(before)
    }

    pub fn set_outline_count(&mut self, count: usize) -> Option<SidebarView> {
        self.outline_count = Some(count);
        self.fall_back_from(SidebarView::Outline, count)
    }

    pub fn set_attachments_count(&mut self, count: usize) -> Option<SidebarView> {
        self.attachments_count = Some(count);
        self.fall_back_from(SidebarView::Attachments, count)
    }

    pub fn outline_count(&self) -> Option<usize> {
        self.outline_count
    }

    pub fn attachments_count(&self) -> Option<usize> {
        self.attachments_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn fall_back_from(&mut self, view: SidebarView, count: usize) -> Option<SidebarView> {
        if count > 0 || self.active != Some(view) {
            return None;
        }
        let before = self.visible_view();
        self.active = Some(SidebarView::Thumbs);
        self.changed(before)
    }

    /// Outline and attachments are only offered once known to be non-empty
    /// (or while still unknown).
    fn available(&self, view: SidebarView) -> SidebarView {
        let empty = match view {
            SidebarView::Outline => self.outline_count == Some(0),
            SidebarView::Attachments => self.attachments_count == Some(0),
            _ => false,
        };
        if empty { SidebarView::Thumbs } else { view }
    }

    fn changed(&self, before: SidebarView) -> Option<SidebarView> {
        let after = self.visible_view();
        (after != before).then_some(after)
    }
}
