use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::LoadOptions;
use crate::error::OptionsError;
use crate::view_state::{ScrollMode, SidebarView, SpreadMode, ZoomSpec};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "folioview";

/// Page renderer backend requested by the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Renderer {
    #[default]
    Canvas,
    Svg,
}

impl Renderer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Renderer::Canvas => "canvas",
            Renderer::Svg => "svg",
        }
    }
}

/// How the text layer is built on top of rendered pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayerMode {
    Disable,
    Enable,
    EnableEnhance,
}

/// Target used for external links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    None,
    SelfFrame,
    Blank,
    Parent,
    Top,
}

/// Cursor tool active after a document opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorTool {
    #[default]
    Select,
    Hand,
}

/// Rendering hints forwarded to the embedder once a document is open.
/// The shell does not render pages itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderingOptions {
    pub single_page_mode: bool,
    pub text_layer: TextLayerMode,
    pub render_interactive_forms: bool,
    pub link_target: LinkTarget,
    pub renderer: Renderer,
    pub max_canvas_pixels: u64,
    pub c_map_url: String,
    pub c_map_packed: bool,
    pub disable_font_face: bool,
    pub locale: String,
}

/// Load-time viewer options.
///
/// Built once at startup and handed out by reference; nothing mutates it
/// afterwards. Enumerations keep their numeric form so that a config file
/// written by hand can be validated with a precise error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerOptions {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub single_page_mode: bool,

    #[serde(default = "default_text_layer_mode")]
    pub text_layer_mode: u8,

    #[serde(default = "default_true")]
    pub render_interactive_forms: bool,

    #[serde(default)]
    pub disable_page_labels: bool,

    #[serde(default)]
    pub disable_page_mode: bool,

    #[serde(default)]
    pub external_link_target: u8,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub disable_stream: bool,

    #[serde(default)]
    pub disable_range: bool,

    #[serde(default)]
    pub disable_auto_fetch: bool,

    #[serde(default)]
    pub disable_font_face: bool,

    #[serde(default)]
    pub renderer: Renderer,

    #[serde(default)]
    pub cursor_tool_on_load: u8,

    #[serde(default)]
    pub sidebar_view_on_load: u8,

    /// Empty means unset
    #[serde(default)]
    pub default_zoom_value: String,

    #[serde(default = "default_true")]
    pub show_previous_view_on_load: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_mode_on_load: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread_mode_on_load: Option<u8>,

    #[serde(default = "default_max_canvas_pixels")]
    pub max_canvas_pixels: u64,

    #[serde(default = "default_c_map_url")]
    pub c_map_url: String,

    #[serde(default = "default_true")]
    pub c_map_packed: bool,

    #[serde(default)]
    pub disable_history: bool,

    #[serde(default = "default_pages_loaded_timeout_ms")]
    pub pages_loaded_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_text_layer_mode() -> u8 {
    1
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_max_canvas_pixels() -> u64 {
    16_777_216
}

fn default_c_map_url() -> String {
    "../web/cmaps/".to_string()
}

fn default_pages_loaded_timeout_ms() -> u64 {
    10_000
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            single_page_mode: false,
            text_layer_mode: default_text_layer_mode(),
            render_interactive_forms: true,
            disable_page_labels: false,
            disable_page_mode: false,
            external_link_target: 0,
            locale: default_locale(),
            disable_stream: false,
            disable_range: false,
            disable_auto_fetch: false,
            disable_font_face: false,
            renderer: Renderer::default(),
            cursor_tool_on_load: 0,
            sidebar_view_on_load: 0,
            default_zoom_value: String::new(),
            show_previous_view_on_load: true,
            scroll_mode_on_load: None,
            spread_mode_on_load: None,
            max_canvas_pixels: default_max_canvas_pixels(),
            c_map_url: default_c_map_url(),
            c_map_packed: true,
            disable_history: false,
            pages_loaded_timeout_ms: default_pages_loaded_timeout_ms(),
        }
    }
}

impl ViewerOptions {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
    }

    /// Load and validate options from a YAML file.
    pub fn load_from_path(path: &Path) -> Result<Self, OptionsError> {
        let content = fs::read_to_string(path)?;
        let mut options: Self = serde_yaml::from_str(&content)?;
        debug!("Loaded viewer options from {path:?}");
        if options.version < CURRENT_VERSION {
            options.migrate();
        }
        options.validate()?;
        Ok(options)
    }

    /// Options from `path`, or from the default location when `None`.
    ///
    /// Never fails: a missing file yields defaults (and a commented template
    /// is written at the default location), anything unreadable or invalid is
    /// logged and replaced by defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let explicit = path.is_some();
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default options");
                return Self::default();
            }
        };

        if !path.exists() {
            if explicit {
                warn!("Options file {path:?} does not exist, using defaults");
            } else {
                info!("Options file not found, creating with defaults at {path:?}");
                write_template(&Self::default(), &path);
            }
            return Self::default();
        }

        match Self::load_from_path(&path) {
            Ok(options) => options,
            Err(e) => {
                error!("Failed to load options from {path:?}: {e}");
                Self::default()
            }
        }
    }

    fn migrate(&mut self) {
        info!(
            "Migrating viewer options from v{} to v{}",
            self.version, CURRENT_VERSION
        );
        self.version = CURRENT_VERSION;
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        check_range("text_layer_mode", self.text_layer_mode, 2)?;
        check_range("external_link_target", self.external_link_target, 4)?;
        check_range("cursor_tool_on_load", self.cursor_tool_on_load, 1)?;
        check_range("sidebar_view_on_load", self.sidebar_view_on_load, 3)?;
        if let Some(mode) = self.scroll_mode_on_load {
            check_range("scroll_mode_on_load", mode, 2)?;
        }
        if let Some(mode) = self.spread_mode_on_load {
            check_range("spread_mode_on_load", mode, 2)?;
        }
        if !self.default_zoom_value.trim().is_empty()
            && ZoomSpec::parse(&self.default_zoom_value).is_none()
        {
            return Err(OptionsError::InvalidZoom(self.default_zoom_value.clone()));
        }
        Ok(())
    }

    /// `None` when no default zoom is configured.
    pub fn default_zoom(&self) -> Option<ZoomSpec> {
        ZoomSpec::parse(&self.default_zoom_value)
    }

    /// Sidebar view forced on load. `None` when the option is zero.
    pub fn sidebar_view_override(&self) -> Option<SidebarView> {
        match SidebarView::from_index(i64::from(self.sidebar_view_on_load)) {
            Some(SidebarView::None) | None => None,
            view => view,
        }
    }

    pub fn scroll_mode_override(&self) -> Option<ScrollMode> {
        self.scroll_mode_on_load
            .and_then(|m| ScrollMode::from_index(i64::from(m)))
    }

    pub fn spread_mode_override(&self) -> Option<SpreadMode> {
        self.spread_mode_on_load
            .and_then(|m| SpreadMode::from_index(i64::from(m)))
    }

    pub fn text_layer(&self) -> TextLayerMode {
        match self.text_layer_mode {
            0 => TextLayerMode::Disable,
            2 => TextLayerMode::EnableEnhance,
            _ => TextLayerMode::Enable,
        }
    }

    pub fn link_target(&self) -> LinkTarget {
        match self.external_link_target {
            1 => LinkTarget::SelfFrame,
            2 => LinkTarget::Blank,
            3 => LinkTarget::Parent,
            4 => LinkTarget::Top,
            _ => LinkTarget::None,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            disable_stream: self.disable_stream,
            disable_range: self.disable_range,
            disable_auto_fetch: self.disable_auto_fetch,
        }
    }

    pub fn rendering_options(&self) -> RenderingOptions {
        RenderingOptions {
            single_page_mode: self.single_page_mode,
            text_layer: self.text_layer(),
            render_interactive_forms: self.render_interactive_forms,
            link_target: self.link_target(),
            renderer: self.renderer,
            max_canvas_pixels: self.max_canvas_pixels,
            c_map_url: self.c_map_url.clone(),
            c_map_packed: self.c_map_packed,
            disable_font_face: self.disable_font_face,
            locale: self.locale.clone(),
        }
    }

    pub fn cursor_tool(&self) -> CursorTool {
        if self.cursor_tool_on_load == 1 {
            CursorTool::Hand
        } else {
            CursorTool::Select
        }
    }
}

fn check_range(field: &'static str, value: u8, max: u8) -> Result<(), OptionsError> {
    if value > max {
        return Err(OptionsError::OutOfRange {
            field,
            value: i64::from(value),
            max: i64::from(max),
        });
    }
    Ok(())
}

fn write_template(options: &ViewerOptions, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match fs::write(path, generate_options_yaml(options)) {
        Ok(()) => debug!("Saved options template to {path:?}"),
        Err(e) => error!("Failed to save options to {path:?}: {e}"),
    }
}

fn generate_options_yaml(options: &ViewerOptions) -> String {
    let mut content = String::new();

    content.push_str(OPTIONS_HEADER);
    content.push_str(&format!("version: {}\n", options.version));
    content.push_str(&format!(
        "show_previous_view_on_load: {}\n",
        options.show_previous_view_on_load
    ));
    content.push_str(&format!(
        "default_zoom_value: \"{}\"\n",
        options.default_zoom_value
    ));
    content.push_str(&format!(
        "sidebar_view_on_load: {}\n",
        options.sidebar_view_on_load
    ));
    content.push_str("# scroll_mode_on_load: 0\n");
    content.push_str("# spread_mode_on_load: 0\n");
    content.push_str(&format!("disable_page_mode: {}\n", options.disable_page_mode));
    content.push_str(&format!(
        "disable_page_labels: {}\n",
        options.disable_page_labels
    ));
    content.push_str(&format!("disable_history: {}\n", options.disable_history));
    content.push_str(&format!("text_layer_mode: {}\n", options.text_layer_mode));
    content.push_str(&format!(
        "cursor_tool_on_load: {}\n",
        options.cursor_tool_on_load
    ));
    content.push_str(&format!("locale: \"{}\"\n", options.locale));
    content.push_str(&format!("renderer: {}\n", options.renderer.as_str()));
    content.push_str(&format!(
        "pages_loaded_timeout_ms: {}\n",
        options.pages_loaded_timeout_ms
    ));

    content
}

const OPTIONS_HEADER: &str = r#"# ============================================================================
# folioview options
# ============================================================================
# sidebar_view_on_load: 0 = keep, 1 = thumbnails, 2 = outline, 3 = attachments
# scroll_mode_on_load:  0 = vertical, 1 = horizontal, 2 = wrapped
# spread_mode_on_load:  0 = none, 1 = odd, 2 = even
# default_zoom_value:   auto | page-actual | page-fit | page-width | percent
#
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let options = ViewerOptions::default();
        assert!(options.show_previous_view_on_load);
        assert_eq!(options.text_layer_mode, 1);
        assert_eq!(options.max_canvas_pixels, 16_777_216);
        assert_eq!(options.pages_loaded_timeout_ms, 10_000);
        assert_eq!(options.default_zoom(), None);
        assert_eq!(options.sidebar_view_override(), None);
        assert_eq!(options.scroll_mode_override(), None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_zoom_value: page-fit\nscroll_mode_on_load: 2").unwrap();

        let options = ViewerOptions::load_from_path(file.path()).unwrap();
        assert_eq!(options.default_zoom(), Some(ZoomSpec::PageFit));
        assert_eq!(options.scroll_mode_override(), Some(ScrollMode::Wrapped));
        assert_eq!(options.spread_mode_override(), None);
        assert_eq!(options.locale, "en");
    }

    #[test]
    fn out_of_range_enumeration_is_rejected() {
        let options = ViewerOptions {
            sidebar_view_on_load: 7,
            ..Default::default()
        };
        match options.validate() {
            Err(OptionsError::OutOfRange { field, value, max }) => {
                assert_eq!(field, "sidebar_view_on_load");
                assert_eq!(value, 7);
                assert_eq!(max, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bad_default_zoom_is_rejected() {
        let options = ViewerOptions {
            default_zoom_value: "enormous".into(),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(OptionsError::InvalidZoom(_))
        ));
    }

    #[test]
    fn numeric_options_map_to_rendering_hints() {
        let options = ViewerOptions {
            text_layer_mode: 2,
            external_link_target: 2,
            renderer: Renderer::Svg,
            disable_font_face: true,
            disable_range: true,
            ..Default::default()
        };

        let hints = options.rendering_options();
        assert_eq!(hints.text_layer, TextLayerMode::EnableEnhance);
        assert_eq!(hints.link_target, LinkTarget::Blank);
        assert_eq!(hints.renderer, Renderer::Svg);
        assert!(hints.disable_font_face);
        assert_eq!(hints.c_map_url, "../web/cmaps/");

        let load = options.load_options();
        assert!(load.disable_range);
        assert!(!load.disable_stream);
        assert!(!load.disable_auto_fetch);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "text_layer_mode: 9").unwrap();
        let options = ViewerOptions::load_or_default(Some(file.path()));
        assert_eq!(options.text_layer_mode, 1);
    }

    #[test]
    fn generated_template_parses_back() {
        let yaml = generate_options_yaml(&ViewerOptions::default());
        let parsed: ViewerOptions = serde_yaml::from_str(&yaml).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.renderer, Renderer::Canvas);
    }

    #[test]
    fn missing_explicit_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let options = ViewerOptions::load_or_default(Some(&path));
        assert!(options.show_previous_view_on_load);
        assert!(!path.exists());
    }
}
