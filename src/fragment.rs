//! URL fragment ("bookmark") parsing and the current-view anchor.
//!
//! Accepted form: `#page=3&zoom=150,10,720&pagemode=thumbs&search=term`.
//! A fragment without any `=` is a named destination, or a page number if
//! it is all digits.

use crate::view_state::{SidebarView, ViewLocation, ZoomSpec};

/// Zoom part of a fragment, with optional scroll offsets in page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentZoom {
    pub spec: ZoomSpec,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub page: Option<u32>,
    pub zoom: Option<FragmentZoom>,
    pub named_dest: Option<String>,
    pub page_mode: Option<SidebarView>,
    pub search: Option<String>,
    pub phrase: bool,
    /// Raw rotation; validated by the reconciler
    pub rotation: Option<i64>,
}

impl Fragment {
    /// Parse a fragment. Malformed parameters are dropped, never errors.
    pub fn parse(hash: &str) -> Self {
        let hash = hash.strip_prefix('#').unwrap_or(hash).trim();
        let mut fragment = Self::default();
        if hash.is_empty() {
            return fragment;
        }

        if !hash.contains('=') {
            let decoded = percent_decode(hash);
            if !decoded.is_empty() && decoded.bytes().all(|b| b.is_ascii_digit()) {
                fragment.page = decoded.parse().ok().filter(|p| *p > 0);
            } else if !decoded.is_empty() {
                fragment.named_dest = Some(decoded);
            }
            return fragment;
        }

        for pair in hash.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = percent_decode(value);
            match key.to_ascii_lowercase().as_str() {
                "page" => {
                    fragment.page = value.trim().parse().ok().filter(|p| *p > 0);
                }
                "zoom" => fragment.zoom = parse_zoom(&value),
                "nameddest" => {
                    if !value.is_empty() {
                        fragment.named_dest = Some(value);
                    }
                }
                "pagemode" => fragment.page_mode = SidebarView::from_page_mode_param(&value),
                "search" => {
                    if !value.is_empty() {
                        fragment.search = Some(value);
                    }
                }
                "phrase" => fragment.phrase = value == "true",
                "rotation" => fragment.rotation = value.trim().parse().ok(),
                other => log::debug!("Ignoring unknown fragment parameter {other:?}"),
            }
        }
        fragment
    }

    /// True when the fragment moves the view (page, zoom or destination).
    pub fn is_navigation(&self) -> bool {
        self.page.is_some() || self.zoom.is_some() || self.named_dest.is_some()
    }
}

fn parse_zoom(value: &str) -> Option<FragmentZoom> {
    let mut args = value.split(',').map(str::trim);
    let name = args.next()?;
    let spec = ZoomSpec::parse(name)?;
    let rest: Vec<Option<f64>> = args.map(|a| a.parse::<f64>().ok()).collect();
    let (left, top) = match name {
        // FitH / FitBH carry only a top offset
        "FitH" | "FitBH" => (None, rest.first().copied().flatten()),
        "Fit" | "FitB" => (None, None),
        _ => (
            rest.first().copied().flatten(),
            rest.get(1).copied().flatten(),
        ),
    };
    Some(FragmentZoom { spec, left, top })
}

/// Anchor for the "current view" link: `#page=N&zoom=Z,L,T`.
pub fn view_bookmark_href(location: &ViewLocation) -> String {
    let mut href = format!(
        "#page={}&zoom={},{},{}",
        location.page,
        location.zoom,
        location.scroll_left.round() as i64,
        location.scroll_top.round() as i64
    );
    if location.rotation.degrees() != 0 {
        href.push_str(&format!("&rotation={}", location.rotation));
    }
    href
}

/// Decode `%XX` escapes. Invalid escapes are kept verbatim.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
