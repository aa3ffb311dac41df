//! Localised UI strings with `{{name}}` interpolation.

use std::collections::HashMap;

const RTL_LANGUAGES: &[&str] = &["ar", "ckb", "fa", "he", "ps", "sd", "ug", "ur", "yi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Localization {
    locale: String,
    strings: HashMap<&'static str, &'static str>,
}

impl Localization {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            strings: ENGLISH.iter().copied().collect(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn direction(&self) -> TextDirection {
        let primary = self
            .locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if RTL_LANGUAGES.contains(&primary.as_str()) {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }

    /// Look up `key`, falling back to `fallback` when the key is unknown,
    /// then substitute `{{name}}` placeholders from `args`.
    pub fn get(&self, key: &str, args: &[(&str, &str)], fallback: &str) -> String {
        let template = self.strings.get(key).copied().unwrap_or(fallback);
        interpolate(template, args)
    }
}

impl Default for Localization {
    fn default() -> Self {
        Self::new("en-US")
    }
}

/// Unknown placeholders are left in place.
fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match args.iter().find(|(k, _)| *k == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

const ENGLISH: &[(&str, &str)] = &[
    ("of_pages", "of {{pagesCount}}"),
    ("page_of_pages", "({{pageNumber}} of {{pagesCount}})"),
    ("page_scale_auto", "Automatic Zoom"),
    ("page_scale_actual", "Actual Size"),
    ("page_scale_fit", "Page Fit"),
    ("page_scale_width", "Page Width"),
    ("page_scale_percent", "{{scale}}%"),
    ("error_version_info", "folioview v{{version}} (build: {{build}})"),
    ("error_message", "Message: {{message}}"),
    ("error_stack", "Stack: {{stack}}"),
    ("error_file", "File: {{file}}"),
    ("error_line", "Line: {{line}}"),
    ("loading_error", "An error occurred while loading the PDF."),
    ("invalid_file_error", "Invalid or corrupted PDF file."),
    ("missing_file_error", "Missing PDF file."),
    ("unexpected_response_error", "Unexpected server response."),
    ("password_label", "Enter the password to open this PDF file."),
    ("password_invalid", "Invalid password. Please try again."),
    (
        "unsupported_feature",
        "This PDF document might not be displayed correctly.",
    ),
    ("document_properties_portrait", "portrait"),
    ("document_properties_landscape", "landscape"),
    (
        "document_properties_page_size_dimension_name",
        "{{width}} × {{height}} {{unit}} ({{name}}, {{orientation}})",
    ),
    (
        "document_properties_page_size_dimension",
        "{{width}} × {{height}} {{unit}} ({{orientation}})",
    ),
    ("document_properties_linearized_yes", "Yes"),
    ("document_properties_linearized_no", "No"),
    ("invalid_page", "{{page}} is not a valid page."),
];
