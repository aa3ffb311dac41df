//! Error taxonomy and the user-visible error report.

use crate::l10n::Localization;

/// Failure to open a document. Aborts the open operation.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("missing PDF file: {path}")]
    Missing { path: String },

    #[error("invalid or corrupted PDF file: {detail}")]
    Invalid { detail: String },

    #[error("password required")]
    PasswordRequired,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("unsupported document source: {0}")]
    UnsupportedSource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF engine: {detail}")]
    Backend { detail: String },
}

impl LoadError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid {
            detail: detail.into(),
        }
    }

    pub fn backend(detail: impl Into<String>) -> Self {
        Self::Backend {
            detail: detail.into(),
        }
    }

    pub fn is_password(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::IncorrectPassword)
    }

    /// Localisation key and English fallback for the headline message.
    pub fn message_key(&self) -> (&'static str, &'static str) {
        match self {
            Self::Missing { .. } => ("missing_file_error", "Missing PDF file."),
            Self::Invalid { .. } => ("invalid_file_error", "Invalid or corrupted PDF file."),
            Self::UnsupportedSource(_) => {
                ("unexpected_response_error", "Unexpected server response.")
            }
            _ => ("loading_error", "An error occurred while loading the PDF."),
        }
    }
}

/// Failure reading or writing the persisted view history.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("view history I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("view history format: {0}")]
    Json(#[from] serde_json::Error),

    #[error("view history unavailable: {0}")]
    Unavailable(String),
}

/// Invalid viewer options.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("{field} must be between 0 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("invalid default zoom value {0:?}")]
    InvalidZoom(String),

    #[error("options I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("options format: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Document features the viewer cannot render faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedFeature {
    Forms,
}

impl UnsupportedFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forms => "forms",
        }
    }
}

/// Technical detail attached to an error report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoreInfo {
    pub message: String,
    pub stack: Option<String>,
    pub filename: Option<String>,
    pub line_number: Option<u32>,
}

/// Contents of the error panel: a headline plus expandable detail lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub message: String,
    pub more_info: Vec<String>,
}

impl ErrorReport {
    pub fn new(l10n: &Localization, message: impl Into<String>, more: Option<&MoreInfo>) -> Self {
        let version = env!("CARGO_PKG_VERSION");
        let build = option_env!("FOLIOVIEW_BUILD").unwrap_or("?");
        let mut more_info = vec![l10n.get(
            "error_version_info",
            &[("version", version), ("build", build)],
            "folioview v{{version}} (build: {{build}})",
        )];

        if let Some(more) = more {
            more_info.push(l10n.get(
                "error_message",
                &[("message", more.message.as_str())],
                "Message: {{message}}",
            ));
            if let Some(stack) = &more.stack {
                more_info.push(l10n.get("error_stack", &[("stack", stack.as_str())], "Stack: {{stack}}"));
            } else {
                if let Some(file) = &more.filename {
                    more_info.push(l10n.get("error_file", &[("file", file.as_str())], "File: {{file}}"));
                }
                if let Some(line) = more.line_number {
                    let line = line.to_string();
                    more_info.push(l10n.get("error_line", &[("line", line.as_str())], "Line: {{line}}"));
                }
            }
        }

        Self {
            message: message.into(),
            more_info,
        }
    }

    pub fn from_load_error(l10n: &Localization, error: &LoadError) -> Self {
        let (key, fallback) = error.message_key();
        let more = MoreInfo {
            message: error.to_string(),
            ..Default::default()
        };
        Self::new(l10n, l10n.get(key, &[], fallback), Some(&more))
    }

    pub fn to_log_string(&self) -> String {
        format!("{}\n{}", self.message, self.more_info.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_prefers_stack_over_file_and_line() {
        let l10n = Localization::default();
        let more = MoreInfo {
            message: "boom".into(),
            stack: Some("at open".into()),
            filename: Some("doc.pdf".into()),
            line_number: Some(3),
        };
        let report = ErrorReport::new(&l10n, "Failed", Some(&more));
        assert_eq!(report.more_info.len(), 3);
        assert_eq!(report.more_info[1], "Message: boom");
        assert_eq!(report.more_info[2], "Stack: at open");
    }

    #[test]
    fn report_lists_file_and_line_without_stack() {
        let l10n = Localization::default();
        let more = MoreInfo {
            message: "bad xref".into(),
            filename: Some("doc.pdf".into()),
            line_number: Some(42),
            ..Default::default()
        };
        let report = ErrorReport::new(&l10n, "Failed", Some(&more));
        assert_eq!(
            &report.more_info[1..],
            &["Message: bad xref", "File: doc.pdf", "Line: 42"]
        );
    }

    #[test]
    fn load_error_headline_is_localised() {
        let l10n = Localization::default();
        let report = ErrorReport::from_load_error(
            &l10n,
            &LoadError::Missing {
                path: "gone.pdf".into(),
            },
        );
        assert_eq!(report.message, "Missing PDF file.");
        assert!(report.to_log_string().contains("gone.pdf"));
    }
}
