//! Find bar state. Matching itself belongs to the rendering engine; the
//! shell only tracks the current query and forwards commands.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindKind {
    #[default]
    Find,
    Again,
    HighlightAllChange,
    CaseSensitivityChange,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindCommand {
    pub kind: FindKind,
    pub query: String,
    pub phrase_search: bool,
    pub case_sensitive: bool,
    pub highlight_all: bool,
    pub find_previous: bool,
}

impl FindCommand {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Search requested through the `search=` fragment parameter
    pub fn from_url_hash(query: impl Into<String>, phrase_search: bool) -> Self {
        Self {
            kind: FindKind::Find,
            query: query.into(),
            phrase_search,
            case_sensitive: false,
            highlight_all: true,
            find_previous: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindState {
    pub bar_open: bool,
    pub last: Option<FindCommand>,
}

impl FindState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command. Returns the command to forward, `None` when an
    /// empty query makes it a no-op.
    pub fn execute(&mut self, command: FindCommand) -> Option<FindCommand> {
        if command.query.trim().is_empty() {
            return None;
        }
        let command = match (command.kind, &self.last) {
            // "again" reuses the options of the previous search
            (FindKind::Again, Some(previous)) if previous.query == command.query => FindCommand {
                kind: FindKind::Again,
                find_previous: command.find_previous,
                ..previous.clone()
            },
            _ => command,
        };
        self.last = Some(command.clone());
        Some(command)
    }

    pub fn open_bar(&mut self) {
        self.bar_open = true;
    }

    pub fn close_bar(&mut self) {
        self.bar_open = false;
    }

    pub fn query(&self) -> Option<&str> {
        self.last.as_ref().map(|c| c.query.as_str())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
