use anyhow::{Context, Result, bail};
use std::io::BufRead;

use crate::events::{NamedAction, ViewerEvent};
use crate::find::FindCommand;
use crate::view_state::{ScrollMode, SidebarView, SpreadMode};

/// Source of textual viewer commands
pub trait CommandSource {
    /// Next line, `None` at end of input
    fn next_line(&mut self) -> Result<Option<String>>;
}

/// Reads commands from standard input, one per line
pub struct StdinCommandSource {
    stdin: std::io::Stdin,
}

impl Default for StdinCommandSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinCommandSource {
    pub fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
        }
    }
}

impl CommandSource for StdinCommandSource {
    fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .stdin
            .lock()
            .read_line(&mut line)
            .context("reading command from stdin")?;
        Ok((read > 0).then_some(line))
    }
}

/// Fixed list of commands, for scripts and tests
pub struct ScriptedCommandSource {
    lines: Vec<String>,
    current_index: usize,
}

impl ScriptedCommandSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            current_index: 0,
        }
    }
}

impl CommandSource for ScriptedCommandSource {
    fn next_line(&mut self) -> Result<Option<String>> {
        let line = self.lines.get(self.current_index).cloned();
        if line.is_some() {
            self.current_index += 1;
        }
        Ok(line)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Event(ViewerEvent),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  next | prev | first | last       page navigation
  page <N|LABEL>                   go to page
  zoom-in [N] | zoom-out [N]       zoom by N steps
  scale <VALUE>                    auto, page-fit, page-width, page-actual or percent
  rotate-cw | rotate-ccw           rotate pages
  scroll <vertical|horizontal|wrapped>
  spread <none|odd|even>
  sidebar <none|thumbs|outline|attachments>
  find <TEXT>                      search
  hash <FRAGMENT>                  follow a bookmark, e.g. page=3&zoom=150
  props                            document properties
  back | forward                   navigation history
  resize <W> <H>                   viewport size in pixels
  status                           current view
  quit";

/// Parse one command line. Blank lines and `#` comments give `None`.
pub fn parse_command(line: &str) -> Result<Option<CliCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let event = match name {
        "quit" | "q" | "exit" => return Ok(Some(CliCommand::Quit)),
        "help" | "?" => return Ok(Some(CliCommand::Help)),
        "status" => return Ok(Some(CliCommand::Status)),
        "next" | "n" => ViewerEvent::NextPage,
        "prev" | "p" => ViewerEvent::PreviousPage,
        "first" => ViewerEvent::FirstPage,
        "last" => ViewerEvent::LastPage,
        "page" | "goto" => {
            if arg.is_empty() {
                bail!("page needs a number or label");
            }
            ViewerEvent::PageNumberChanged(arg.to_string())
        }
        "zoom-in" | "+" => ViewerEvent::ZoomIn {
            ticks: parse_ticks(arg)?,
        },
        "zoom-out" | "-" => ViewerEvent::ZoomOut {
            ticks: parse_ticks(arg)?,
        },
        "scale" => {
            if arg.is_empty() {
                bail!("scale needs a value");
            }
            ViewerEvent::ScaleChanged(arg.to_string())
        }
        "rotate-cw" => ViewerEvent::RotateCw,
        "rotate-ccw" => ViewerEvent::RotateCcw,
        "scroll" => ViewerEvent::SwitchScrollMode(
            ScrollMode::from_name(arg).with_context(|| format!("unknown scroll mode {arg:?}"))?,
        ),
        "spread" => ViewerEvent::SwitchSpreadMode(
            SpreadMode::from_name(arg).with_context(|| format!("unknown spread mode {arg:?}"))?,
        ),
        "sidebar" => ViewerEvent::PageMode(
            SidebarView::from_page_mode_param(arg)
                .with_context(|| format!("unknown sidebar view {arg:?}"))?,
        ),
        "find" => ViewerEvent::Find(FindCommand::new(arg)),
        "hash" => ViewerEvent::HashChange(arg.to_string()),
        "props" | "properties" => ViewerEvent::DocumentProperties,
        "back" => ViewerEvent::NamedAction(NamedAction::GoBack),
        "forward" => ViewerEvent::NamedAction(NamedAction::GoForward),
        "resize" => {
            let mut parts = arg.split_whitespace().map(str::parse::<f64>);
            match (parts.next(), parts.next()) {
                (Some(Ok(width)), Some(Ok(height))) => ViewerEvent::Resize { width, height },
                _ => bail!("resize needs a width and a height"),
            }
        }
        other => bail!("unknown command {other:?}, try help"),
    };
    Ok(Some(CliCommand::Event(event)))
}

fn parse_ticks(arg: &str) -> Result<u32> {
    if arg.is_empty() {
        return Ok(1);
    }
    arg.parse()
        .with_context(|| format!("invalid step count {arg:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_yields_lines_then_none() {
        let mut source = ScriptedCommandSource::new(["next", "quit"]);
        assert_eq!(source.next_line().unwrap().as_deref(), Some("next"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("quit"));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(
            parse_command("page iv").unwrap(),
            Some(CliCommand::Event(ViewerEvent::PageNumberChanged("iv".into())))
        );
        assert_eq!(
            parse_command("zoom-in 3").unwrap(),
            Some(CliCommand::Event(ViewerEvent::ZoomIn { ticks: 3 }))
        );
        assert_eq!(
            parse_command("scroll wrapped").unwrap(),
            Some(CliCommand::Event(ViewerEvent::SwitchScrollMode(
                ScrollMode::Wrapped
            )))
        );
        assert_eq!(
            parse_command("hash #page=2").unwrap(),
            Some(CliCommand::Event(ViewerEvent::HashChange("#page=2".into())))
        );
        assert_eq!(parse_command("quit").unwrap(), Some(CliCommand::Quit));
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# setup").unwrap(), None);
    }

    #[test]
    fn bad_commands_are_errors() {
        assert!(parse_command("fly").is_err());
        assert!(parse_command("page").is_err());
        assert!(parse_command("zoom-in many").is_err());
        assert!(parse_command("spread sideways").is_err());
    }
}
