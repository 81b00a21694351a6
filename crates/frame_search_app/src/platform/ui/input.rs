use std::path::PathBuf;

use frame_search_core::Msg;
use thiserror::Error;

/// One line typed into the interactive shell.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Empty,
    Help,
    Status,
    Quit,
    Dispatch(Vec<Msg>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}` (type `help` for a list)")]
    UnknownCommand(String),
    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
}

pub fn parse_command(line: &str) -> Result<ShellCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, unquote(rest.trim())),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => ShellCommand::Help,
        "status" => ShellCommand::Status,
        "quit" | "exit" => ShellCommand::Quit,
        "pick" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "pick",
                    what: "a video path",
                });
            }
            ShellCommand::Dispatch(vec![Msg::MediaPicked(PathBuf::from(rest))])
        }
        // Title and query may be set to blank; the upload and search
        // actions report the missing input.
        "title" => ShellCommand::Dispatch(vec![Msg::TitleChanged(rest.to_string())]),
        "upload" => ShellCommand::Dispatch(vec![Msg::UploadClicked]),
        "query" => ShellCommand::Dispatch(vec![Msg::QueryChanged(rest.to_string())]),
        "search" if rest.is_empty() => ShellCommand::Dispatch(vec![Msg::SearchClicked]),
        "search" => ShellCommand::Dispatch(vec![
            Msg::QueryChanged(rest.to_string()),
            Msg::SearchClicked,
        ]),
        "save" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "save",
                    what: "a target directory",
                });
            }
            ShellCommand::Dispatch(vec![Msg::SaveFramesClicked {
                dir: PathBuf::from(rest),
            }])
        }
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

/// Strips one pair of matching surrounding quotes.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

pub const HELP_TEXT: &str = "\
Commands:
  pick <path>      choose a video (checked against the 3 minute limit)
  title <text>     set the upload title
  upload           upload the chosen video with its title
  query <text>     set the search query
  search [text]    search frames (optionally setting the query first)
  save <dir>       download the images of the current results into <dir>
  status           redraw the whole screen
  help             show this list
  quit             leave (also on end of input)";
