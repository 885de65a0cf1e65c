//! Parsing of the interactive command language.

use geocoin_core::{Cell, MoveDirection, Position};
use thiserror::Error;

/// Help text listing every command.
pub(crate) const HELP: &str = "\
commands:
  n | s | e | w          step one tile (also up, down, left, right)
  goto <lat> <lng>       jump to a geolocation fix
  open <i> <j>           open the cache on cell (i, j)
  close                  close the open cache
  mint                   mint a token from the open cache
  deposit                deposit your most recent token into the open cache
  withdraw               withdraw the most recent deposit from the open cache
  status                 show position, inventory and open cache
  map                    draw the neighborhood
  reset                  discard every cache and token
  export                 print the session as a single line
  import <string>        replace the session with an exported one
  help                   show this text
  quit                   leave";

/// One line of player input.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ReplCommand {
    Move(MoveDirection),
    Goto(Position),
    Open(Cell),
    Close,
    Mint,
    Deposit,
    Withdraw,
    Status,
    Map,
    Reset,
    Export,
    Import(String),
    Help,
    Quit,
}

/// Reasons an input line is not understood.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ParseError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
}

/// Parses a non-empty input line. Blank lines yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<ReplCommand>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "n" | "north" | "up" => ReplCommand::Move(MoveDirection::North),
        "s" | "south" | "down" => ReplCommand::Move(MoveDirection::South),
        "e" | "east" | "right" => ReplCommand::Move(MoveDirection::East),
        "w" | "west" | "left" => ReplCommand::Move(MoveDirection::West),
        "goto" => {
            let (lat, lng) = two_args::<f64>(&rest)
                .filter(|(lat, lng)| lat.is_finite() && lng.is_finite())
                .ok_or(ParseError::Arguments {
                    command: "goto",
                    expected: "a latitude and a longitude",
                })?;
            ReplCommand::Goto(Position::new(lat, lng))
        }
        "open" => {
            let (i, j) = two_args(&rest).ok_or(ParseError::Arguments {
                command: "open",
                expected: "two integer cell coordinates",
            })?;
            ReplCommand::Open(Cell::new(i, j))
        }
        "close" => ReplCommand::Close,
        "mint" | "generate" => ReplCommand::Mint,
        "deposit" => ReplCommand::Deposit,
        "withdraw" => ReplCommand::Withdraw,
        "status" => ReplCommand::Status,
        "map" => ReplCommand::Map,
        "reset" => ReplCommand::Reset,
        "export" => ReplCommand::Export,
        "import" => match rest.as_slice() {
            [payload] => ReplCommand::Import((*payload).to_owned()),
            _ => {
                return Err(ParseError::Arguments {
                    command: "import",
                    expected: "one exported save string",
                })
            }
        },
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

fn two_args<T: std::str::FromStr>(rest: &[&str]) -> Option<(T, T)> {
    match rest {
        [first, second] => Some((first.parse().ok()?, second.parse().ok()?)),
        _ => None,
    }
}
