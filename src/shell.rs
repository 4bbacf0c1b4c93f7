//! Line commands understood by the interactive shell.

use std::path::PathBuf;

use thiserror::Error;

use crate::collection::CollectionType;
use crate::state::Field;

pub const HELP: &str = "\
Commands (positions are 1-based):
  list                              show both collections
  find <text>                       search names and urls
  <sites|engines> add               append a new card in edit mode
  <sites|engines> edit <n>          start editing card n
  <sites|engines> name <n> <text>   type into the name field
  <sites|engines> url <n> <text>    type into the url field
  <sites|engines> save <n>          commit the edit
  <sites|engines> cancel <n>        discard the edit
  <sites|engines> icon <n> <icon>   change the icon (while editing)
  <sites|engines> delete <n>        arm delete; repeat to confirm
  <sites|engines> key <n>           press a key on card n
  <sites|engines> drag <n>          start dragging card n
  <sites|engines> over <n>          drag over card n
  <sites|engines> leave <n>         drag out of card n
  <sites|engines> drop <n>          drop onto card n
  <sites|engines> dragend           end the drag
  <sites|engines> move <from> <to>  move card before another
  <sites|engines> import <file>     import a JSON export
  <sites|engines> export [file]     write a JSON export
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Help,
    Quit,
    Find(String),
    Card {
        collection: CollectionType,
        action: CardCommand,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardCommand {
    Add,
    Edit(usize),
    Type(usize, Field, String),
    Save(usize),
    Cancel(usize),
    Icon(usize, String),
    Delete(usize),
    Key(usize),
    Drag(usize),
    Over(usize),
    Leave(usize),
    Drop(usize),
    DragEnd,
    Move(usize, usize),
    Import(PathBuf),
    Export(Option<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("Missing argument: {0}")]
    Missing(&'static str),
    #[error("'{0}' is not a card position")]
    BadPosition(String),
}

pub fn parse(line: &str) -> Result<ShellCommand, ParseError> {
    let line = line.trim();
    let (head, rest) = split_word(line);

    match head {
        "list" | "ls" => Ok(ShellCommand::List),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        "find" => Ok(ShellCommand::Find(rest.to_string())),
        "sites" | "engines" => {
            let collection = if head == "sites" {
                CollectionType::Sites
            } else {
                CollectionType::Engines
            };
            Ok(ShellCommand::Card {
                collection,
                action: parse_card(rest)?,
            })
        }
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn parse_card(input: &str) -> Result<CardCommand, ParseError> {
    let (verb, rest) = split_word(input);
    let command = match verb {
        "add" => CardCommand::Add,
        "edit" => CardCommand::Edit(position(rest)?.0),
        "name" | "url" => {
            let (n, text) = position(rest)?;
            let field = if verb == "name" { Field::Name } else { Field::Url };
            CardCommand::Type(n, field, text.to_string())
        }
        "save" | "commit" => CardCommand::Save(position(rest)?.0),
        "cancel" => CardCommand::Cancel(position(rest)?.0),
        "icon" => {
            let (n, icon) = position(rest)?;
            if icon.is_empty() {
                return Err(ParseError::Missing("icon"));
            }
            CardCommand::Icon(n, icon.to_string())
        }
        "delete" | "rm" => CardCommand::Delete(position(rest)?.0),
        "key" => CardCommand::Key(position(rest)?.0),
        "drag" => CardCommand::Drag(position(rest)?.0),
        "over" => CardCommand::Over(position(rest)?.0),
        "leave" => CardCommand::Leave(position(rest)?.0),
        "drop" => CardCommand::Drop(position(rest)?.0),
        "dragend" => CardCommand::DragEnd,
        "move" | "mv" => {
            let (from, rest) = position(rest)?;
            let (to, _) = position(rest)?;
            CardCommand::Move(from, to)
        }
        "import" => {
            if rest.is_empty() {
                return Err(ParseError::Missing("file"));
            }
            CardCommand::Import(PathBuf::from(rest))
        }
        "export" => CardCommand::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "" => return Err(ParseError::Missing("action")),
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(at) => (&input[..at], input[at..].trim()),
        None => (input, ""),
    }
}

fn position(input: &str) -> Result<(usize, &str), ParseError> {
    let (word, rest) = split_word(input);
    if word.is_empty() {
        return Err(ParseError::Missing("position"));
    }
    word.parse::<usize>()
        .map(|n| (n, rest))
        .map_err(|_| ParseError::BadPosition(word.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(collection: CollectionType, action: CardCommand) -> ShellCommand {
        ShellCommand::Card { collection, action }
    }

    #[test]
    fn test_parses_card_commands() {
        assert_eq!(
            parse("sites name 2 My Site").unwrap(),
            card(
                CollectionType::Sites,
                CardCommand::Type(2, Field::Name, "My Site".to_string())
            )
        );
        assert_eq!(
            parse("engines move 3 1").unwrap(),
            card(CollectionType::Engines, CardCommand::Move(3, 1))
        );
        assert_eq!(
            parse("  sites   export  ").unwrap(),
            card(CollectionType::Sites, CardCommand::Export(None))
        );
        assert_eq!(parse("find rust book").unwrap(), ShellCommand::Find("rust book".to_string()));
    }

    #[test]
    fn test_reports_bad_input() {
        assert_eq!(parse("bogus"), Err(ParseError::Unknown("bogus".to_string())));
        assert_eq!(parse("sites"), Err(ParseError::Missing("action")));
        assert_eq!(parse("sites edit"), Err(ParseError::Missing("position")));
        assert_eq!(
            parse("sites delete two"),
            Err(ParseError::BadPosition("two".to_string()))
        );
        assert_eq!(parse("sites icon 1"), Err(ParseError::Missing("icon")));
    }
}
