//! Terminal commands
//!
//! Each input line parses into a [`Command`]; handlers live in per-area
//! modules and return the text to print, or an error string.

mod auth;
mod billing;
mod chat;

use std::path::PathBuf;

use crate::app::AppState;
use crate::billing::BudgetPeriod;

pub const HELP: &str = "\
Commands:
  /login <username> <password>        sign in
  /register <username> <password> [email]
  /logout                             sign out
  /me                                 refresh and show the profile
  /new                                start a new conversation
  /list                               list conversations
  /load <id>                          open a conversation
  /delete <id>                        delete a conversation
  /history                            show the current conversation
  /model [id]                         show or select the model
  /models                             list models and prices
  /attach <path>                      upload a file for the next message
  /detach                             drop the pending attachment
  /budget                             show the daily budget
  /budget set <period> <coins>        period: none, week, two_weeks, three_weeks, month
  /budget off                         disable the daily budget
  /help                               this text
  /quit                               exit
Anything else is sent as a message.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Register { username: String, password: String, email: Option<String> },
    Logout,
    Me,
    New,
    List,
    Load(i64),
    Delete(i64),
    History,
    Model(Option<String>),
    Models,
    Attach(PathBuf),
    Detach,
    Budget,
    BudgetSet { period: BudgetPeriod, coins: i64 },
    BudgetOff,
    Help,
    Quit,
    Send(String),
}

/// Result of running a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Quit,
}

fn parse_id(arg: Option<&str>, usage: &str) -> Result<i64, String> {
    arg.and_then(|a| a.parse::<i64>().ok())
        .ok_or_else(|| format!("Usage: {}", usage))
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Send(line.to_string())));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match (name.as_str(), args.as_slice()) {
        ("login", [username, password]) => Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        },
        ("login", _) => return Err("Usage: /login <username> <password>".to_string()),
        ("register", [username, password]) => Command::Register {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
        },
        ("register", [username, password, email]) => Command::Register {
            username: username.to_string(),
            password: password.to_string(),
            email: Some(email.to_string()),
        },
        ("register", _) => {
            return Err("Usage: /register <username> <password> [email]".to_string())
        }
        ("logout", []) => Command::Logout,
        ("me", []) => Command::Me,
        ("new", []) => Command::New,
        ("list", []) => Command::List,
        ("load", args) => Command::Load(parse_id(args.first().copied(), "/load <id>")?),
        ("delete", args) => Command::Delete(parse_id(args.first().copied(), "/delete <id>")?),
        ("history", []) => Command::History,
        ("model", []) => Command::Model(None),
        ("model", [id]) => Command::Model(Some(id.to_string())),
        ("models", []) => Command::Models,
        ("attach", []) => return Err("Usage: /attach <path>".to_string()),
        ("attach", path) => Command::Attach(PathBuf::from(path.join(" "))),
        ("detach", []) => Command::Detach,
        ("budget", []) => Command::Budget,
        ("budget", ["off"]) => Command::BudgetOff,
        ("budget", ["set", period, coins]) => Command::BudgetSet {
            period: period.parse()?,
            coins: coins
                .parse()
                .map_err(|_| format!("Invalid coin amount: {}", coins))?,
        },
        ("budget", _) => {
            return Err("Usage: /budget [set <period> <coins> | off]".to_string())
        }
        ("help", _) => Command::Help,
        ("quit", _) | ("exit", _) => Command::Quit,
        (other, _) => return Err(format!("Unknown command: /{} (try /help)", other)),
    };
    Ok(Some(command))
}

pub async fn dispatch(state: &AppState, command: Command) -> Result<Outcome, String> {
    let output = match command {
        Command::Login { username, password } => auth::login(state, &username, &password).await?,
        Command::Register {
            username,
            password,
            email,
        } => auth::register(state, username, password, email).await?,
        Command::Logout => auth::logout(state),
        Command::Me => auth::me(state).await?,
        Command::New => chat::new_conversation(state),
        Command::List => chat::list_conversations(state).await?,
        Command::Load(id) => chat::load_conversation(state, id).await?,
        Command::Delete(id) => chat::delete_conversation(state, id).await?,
        Command::History => chat::history(state),
        Command::Model(None) => chat::show_model(state),
        Command::Model(Some(id)) => chat::select_model(state, &id)?,
        Command::Models => chat::list_models(state).await?,
        Command::Attach(path) => chat::attach(state, &path).await?,
        Command::Detach => chat::detach(state),
        Command::Budget => billing::show_budget(state).await,
        Command::BudgetSet { period, coins } => billing::set_budget(state, period, coins).await?,
        Command::BudgetOff => billing::disable_budget(state).await?,
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Outcome::Quit),
        Command::Send(text) => chat::send_message(state, &text).await?,
    };
    Ok(Outcome::Output(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            parse("  hello there ").unwrap(),
            Some(Command::Send("hello there".to_string()))
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("/load 42").unwrap(), Some(Command::Load(42)));
        assert_eq!(parse("/MODEL openai/gpt-4o").unwrap(), Some(Command::Model(Some("openai/gpt-4o".into()))));
        assert_eq!(
            parse("/budget set week 700").unwrap(),
            Some(Command::BudgetSet { period: BudgetPeriod::Week, coins: 700 })
        );
        assert_eq!(parse("/budget off").unwrap(), Some(Command::BudgetOff));
        assert_eq!(
            parse("/attach my notes.txt").unwrap(),
            Some(Command::Attach(PathBuf::from("my notes.txt")))
        );
        assert_eq!(
            parse("/register bob pw bob@example.com").unwrap(),
            Some(Command::Register {
                username: "bob".into(),
                password: "pw".into(),
                email: Some("bob@example.com".into()),
            })
        );
        assert_eq!(parse("/exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("/load abc").is_err());
        assert!(parse("/login onlyuser").is_err());
        assert!(parse("/budget set fortnight 10").is_err());
        assert!(parse("/budget set week lots").is_err());
        assert!(parse("/frobnicate").unwrap_err().contains("Unknown command"));
    }
}
