// ABOUTME: REPL command parsing: slash commands and plain chat input.
// ABOUTME: Anything that is not a slash command is sent to the active conversation.

use crate::auth::RegisterForm;

/// Reference to a conversation: a raw id or a 1-based position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(String),
    Index(usize),
}

impl Target {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.strip_prefix('#') {
            Some(n) => match n.parse::<usize>() {
                Ok(index) if index > 0 => Ok(Target::Index(index)),
                _ => Err(format!("Invalid list position: {raw}")),
            },
            None => Ok(Target::Id(raw.to_string())),
        }
    }
}

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Register(RegisterForm),
    Logout,
    Whoami,
    List { page: u32 },
    New { title: Option<String> },
    Open(Target),
    Close,
    Rename { target: Target, title: String },
    Delete(Target),
    Help,
    Quit,
    /// Plain text for the active conversation.
    Say(String),
}

pub const HELP: &str = "\
Commands:
  /login <email> <password>                  sign in
  /register <name> <email> <password> <confirm>
                                             create an account
  /logout                                    sign out
  /whoami                                    show the signed-in user
  /list [page]                               list conversations (page starts at 1)
  /new [title]                               start a conversation
  /open <id|#n>                              open a conversation
  /close                                     leave the active conversation
  /rename <id|#n> <title>                    rename a conversation
  /delete <id|#n>                            delete a conversation
  /help                                      show this help
  /quit                                      exit
Any other input is sent to the active conversation.";

/// Parse one line of input. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Say(trimmed.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let words: Vec<&str> = args.split_whitespace().collect();

    let command = match name {
        "login" => match words.as_slice() {
            [email, password] => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            _ => return Err("Usage: /login <email> <password>".to_string()),
        },
        "register" => match words.as_slice() {
            [name, email, password, confirm] => Command::Register(RegisterForm {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                confirm_password: confirm.to_string(),
            }),
            _ => return Err("Usage: /register <name> <email> <password> <confirm>".to_string()),
        },
        "logout" => Command::Logout,
        "whoami" => Command::Whoami,
        "list" | "ls" => match words.as_slice() {
            [] => Command::List { page: 0 },
            [page] => match page.parse::<u32>() {
                Ok(page) if page > 0 => Command::List { page: page - 1 },
                _ => return Err(format!("Invalid page: {page}")),
            },
            _ => return Err("Usage: /list [page]".to_string()),
        },
        "new" => Command::New {
            title: (!args.is_empty()).then(|| args.to_string()),
        },
        "open" => match words.as_slice() {
            [target] => Command::Open(Target::parse(target)?),
            _ => return Err("Usage: /open <id|#n>".to_string()),
        },
        "close" => Command::Close,
        "rename" => match args.split_once(char::is_whitespace) {
            Some((target, title)) if !title.trim().is_empty() => Command::Rename {
                target: Target::parse(target)?,
                title: title.trim().to_string(),
            },
            _ => return Err("Usage: /rename <id|#n> <title>".to_string()),
        },
        "delete" | "rm" => match words.as_slice() {
            [target] => Command::Delete(Target::parse(target)?),
            _ => return Err("Usage: /delete <id|#n>".to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command: /{other} (try /help)")),
    };
    Ok(Some(command))
}
