use crate::types::ReasoningMode;
use crate::util::parse_bool_str;

pub const HELP_TEXT: &str = "/new  /list  /open <n|id>  /delete <n|id>  /mode <auto|pro|fast>  \
/thinking <on|off>  /key <model> <key>  /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewChat,
    List,
    Open(String),
    Delete(String),
    Mode(ReasoningMode),
    Thinking(bool),
    Key { model: String, key: String },
    Help,
    Quit,
}

/// `None` means the input is a chat message, not a command.
pub fn parse_command(input: &str) -> Option<Result<Command, String>> {
    let trimmed = input.trim();
    if matches!(trimmed.to_ascii_lowercase().as_str(), "exit" | "quit") {
        return Some(Ok(Command::Quit));
    }
    let rest = trimmed.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let parsed = match (name.as_str(), args.as_slice()) {
        ("new" | "clear", []) => Ok(Command::NewChat),
        ("list" | "ls", []) => Ok(Command::List),
        ("open", [target]) => Ok(Command::Open(target.to_string())),
        ("open", _) => Err("usage: /open <n|id>".to_string()),
        ("delete" | "rm", [target]) => Ok(Command::Delete(target.to_string())),
        ("delete" | "rm", _) => Err("usage: /delete <n|id>".to_string()),
        ("mode", [mode]) => mode.parse::<ReasoningMode>().map(Command::Mode),
        ("mode", _) => Err("usage: /mode <auto|pro|fast>".to_string()),
        ("thinking", [flag]) => parse_bool_str(flag)
            .map(Command::Thinking)
            .ok_or_else(|| "usage: /thinking <on|off>".to_string()),
        ("thinking", _) => Err("usage: /thinking <on|off>".to_string()),
        ("key", [model, key]) => Ok(Command::Key {
            model: model.to_string(),
            key: key.to_string(),
        }),
        ("key", _) => Err("usage: /key <model> <key>".to_string()),
        ("help" | "?", _) => Ok(Command::Help),
        ("quit" | "exit", _) => Ok(Command::Quit),
        (other, _) => Err(format!("unknown command /{other}, try /help")),
    };
    Some(parsed)
}
