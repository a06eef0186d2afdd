//! Command names and parsing.
//!
//! Dispatch is over a closed enum rather than a string-keyed table, so every
//! handler site is exhaustiveness-checked. Lookup is an exact match on the
//! trimmed input line; only `decode` takes a free-form argument.

/// A recognized terminal command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    WhoAmI,
    Meaning,
    Memory,
    Override,
    Status,
    Sudo,
    /// The exact line `sudo override` - the only privilege grant.
    SudoOverride,
    Trace,
    Ps,
    Minimal,
    Life,
    Snake,
    Reboot,
    History,
    Exit,
    /// `decode [fragment]` - the one command with an argument.
    Decode(Option<String>),
    GodMode,
    Ascend,
    Transcend,
    Reveal,
}

/// Commands always listed by `help`.
pub const BASE_COMMANDS: [&str; 15] = [
    "help", "whoami", "meaning", "memory", "override", "status", "sudo", "trace", "ps",
    "minimal", "life", "snake", "reboot", "history", "exit",
];

/// Commands listed by `help` only once the session is privileged.
pub const HIDDEN_COMMANDS: [&str; 5] = ["decode", "godmode", "ascend", "transcend", "reveal"];

impl Command {
    /// The name as recorded in history and matched by the awareness sets.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::WhoAmI => "whoami",
            Command::Meaning => "meaning",
            Command::Memory => "memory",
            Command::Override => "override",
            Command::Status => "status",
            Command::Sudo => "sudo",
            Command::SudoOverride => "sudo override",
            Command::Trace => "trace",
            Command::Ps => "ps",
            Command::Minimal => "minimal",
            Command::Life => "life",
            Command::Snake => "snake",
            Command::Reboot => "reboot",
            Command::History => "history",
            Command::Exit => "exit",
            Command::Decode(_) => "decode",
            Command::GodMode => "godmode",
            Command::Ascend => "ascend",
            Command::Transcend => "transcend",
            Command::Reveal => "reveal",
        }
    }

    /// Hidden commands read as unknown until the session is privileged.
    pub fn is_hidden(&self) -> bool {
        HIDDEN_COMMANDS.contains(&self.name())
    }
}

/// Parse one trimmed input line. `None` means unknown command.
pub fn parse(line: &str) -> Option<Command> {
    if line == "decode" {
        return Some(Command::Decode(None));
    }
    if let Some(rest) = line.strip_prefix("decode ") {
        let fragment = rest.split_whitespace().next().map(str::to_string);
        return Some(Command::Decode(fragment));
    }

    match line {
        "help" => Some(Command::Help),
        "whoami" => Some(Command::WhoAmI),
        "meaning" => Some(Command::Meaning),
        "memory" => Some(Command::Memory),
        "override" => Some(Command::Override),
        "status" => Some(Command::Status),
        "sudo" => Some(Command::Sudo),
        "sudo override" => Some(Command::SudoOverride),
        "trace" => Some(Command::Trace),
        "ps" => Some(Command::Ps),
        "minimal" => Some(Command::Minimal),
        "life" => Some(Command::Life),
        "snake" => Some(Command::Snake),
        "reboot" => Some(Command::Reboot),
        "history" => Some(Command::History),
        "exit" => Some(Command::Exit),
        "godmode" => Some(Command::GodMode),
        "ascend" => Some(Command::Ascend),
        "transcend" => Some(Command::Transcend),
        "reveal" => Some(Command::Reveal),
        _ => None,
    }
}

/// Whether typed input currently matches a known command, for the live input
/// highlight. Matches any base or hidden command plus `sudo override`.
pub fn is_known(input: &str) -> bool {
    let trimmed = input.trim().to_lowercase();
    if trimmed == "sudo override" {
        return true;
    }
    BASE_COMMANDS.contains(&trimmed.as_str())
        || HIDDEN_COMMANDS.contains(&trimmed.as_str())
        || trimmed.starts_with("decode ")
}
