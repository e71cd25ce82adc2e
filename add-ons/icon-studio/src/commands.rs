//! Line commands for the terminal chat panel.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: treated as a spoken utterance.
    Say(String),
    /// `/action [what]`
    RequestAction(String),
    /// `/persona <index|name>`
    SelectPersona(String),
    Personas,
    Buy,
    Balance,
    Transcript,
    Links,
    Close,
    Open,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Say(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name.to_ascii_lowercase().as_str() {
            "action" => Command::RequestAction(arg.to_string()),
            "persona" if !arg.is_empty() => Command::SelectPersona(arg.to_string()),
            "personas" | "persona" => Command::Personas,
            "buy" => Command::Buy,
            "balance" => Command::Balance,
            "transcript" => Command::Transcript,
            "links" => Command::Links,
            "close" => Command::Close,
            "open" => Command::Open,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

pub const HELP: &str = "\
Type anything to say it to the selected persona.
  /personas           list personas
  /persona <n|name>   select a persona
  /action [what]      ask the persona to do something
  /buy                open the credits checkout link
  /balance            show token balance
  /transcript         show the chat so far
  /links              radio, music and NFT links
  /close, /open       close or reopen the chat panel
  /quit               leave";
