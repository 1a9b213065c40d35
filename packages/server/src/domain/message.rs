//! Wire texts and chat message formatting.

use super::DisplayName;

/// Logo written to every accepted connection before the name prompt.
pub const BANNER: &str = r#"Welcome to TCP-Chat!
         _nnnn_
        dGGGGMMb
       @p~qp~~qMb
       M|@||@) M|
       @,----.JM|
      JS^\__/  qKL
     dZP        qKRb
    dZP          qKKb
   fZP            SMMb
   HZM            MMMM
   FqM            MMMM
 __| ".        |\dS"qML
 |    .       | ' \Zq
_)      \.___.,|     .'
\____   )MMMMMP|   .'
     -'       --'
"#;

pub const NAME_PROMPT: &str = "[ENTER YOUR NAME]: ";

pub const CHAT_FULL_NOTICE: &str = "Chat is full. Please try again later.\n";
pub const NAME_TAKEN_NOTICE: &str =
    "This name is already taken. Please try another name to rejoin the chat.\n";
pub const EMPTY_NAME_NOTICE: &str = "Name cannot be empty\n";

pub const HISTORY_HEADER: &str = "\n Previous Messages \n";
pub const HISTORY_FOOTER: &str = " End Of Previous Messages \n\n";

/// Greeting written only to the newly admitted participant.
pub fn welcome(name: &DisplayName) -> String {
    format!("Welcome to the chat, {}!\n", name)
}

/// One broadcast line, exactly as it goes on the wire and into history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    /// `[<timestamp>][<name>]: <body>\n`
    pub fn chat(timestamp: &str, from: &DisplayName, body: &str) -> Self {
        Self(format!("[{}][{}]: {}\n", timestamp, from, body))
    }

    pub fn joined(name: &DisplayName) -> Self {
        Self(format!("\n{} has joined our chat...\n", name))
    }

    pub fn left(name: &DisplayName) -> Self {
        Self(format!("\n{} has left our chat...\n", name))
    }

    /// Wrap already formatted text.
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
