use std::fmt;

/// Whether an inbound chat event is a recognised slash command or free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Command,
    Text,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Command => write!(f, "command"),
            EventKind::Text => write!(f, "text"),
        }
    }
}

/// A chat message normalised away from any particular platform.
///
/// For commands `payload` is the command name without the leading `/`;
/// for text it is the message body as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub payload: String,
    pub chat_id: String,
}

impl InboundEvent {
    pub fn command(chat_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Command,
            payload: name.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn text(chat_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Text,
            payload: body.into(),
            chat_id: chat_id.into(),
        }
    }
}
