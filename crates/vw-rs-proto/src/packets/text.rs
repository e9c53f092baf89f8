//! Text (0x09): Bidirectional.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    Raw,
    Chat,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub text_type: TextType,
    pub source_name: String,
    pub message: String,
}

impl Text {
    /// A raw message with no sender.
    pub fn raw(message: impl Into<String>) -> Self {
        Self {
            text_type: TextType::Raw,
            source_name: String::new(),
            message: message.into(),
        }
    }
}
