use std::fmt;
use std::str::FromStr;

/// Author of a transcript turn. Stored as its lower-case label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown speaker label {0:?}")]
pub struct UnknownSpeaker(pub String);

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl FromStr for Speaker {
    type Err = UnknownSpeaker;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        [Self::User, Self::Assistant, Self::System]
            .into_iter()
            .find(|speaker| speaker.label() == label)
            .ok_or_else(|| UnknownSpeaker(label.to_string()))
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
