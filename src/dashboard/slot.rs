use serde::Serialize;
use std::fmt;

/// Load state of one dataset on the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Slot<T> {
    Idle,
    Loading,
    Ready { data: T },
    Failed { error: String },
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Idle
    }
}

#[cfg(test)]
impl<T> Slot<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Slot::Ready { data } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Slot::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Slot::Loading)
    }
}

/// The four datasets a page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Technical,
    Fundamental,
    Comprehensive,
    Sentiment,
}

impl Dataset {
    /// Inline message shown in place of a section that failed to load.
    pub fn failure_message(self, cause: &dyn fmt::Display) -> String {
        format!("Failed to load {} data: {}", self.describe(), cause)
    }

    fn describe(self) -> &'static str {
        match self {
            Dataset::Technical => "technical analysis",
            Dataset::Fundamental => "fundamental analysis",
            Dataset::Comprehensive => "comprehensive analysis",
            Dataset::Sentiment => "sentiment analysis",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
