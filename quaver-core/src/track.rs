use serde::{Deserialize, Serialize};

/// An identified playable item.  `link` is an opaque source identifier that
/// only the stream resolver knows how to interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub link: String,
    pub duration: String,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            duration: duration.into(),
        }
    }
}
