use std::{error, fmt, io};

#[derive(Debug)]
pub enum Error {
    PlaylistNotFound(String),
    TrackIndexOutOfRange { index: usize, len: usize },
    BadTrackLink(String),
    NoAudioStream,
    SearchFailed(Box<dyn error::Error + Send>),
    ResolveFailed(Box<dyn error::Error + Send>),
    EngineError(Box<dyn error::Error + Send>),
    JsonError(Box<dyn error::Error + Send>),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaylistNotFound(name) => write!(f, "Playlist '{}' not found", name),
            Self::TrackIndexOutOfRange { index, len } => {
                write!(f, "Song number {} is out of range, the playlist size is {}", index, len)
            }
            Self::BadTrackLink(link) => write!(f, "Unrecognized track link: {}", link),
            Self::NoAudioStream => write!(f, "No audio stream available"),
            Self::SearchFailed(err)
            | Self::ResolveFailed(err)
            | Self::EngineError(err)
            | Self::JsonError(err) => err.fmt(f),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::JsonError(Box::new(err))
    }
}
