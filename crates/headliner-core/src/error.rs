use headliner_api::GNewsError;
use thiserror::Error;

const NEWS_UNAVAILABLE_MESSAGE: &str = "Unable to load news. Please check your connection.";
const LOCATION_UNAVAILABLE_MESSAGE: &str =
    "Location unavailable. Allow location access or set a region, then try again.";

/// All the ways a feed load can go wrong
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode response: {0}")]
    Decoding(String),

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("No news available from any source")]
    NewsUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// The one line we show the user for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Transport(_) | Error::Decoding(_) | Error::NewsUnavailable => {
                NEWS_UNAVAILABLE_MESSAGE
            }
            Error::PermissionDenied | Error::LocationUnavailable(_) => {
                LOCATION_UNAVAILABLE_MESSAGE
            }
            Error::ConfigError(_) | Error::IoError(_) => {
                "Configuration problem. Check your headliner config file."
            }
        }
    }
}

impl From<GNewsError> for Error {
    fn from(err: GNewsError) -> Self {
        if err.is_decoding() {
            Error::Decoding(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}
