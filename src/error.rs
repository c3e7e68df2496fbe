use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Input JSON that does not describe an export request.
    InvalidInput(String),
    /// A font could not be read, parsed or embedded.
    Font(String),
    /// Page geometry leaves no room for content.
    Layout(String),
    Pdf(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Font(msg) => write!(f, "font error: {msg}"),
            Error::Layout(msg) => write!(f, "layout error: {msg}"),
            Error::Pdf(msg) => write!(f, "PDF error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}
