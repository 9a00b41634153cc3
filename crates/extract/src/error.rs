use std::fmt;

#[derive(Debug)]
pub enum ExtractError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (lookahead out of range, bad status code, etc.).
    ConfigValidation(String),
    /// IO error (file read, etc.).
    Io(String),
    /// A page dump could not be decoded.
    PageDump(String),
    /// The external text/table extraction step failed.
    Extraction(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::PageDump(msg) => write!(f, "page dump error: {msg}"),
            Self::Extraction(msg) => write!(f, "extraction failed: {msg}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
