pub mod json_lines;

use crate::domain::entities::bar::Bar;
use crate::domain::error::DomainError;
use async_trait::async_trait;

/// A source of base bars, in timestamp order per symbol.
#[async_trait]
pub trait BarFeed: Send {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Next bar, or `None` once the feed is exhausted.
    async fn next_bar(&mut self) -> Result<Option<Bar>, FeedError>;
}

#[derive(Debug)]
pub enum FeedError {
    /// Reading from the underlying source failed
    Io(String),
    /// A record could not be decoded into a bar
    Parse { line: usize, message: String },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Io(msg) => write!(f, "IO error: {msg}"),
            FeedError::Parse { line, message } => write!(f, "Parse error on line {line}: {message}"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<FeedError> for DomainError {
    fn from(e: FeedError) -> Self {
        DomainError::Feed(e.to_string())
    }
}
