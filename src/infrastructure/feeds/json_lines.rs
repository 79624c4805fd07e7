use super::{BarFeed, FeedError};
use crate::domain::entities::bar::Bar;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads one JSON bar per line. Blank lines are skipped.
pub struct JsonLinesFeed<R> {
    name: String,
    lines: Lines<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesFeed<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl JsonLinesFeed<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .map_err(|e| FeedError::Io(format!("{}: {e}", path.display())))?;
        Ok(Self::new(path.display().to_string(), BufReader::new(file)))
    }
}

impl JsonLinesFeed<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new("stdin", BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> BarFeed for JsonLinesFeed<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_bar(&mut self) -> Result<Option<Bar>, FeedError> {
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .map_err(|e| FeedError::Io(e.to_string()))?
            else {
                return Ok(None);
            };
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line)
                .map(Some)
                .map_err(|e| FeedError::Parse {
                    line: self.line_no,
                    message: e.to_string(),
                });
        }
    }
}
