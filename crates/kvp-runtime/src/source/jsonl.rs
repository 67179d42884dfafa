use std::marker::PhantomData;

use async_trait::async_trait;
use kvp_core::Update;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use super::UpdateSource;

/// Reads one JSON-encoded [`Update`] per line.
///
/// Blank lines are skipped. A line that fails to decode, or an I/O error,
/// ends the source with an error naming the offending line number.
pub struct JsonLinesSource<R, K, V> {
    lines: Lines<R>,
    line_no: u64,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<R, K, V> JsonLinesSource<R, K, V>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            _marker: PhantomData,
        }
    }

    /// Number of lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

#[async_trait]
impl<R, K, V> UpdateSource<K, V> for JsonLinesSource<R, K, V>
where
    R: AsyncBufRead + Unpin + Send,
    K: DeserializeOwned + Send + 'static,
    V: DeserializeOwned + Send + 'static,
{
    async fn next_update(&mut self) -> Option<anyhow::Result<Update<K, V>>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    return Some(Err(anyhow::anyhow!(
                        "read error after line {}: {e}",
                        self.line_no
                    )));
                }
            };
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            kvp_trace!(pipe, line = self.line_no, "update line read");
            return Some(
                serde_json::from_str(trimmed)
                    .map_err(|e| anyhow::anyhow!("line {}: invalid update: {e}", self.line_no)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Source<'a> = JsonLinesSource<&'a [u8], String, i64>;

    #[tokio::test]
    async fn decodes_lines_in_order() {
        let input = b"{\"op\":\"put\",\"key\":\"a\",\"value\":1}\n\n{\"op\":\"drop\",\"key\":\"a\"}\n";
        let mut source: Source<'_> = JsonLinesSource::new(&input[..]);

        let first = source.next_update().await.unwrap().unwrap();
        assert_eq!(first, Update::put("a".to_string(), 1));
        let second = source.next_update().await.unwrap().unwrap();
        assert_eq!(second, Update::drop("a".to_string()));
        assert!(source.next_update().await.is_none());
        assert_eq!(source.lines_read(), 3);
    }

    #[tokio::test]
    async fn malformed_line_is_an_error() {
        let input = b"{\"op\":\"put\",\"key\":\"a\",\"value\":1}\nnot json\n";
        let mut source: Source<'_> = JsonLinesSource::new(&input[..]);

        assert!(source.next_update().await.unwrap().is_ok());
        let err = source.next_update().await.unwrap().unwrap_err();
        assert!(err.to_string().starts_with("line 2"), "{err}");
    }

    #[tokio::test]
    async fn last_line_without_newline_is_read() {
        let input = b"{\"op\":\"drop\",\"key\":\"z\"}";
        let mut source: Source<'_> = JsonLinesSource::new(&input[..]);
        assert_eq!(
            source.next_update().await.unwrap().unwrap(),
            Update::drop("z".to_string())
        );
        assert!(source.next_update().await.is_none());
    }
}
