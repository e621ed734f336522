//! A line-oriented candidate list, grounded on `bucket.go::ReadFromFile`.

use std::io::Cursor;

use tracing::info;

use crate::bucket::{Bucket, dedup_valid_names};
use crate::error::Result;

/// Reads `path`, validating/deduping/lowercasing each line, and feeds one
/// [`Bucket`] per accepted name into a bounded work channel. Closes the
/// channel once the whole file has been consumed.
pub async fn feed_from_file(path: &str, tx: async_channel::Sender<Bucket>) -> Result<()> {
    let contents = tokio::fs::read_to_string(path).await?;
    let (accepted, skipped) = dedup_valid_names(Cursor::new(contents.as_bytes()))?;

    for name in &skipped {
        info!(bucket = %name, "invalid | skipping malformed bucket name");
    }

    for name in accepted {
        if tx.send(Bucket::new(name)).await.is_err() {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn feeds_only_valid_deduped_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MyBucket\nmybucket\nxn--bad\nok-bucket").unwrap();

        let (tx, rx) = async_channel::unbounded();
        feed_from_file(file.path().to_str().unwrap(), tx).await.unwrap();

        let mut names = Vec::new();
        while let Ok(bucket) = rx.try_recv() {
            names.push(bucket.name);
        }
        assert_eq!(names, vec!["mybucket".to_string(), "ok-bucket".to_string()]);
    }
}
