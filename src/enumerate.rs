//! Paginated object listing via `ListObjectsV2`, with a hard page cap.

use aws_sdk_s3::Client;
use aws_sdk_s3::types::EncodingType;
use tracing::debug;

use crate::bucket::{Bucket, Object};
use crate::error::{Result, ScanError};

/// The maximum number of `ListObjectsV2` pages consumed for one bucket.
/// Buckets larger than this are intentionally skipped.
const PAGE_CAP: u32 = 5000;

/// Enumerates every object in `bucket` via `ListObjectsV2`, accumulating
/// keys, sizes, and a running total until `is_truncated` is false. Aborts
/// with [`ScanError::PageCapExceeded`] once more than [`PAGE_CAP`] pages
/// have been fetched.
pub async fn enumerate_list_objects_v2(client: &Client, bucket: &mut Bucket) -> Result<()> {
    let mut continuation_token: Option<String> = None;
    let mut page: u32 = 0;

    loop {
        debug!(bucket = %bucket.name, page, "requesting object page");
        let mut req = client
            .list_objects_v2()
            .bucket(&bucket.name)
            .encoding_type(EncodingType::Url);
        if let Some(token) = &continuation_token {
            req = req.continuation_token(token);
        }

        let output = req.send().await.map_err(|e| ScanError::Enumerate {
            bucket: bucket.name.clone(),
            source: Box::new(e),
        })?;

        for obj in output.contents() {
            let key = obj.key().unwrap_or_default().to_string();
            let size = obj.size().unwrap_or_default().max(0) as u64;
            bucket.bucket_size += size;
            bucket.objects.push(Object { key, size });
        }

        if !output.is_truncated().unwrap_or(false) {
            bucket.objects_enumerated = true;
            break;
        }

        continuation_token = output.next_continuation_token().map(str::to_string);
        page += 1;
        if page >= PAGE_CAP {
            return Err(ScanError::PageCapExceeded {
                bucket: bucket.name.clone(),
            });
        }
    }

    bucket.num_objects = bucket.objects.len() as u32;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_size_matches_sum_of_object_sizes() {
        let mut bucket = Bucket::new("example");
        bucket.objects = vec![
            Object { key: "a".to_string(), size: 10 },
            Object { key: "b".to_string(), size: 33 },
        ];
        bucket.bucket_size = bucket.objects.iter().map(|o| o.size).sum();
        bucket.objects_enumerated = true;
        assert_eq!(bucket.bucket_size, 43);
    }

    #[test]
    fn page_cap_constant_matches_spec() {
        assert_eq!(PAGE_CAP, 5000);
    }
}
