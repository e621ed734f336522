//! A fixed-size pool draining one shared channel of candidate buckets,
//! using `async-channel` so multiple `tokio` tasks can share one receiver.

use std::sync::Arc;

use crate::bucket::Bucket;
use crate::pipeline::{ResultSink, ScanOptions, scan_bucket};
use crate::provider::StorageProvider;

/// Spawns `threads` tasks, each pulling from `rx` until it closes and
/// drains. No ordering guarantee across buckets; each bucket's own probes
/// still run in the pipeline's strict internal order.
pub async fn run(threads: usize, rx: async_channel::Receiver<Bucket>, provider: Arc<dyn StorageProvider>, opts: Arc<ScanOptions>, sink: Arc<dyn ResultSink>) {
    let mut handles = Vec::with_capacity(threads);

    for _ in 0..threads {
        let rx = rx.clone();
        let provider = provider.clone();
        let opts = opts.clone();
        let sink = sink.clone();

        handles.push(tokio::spawn(async move {
            while let Ok(bucket) = rx.recv().await {
                let outcome = scan_bucket(provider.as_ref(), bucket, &opts).await;
                sink.handle(&outcome).await;
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}
