//! Broker-backed worker pool, grounded on `worker/mq_worker.go::WorkMQ`.
//!
//! Each worker owns its own AMQP connection and reconnects on ack failure,
//! matching the Go source's outer `for {}` recovery loop exactly.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicRejectOptions};
use lapin::types::FieldTable;
use tracing::{error, info, warn};

use crate::bucket::Bucket;
use crate::input::broker::{BrokerMessage, connect, declare_topology};
use crate::pipeline::{PipelineOutcome, ResultSink, ScanOptions, scan_bucket};
use crate::provider::StorageProvider;

/// Spawns `threads` independent broker-consuming workers against `queue`.
pub async fn run(threads: usize, uri: &str, queue: &str, provider: Arc<dyn StorageProvider>, opts: Arc<ScanOptions>, sink: Arc<dyn ResultSink>) {
    let mut handles = Vec::with_capacity(threads);

    for worker_id in 0..threads {
        let uri = uri.to_string();
        let queue = queue.to_string();
        let provider = provider.clone();
        let opts = opts.clone();
        let sink = sink.clone();
        let prefetch = threads as u16;

        handles.push(tokio::spawn(async move {
            loop {
                if let Err(error) = consume_until_broken(worker_id, &uri, &queue, prefetch, provider.as_ref(), &opts, sink.as_ref()).await {
                    error!(worker_id, %error, "broker worker disconnected, reconnecting");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

async fn consume_until_broken(
    worker_id: usize,
    uri: &str,
    queue: &str,
    prefetch: u16,
    provider: &dyn StorageProvider,
    opts: &ScanOptions,
    sink: &dyn ResultSink,
) -> crate::error::Result<()> {
    let connection = connect(uri).await?;
    let channel = connection.create_channel().await?;
    declare_topology(&channel, queue, prefetch).await?;

    let tag = format!("{queue}_{worker_id}");
    let mut consumer = channel
        .basic_consume(queue, &tag, BasicConsumeOptions::default(), FieldTable::default())
        .await?;

    while let Some(delivery) = consumer.next().await {
        let delivery = delivery?;

        let bucket_name = match serde_json::from_slice::<BrokerMessage>(&delivery.data) {
            Ok(msg) => msg.bucket,
            Err(error) => {
                warn!(worker_id, %error, "malformed broker message, acking to avoid a poison-message loop");
                // Preserved from the upstream worker, which acks right
                // after a failed unmarshal instead of skipping ahead: fall
                // through and still attempt to scan an empty bucket name,
                // which the pipeline will reject as invalid.
                String::new()
            }
        };

        let outcome = scan_bucket(provider, Bucket::new(bucket_name), opts).await;
        sink.handle(&outcome).await;

        let should_ack = !matches!(outcome, PipelineOutcome::Error { .. });
        if should_ack {
            delivery.ack(BasicAckOptions::default()).await?;
        } else {
            info!(worker_id, "rejecting message, routed to dead-letter queue");
            delivery.reject(BasicRejectOptions { requeue: false }).await?;
        }
    }

    Ok(())
}
