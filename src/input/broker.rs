//! AMQP 0-9-1 connection and queue topology.

use lapin::options::{BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use serde::Deserialize;

use crate::error::Result;

/// The JSON payload a broker message carries: just the candidate bucket
/// name, under the wire key `name`.
#[derive(Debug, Deserialize)]
pub struct BrokerMessage {
    #[serde(rename = "name")]
    pub bucket: String,
}

pub async fn connect(uri: &str) -> Result<Connection> {
    Ok(Connection::connect(uri, ConnectionProperties::default()).await?)
}

/// Declares `<queue>_dead` and `<queue>` (the latter dead-lettering into
/// the former) and sets the channel's prefetch to `prefetch`, matching
/// `mq.go::Connect` exactly.
pub async fn declare_topology(channel: &Channel, queue: &str, prefetch: u16) -> Result<()> {
    let dead_letter_queue = format!("{queue}_dead");

    channel
        .queue_declare(&dead_letter_queue, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
        .await?;

    let mut args = FieldTable::default();
    args.insert("x-dead-letter-exchange".into(), lapin::types::AMQPValue::LongString("".into()));
    args.insert("x-dead-letter-routing-key".into(), lapin::types::AMQPValue::LongString(dead_letter_queue.into()));

    channel
        .queue_declare(queue, QueueDeclareOptions { durable: true, ..Default::default() }, args)
        .await?;

    channel.basic_qos(prefetch, BasicQosOptions::default()).await?;

    Ok(())
}
