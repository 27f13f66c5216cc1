use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        BasicRejectOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable},
};
use tracing::{debug, info};

use crate::{
    activities::{DeadLetterQueue, DeliveryQueue},
    config::Config,
    models::message::DlqMessage,
};

/// RabbitMQ client covering both sides of this service: consuming prepare
/// requests and submitting delayed triggers to the data queue.
///
/// Delayed visibility uses the per-message-TTL plus dead-letter pattern: the
/// trigger is published to a holding queue with no consumers whose dead
/// letter routing targets the data queue, carrying an expiration equal to
/// the remaining delay. The delay is uniform per deployment, so TTL expiry
/// order stays FIFO.
pub struct RabbitMqClient {
    channel: Channel,
    prepare_queue_name: String,
    data_queue_name: String,
    delay_queue_name: String,
    failed_queue_name: String,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to RabbitMQ");

        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|_| anyhow!("Failed to connect to RabbitMQ"))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|_| anyhow!("RabbitMQ channel creation failed"))?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to set up QoS"))?;

        channel
            .queue_declare(
                &config.prepare_queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to declare prepare queue"))?;

        channel
            .queue_declare(
                &config.data_queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to declare data queue"))?;

        channel
            .queue_declare(
                &config.failed_queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to declare failed queue"))?;

        let mut delay_args = FieldTable::default();
        delay_args.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString("".into()),
        );
        delay_args.insert(
            "x-dead-letter-routing-key".into(),
            AMQPValue::LongString(config.data_queue_name.as_str().into()),
        );

        channel
            .queue_declare(
                &config.delay_queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                delay_args,
            )
            .await
            .map_err(|_| anyhow!("Failed to declare delay queue"))?;

        info!(
            prepare_queue = %config.prepare_queue_name,
            data_queue = %config.data_queue_name,
            delay_queue = %config.delay_queue_name,
            "RabbitMQ queues declared"
        );

        Ok(Self {
            channel,
            prepare_queue_name: config.prepare_queue_name.clone(),
            data_queue_name: config.data_queue_name.clone(),
            delay_queue_name: config.delay_queue_name.clone(),
            failed_queue_name: config.failed_queue_name.clone(),
        })
    }

    pub async fn create_consumer(&self) -> Result<Consumer, Error> {
        let consumer = self
            .channel
            .basic_consume(
                &self.prepare_queue_name,
                "prepare_worker",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to create consumer"))?;

        info!(queue = %self.prepare_queue_name, "Consumer created for prepare queue");

        Ok(consumer)
    }

    pub async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|_| anyhow!("Failed to acknowledge message"))?;

        Ok(())
    }

    pub async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error> {
        self.channel
            .basic_reject(delivery_tag, BasicRejectOptions { requeue })
            .await
            .map_err(|_| anyhow!("Failed to reject message"))?;

        Ok(())
    }
}

#[async_trait]
impl DeadLetterQueue for RabbitMqClient {
    async fn publish(&self, message: &DlqMessage) -> Result<(), Error> {
        let payload = serde_json::to_vec(message)?;

        self.channel
            .basic_publish(
                "",
                &self.failed_queue_name,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|_| anyhow!("Failed to publish message to dlq"))?;

        Ok(())
    }
}

#[async_trait]
impl DeliveryQueue for RabbitMqClient {
    async fn submit(&self, payload: &[u8], visible_at: DateTime<Utc>) -> Result<(), Error> {
        let delay_ms = (visible_at - Utc::now()).num_milliseconds().max(0);

        debug!(
            delay_ms,
            data_queue = %self.data_queue_name,
            "Submitting delayed trigger"
        );

        self.channel
            .basic_publish(
                "",
                &self.delay_queue_name,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_expiration(delay_ms.to_string().into()),
            )
            .await
            .map_err(|_| anyhow!("Failed to submit trigger to delay queue"))?;

        Ok(())
    }
}
