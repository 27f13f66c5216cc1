use std::sync::Arc;

use anyhow::{Error, Result};
use futures_util::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use prepare_service::{
    activities::{dispatch::TriggerDispatcher, snapshot::SnapshotWriter},
    api::run_api_server,
    clients::{card::CardServiceClient, database::DatabaseClient, rbmq::RabbitMqClient},
    config::Config,
    coordinator::PrepareCoordinator,
    utils::process_prepare_request,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = Config::load()?;

    let rabbitmq = Arc::new(RabbitMqClient::connect(&config).await?);
    let database = Arc::new(DatabaseClient::connect(&config.database_url).await?);
    database.run_migrations().await?;
    let card_service = Arc::new(CardServiceClient::new(&config)?);

    let snapshot_writer = SnapshotWriter::new(card_service, database.clone());
    let trigger_dispatcher = TriggerDispatcher::new(
        rabbitmq.clone(),
        database.clone(),
        config.send_delay_seconds,
    );

    let coordinator = PrepareCoordinator::new(
        snapshot_writer,
        trigger_dispatcher,
        config.retry_config(),
    );

    let api_config = config.clone();
    tokio::spawn(async move {
        if let Err(e) = run_api_server(api_config).await {
            error!(error = %e, "Health check server exited");
        }
    });

    info!("Prepare worker started");

    let mut consumer = rabbitmq.create_consumer().await?;

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(error = %e, "Failed to receive delivery");
                continue;
            }
        };

        let payload = String::from_utf8_lossy(&delivery.data).to_string();

        match process_prepare_request(&payload, &coordinator, rabbitmq.as_ref()).await {
            Ok(()) => {
                rabbitmq.acknowledge(delivery.delivery_tag).await?;
            }
            Err(e) => {
                error!(error = %e, "Prepare request failed, parked on failed queue");
                rabbitmq.reject(delivery.delivery_tag, false).await?;
            }
        }
    }

    Ok(())
}
