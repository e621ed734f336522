use std::sync::Arc;

use clap::Parser;

use s3lurk::bucket::Bucket;
use s3lurk::cli::{Cli, ProviderKind};
use s3lurk::config::Config;
use s3lurk::credentials::has_credentials;
use s3lurk::error::{Result, ScanError};
use s3lurk::logging;
use s3lurk::persistence::{PostgresStore, ResultStore};
use s3lurk::pipeline::{ScanOptions, StoreSink};
use s3lurk::provider::custom::CustomProvider;
use s3lurk::provider::{StorageProvider, aws, digitalocean, dreamhost, gcp, linode, ovh, scaleway, wasabi};
use s3lurk::worker::{broker_pool, file_pool};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.json, cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    config.validate(cli.provider.as_str(), cli.db, cli.needs_mq_config())?;

    let provider = build_provider(&cli, &config).await?;

    let store: Option<Arc<dyn ResultStore>> = if cli.db {
        let db = config.db.as_ref().expect("validated above");
        Some(Arc::new(PostgresStore::connect(&db.uri).await?))
    } else {
        None
    };
    let sink = Arc::new(StoreSink { store });

    let opts = Arc::new(ScanOptions {
        enumerate: cli.enumerate,
        destructive: false,
    });

    if cli.mq {
        let mq_cfg = config.mq.as_ref().expect("validated above");
        broker_pool::run(cli.threads, &mq_cfg.uri, &mq_cfg.queue_name, provider, opts, sink).await;
        return Ok(());
    }

    let (tx, rx) = async_channel::bounded::<Bucket>(cli.threads * 4);

    if let Some(bucket_name) = &cli.bucket {
        tx.send(Bucket::new(bucket_name.clone())).await.ok();
        drop(tx);
        file_pool::run(cli.threads, rx, provider, opts, sink).await;
        return Ok(());
    }

    if let Some(path) = &cli.bucket_file {
        let path = path.clone();
        let feeder = tokio::spawn(async move {
            let result = s3lurk::input::file::feed_from_file(&path, tx).await;
            if let Err(error) = result {
                tracing::error!(%error, "failed to read bucket file");
            }
        });
        file_pool::run(cli.threads, rx, provider, opts, sink).await;
        feeder.await.ok();
        return Ok(());
    }

    unreachable!("clap's ArgGroup guarantees exactly one of bucket/bucket_file/mq is set")
}

async fn build_provider(cli: &Cli, config: &Config) -> Result<Arc<dyn StorageProvider>> {
    let provider: Arc<dyn StorageProvider> = match cli.provider {
        ProviderKind::Aws => {
            let credentialed = has_credentials(None).await;
            Arc::new(aws::AwsProvider::new(credentialed))
        }
        ProviderKind::Gcp => Arc::new(gcp::GcpProvider::new()?),
        ProviderKind::Digitalocean => Arc::new(digitalocean::DigitalOceanProvider::new()?),
        ProviderKind::Linode => Arc::new(linode::LinodeProvider::new()?),
        ProviderKind::Dreamhost => Arc::new(dreamhost::DreamhostProvider::new()?),
        ProviderKind::Wasabi => Arc::new(wasabi::WasabiProvider::new()),
        ProviderKind::Scaleway => Arc::new(scaleway::ScalewayProvider::new()?),
        ProviderKind::Ovh => Arc::new(ovh::OvhProvider::new()?),
        ProviderKind::Custom => {
            let custom_cfg = config
                .providers
                .custom
                .as_ref()
                .ok_or_else(|| ScanError::Config("missing providers.custom section".to_string()))?;
            Arc::new(CustomProvider::new(custom_cfg)?)
        }
    };
    Ok(provider)
}
