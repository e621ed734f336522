//! Command-line surface, matching the flag set one-to-one via `clap`
//! derive macros. The mutual exclusion the Go source enforces by hand in a
//! post-parse `Validate()` function is expressed natively here through
//! `clap::ArgGroup`.

use clap::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum ProviderKind {
    Aws,
    Gcp,
    Digitalocean,
    Linode,
    Dreamhost,
    Wasabi,
    Scaleway,
    Ovh,
    Custom,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Digitalocean => "digitalocean",
            Self::Linode => "linode",
            Self::Dreamhost => "dreamhost",
            Self::Wasabi => "wasabi",
            Self::Scaleway => "scaleway",
            Self::Ovh => "ovh",
            Self::Custom => "custom",
        }
    }
}

/// Multi-provider S3 bucket discovery and permission scanner.
#[derive(Debug, Parser)]
#[command(name = "s3lurk", version, about)]
#[command(group(
    clap::ArgGroup::new("input")
        .required(true)
        .args(["bucket", "bucket_file", "mq"]),
))]
pub struct Cli {
    /// A single bucket name to scan.
    #[arg(long = "bucket")]
    pub bucket: Option<String>,

    /// A file containing one candidate bucket name per line.
    #[arg(long = "bucket-file")]
    pub bucket_file: Option<String>,

    /// Consume candidate bucket names from the AMQP queue configured under
    /// `mq.queue_name` instead of a file.
    #[arg(long = "mq")]
    pub mq: bool,

    /// Which provider's adapter to scan against.
    #[arg(long = "provider", value_enum, default_value_t = ProviderKind::Aws)]
    pub provider: ProviderKind,

    /// Persist results to the database configured under `db.uri`.
    #[arg(long = "db")]
    pub db: bool,

    /// Emit structured JSON log lines instead of the human formatter.
    #[arg(long = "json")]
    pub json: bool,

    /// Enumerate every object in buckets found to exist.
    #[arg(long = "enumerate")]
    pub enumerate: bool,

    /// Worker pool size.
    #[arg(long = "threads", default_value_t = 4)]
    pub threads: usize,

    /// Enable debug-level logging.
    #[arg(long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    pub fn needs_mq_config(&self) -> bool {
        self.mq
    }
}
