use std::sync::Arc;
use clap::{Parser, Subcommand};
use route53_pager::{
    model::{RecordType, ResourceRecord, ResourceRecordSet},
    settings::{LogFormat, Settings},
    transport::{rate_limit::RateLimit, route53::Route53Connector, SharedTransport},
    Client, RecordFilter,
};

#[derive(Debug, Parser)]
#[command(version, about = "Inspect and edit Route 53 hosted zones")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every hosted zone
    Zones,
    /// Show the hosted zone serving a domain
    Zone { domain: String },
    /// List record sets in one or more zones
    Records {
        #[arg(required = true)]
        domains: Vec<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        rr_type: Option<String>,
    },
    /// Add a value to an existing record set
    Append {
        domain: String,
        name: String,
        #[arg(value_name = "TYPE")]
        rr_type: String,
        value: String,
        /// Submit the delete and create as a single change batch
        #[arg(long)]
        atomic: bool,
        /// Wait for the change to propagate
        #[arg(long)]
        wait: bool,
    },
    /// Show or wait for a submitted change
    Change {
        id: String,
        #[arg(long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Settings::new()?;

    match cfg.log_format {
        LogFormat::Text => {
            let subscriber = tracing_subscriber::FmtSubscriber::new();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::fmt().json().finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let client = client(&cfg).await;
    run(client, cfg, cli.command).await
}

async fn client(cfg: &Settings) -> Client {
    let connector = Route53Connector::new()
        .region(cfg.region.clone())
        .endpoint_url(cfg.endpoint_url.clone())
        .rate_limit(cfg.requests_per_second.map(|n| Arc::new(RateLimit::per_second(n))));

    let mut client = if cfg.reuse_transport {
        Client::new(SharedTransport::new(Arc::new(connector.open().await)))
    } else {
        Client::new(connector)
    };
    *client.page_size_mut() = cfg.page_size;

    client
}

async fn run(client: Client, cfg: Settings, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Zones => {
            for zone in client.get_all_zones().await? {
                println!("{}\t{}", zone.short_id(), zone.name);
            }
        }
        Command::Zone { domain } => {
            let zone = client.get_zone_by_name(&domain).await?;
            let details = client.get_zone_details(&zone.id).await?;
            println!("{}\t{}", zone.short_id(), zone.name);
            for ns in details.name_servers {
                println!("  {ns}");
            }
        }
        Command::Records { domains, name, rr_type } => {
            let filter = RecordFilter {
                name,
                rr_type: rr_type.as_deref().map(RecordType::from),
            };

            // Each zone is listed in its own scope.
            let listings = futures::future::try_join_all(domains.iter().map(|domain| {
                let client = &client;
                let filter = filter.clone();
                async move {
                    let zone = client.get_zone_by_name(domain).await?;
                    client.get_record_sets(&zone.id, filter).await
                }
            })).await?;

            for set in listings.into_iter().flatten() {
                print_record_set(&set);
            }
        }
        Command::Append { domain, name, rr_type, value, atomic, wait } => {
            let zone = client.get_zone_by_name(&domain).await?;
            let rr_type = RecordType::from(rr_type.as_str());
            let append = move |mut records: Vec<ResourceRecord>| {
                records.push(ResourceRecord::new(value));
                records
            };

            let info = if atomic {
                client.update_records_atomic(&zone.id, &name, rr_type, append).await?
            } else {
                client.update_records(&zone.id, &name, rr_type, append).await?
            };
            println!("{}\t{:?}", info.id, info.status);

            if wait {
                let info = client.wait_for_change(&info.id, cfg.change_poll_interval()?, cfg.change_timeout()?).await?;
                println!("{}\t{:?}", info.id, info.status);
            }
        }
        Command::Change { id, wait } => {
            let info = if wait {
                client.wait_for_change(&id, cfg.change_poll_interval()?, cfg.change_timeout()?).await?
            } else {
                client.get_change(&id).await?
            };
            println!("{}\t{:?}", info.id, info.status);
        }
    }

    Ok(())
}

fn print_record_set(set: &ResourceRecordSet) {
    let ttl = set.ttl.map(|t| t.to_string()).unwrap_or_else(|| "-".to_owned());
    for record in &set.records {
        println!("{}\t{}\t{}\t{}", set.name, ttl, set.rr_type, record.value);
    }
}
