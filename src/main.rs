use clap::{Parser, ValueEnum};
use marketplace_ledger::application::ledger::OrderLedger;
use marketplace_ledger::config::LedgerConfig;
use marketplace_ledger::domain::ports::{AddressBookBox, CatalogStoreBox, LedgerStoreBox};
use marketplace_ledger::infrastructure::carrier::SimulatedCarrier;
use marketplace_ledger::infrastructure::gateway::{GatewayMode, SimulatedGateway};
use marketplace_ledger::infrastructure::in_memory::InMemoryStore;
use marketplace_ledger::infrastructure::notifier::LogNotifier;
#[cfg(feature = "storage-rocksdb")]
use marketplace_ledger::infrastructure::rocksdb::RocksDBStore;
use marketplace_ledger::interfaces::csv::command_reader::CommandReader;
use marketplace_ledger::interfaces::csv::ledger_writer::LedgerWriter;
use marketplace_ledger::interfaces::csv::seed_reader::SeedReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GatewayArg {
    Approve,
    Decline,
    Offline,
}

impl From<GatewayArg> for GatewayMode {
    fn from(arg: GatewayArg) -> Self {
        match arg {
            GatewayArg::Approve => GatewayMode::Approve,
            GatewayArg::Decline => GatewayMode::Decline,
            GatewayArg::Offline => GatewayMode::Offline,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input lifecycle commands CSV file
    commands: PathBuf,

    /// Catalog listings to seed (id,seller,title,price,currency)
    #[arg(long)]
    items: Option<PathBuf>,

    /// Shipping addresses to seed (id,owner,line1,line2,city,emirate,postal_code,country)
    #[arg(long)]
    addresses: Option<PathBuf>,

    /// TOML file with [pricing] and [shipping] settings
    #[arg(long, env = "LEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Where to write the transaction ledger CSV
    #[arg(long)]
    ledger_out: Option<PathBuf>,

    /// How the simulated payment gateway answers
    #[arg(long, value_enum, default_value_t = GatewayArg::Approve)]
    gateway: GatewayArg,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct Stores {
    ledger: LedgerStoreBox,
    catalog: CatalogStoreBox,
    addresses: AddressBookBox,
}

fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(path) = db_path {
        let store = RocksDBStore::open(&path)?;
        info!(path = %path.display(), "using RocksDB storage");
        return Ok(Stores {
            ledger: Box::new(store.clone()),
            catalog: Box::new(store.clone()),
            addresses: Box::new(store),
        });
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    let store = InMemoryStore::new();
    Ok(Stores {
        ledger: Box::new(store.clone()),
        catalog: Box::new(store.clone()),
        addresses: Box::new(store),
    })
}

async fn seed(stores: &Stores, items: Option<&Path>, addresses: Option<&Path>) -> Result<()> {
    if let Some(path) = items {
        let file = File::open(path).into_diagnostic()?;
        for item in SeedReader::new(file).items() {
            match item {
                Ok(item) => {
                    let id = item.id;
                    if let Err(e) = stores.catalog.add_item(item).await {
                        warn!(item_id = %id, error = %e, "skipping item");
                    }
                }
                Err(e) => warn!(error = %e, "skipping malformed item row"),
            }
        }
        let listed = stores.catalog.items().await?.len();
        info!(items = listed, "catalog seeded");
    }

    if let Some(path) = addresses {
        let file = File::open(path).into_diagnostic()?;
        for address in SeedReader::new(file).addresses() {
            match address {
                Ok(address) => {
                    let id = address.id;
                    if let Err(e) = stores.addresses.add_address(address).await {
                        warn!(address_id = %id, error = %e, "skipping address");
                    }
                }
                Err(e) => warn!(error = %e, "skipping malformed address row"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };

    let stores = open_stores(cli.db_path.clone())?;
    seed(&stores, cli.items.as_deref(), cli.addresses.as_deref()).await?;

    let Stores { ledger: store, .. } = stores;
    let ledger = OrderLedger::new(
        store,
        Box::new(SimulatedGateway::new(cli.gateway.into())),
        Box::new(SimulatedCarrier::new()),
        Box::new(LogNotifier),
    )
    .with_config(&config);

    // Process commands
    let file = File::open(&cli.commands).into_diagnostic()?;
    for (row, command) in CommandReader::new(file).commands().enumerate() {
        let row = row + 1;
        match command {
            Ok(command) => {
                let name = command.name();
                match ledger.execute(command).await {
                    Ok(order) => debug!(
                        row,
                        command = name,
                        order_id = %order.id,
                        status = %order.order_status,
                        "command applied"
                    ),
                    Err(e) => error!(row, command = name, error = %e, "failed to process command"),
                }
            }
            Err(e) => error!(row, error = %e, "failed to read command"),
        }
    }

    let results = ledger.into_results().await?;

    let stdout = io::stdout();
    LedgerWriter::new(stdout.lock()).write_orders(&results.orders)?;

    if let Some(path) = cli.ledger_out {
        let file = File::create(path).into_diagnostic()?;
        LedgerWriter::new(file).write_transactions(&results.transactions)?;
    }

    Ok(())
}
