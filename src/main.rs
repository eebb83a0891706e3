use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{info, warn};

use ccbot::config::{AppConfig, DEFAULT_CONFIG_PATH};
use ccbot::engine::{BookView, OrderBookEngine, Side};
use ccbot::execution::{BitflyerGateway, ExecutionGateway, GmoGateway, OrderType};
use ccbot::market_data::adapters::{BitflyerAdapter, FeedAdapter, GmoAdapter, Venue};
use ccbot::market_data::driver::{StopReason, StreamDriver};
use ccbot::telemetry;
use ccbot::trade_log::{CsvTradeLogger, TradeLogger};

/// Order book streaming and order entry for bitFlyer and GMO Coin
#[derive(Parser)]
#[clap(name = "ccbot")]
struct Cli {
    /// TOML settings file (optional)
    #[clap(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// bitflyer or gmo
    #[clap(long, global = true)]
    venue: Option<Venue>,

    /// Venue symbol, e.g. FX_BTC_JPY or BTC_JPY
    #[clap(long, global = true)]
    symbol: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[clap(long, global = true, default_value = "info")]
    log: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream the order book and print the top levels on every update
    Stream {
        #[clap(long)]
        depth: Option<usize>,

        /// Serve Prometheus metrics on this port
        #[clap(long)]
        metrics_port: Option<u16>,
    },
    /// Show position, balance and open orders
    Account,
    /// Submit an order: limit with --price, market without
    Order {
        side: Side,
        size: Decimal,
        #[clap(long)]
        price: Option<Decimal>,
    },
    /// Cancel an open order
    Cancel { order_id: String },
    /// Close part or all of an open position (market without --price)
    Settle {
        side: Side,
        size: Decimal,
        position_id: String,
        #[clap(long)]
        price: Option<Decimal>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log);

    let mut overrides = Vec::new();
    if let Some(venue) = cli.venue {
        overrides.push(("venue", venue.to_string()));
    }
    if let Some(symbol) = &cli.symbol {
        overrides.push(("symbol", symbol.clone()));
    }
    if let Command::Stream { depth: Some(depth), .. } = &cli.command {
        overrides.push(("depth", depth.to_string()));
    }
    let settings = AppConfig::load(&cli.config, &overrides)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    info!(venue = %settings.venue, symbol = %settings.symbol, "Settings loaded");

    match cli.command {
        Command::Stream { metrics_port, .. } => {
            if let Some(port) = metrics_port {
                telemetry::init_metrics(port)?;
            }
            let reason = match settings.venue {
                Venue::Bitflyer => {
                    let adapter = BitflyerAdapter::new(&settings.symbol).with_ws_url(settings.ws_url());
                    run_stream(adapter, &settings).await?
                }
                Venue::Gmo => {
                    let adapter = GmoAdapter::new(&settings.symbol).with_ws_url(settings.ws_url());
                    run_stream(adapter, &settings).await?
                }
            };
            info!(?reason, "Stream stopped");
        }
        Command::Account => {
            let gateway = gateway(&settings, settings.order_type)?;
            let position = gateway.get_position().await?;
            let balance = gateway.get_available_balance().await?;
            let open_orders = gateway.list_open_order_ids().await?;
            let positions = gateway.list_open_position_ids().await?;
            let count = gateway.count_open_orders().await?;

            println!("\n=== {} {} ===", settings.venue, settings.symbol);
            println!("Position: {}", position);
            println!("Available balance: {}", balance);
            println!("Open orders ({}): {:?}", count, open_orders);
            println!("Open positions: {:?}", positions);
        }
        Command::Order { side, size, price } => {
            let id = gateway(&settings, order_type_for(price, settings.order_type))?
                .submit_order(side, size, price)
                .await?;
            println!("Submitted {} {} @ {}: {}", side, size, show_price(price), id);
            record(&settings, "order", &[side.to_string(), size.to_string(), show_price(price), id])?;
        }
        Command::Cancel { order_id } => {
            gateway(&settings, settings.order_type)?.cancel_order(&order_id).await?;
            println!("Cancelled {}", order_id);
            record(&settings, "cancel", &[order_id])?;
        }
        Command::Settle { side, size, position_id, price } => {
            let id = gateway(&settings, order_type_for(price, settings.order_type))?
                .settle_position(side, size, &position_id, price)
                .await?;
            println!("Settling {} with {} {} @ {}: {}", position_id, side, size, show_price(price), id);
            record(
                &settings,
                "settle",
                &[side.to_string(), size.to_string(), show_price(price), position_id, id],
            )?;
        }
    }

    Ok(())
}

async fn run_stream<A: FeedAdapter>(adapter: A, settings: &AppConfig) -> anyhow::Result<StopReason> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            return;
        }
        info!("Ctrl+C received, shutting down");
        let _ = shutdown_tx.send(());
    });

    let depth = settings.depth;
    let mut engine = OrderBookEngine::with_policy(&settings.symbol, settings.cross_policy);
    let mut driver = StreamDriver::new(adapter, &mut engine);
    let reason = driver
        .connect_and_run(|view| print_top(view, depth), shutdown_rx)
        .await?;
    Ok(reason)
}

fn print_top(view: &BookView, depth: usize) {
    println!("\n--- asks ---");
    for level in view.asks.iter().take(depth).rev() {
        println!("{:>16} {:>12}", level.price, level.size);
    }
    println!("--- bids ---");
    for level in view.bids.iter().take(depth) {
        println!("{:>16} {:>12}", level.price, level.size);
    }
    match (view.spread(), view.mid()) {
        (Some(spread), Some(mid)) => println!("spread {} mid {}", spread, mid),
        _ => println!("spread N/A"),
    }
}

fn gateway(settings: &AppConfig, order_type: OrderType) -> anyhow::Result<Box<dyn ExecutionGateway>> {
    let credentials = settings.credentials()?;
    let gateway: Box<dyn ExecutionGateway> = match settings.venue {
        Venue::Bitflyer => Box::new(BitflyerGateway::with_base_url(
            settings.rest_url(),
            &settings.symbol,
            order_type,
            credentials,
        )),
        Venue::Gmo => Box::new(GmoGateway::with_base_url(
            settings.rest_url(),
            &settings.symbol,
            order_type,
            credentials,
        )),
    };
    Ok(gateway)
}

// a priced order keeps the configured type; an unpriced one can only be a market order
fn order_type_for(price: Option<Decimal>, configured: OrderType) -> OrderType {
    match price {
        Some(_) => configured,
        None => OrderType::Market,
    }
}

fn show_price(price: Option<Decimal>) -> String {
    price.map(|p| p.to_string()).unwrap_or_else(|| "MARKET".into())
}

// timestamp, venue, symbol, action, then the action's own fields
fn record(settings: &AppConfig, action: &str, fields: &[String]) -> anyhow::Result<()> {
    let Some(path) = &settings.trade_log else {
        return Ok(());
    };
    let mut row = vec![
        chrono::Utc::now().to_rfc3339(),
        settings.venue.to_string(),
        settings.symbol.clone(),
        action.to_string(),
    ];
    row.extend_from_slice(fields);
    CsvTradeLogger::new(path).append_record(&row)?;
    Ok(())
}
