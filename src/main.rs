use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::{Order, OrderKind, OrderSide, OrderStatus};
use engine::{EngineHandle, PaperEngine};
use feed::{BinanceClient, FeedPoller};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// The main entry point for the papertrade simulator.
#[tokio::main]
async fn main() {
    // Initialize structured logging. RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Trade => {
            if let Err(e) = handle_trade().await {
                eprintln!("Error during trading session: {}", e);
            }
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A paper-trading simulator that matches virtual orders against a live price feed.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive paper-trading session against the live feed.
    Trade,
}

// ==============================================================================
// Trade Command Logic
// ==============================================================================

/// Wires the feed poller into the engine and drives the interactive session.
async fn handle_trade() -> anyhow::Result<()> {
    let config = configuration::load_config()?;

    let engine = EngineHandle::new(PaperEngine::new(
        &config.pair.base_asset,
        &config.pair.quote_asset,
        config.account.initial_quote,
    ));

    let client = Arc::new(BinanceClient::new(&config.feed));
    let poller = FeedPoller::new(
        client,
        &config.pair.symbol,
        &config.feed.interval,
        config.feed.poll_secs,
    );
    let mut kline_rx = poller.subscribe();

    println!(
        "--- Paper trading {} with {} {} ---",
        config.pair.label(),
        config.account.initial_quote,
        config.pair.quote_asset
    );
    println!(
        "Commands: buy <qty> [@ <price>] | sell <qty> [@ <price>] | cancel <id> | \
         orders [open|filled] | balance | price | quit"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            Some(kline) = kline_rx.recv() => {
                for order in engine.on_price_update(kline.close).await {
                    println!(
                        ">>> Filled: {:?} {} {} @ {}",
                        order.side, order.quantity, order.pair, order.limit_price
                    );
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(input) => {
                        if !dispatch_command(&engine, &config.pair.quote_asset, &config.pair.base_asset, input.trim()).await {
                            break;
                        }
                    }
                    // stdin closed (e.g. piped input ran out).
                    None => break,
                }
            }
        }
    }

    // Session summary: every order ever placed, newest first.
    let orders = engine.orders().await;
    if !orders.is_empty() {
        println!("\n--- Session summary ---");
        println!("{}", render_orders(orders.iter().rev()));
    }
    let balance = engine.balance().await;
    println!(
        "Final balance: {} {} | {} {}",
        balance.quote, config.pair.quote_asset, balance.base, config.pair.base_asset
    );

    Ok(())
}

/// Parses and executes one interactive command. Returns `false` to end the session.
async fn dispatch_command(
    engine: &EngineHandle,
    quote_asset: &str,
    base_asset: &str,
    input: &str,
) -> bool {
    let parts: Vec<&str> = input.split_whitespace().collect();

    match parts.as_slice() {
        [] => {}
        ["quit"] | ["exit"] => return false,
        ["help"] => {
            println!(
                "buy <qty> [@ <price>] | sell <qty> [@ <price>] | cancel <id> | \
                 orders [open|filled] | balance | price | quit"
            );
        }
        ["balance"] => {
            let balance = engine.balance().await;
            println!(
                "{} {} | {} {}",
                balance.quote, quote_asset, balance.base, base_asset
            );
        }
        ["price"] => match engine.last_price().await {
            Some(price) => println!("{} {}", price, quote_asset),
            None => println!("No price received yet."),
        },
        ["orders"] => println!("{}", render_orders(engine.orders().await.iter().rev())),
        ["orders", "open"] => {
            let orders = engine.orders().await;
            println!(
                "{}",
                render_orders(
                    orders
                        .iter()
                        .filter(|o| o.status == OrderStatus::Open)
                        .rev()
                )
            );
        }
        ["orders", "filled"] => {
            let orders = engine.orders().await;
            println!(
                "{}",
                render_orders(
                    orders
                        .iter()
                        .filter(|o| o.status == OrderStatus::Filled)
                        .rev()
                )
            );
        }
        ["cancel", id] => match find_order_id(engine, id).await {
            Some(order_id) => match engine.cancel_order(order_id).await {
                Some(order) => println!("Canceled {}", order.id),
                None => println!("Order is no longer open."),
            },
            None => println!("No open order matches id '{}'.", id),
        },
        [verb @ ("buy" | "sell"), qty, rest @ ..] => {
            let side = if *verb == "buy" {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            let Ok(quantity) = Decimal::from_str(qty) else {
                println!("Invalid quantity '{}'.", qty);
                return true;
            };
            let (kind, limit_price) = match rest {
                [] => (OrderKind::Market, None),
                ["@", price] => match Decimal::from_str(price) {
                    Ok(p) => (OrderKind::Limit, Some(p)),
                    Err(_) => {
                        println!("Invalid price '{}'.", price);
                        return true;
                    }
                },
                _ => {
                    println!("Usage: {} <qty> [@ <price>]", verb);
                    return true;
                }
            };
            match engine.place_order(kind, side, quantity, limit_price).await {
                Ok(order) => println!(
                    "Placed {:?} {:?} {} @ {} ({:?}) id={}",
                    order.kind, order.side, order.quantity, order.limit_price, order.status, order.id
                ),
                Err(e) => println!("Rejected: {}", e),
            }
        }
        _ => println!("Unknown command '{}'. Type 'help' for usage.", input),
    }

    true
}

/// Resolves a (possibly abbreviated) order id against the open orders.
async fn find_order_id(engine: &EngineHandle, prefix: &str) -> Option<uuid::Uuid> {
    let orders = engine.orders().await;
    let mut matches = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Open && o.id.to_string().starts_with(prefix));

    match (matches.next(), matches.next()) {
        (Some(order), None) => Some(order.id),
        // Ambiguous prefixes are treated as no match.
        _ => None,
    }
}

/// Renders orders in the same columns the web order tables used.
fn render_orders<'a>(orders: impl Iterator<Item = &'a Order>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Id", "Pair", "Type", "Side", "Price", "Amount", "Filled", "Total", "Status",
    ]);

    for order in orders {
        table.add_row(vec![
            order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            order.id.to_string(),
            order.pair.clone(),
            format!("{:?}", order.kind),
            format!("{:?}", order.side),
            order.limit_price.to_string(),
            order.quantity.to_string(),
            order.filled_display().to_string(),
            order.notional.round_dp(2).to_string(),
            format!("{:?}", order.status),
        ]);
    }

    table
}
