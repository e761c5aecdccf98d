//! # Command-Line Client
//!
//! Thin wrapper that exercises every operation of the ordering service from a
//! terminal.
//!
//! ## Usage
//!
//! ```bash
//! ys-client --config config/restaurant.toml messages --version V2
//! ys-client --config config/restaurant.toml update-order 123456 Accepted
//! ys-client --config config/restaurant.toml restaurant-state HugeDemand
//! ys-client --config config/restaurant.toml product-options 42 options.json
//! ```
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.

use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{info, LevelFilter};
use serde::Serialize;
use std::io::Write;

use yemeksepeti::client::ServiceClient;
use yemeksepeti::common::config::ServiceConfig;
use yemeksepeti::common::messages::{OrderState, RestaurantState};
use yemeksepeti::processing::{normalize, Node};

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the service configuration file (TOML format)
    ///
    /// Example: config/restaurant.toml
    #[arg(short, long)]
    config: String,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the restaurant menu
    Menu,
    /// Filter menu options of one product from an XML or JSON file of options
    ProductOptions { product_id: String, file: String },
    /// Fetch all pending orders
    Messages {
        #[arg(long, default_value = "V1")]
        version: String,
    },
    /// Fetch the next message
    Message {
        #[arg(long, default_value = "V1")]
        version: String,
    },
    /// Change an order's state
    UpdateOrder {
        order_id: String,
        state: OrderState,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Change the restaurant's availability (Open, Closed, HugeDemand)
    RestaurantState { state: RestaurantState },
    /// List accepted payment methods
    PaymentTypes,
    /// List the restaurant's delivery areas
    DeliveryAreas,
    /// List restaurants of this account
    Restaurants,
    /// Show the restaurant status
    Status,
    /// Show whether the restaurant is open
    IsOpen,
    /// Acknowledge a processed message
    Ack { message_id: String },
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger(verbose: bool) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reads option records from a file: XML is normalized, anything else is
/// parsed as a JSON array of flat records.
fn load_options(path: &str) -> anyhow::Result<Vec<Node>> {
    let content = std::fs::read_to_string(path)?;

    if content.trim_start().starts_with('<') {
        let doc = normalize(&content)?;
        let options = doc.root()?;
        return Ok(match options {
            Node::Object(map) => map
                .iter()
                .filter(|(key, _)| !key.starts_with(['@', '#']))
                .flat_map(|(_, child)| child.items())
                .cloned()
                .collect(),
            other => vec![other.clone()],
        });
    }

    let records: Vec<std::collections::BTreeMap<String, serde_json::Value>> =
        serde_json::from_str(&content)?;
    Ok(records
        .into_iter()
        .map(|record| {
            Node::Object(
                record
                    .into_iter()
                    .map(|(k, v)| {
                        let text = match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, Node::Scalar(text))
                    })
                    .collect(),
            )
        })
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logger(args.verbose);

    let config = ServiceConfig::from_file(&args.config)?;
    info!(
        "🍽️  Catalog {} via {}",
        config.credentials.catalog_name,
        config.service.endpoint()
    );

    let client = ServiceClient::connect(config).await;

    match args.command {
        Command::Menu => print_json(&client.get_menu().await?)?,
        Command::ProductOptions { product_id, file } => {
            let options = load_options(&file)?;
            print_json(&client.get_product_options(&product_id, &options))?
        }
        Command::Messages { version } => print_json(&client.get_all_messages(&version).await?)?,
        Command::Message { version } => print_json(&client.get_message(&version).await?)?,
        Command::UpdateOrder {
            order_id,
            state,
            reason,
        } => print_json(
            &client
                .update_order(&order_id, state, reason.as_deref())
                .await?,
        )?,
        Command::RestaurantState { state } => {
            print_json(&client.update_restaurant_state(state).await?)?
        }
        Command::PaymentTypes => print_json(&client.get_payment_types().await?)?,
        Command::DeliveryAreas => print_json(&client.get_restaurant_delivery_areas().await?)?,
        Command::Restaurants => print_json(&client.get_restaurant_list().await?)?,
        Command::Status => print_json(&client.get_restaurant_status().await?)?,
        Command::IsOpen => print_json(&client.is_restaurant_open().await?)?,
        Command::Ack { message_id } => {
            print_json(&client.set_message_successful(&message_id).await?)?
        }
    }

    Ok(())
}
