use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use soi_checkout::application::checkout::{CheckoutConfig, CheckoutSequencer};
use soi_checkout::application::inquiry::submit_inquiry;
use soi_checkout::domain::catalog::Catalog;
use soi_checkout::domain::money::Price;
use soi_checkout::domain::order::{OrderPayload, SubmissionStatus};
use soi_checkout::infrastructure::email_relay::{OutboxNotifier, RelayConfig};
use soi_checkout::interfaces::csv::cart_reader::CartReader;
use soi_checkout::interfaces::json::{read_details, read_inquiry};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the product catalog
    Catalog,
    /// Place an order from a cart CSV and a customer details JSON file
    Order(OrderArgs),
    /// Send a contact-form inquiry from a JSON file
    Inquiry(InquiryArgs),
}

#[derive(Args)]
struct RelayArgs {
    /// Email relay service id
    #[arg(long, env = "SOI_SERVICE_ID")]
    service_id: Option<String>,

    /// Email relay public key
    #[arg(long, env = "SOI_PUBLIC_KEY")]
    public_key: Option<String>,

    /// File that relay requests are appended to (defaults to stderr)
    #[arg(long)]
    outbox: Option<PathBuf>,
}

#[derive(Args)]
struct OrderArgs {
    /// Cart CSV file with `product,variant,quantity` rows
    cart: PathBuf,

    /// Customer details JSON file
    #[arg(long)]
    details: PathBuf,

    /// Reference of the UPI payment made by the shopper
    #[arg(long, default_value = "")]
    payment_ref: String,

    /// Delivery fee in rupees
    #[arg(long, default_value = "30")]
    delivery_fee: rust_decimal::Decimal,

    /// Merchant UPI address shown for payment
    #[arg(long, env = "SOI_UPI_ID", default_value = "spiceofindia@upi")]
    upi_id: String,

    /// Email relay template used for orders
    #[arg(long, env = "SOI_ORDER_TEMPLATE_ID")]
    template_id: Option<String>,

    #[command(flatten)]
    relay: RelayArgs,
}

#[derive(Args)]
struct InquiryArgs {
    /// Inquiry JSON file with name, email, type and message
    input: PathBuf,

    /// Email relay template used for inquiries
    #[arg(long, env = "SOI_INQUIRY_TEMPLATE_ID")]
    template_id: Option<String>,

    #[command(flatten)]
    relay: RelayArgs,
}

#[derive(Serialize)]
struct Receipt<'a> {
    status: SubmissionStatus,
    simulated: bool,
    payment_link: String,
    order: &'a OrderPayload,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Catalog => print_catalog(&Catalog::spices()),
        Command::Order(args) => place_order(args).await,
        Command::Inquiry(args) => send_inquiry(args).await,
    }
}

fn print_catalog(catalog: &Catalog) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for product in catalog.products() {
        let prices: Vec<String> = product
            .prices
            .iter()
            .map(|p| format!("{} {}", p.variant, p.price))
            .collect();
        writeln!(out, "{}\t{}\t{}", product.id, product.name, prices.join(", ")).into_diagnostic()?;
    }
    Ok(())
}

fn outbox(relay: &RelayArgs, template_id: Option<String>) -> Result<OutboxNotifier> {
    let config = RelayConfig::new(
        relay.service_id.clone(),
        template_id,
        relay.public_key.clone(),
    );
    let sink: Box<dyn Write + Send> = match &relay.outbox {
        Some(path) => Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()?,
        ),
        None => Box::new(io::stderr()),
    };
    Ok(OutboxNotifier::new(config, sink))
}

async fn place_order(args: OrderArgs) -> Result<()> {
    let defaults = CheckoutConfig::default();
    let config = CheckoutConfig::new(
        Price::new(args.delivery_fee),
        args.upi_id.clone(),
        defaults.payee_name(),
    )
    .into_diagnostic()?;
    let notifier = outbox(&args.relay, args.template_id.clone())?;
    let mut checkout = CheckoutSequencer::new(Catalog::spices(), config, Box::new(notifier));

    // Fill the cart, skipping rows that cannot be read or added
    let file = File::open(&args.cart).into_diagnostic()?;
    for entry in CartReader::new(file).entries() {
        match entry {
            Ok(entry) => {
                if let Err(e) = checkout.add_to_cart(&entry.product, &entry.variant, entry.quantity) {
                    warn!(error = %e, "Skipping cart row");
                }
            }
            Err(e) => warn!(error = %e, "Skipping cart row"),
        }
    }

    let totals = checkout.compute_totals();
    info!(subtotal = %totals.subtotal, delivery_fee = %totals.delivery_fee, total = %totals.total, "Cart ready");
    checkout.advance_to_details().into_diagnostic()?;

    let details = read_details(File::open(&args.details).into_diagnostic()?).into_diagnostic()?;
    checkout.submit_details(details).into_diagnostic()?;

    let payment_link = checkout.payment_target().into_diagnostic()?.upi_link();
    info!(link = %payment_link, "Awaiting payment");

    let confirmation = checkout.confirm_payment(&args.payment_ref).await.into_diagnostic()?;

    let receipt = Receipt {
        status: checkout.status(),
        simulated: confirmation.simulated,
        payment_link,
        order: &confirmation.order,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &receipt).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;

    checkout.reset();
    Ok(())
}

async fn send_inquiry(args: InquiryArgs) -> Result<()> {
    let notifier = outbox(&args.relay, args.template_id.clone())?;
    let inquiry = read_inquiry(File::open(&args.input).into_diagnostic()?).into_diagnostic()?;
    let delivered = submit_inquiry(&notifier, &inquiry).await.into_diagnostic()?;
    println!("{}", if delivered { "Inquiry sent" } else { "Inquiry not sent (relay not configured)" });
    Ok(())
}
