//! Cadenza Booking CLI
//!
//! Inspect availability, price a date range and make reservations for
//! rental products from the terminal.
//!
//! ```sh
//! # Remaining stock per day, as availability spans
//! booking-cli availability --product-id 7 --stock 5 --unit-price 1500
//!
//! # Price a range without booking it
//! booking-cli quote --product-id 7 --stock 5 --unit-price 1500 \
//!     --start 2026-06-01 --end 2026-06-03 --quantity 2
//!
//! # Reserve the range (needs auth in the config or --token/--user-id)
//! booking-cli book --product-id 7 --stock 5 --unit-price 1500 \
//!     --start 2026-06-01 --end 2026-06-03 --quantity 2
//!
//! # Any command against an in-memory backend instead of the real one
//! booking-cli --offline availability --product-id 7 --stock 5 --unit-price 1500
//!
//! # Validate config without talking to the backend
//! booking-cli check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use cadenza_booking::application::{AvailabilityIndex, BookingSession, ClickOutcome};
use cadenza_booking::application::pricing::format_amount;
use cadenza_booking::config::{default_config_path, AppConfig, LoggingConfig};
use cadenza_booking::domain::{ProductSnapshot, ReservationGateway};
use cadenza_booking::infrastructure::http::{HttpGatewayConfig, HttpReservationGateway};
use cadenza_booking::infrastructure::memory::{InMemoryReservationGateway, StaticIdentity};
use cadenza_booking::notifications::create_event_bus;

/// Cadenza Booking: availability and reservations for rental products.
#[derive(Parser, Debug)]
#[command(
    name = "booking-cli",
    version,
    about = "Availability, quotes and reservations for rental products",
    long_about = "Cadenza Booking CLI: per-day availability, price quotes and \
                  reservation submission against the marketplace REST backend.\n\n\
                  Default config: ~/.config/cadenza-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BOOKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the marketplace backend base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Override the bearer token used for submissions.
    #[arg(long, env = "BOOKING_TOKEN")]
    token: Option<String>,

    /// Override the marketplace user id.
    #[arg(long)]
    user_id: Option<i64>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Use an in-memory backend instead of the marketplace API.
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show remaining stock per day for a product
    Availability(AvailabilityArgs),
    /// Price a date range without booking it
    Quote(RangeArgs),
    /// Reserve a date range
    Book(RangeArgs),
    /// Validate the configuration file and exit
    Check,
}

/// Product metadata the marketplace page would supply
#[derive(Args, Debug)]
struct ProductArgs {
    /// Product id on the marketplace.
    #[arg(long)]
    product_id: i64,

    /// Units the owner stocks.
    #[arg(long)]
    stock: i64,

    /// Rental price per unit per day, in minor currency units (cents).
    #[arg(long)]
    unit_price: i64,

    /// ISO 4217 currency code.
    #[arg(long, default_value = "EUR")]
    currency: String,

    /// Bookable window in months, overriding the config.
    #[arg(long)]
    months: Option<u32>,
}

#[derive(Args, Debug)]
struct AvailabilityArgs {
    #[command(flatten)]
    product: ProductArgs,
}

#[derive(Args, Debug)]
struct RangeArgs {
    #[command(flatten)]
    product: ProductArgs,

    /// First rental day (YYYY-MM-DD).
    #[arg(long)]
    start: NaiveDate,

    /// Last rental day, inclusive (YYYY-MM-DD).
    #[arg(long)]
    end: NaiveDate,

    /// Units to rent.
    #[arg(long, default_value_t = 1)]
    quantity: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides before logging starts ──────────────
    if let Some(url) = cli.base_url {
        config.api.base_url = url;
    }
    if let Some(token) = cli.token {
        config.auth.bearer_token = Some(token);
    }
    if let Some(user_id) = cli.user_id {
        config.auth.user_id = Some(user_id);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    match load_error {
        Some(e) => error!(
            "Failed to load config from {}: {}. Using defaults.",
            config_path.display(),
            e
        ),
        None => info!("Configuration loaded from {}", config_path.display()),
    }

    match cli.command {
        Commands::Availability(args) => run_availability(&config, args, cli.offline).await,
        Commands::Quote(args) => run_quote(&config, args, cli.offline).await,
        Commands::Book(args) => run_book(&config, args, cli.offline).await,
        Commands::Check => {
            println!("✅ Configuration is valid");
            println!("   Config file : {}", config_path.display());
            println!("   Backend     : {}", config.api.base_url);
            println!("   Timeout     : {}s", config.api.timeout_secs);
            println!("   Window      : {} months", config.booking.window_months);
            let account = if config.auth.is_configured() {
                "configured"
            } else {
                "browse-only"
            };
            println!("   Account     : {}", account);
            println!("   Log level   : {}", config.logging.level);
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Build a refreshed session for the product named on the command line.
async fn start_session(
    config: &AppConfig,
    product: &ProductArgs,
    offline: bool,
) -> Result<BookingSession, Box<dyn std::error::Error>> {
    let identity = match (config.auth.user_id, config.auth.bearer_token.clone()) {
        (Some(user_id), Some(token)) => StaticIdentity::signed_in(user_id, token),
        _ => StaticIdentity::signed_out(),
    };

    let gateway: Arc<dyn ReservationGateway> = if offline {
        info!("Offline mode: reservations stay on this machine");
        let gateway = InMemoryReservationGateway::new();
        gateway.set_stock(product.product_id, product.stock);
        Arc::new(gateway)
    } else {
        Arc::new(HttpReservationGateway::new(
            HttpGatewayConfig {
                base_url: config.api.base_url.clone(),
                timeout: config.api.timeout(),
            },
            Arc::new(identity.clone()),
        )?)
    };

    let snapshot = ProductSnapshot::new(
        product.product_id,
        product.stock,
        product.unit_price,
        &product.currency,
    );
    let window_months = product.months.unwrap_or(config.booking.window_months);

    let mut session = BookingSession::new(
        snapshot,
        gateway,
        Arc::new(identity),
        create_event_bus(),
        window_months,
    );
    session.refresh().await?;
    Ok(session)
}

async fn run_availability(
    config: &AppConfig,
    args: AvailabilityArgs,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = start_session(config, &args.product, offline).await?;
    let index = session.availability();
    let window = index.window();

    println!(
        "Product {}: remaining units {}..{}",
        args.product.product_id, window.start, window.end
    );
    print_spans(index);

    println!();
    print!("{}", render_calendar(index));
    if index.days().any(|(_, left)| left <= 0) {
        println!("[d] = booked out");
    }
    Ok(())
}

/// Collapse runs of days with equal remaining stock into spans.
fn print_spans(index: &AvailabilityIndex) {
    let mut days = index.days();
    let Some((first_day, first_left)) = days.next() else {
        return;
    };
    let mut span_start = first_day;
    let mut span_end = first_day;
    let mut span_left = first_left;
    for (day, left) in days {
        if left == span_left {
            span_end = day;
            continue;
        }
        print_span(span_start, span_end, span_left);
        span_start = day;
        span_end = day;
        span_left = left;
    }
    print_span(span_start, span_end, span_left);
}

fn print_span(start: NaiveDate, end: NaiveDate, left: i64) {
    let marker = if left <= 0 { "  (booked out)" } else { "" };
    println!("  {}..{}  {}{}", start, end, left, marker);
}

/// Render the window as month grids, bracketing booked-out days.
fn render_calendar(index: &AvailabilityIndex) -> String {
    let mut out = String::new();
    let mut current_month: Option<(i32, u32)> = None;
    let mut line = String::new();

    for (day, left) in index.days() {
        let month = (day.year(), day.month());
        if current_month != Some(month) {
            if !line.is_empty() {
                out.push_str(line.trim_end());
                out.push('\n');
                line.clear();
            }
            if current_month.is_some() {
                out.push('\n');
            }
            current_month = Some(month);
            out.push_str(&format!("{}\n", day.format("%B %Y")));
            out.push_str(" Mo  Tu  We  Th  Fr  Sa  Su\n");
            line.push_str(&"    ".repeat(day.weekday().num_days_from_monday() as usize));
        }
        if left > 0 {
            line.push_str(&format!(" {:>2} ", day.day()));
        } else {
            line.push_str(&format!("[{:>2}]", day.day()));
        }
        if day.weekday() == Weekday::Sun {
            out.push_str(line.trim_end());
            out.push('\n');
            line.clear();
        }
    }
    if !line.is_empty() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

async fn run_quote(
    config: &AppConfig,
    args: RangeArgs,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = start_session(config, &args.product, offline).await?;
    select_range(&mut session, &args)?;

    let quote = session.quote();
    println!(
        "{} day(s) × {} unit(s) × {}",
        quote.duration_days,
        quote.quantity,
        format_amount(quote.unit_price_minor, &quote.currency)
    );
    println!("Subtotal: {}", quote.format_subtotal());
    Ok(())
}

async fn run_book(
    config: &AppConfig,
    args: RangeArgs,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = start_session(config, &args.product, offline).await?;
    select_range(&mut session, &args)?;
    let quote = session.quote();

    let confirmation = session.submit().await?;
    println!(
        "✅ Reservation {} ({}): {} for {}..{}",
        confirmation.reservation_id,
        confirmation.status,
        quote.format_subtotal(),
        args.start,
        args.end
    );
    Ok(())
}

/// Drive the two-click selection with the range from the command line.
fn select_range(
    session: &mut BookingSession,
    args: &RangeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    session.set_quantity(args.quantity);
    session.click(args.start)?;
    match session.click(args.end)? {
        ClickOutcome::RangeCompleted(range) => {
            info!(%range, quantity = args.quantity, "Range selected");
            Ok(())
        }
        ClickOutcome::StartSet(_) => unreachable!("second click cannot start a range"),
    }
}

// ── Tests ──────────────────────────────────────────────────────
