//! Kitledger CLI
//!
//! Seeds a store from fixtures and runs a single command against it: browse the catalog,
//! list or inspect orders, move an order through its lifecycle, place an order, or print
//! dashboard figures.

use std::{
    io::{self, Write},
    process::ExitCode,
    time::Instant,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use humanize_duration::{Truncate, prelude::DurationExt};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use tracing::info;

use kitledger::{
    config::{LoggingConfig, StoreConfig},
    observability::init_subscriber,
    prelude::*,
};

/// Kitledger: order ledger for medical collection kits
#[derive(Debug, Parser)]
#[command(name = "kitledger", about = "Medical collection kit order ledger", long_about = None)]
struct Cli {
    /// Store settings.
    #[command(flatten)]
    store: StoreConfig,

    /// Logging output settings.
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Load configuration from environment and CLI arguments
    fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalog products
    Products {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Hide out-of-stock products
        #[arg(long)]
        in_stock: bool,

        /// Match against name or description
        #[arg(short, long)]
        search: Option<String>,

        /// Result ordering
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
    },

    /// List orders, most recent first
    Orders {
        /// Only orders with this status
        #[arg(long)]
        status: Option<OrderStatus>,

        /// Only orders with this payment status
        #[arg(long)]
        payment: Option<PaymentStatus>,

        /// Only orders placed by the purchaser with this email
        #[arg(long)]
        email: Option<String>,
    },

    /// Print an order's invoice and tracking history
    Order {
        /// Order identifier
        id: String,
    },

    /// Move an order to a new status, optionally updating its payment status
    Status {
        /// Order identifier
        id: String,

        /// New order status
        status: OrderStatus,

        /// New payment status
        #[arg(long)]
        payment: Option<PaymentStatus>,
    },

    /// Check out a cart as a purchaser
    Place {
        /// Email of the purchaser placing the order
        #[arg(short, long)]
        email: String,

        /// Payment method (credit-card, pay-later, purchase-order)
        #[arg(short, long, default_value = "credit-card")]
        payment: PaymentMethod,

        /// Cart lines as `product-id=quantity` (quantity defaults to 1)
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Print store-wide or per-purchaser figures
    Analytics {
        /// Figures for the purchaser with this email instead
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    PriceLow,
    PriceHigh,
    Stock,
}

impl From<SortArg> for ProductSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Name => ProductSort::Name,
            SortArg::PriceLow => ProductSort::PriceLowToHigh,
            SortArg::PriceHigh => ProductSort::PriceHighToLow,
            SortArg::Stock => ProductSort::Stock,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    if let Err(err) = init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("{err}");
        }

        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            #[expect(clippy::print_stderr, reason = "command errors are reported to the user")]
            {
                eprintln!("Error: {err:#}");
            }

            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.store;

    let mut store = Fixture::from_set_in(&config.fixtures_path, &config.fixture_set)
        .with_context(|| format!("loading fixture set {:?}", config.fixture_set))?
        .into_store(config.ledger_config()?)?;

    info!(
        products = store.catalog.len(),
        purchasers = store.directory.len(),
        orders = store.ledger.len(),
        "store seeded"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Products {
            category,
            in_stock,
            search,
            sort,
        } => {
            let query = ProductQuery {
                category,
                in_stock_only: in_stock,
                search,
                sort: sort.into(),
            };

            write_products(&mut out, &store.catalog.query(&query))?;
        }
        Command::Orders {
            status,
            payment,
            email,
        } => {
            let filter = OrderFilter {
                status,
                payment_status: payment,
            };

            let orders: Vec<&Order<'_>> = match email {
                Some(email) => store
                    .ledger
                    .by_purchaser(&find_purchaser(&store.directory, &email)?.id)
                    .into_iter()
                    .filter(|order| filter.matches(order))
                    .collect(),
                None => store.ledger.list(&filter),
            };

            write_orders(&mut out, &orders)?;
        }
        Command::Order { id } => {
            let order = store
                .ledger
                .get(&OrderId::new(id.as_str()))
                .with_context(|| format!("order {id} not found"))?;

            let invoice = Invoice::from_order(order);

            invoice.write_to(&mut out)?;
            invoice.write_tracking_to(&mut out)?;
        }
        Command::Status {
            id,
            status,
            payment,
        } => {
            let id = OrderId::new(id);

            store.ledger.set_status(&id, status)?;

            if let Some(payment) = payment {
                store.ledger.set_payment_status(&id, payment)?;
            }

            let order = store.ledger.get(&id).with_context(|| format!("order {id} not found"))?;

            writeln!(
                out,
                "{} is now {} (payment {})",
                order.id(),
                order.status(),
                order.payment_status()
            )?;

            Invoice::from_order(order).write_tracking_to(&mut out)?;
        }
        Command::Place {
            email,
            payment,
            items,
        } => {
            let mut cart = Cart::new();

            for item in &items {
                let (product, quantity) = parse_cart_line(item)?;

                let key = store
                    .catalog
                    .key_of(&ProductId::new(product))
                    .with_context(|| format!("product {product} not found"))?;

                cart.add_item(&store.catalog, key, quantity)?;
            }

            let request = CheckoutRequest {
                purchaser: store.directory.find_by_email(&email),
                payment_method: payment,
                shipping_address: None,
            };

            let checkout = Checkout::new(SimulatedPayment::new(config.payment_delay()));
            let start = Instant::now();

            let order = checkout
                .checkout(&mut store.ledger, &store.catalog, &mut cart, request)
                .await?;

            let elapsed = start.elapsed();

            Invoice::from_order(order).write_to(&mut out)?;

            writeln!(out, " Checkout took {}", elapsed.human(Truncate::Millis))?;
        }
        Command::Analytics { email } => match email {
            Some(email) => {
                let purchaser = find_purchaser(&store.directory, &email)?;
                let summary = store.ledger.purchaser_summary(&purchaser.id)?;

                writeln!(out, "{} <{}>", purchaser.name, purchaser.email)?;
                writeln!(out, "  Orders:           {}", summary.order_count)?;
                writeln!(out, "  Active orders:    {}", summary.active_orders)?;
                writeln!(out, "  Delivered orders: {}", summary.delivered_orders)?;
                writeln!(out, "  Total spent:      {}", summary.total_spent)?;
            }
            None => {
                let analytics = store.ledger.analytics()?;

                writeln!(out, "Total orders:     {}", analytics.total_orders)?;
                writeln!(out, "Pending payments: {}", analytics.pending_payments)?;
                writeln!(out, "Revenue:          {}", analytics.revenue)?;

                for (status, count) in analytics.orders_by_status {
                    writeln!(out, "  {:<12}{count}", format!("{status}:"))?;
                }
            }
        },
    }

    Ok(())
}

fn find_purchaser<'d>(directory: &'d Directory, email: &str) -> Result<&'d Purchaser> {
    directory
        .find_by_email(email)
        .with_context(|| format!("no purchaser registered with email {email}"))
}

/// Split `product-id=quantity`; a bare product id means one unit.
fn parse_cart_line(item: &str) -> Result<(&str, u32)> {
    let Some((product, quantity)) = item.split_once('=') else {
        return Ok((item.trim(), 1));
    };

    let quantity = quantity
        .trim()
        .parse()
        .with_context(|| format!("invalid quantity in {item:?}"))?;

    if product.trim().is_empty() {
        bail!("missing product id in {item:?}");
    }

    Ok((product.trim(), quantity))
}

fn write_products(out: &mut impl Write, products: &[&Product<'_>]) -> Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["ID", "Name", "Category", "Price", "Stock", "Availability"]);

    for product in products {
        builder.push_record([
            product.id.to_string(),
            if product.featured {
                format!("{} *", product.name)
            } else {
                product.name.clone()
            },
            product.category.clone(),
            product.price.to_string(),
            product.stock.to_string(),
            if product.in_stock {
                "In stock".to_string()
            } else {
                "Out of stock".to_string()
            },
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

fn write_orders(out: &mut impl Write, orders: &[&Order<'_>]) -> Result<()> {
    if orders.is_empty() {
        writeln!(out, "No orders found")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Purchaser", "Placed", "Items", "Total", "Status", "Payment"]);

    for order in orders {
        builder.push_record([
            order.id().to_string(),
            order.purchaser().name.clone(),
            order.ordered_at().strftime("%Y-%m-%d").to_string(),
            order.item_count().to_string(),
            order.total().to_string(),
            order.status().to_string(),
            format!("{} ({})", order.payment_status(), order.payment_method()),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}
