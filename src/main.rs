//! Travel desk command-line interface.
//!
//! Lists, creates and edits bookings through the same live pages the desk
//! uses, and exports single-booking and aggregate reports.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use travel_desk::{
    config::{
        app::{AppConfig, load_config},
        database::{create_tables, get_database_url},
        staff::current_actor,
    },
    core::{
        fields::assignment,
        filter::DateWindow,
        notify::{Notifier, TracingNotifier},
        page::{
            BookingPage, HOTEL_PAGE, HOTEL_VIEW_ALL, PageConfig, REPORTS_PAGE, UMRAH_PAGE, UMRAH_VIEW_ALL,
            VISA_PAGE,
        },
        record::{Booking, BookingKind, BookingRecord},
        report::{Letterhead, ReportDocument, build_booking_report, format_currency},
        store::Store,
    },
    entities::{hotel_booking, umrah_booking, visa_booking},
    errors::{Error, Result},
};

#[derive(Parser)]
#[command(name = "travel-desk")]
#[command(about = "Back office for visa, Umrah and hotel bookings")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the booking tables
    Init,

    /// List bookings
    List {
        /// Booking type: visa, umrah or hotel
        kind: BookingKind,

        /// Every staff member's bookings (umrah and hotel only)
        #[arg(long)]
        all: bool,

        /// Date window, e.g. last-7-days or this-month
        #[arg(long, default_value = "all-time")]
        window: DateWindow,

        /// Status to show; "all" shows every status
        #[arg(long, default_value = "all")]
        status: String,

        /// Search term
        #[arg(long)]
        search: Option<String>,
    },

    /// Create a booking owned by the acting staff member
    Add {
        /// Booking type: visa, umrah or hotel
        kind: BookingKind,

        /// Field values, e.g. fullName="Ayesha Siddiqui" totalFee=1500
        #[arg(required = true, value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Change fields of one of the acting staff member's bookings
    Edit {
        /// Booking type: visa, umrah or hotel
        kind: BookingKind,

        /// Booking identifier
        id: i64,

        /// Field values to change; an empty value clears the field
        #[arg(required = true, value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Export the report for one booking
    Report {
        /// Booking type: visa, umrah or hotel
        kind: BookingKind,

        /// Booking identifier
        id: i64,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Export totals over the acting staff member's bookings
    Summary {
        /// Booking type: visa, umrah or hotel
        kind: BookingKind,

        /// Date window, e.g. this-month
        #[arg(long, default_value = "this-month")]
        window: DateWindow,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. Load .env file; variables can also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    run(cli).await.inspect_err(|e| error!("{e}"))
}

async fn run(cli: Cli) -> Result<()> {
    // Only the report commands need the letterhead, so a missing file is not fatal here.
    let app_config = load_config(&cli.config)
        .inspect_err(|e| warn!("Continuing without config.toml: {e}"))
        .ok();

    let url = get_database_url(app_config.as_ref());
    let store = Store::connect(&url)
        .await
        .inspect(|_| info!("Connected to {url}"))?;
    create_tables(store.connection()).await?;

    let today = Local::now().date_naive();
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    match cli.command {
        Commands::Init => {
            info!("Booking tables ready.");
            Ok(())
        }
        Commands::List {
            kind,
            all,
            window,
            status,
            search,
        } => {
            let config = list_page(kind, all)?;
            let options = ListOptions {
                window,
                status,
                search,
            };
            match kind {
                BookingKind::Visa => list::<visa_booking::Model>(&store, config, &options, notifier, today).await,
                BookingKind::Umrah => list::<umrah_booking::Model>(&store, config, &options, notifier, today).await,
                BookingKind::Hotel => list::<hotel_booking::Model>(&store, config, &options, notifier, today).await,
            }
        }
        Commands::Add { kind, fields } => match kind {
            BookingKind::Visa => add::<visa_booking::Model>(&store, &fields, notifier).await,
            BookingKind::Umrah => add::<umrah_booking::Model>(&store, &fields, notifier).await,
            BookingKind::Hotel => add::<hotel_booking::Model>(&store, &fields, notifier).await,
        },
        Commands::Edit { kind, id, fields } => match kind {
            BookingKind::Visa => edit::<visa_booking::Model>(&store, id, &fields, notifier).await,
            BookingKind::Umrah => edit::<umrah_booking::Model>(&store, id, &fields, notifier).await,
            BookingKind::Hotel => edit::<hotel_booking::Model>(&store, id, &fields, notifier).await,
        },
        Commands::Report { kind, id, format } => {
            let app_config = require_config(app_config)?;
            let booking = Booking::fetch(store.connection(), kind, id).await?;
            let document = build_booking_report(&booking, &Letterhead::from(&app_config.agency), today);
            export(&document, &app_config.report.output_dir, format)
        }
        Commands::Summary { kind, window, format } => {
            let app_config = require_config(app_config)?;
            let document = match kind {
                BookingKind::Visa => summary::<visa_booking::Model>(&store, &app_config, window, notifier, today).await,
                BookingKind::Umrah => {
                    summary::<umrah_booking::Model>(&store, &app_config, window, notifier, today).await
                }
                BookingKind::Hotel => {
                    summary::<hotel_booking::Model>(&store, &app_config, window, notifier, today).await
                }
            }?;
            for line in document.summary.iter().flat_map(|s| s.lines()) {
                println!("{line}");
            }
            export(&document, &app_config.report.output_dir, format)
        }
    }
}

struct ListOptions {
    window: DateWindow,
    status: String,
    search: Option<String>,
}

fn list_page(kind: BookingKind, all: bool) -> Result<PageConfig> {
    match (kind, all) {
        (BookingKind::Visa, false) => Ok(VISA_PAGE),
        (BookingKind::Umrah, false) => Ok(UMRAH_PAGE),
        (BookingKind::Hotel, false) => Ok(HOTEL_PAGE),
        (BookingKind::Umrah, true) => Ok(UMRAH_VIEW_ALL),
        (BookingKind::Hotel, true) => Ok(HOTEL_VIEW_ALL),
        (BookingKind::Visa, true) => Err(Error::Config {
            message: "visa applications are only listed for their owner".to_string(),
        }),
    }
}

fn require_config(config: Option<AppConfig>) -> Result<AppConfig> {
    config.ok_or_else(|| Error::Config {
        message: "config.toml with an [agency] section is required for reports".to_string(),
    })
}

async fn list<R: BookingRecord>(
    store: &Store,
    config: PageConfig,
    options: &ListOptions,
    notifier: Arc<dyn Notifier>,
    today: NaiveDate,
) -> Result<()> {
    let actor = current_actor()?;
    let mut page = BookingPage::<R>::open(store, &actor, config, notifier);
    page.set_window(options.window)?;
    page.set_status(&options.status);
    if let Some(term) = &options.search {
        page.set_search(term);
        page.submit_search();
    }
    page.changed().await?;
    if let Some(message) = page.last_error().await {
        return Err(Error::Subscription { message });
    }

    let records = page.visible(today).await;
    println!("{} ({})", config.title, records.len());
    for record in &records {
        let (primary, secondary) = record.report_identifiers();
        let date = record
            .record_date()
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        println!(
            "{:>6}  {date}  {primary:<16}  {secondary:<24}  {:<12}  {}",
            record.id(),
            record.status().unwrap_or("-"),
            format_currency("", record.financials().profit),
        );
    }
    page.close();
    Ok(())
}

/// Opens the acting staff member's own page for `R` and waits for its first snapshot.
async fn open_own_page<R: BookingRecord>(store: &Store, notifier: Arc<dyn Notifier>) -> Result<BookingPage<R>> {
    let actor = current_actor()?;
    let mut page = BookingPage::<R>::open(store, &actor, list_page(R::KIND, false)?, notifier);
    page.changed().await?;
    if let Some(message) = page.last_error().await {
        return Err(Error::Subscription { message });
    }
    Ok(page)
}

async fn add<R: BookingRecord>(store: &Store, fields: &[String], notifier: Arc<dyn Notifier>) -> Result<()> {
    let page = open_own_page::<R>(store, notifier).await?;
    let mut form = page.new_form();
    form.fill(
        fields
            .iter()
            .map(|text| assignment(text))
            .collect::<Result<Vec<_>>>()?,
    )?;
    let saved = page.submit(&form).await?;
    println!("Created {} booking {}", R::KIND, saved.id());
    page.close();
    Ok(())
}

async fn edit<R: BookingRecord>(
    store: &Store,
    id: i64,
    fields: &[String],
    notifier: Arc<dyn Notifier>,
) -> Result<()> {
    let page = open_own_page::<R>(store, notifier).await?;
    let mut editor = page.edit(id).await?;
    for text in fields {
        let (field, value) = assignment(text)?;
        let recomputed = editor.set_field(field, value)?;
        if !recomputed.is_empty() {
            info!("{field} changed; recomputed {}", recomputed.join(", "));
        }
    }
    let saved = page.save(&mut editor).await?;
    for (label, value) in saved.labelled_fields() {
        println!("{label:<24} {value}");
    }
    page.close();
    Ok(())
}

async fn summary<R: BookingRecord>(
    store: &Store,
    app_config: &AppConfig,
    window: DateWindow,
    notifier: Arc<dyn Notifier>,
    today: NaiveDate,
) -> Result<ReportDocument> {
    let actor = current_actor()?;
    let mut page = BookingPage::<R>::open(store, &actor, REPORTS_PAGE, notifier);
    page.set_window(window)?;
    page.changed().await?;
    if let Some(message) = page.last_error().await {
        return Err(Error::Subscription { message });
    }
    let document = page
        .list_report(&Letterhead::from(&app_config.agency), &app_config.report, today)
        .await;
    page.close();
    Ok(document)
}

fn export(document: &ReportDocument, dir: &Path, format: Format) -> Result<()> {
    let path = match format {
        Format::Text => document.write_text(dir)?,
        Format::Json => document.write_json(dir)?,
    };
    info!("Report written to {}", path.display());
    Ok(())
}
