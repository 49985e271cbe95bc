use clap::{Parser, Subcommand};
use pinbook::book::{photo, search, ContactForm, CustomerBook, PhotoError, ShareFormat, Sharer};
use pinbook::config::{AppConfig, PipelineConfig};
use pinbook::location::{Coordinate, LocationPipeline, ResolutionRequest, ResolutionStatus};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pinbook: customer address book with map-link location resolution
///
/// Paste a Google Maps link (short links included) to get coordinates and an
/// address, or keep a small book of customers with their locations.
///
/// Examples:
///   pinbook resolve "https://maps.app.goo.gl/AbCd123"
///   pinbook locate --lat 23.15371 --lon 79.753135
///   pinbook add --name "Asha" --mobile 9876543210 --url "https://maps.google.com/?q=23.15371,79.753135"
///   pinbook edit 1 --address "12 Lake View" --photo shop.jpg
///   pinbook search jabalpur --highlight
///   pinbook share 1 --format whatsapp
///   pinbook serve --port 3000
#[derive(Parser)]
#[command(name = "pinbook", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.pinbook/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Customer book file (default: ~/.pinbook/customers.json).
    #[arg(long, global = true)]
    book: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a map link into coordinates and an address.
    Resolve {
        url: String,
    },

    /// Reverse geocode a device or manually entered coordinate.
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Add a customer. A map link or coordinate fills in the location.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mobile: String,
        /// Free-text address; derived from the location when omitted.
        #[arg(long)]
        address: Option<String>,
        /// Google Maps link to resolve.
        #[arg(long)]
        url: Option<String>,
        /// "lat, lng" entered by hand.
        #[arg(long, allow_hyphen_values = true)]
        coordinates: Option<String>,
        /// Image file to attach (repeatable, up to 5).
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },

    /// Edit a saved customer. Only the given fields change.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Google Maps link to resolve.
        #[arg(long)]
        url: Option<String>,
        /// "lat, lng" entered by hand.
        #[arg(long, allow_hyphen_values = true)]
        coordinates: Option<String>,
        /// Image file to attach (repeatable).
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
        /// Photo id to remove (repeatable).
        #[arg(long = "remove-photo")]
        remove_photos: Vec<i64>,
    },

    /// List all customers.
    List,

    /// Search customers by name, mobile, address or coordinates.
    Search {
        term: String,
        /// Wrap matches in <mark> tags.
        #[arg(long)]
        highlight: bool,
    },

    /// Delete a customer by id.
    Delete {
        id: i64,
    },

    /// Print a customer in a share format.
    Share {
        id: i64,
        /// whatsapp, sms, email, maps, text or vcard
        #[arg(long, short = 'f', default_value = "text", value_parser = parse_format)]
        format: ShareFormat,
    },

    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

fn parse_format(s: &str) -> Result<ShareFormat, String> {
    s.parse()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn run(cli: Cli) -> CliResult {
    let config = AppConfig::load(cli.config.as_deref())?;
    let book_path = cli.book.clone().unwrap_or_else(|| config.book_path());

    match cli.command {
        Command::Resolve { url } => {
            let pipeline = LocationPipeline::from_config(&config.pipeline)?;
            let outcome = pipeline.resolve(&ResolutionRequest::Url(url)).await;
            eprintln!("  {}", outcome.status_message());
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.status == ResolutionStatus::Failure {
                std::process::exit(2);
            }
        }

        Command::Locate { lat, lon } => {
            let coord = Coordinate::rounded(lat, lon).ok_or("Invalid coordinates entered")?;
            let pipeline = LocationPipeline::from_config(&config.pipeline)?;
            let outcome = pipeline.resolve(&ResolutionRequest::DeviceLocation(coord)).await;
            if outcome.address.is_none() {
                eprintln!("  Location found (address not available)");
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Command::Add { name, mobile, address, url, coordinates, photos } => {
            let mut book = CustomerBook::load(book_path)?;
            let mut form = ContactForm {
                name,
                mobile,
                address: address.clone().unwrap_or_default(),
                ..ContactForm::default()
            };

            fill_location(&config.pipeline, &mut form, url, coordinates, address.is_some()).await?;
            for path in &photos {
                attach_file(&mut form, path)?;
            }

            let customer = book.add(form)?;
            eprintln!("  Customer added successfully! (id {})", customer.id);
            println!("{}", serde_json::to_string_pretty(&customer)?);
        }

        Command::Edit { id, name, mobile, address, url, coordinates, photos, remove_photos } => {
            let mut book = CustomerBook::load(book_path)?;
            let customer = book.get(id).ok_or_else(|| format!("No customer with id {}", id))?;
            let mut form = ContactForm::from_customer(customer);

            if let Some(name) = name {
                form.name = name;
            }
            if let Some(mobile) = mobile {
                form.mobile = mobile;
            }
            if let Some(address) = &address {
                form.address = address.clone();
            }
            fill_location(&config.pipeline, &mut form, url, coordinates, address.is_some()).await?;
            for photo_id in remove_photos {
                form.remove_photo(photo_id)?;
            }
            for path in &photos {
                attach_file(&mut form, path)?;
            }

            let customer = book.update(id, form)?;
            eprintln!("  Customer updated successfully!");
            println!("{}", serde_json::to_string_pretty(&customer)?);
        }

        Command::List => {
            let book = CustomerBook::load(book_path)?;
            eprintln!("  {} customer(s)", book.len());
            println!("{}", serde_json::to_string_pretty(book.customers())?);
        }

        Command::Search { term, highlight } => {
            let book = CustomerBook::load(book_path)?;
            let found = book.search(&term);
            eprintln!("  {}", search::summary(found.len(), &term));
            if highlight {
                let marked: Vec<_> = found.iter().map(|c| search::highlighted(c, &term)).collect();
                println!("{}", serde_json::to_string_pretty(&marked)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&found)?);
            }
        }

        Command::Delete { id } => {
            let mut book = CustomerBook::load(book_path)?;
            let removed = book.delete(id)?;
            eprintln!("  Customer deleted successfully ({})", removed.name);
        }

        Command::Share { id, format } => {
            let book = CustomerBook::load(book_path)?;
            let customer = book.get(id).ok_or_else(|| format!("No customer with id {}", id))?;
            let content = Sharer::new(&config.book.phone_prefix)
                .render(customer, format)
                .ok_or("No coordinates available for mapping")?;
            println!("{}", content);
        }

        Command::Serve { host, port } => {
            let pipeline = LocationPipeline::from_config(&config.pipeline)?;
            let book = CustomerBook::load(book_path)?;
            let router = pinbook::server::build_router(pipeline, book, config.book.phone_prefix.clone());
            pinbook::server::start(&host, port, router).await?;
        }
    }

    Ok(())
}

/// Resolve a map link or typed coordinate into the form. A map link wins when
/// both are given; an address the user typed is kept over the geocoded one.
async fn fill_location(
    config: &PipelineConfig,
    form: &mut ContactForm,
    url: Option<String>,
    coordinates: Option<String>,
    keep_address: bool,
) -> CliResult {
    let request = match (url, coordinates) {
        (Some(url), _) => ResolutionRequest::Url(url),
        (None, Some(text)) => ResolutionRequest::DeviceLocation(text.parse::<Coordinate>()?),
        (None, None) => return Ok(()),
    };

    let pipeline = LocationPipeline::from_config(config)?;
    let outcome = pipeline.resolve(&request).await;
    eprintln!("  {}", outcome.status_message());

    let typed_address = form.address.clone();
    match request {
        ResolutionRequest::Url(_) => form.apply_outcome(&request, &outcome),
        ResolutionRequest::DeviceLocation(_) => form.apply_manual_outcome(&outcome),
    };
    if keep_address {
        form.address = typed_address;
    }
    Ok(())
}

fn attach_file(form: &mut ContactForm, path: &Path) -> CliResult {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = photo::image_mime(path).ok_or_else(|| PhotoError::NotImage(name.clone()))?;
    let bytes = std::fs::read(path).map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    let attached = form.attach_photo(&name, mime, &bytes)?;
    eprintln!("  Photo {} attached (id {})", attached.name, attached.id);
    Ok(())
}
