//! crier-post - Compose and publish posts
//!
//! Creates posts (text plus media attachments) and publishes them on
//! demand. Scheduled delivery lives in crier-queue and crier-send.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use libcrier::{Config, CrierError, Database, Publisher, Result};

#[derive(Parser, Debug)]
#[command(name = "crier-post")]
#[command(version)]
#[command(about = "Compose and publish posts")]
#[command(long_about = "\
crier-post - Compose and publish posts

DESCRIPTION:
    crier-post creates posts in the crier store and can publish them
    immediately through the configured provider. Media files are copied
    into the crier media directory at creation time, so the original
    files can be moved or deleted afterwards.

COMMANDS:
    create   Create a post from text and optional media files
    show     Show a post and its attachments
    publish  Publish an existing post now, bypassing the schedule queue

USAGE EXAMPLES:
    # Create a text-only post
    crier-post create \"Hello, world\"

    # Create a post from stdin with two images
    echo \"Release day!\" | crier-post create --media shot1.png --media shot2.png

    # Publish post 7 immediately
    crier-post publish 7

CONFIGURATION:
    Configuration file: ~/.config/crier/config.toml (override: CRIER_CONFIG)

EXIT CODES:
    0 - Success
    1 - Operation or delivery failed
    2 - Referenced post or media does not exist
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a post from text and optional media files
    Create {
        /// Post text (reads from stdin if not provided)
        text: Option<String>,

        /// Media file to attach (repeatable, order preserved)
        #[arg(long = "media", value_name = "PATH")]
        media: Vec<PathBuf>,

        /// Alt text for the media file at the same position (repeatable)
        #[arg(long = "alt", value_name = "TEXT")]
        alt: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show a post and its attachments
    Show {
        /// Post ID
        post_id: i64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Publish an existing post now, bypassing the schedule queue
    Publish {
        /// Post ID
        post_id: i64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libcrier::logging::init_cli(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    match cli.command {
        Commands::Create {
            text,
            media,
            alt,
            format,
        } => {
            cmd_create(&config, &db, text, media, alt, &format).await?;
        }
        Commands::Show { post_id, format } => {
            cmd_show(&db, post_id, &format).await?;
        }
        Commands::Publish { post_id, format } => {
            cmd_publish(&config, &db, post_id, &format).await?;
        }
    }

    Ok(())
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(CrierError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

/// Read post text from the argument or stdin
fn resolve_text(text: Option<String>) -> Result<String> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| CrierError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
            buffer.trim_end().to_string()
        }
    };

    if text.trim().is_empty() {
        return Err(CrierError::InvalidInput(
            "Post text cannot be empty".to_string(),
        ));
    }

    Ok(text)
}

async fn cmd_create(
    config: &Config,
    db: &Database,
    text: Option<String>,
    media: Vec<PathBuf>,
    alt: Vec<String>,
    format: &str,
) -> Result<()> {
    validate_format(format)?;

    if alt.len() > media.len() {
        return Err(CrierError::InvalidInput(format!(
            "{} alt text(s) given for {} media file(s)",
            alt.len(),
            media.len()
        )));
    }

    let text = resolve_text(text)?;

    let mut media_ids = Vec::with_capacity(media.len());
    for (i, path) in media.iter().enumerate() {
        let alt_text = alt.get(i).cloned();
        let asset = libcrier::media::ingest_media(&config.media, db, path, alt_text).await?;
        media_ids.push(asset.id);
    }

    let post = db.create_post(&text, &media_ids).await?;

    if format == "json" {
        let json = serde_json::json!({
            "id": post.id,
            "text": post.text,
            "media_ids": media_ids,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!(
            "Created post {} ({} media file(s))",
            post.id,
            media_ids.len()
        );
    }

    Ok(())
}

async fn cmd_show(db: &Database, post_id: i64, format: &str) -> Result<()> {
    validate_format(format)?;

    let detail = db.get_post_with_media(post_id).await?;

    if format == "json" {
        let json = serde_json::json!({
            "id": detail.post.id,
            "text": detail.post.text,
            "created_at": detail.post.created_at,
            "media": detail
                .media
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "id": m.id,
                        "filename": m.filename,
                        "content_type": m.content_type,
                        "alt_text": m.alt_text,
                    })
                })
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!("Post: {}", detail.post.id);
        println!("{}", detail.post.text);
        for media in &detail.media {
            println!(
                "  [media {}] {} ({})",
                media.id, media.filename, media.content_type
            );
        }
    }

    Ok(())
}

async fn cmd_publish(config: &Config, db: &Database, post_id: i64, format: &str) -> Result<()> {
    validate_format(format)?;

    let publisher = Publisher::from_config(config, db.clone());
    let log = publisher.publish_post(post_id).await?;

    if format == "json" {
        let json = serde_json::json!({
            "log_id": log.id,
            "status": log.status,
            "external_id": log.external_id,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!(
            "Published post {} via {} (external id: {})",
            post_id, log.provider, log.external_id
        );
    }

    Ok(())
}
