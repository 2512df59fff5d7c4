//! crier-queue - Manage scheduled publications
//!
//! Unix-style tool for creating and inspecting schedules. The actual
//! publishing is done by crier-send.

use clap::{Parser, Subcommand};
use libcrier::{Config, CrierError, Database, Result, Schedule};

#[derive(Parser, Debug)]
#[command(name = "crier-queue")]
#[command(version)]
#[command(about = "Manage scheduled publications")]
#[command(long_about = "\
crier-queue - Manage scheduled publications

DESCRIPTION:
    crier-queue creates and inspects entries in the crier schedule queue.
    A schedule asks for a post to be published no earlier than a given
    time; the crier-send daemon picks due schedules up and delivers them.

COMMANDS:
    add     Schedule a post for publication
    list    List schedules, newest first
    show    Show one schedule in full

USAGE EXAMPLES:
    # Schedule post 7 for immediate publication
    crier-queue add 7

    # Schedule post 7 for tomorrow afternoon
    crier-queue add 7 --at \"tomorrow 3pm\"

    # Schedule post 7 two hours from now
    crier-queue add 7 --at +2h

    # List the most recent schedules as JSON
    crier-queue list --format json

    # Inspect a schedule (status, attempts, last error)
    crier-queue show 12

CONFIGURATION:
    Configuration file: ~/.config/crier/config.toml (override: CRIER_CONFIG)

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Referenced post or schedule does not exist
    3 - Invalid input (bad id, unparseable time, etc.)
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
    /// Schedule a post for publication
    Add {
        /// Post ID to schedule
        post_id: i64,

        /// Publication time (e.g. "tomorrow 3pm", "+2h"); defaults to now
        #[arg(long)]
        at: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List schedules, newest first
    List {
        /// Maximum number of schedules to show
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show one schedule in full
    Show {
        /// Schedule ID
        schedule_id: i64,

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
        Commands::Add { post_id, at, format } => {
            cmd_add(&db, post_id, at.as_deref(), &format).await?;
        }
        Commands::List { limit, format } => {
            cmd_list(&db, limit, &format).await?;
        }
        Commands::Show { schedule_id, format } => {
            cmd_show(&db, schedule_id, &format).await?;
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

async fn cmd_add(db: &Database, post_id: i64, at: Option<&str>, format: &str) -> Result<()> {
    validate_format(format)?;

    // The post must exist before we promise to publish it
    db.get_post(post_id).await?;

    let scheduled_at = match at {
        Some(expr) => libcrier::scheduling::parse_at(expr)?.timestamp(),
        None => chrono::Utc::now().timestamp(),
    };

    let schedule = db.create_schedule(post_id, scheduled_at).await?;

    if format == "json" {
        let json = serde_json::json!({
            "id": schedule.id,
            "status": schedule.status,
            "scheduled_at": schedule.scheduled_at,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!(
            "Scheduled post {} as schedule {} for {}",
            post_id,
            schedule.id,
            format_timestamp(schedule.scheduled_at)
        );
    }

    Ok(())
}

async fn cmd_list(db: &Database, limit: i64, format: &str) -> Result<()> {
    validate_format(format)?;
    if limit <= 0 {
        return Err(CrierError::InvalidInput(
            "Limit must be greater than zero".to_string(),
        ));
    }

    let schedules = db.list_schedules(limit).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&schedules).unwrap());
    } else {
        for schedule in &schedules {
            println!(
                "{} | post {} | {} | {} | {} attempt(s)",
                schedule.id,
                schedule.post_id,
                schedule.status,
                format_timestamp(schedule.scheduled_at),
                schedule.attempt_count
            );
        }
    }

    Ok(())
}

async fn cmd_show(db: &Database, schedule_id: i64, format: &str) -> Result<()> {
    validate_format(format)?;

    let schedule = db.get_schedule(schedule_id).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&schedule).unwrap());
    } else {
        print_schedule(&schedule);
    }

    Ok(())
}

fn print_schedule(schedule: &Schedule) {
    println!("Schedule:     {}", schedule.id);
    println!("Post:         {}", schedule.post_id);
    println!("Status:       {}", schedule.status);
    println!("Scheduled at: {}", format_timestamp(schedule.scheduled_at));
    println!("Attempts:     {}", schedule.attempt_count);
    if let Some(ref error) = schedule.last_error {
        println!("Last error:   {}", error);
    }
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
