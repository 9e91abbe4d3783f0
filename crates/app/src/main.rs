use std::fmt;

use chrono::NaiveDate;
use services::{AppServices, Clock, ReminderSession};
use study_core::model::{Subject, UserId};
use study_core::session::{Page, SessionStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
    InvalidSubject { raw: String },
    InvalidDate { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidSubject { raw } => write!(f, "invalid --subjects value: {raw:?}"),
            ArgsError::InvalidDate { raw } => {
                write!(f, "invalid --date value (expected YYYY-MM-DD): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db_url: String,
    user: UserId,
    subjects: Vec<Subject>,
    date: Option<NaiveDate>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- review  [--db <sqlite_url>] [--user <name>]");
    eprintln!("                              [--subjects <a,b,...>] [--date <YYYY-MM-DD>]");
    eprintln!("  cargo run -p app -- balance [--db <sqlite_url>] [--user <name>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --user student");
    eprintln!("  --subjects every subject with a lesson on the review day");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_USER, STUDY_AI_API_KEY, STUDY_AI_BASE_URL, STUDY_AI_MODEL,");
    eprintln!("  STUDY_FETCH_TIMEOUT_SECS, STUDY_LEDGER_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Review,
    Balance,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "review" => Some(Self::Review),
            "balance" => Some(Self::Balance),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let raw_user = std::env::var("STUDY_USER").unwrap_or_else(|_| "student".into());
        let mut user = UserId::new(&raw_user).map_err(|_| ArgsError::InvalidUser { raw: raw_user })?;
        let mut subjects = Vec::new();
        let mut date = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user = UserId::new(&value).map_err(|_| ArgsError::InvalidUser { raw: value })?;
                }
                "--subjects" => {
                    let value = require_value(args, "--subjects")?;
                    subjects = parse_subjects(&value)?;
                }
                "--date" => {
                    let value = require_value(args, "--date")?;
                    let parsed = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .map_err(|_| ArgsError::InvalidDate { raw: value.clone() })?;
                    date = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            subjects,
            date,
        })
    }

    /// Picks the lesson day: noon of `--date`, or the system clock.
    /// The reward ledger keeps its own clock.
    fn clock(&self) -> Clock {
        self.date
            .and_then(|day| day.and_hms_opt(12, 0, 0))
            .map_or_else(Clock::default_clock, |noon| Clock::fixed(noon.and_utc()))
    }
}

fn parse_subjects(raw: &str) -> Result<Vec<Subject>, ArgsError> {
    raw.split(',')
        .map(|name| {
            Subject::new(name).map_err(|_| ArgsError::InvalidSubject {
                raw: raw.to_string(),
            })
        })
        .collect()
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── TERMINAL SESSION ──────────────────────────────────────────────────────────
//

fn render(session: &ReminderSession) {
    let state = session.state();
    let Some(subject) = state.current_subject() else {
        return;
    };
    let progress = state.progress();
    println!();
    println!(
        "[{subject} {}/{}] {}  coins: {}",
        progress.subject_position,
        progress.subject_count,
        state.page().as_str(),
        state.coins_earned()
    );

    match state.page() {
        Page::Theory1 => {
            if let Some(reminder) = state.current_reminder() {
                println!("{}", reminder.theory().content);
            }
            println!("(n) next");
        }
        Page::Theory2 => {
            if let Some(reminder) = state.current_reminder() {
                for point in &reminder.theory().key_points {
                    println!("  * {point}");
                }
            }
            println!("(n) next  (b) back");
        }
        Page::Task => {
            if let Some(task) = state.current_task() {
                println!(
                    "Task {}/{} ({}): {}",
                    progress.task_position,
                    progress.task_count,
                    task.difficulty().as_str(),
                    task.question()
                );
                for (idx, option) in task.options().iter().enumerate() {
                    println!("  {}) {option}", idx + 1);
                }
            }
            println!("(1-9) answer  (b) back");
        }
        Page::Explanation => {
            if let Some(task) = state.current_task() {
                match state.selected_is_correct() {
                    Some(true) => println!("Correct!"),
                    Some(false) => {
                        let answer = task
                            .options()
                            .get(task.correct_answer())
                            .map_or("", String::as_str);
                        println!("Not quite. The answer is: {answer}");
                    }
                    None => {}
                }
                println!("{}", task.explanation());
            }
            println!("(n) next  (b) back");
        }
        Page::Completion => {}
    }
}

fn render_completion(session: &ReminderSession) {
    let state = session.state();
    println!();
    println!(
        "All done! {} of {} answers correct, {} coins earned.",
        state.correct_total(),
        state.answered_total(),
        state.coins_earned()
    );
    if let Some(balance) = state.ledger_balance() {
        println!("Balance: {balance} coins");
    }
    if state.can_claim_completion_bonus() {
        println!("(c) claim today's completion bonus  (q) quit");
    } else {
        println!("(q) quit");
    }
}

async fn review(services: &AppServices, args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if !services.content_enabled() {
        eprintln!("STUDY_AI_API_KEY is not set; reminders cannot be generated.");
    }

    let reminders = services.reminders();
    println!("Preparing today's reminder...");
    let mut session = reminders.start_for_today(args.user, args.subjects).await?;
    if let SessionStatus::Failed { message } = session.state().status() {
        println!("{message}");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if session.state().is_complete() {
            render_completion(&session);
        } else {
            render(&session);
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "q" => break,
            "n" => session.advance().await,
            "b" => session.retreat().await,
            "c" => {
                if session.claim_bonus().await {
                    println!("Completion bonus claimed!");
                } else {
                    println!("The completion bonus is not available.");
                }
            }
            input => match input.parse::<usize>() {
                Ok(choice) if choice > 0 => session.submit_answer(choice - 1).await,
                _ => println!("Unrecognised input: {input}"),
            },
        }
    }

    session.close().await;
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Reviewing is the default when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Review,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Review,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, parsed.clock()).await?;
    tracing::info!(db = %parsed.db_url, user = %parsed.user, ?cmd, "storage ready");

    match cmd {
        Command::Review => review(&services, parsed).await,
        Command::Balance => {
            let balance = services.reminders().coin_balance(&parsed.user).await?;
            println!("{}: {balance} coins", parsed.user);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
