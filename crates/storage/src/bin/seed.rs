use std::fmt;

use chrono::{NaiveDate, Utc};
use storage::repository::Storage;
use study_core::model::{Lesson, Subject, UserId};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user: String,
    date: Option<NaiveDate>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDate { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("STUDY_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut user = std::env::var("STUDY_USER").unwrap_or_else(|_| "student".into());
        let mut date = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    user = require_value(&mut args, "--user")?;
                }
                "--date" => {
                    let value = require_value(&mut args, "--date")?;
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

        Ok(Self { db_url, user, date })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --user <id>               Student the lessons belong to (default: student)");
    eprintln!("  --date <YYYY-MM-DD>       Lesson date (default: today, UTC)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  STUDY_DB_URL, STUDY_USER");
}

fn sample_lessons(date: NaiveDate) -> Result<Vec<Lesson>, study_core::Error> {
    let samples = [
        ("Mathematics", "Linear equations", "Exercises 4-9 on page 52"),
        ("History", "The French Revolution", "Read chapter 7"),
        ("Biology", "Cell structure", "Label the diagram of a plant cell"),
        ("Mathematics", "Graphing lines", "Worksheet 3"),
    ];
    samples
        .into_iter()
        .map(|(subject, topic, homework)| -> Result<Lesson, study_core::Error> {
            Ok(Lesson::new(Subject::new(subject)?, topic, homework, date))
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let user = UserId::new(args.user.clone()).map_err(study_core::Error::from)?;
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());

    let lessons = sample_lessons(date)?;
    for lesson in &lessons {
        storage.lessons.insert_lesson(&user, lesson).await?;
    }

    println!(
        "Seeded {} lessons for {} on {} into {}",
        lessons.len(),
        user,
        date,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
