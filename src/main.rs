use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emoticat::{
    AppContext,
    analysis::{AnalysisOutcome, AnalysisRequest},
    config::Config,
    models::{Pet, PetForm, birthday_format},
    pets::{age_in_years, mood::DEFAULT_TOP_MOODS, recent_mood, top_moods},
};

#[derive(Parser)]
#[command(name = "emoticat")]
#[command(version)]
#[command(about = "Cat emotion analysis client: pets, photos and mood history")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "emoticat.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Backend base URL (overrides config file and EMOTICAT_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List pets
    Pets {
        /// Ignore the cached pet list
        #[arg(long)]
        refresh: bool,
    },
    /// Show one pet with its mood history
    Pet { id: i64 },
    /// Add a pet with a profile photo
    AddPet {
        #[arg(long)]
        name: String,
        #[arg(long, value_name = "FILE")]
        image: PathBuf,
        #[arg(long)]
        breed: Option<String>,
        /// Birthday as YYYY-MM-DD
        #[arg(long, value_parser = parse_birthday)]
        birthday: Option<NaiveDate>,
    },
    /// Edit a pet; omitted fields keep their current values
    UpdatePet {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, value_parser = parse_birthday)]
        birthday: Option<NaiveDate>,
    },
    /// Delete a pet
    RemovePet { id: i64 },
    /// Analyze a photo of a pet and record the result
    Analyze {
        #[arg(long = "pet")]
        pet_id: i64,
        photo: PathBuf,
    },
    /// Resolve an image key to a local file, downloading it if needed
    Image { key: String },
    /// Mood summary for a pet
    Moods { id: i64 },
}

fn parse_birthday(value: &str) -> Result<NaiveDate, String> {
    birthday_format::parse(value).ok_or_else(|| format!("'{value}' is not a YYYY-MM-DD date"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let log_filter = format!("emoticat={}", cli.log_level);
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| log_filter.into()),
    );
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    config.apply_env_overrides();
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }

    let context = AppContext::initialize(config).await?;

    if let Err(e) = run(&context, cli.command).await {
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }
    Ok(())
}

async fn run(context: &AppContext, command: Command) -> emoticat::errors::AppResult<()> {
    match command {
        Command::Login { username, password } => {
            let session = context.auth.login(&username, &password).await?;
            println!("Logged in as {}", session.username);
        }
        Command::Register { username, password } => {
            let session = context.auth.register(&username, &password).await?;
            println!("Registered and logged in as {}", session.username);
        }
        Command::Logout => {
            context.auth.logout().await?;
            println!("Logged out");
        }
        Command::Pets { refresh } => {
            let pets = context.pet_service.list_pets(refresh).await?;
            if pets.is_empty() {
                println!("No pets yet");
            }
            for pet in &pets {
                print_pet_line(pet);
            }
        }
        Command::Pet { id } => {
            let pet = context.pet_service.pet_details(id).await?;
            print_pet_line(&pet);
            if let Some(path) = context
                .image_cache
                .resolve_or_placeholder(pet.image_key.as_deref())
                .await
            {
                println!("  photo: {}", path.display());
            }
            for record in &pet.emotion_history {
                println!(
                    "  {} {} - {}",
                    record.emoji(),
                    record.emotion,
                    record.description
                );
            }
        }
        Command::AddPet {
            name,
            image,
            breed,
            birthday,
        } => {
            let form = PetForm {
                name,
                breed,
                birthday,
                image: Some(read_file(&image).await?),
            };
            let pet = context.pet_service.add_pet(form).await?;
            println!("Added {} (id {})", pet.name, pet.id);
        }
        Command::UpdatePet {
            id,
            name,
            image,
            breed,
            birthday,
        } => {
            let current = context.pet_service.pet_details(id).await?;
            let image = match image {
                Some(path) => Some(read_file(&path).await?),
                None => None,
            };
            let form = PetForm {
                name: name.unwrap_or(current.name),
                breed: breed.or(current.breed),
                birthday: birthday.or(current.birthday),
                image,
            };
            let pet = context.pet_service.update_pet(id, form).await?;
            println!("Updated {} (id {})", pet.name, pet.id);
        }
        Command::RemovePet { id } => {
            context.pet_service.remove_pet(id).await?;
            println!("Removed pet {id}");
        }
        Command::Analyze { pet_id, photo } => {
            // The pipeline only accepts pets known locally
            context.pet_service.list_pets(false).await?;
            let image = read_file(&photo).await?;

            match context
                .analysis
                .analyze(AnalysisRequest::new(pet_id, image))
                .await
            {
                AnalysisOutcome::Succeeded(record) => {
                    println!("{} {}", record.emoji(), record.emotion);
                    println!("{}", record.description);
                    for tip in &record.tips {
                        println!("  - {tip}");
                    }
                }
                AnalysisOutcome::Failed(failure) => {
                    println!("{} {}", failure.emoji(), failure.message);
                }
            }
        }
        Command::Image { key } => {
            match context.image_cache.resolve(Some(&key)).await? {
                Some(path) => println!("{}", path.display()),
                None => println!("No image"),
            }
        }
        Command::Moods { id } => {
            let pet = context.pet_service.pet_details(id).await?;
            let age = age_in_years(pet.birthday, Utc::now().date_naive())
                .map(|years| years.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            println!("{} (age {age})", pet.name);

            match recent_mood(&pet, Utc::now()) {
                Some(mood) => println!("Recent mood: {mood}"),
                None => println!("No mood data"),
            }
            for (emotion, count) in top_moods(&pet.emotion_history, DEFAULT_TOP_MOODS) {
                println!("  {} {emotion}: {count}", emotion.emoji());
            }
        }
    }
    Ok(())
}

fn print_pet_line(pet: &Pet) {
    let mood = pet
        .latest_record()
        .map(|r| format!("{} {}", r.emoji(), r.emotion))
        .unwrap_or_else(|| "no mood yet".to_string());
    println!(
        "{:>4}  {}  [{}]  {}",
        pet.id,
        pet.name,
        pet.breed.as_deref().unwrap_or("unknown breed"),
        mood
    );
}

async fn read_file(path: &Path) -> emoticat::errors::AppResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        emoticat::errors::AppError::validation(format!("Cannot read {}: {e}", path.display()))
    })
}
