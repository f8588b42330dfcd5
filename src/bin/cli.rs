use anyhow::Context;
use clap::{Parser, Subcommand};
use credstore::{
    config::StoreConfig,
    services::{LoginError, LoginRequest, RegisterRequest, RegistrationError},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "credstore-cli")]
#[command(about = "Register and log in against the local credential store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt twice if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log in and print the display name
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether an email is already registered
    Exists {
        /// Email address
        #[arg(short, long)]
        email: String,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn confirm_password(prompt: &str) -> anyhow::Result<(String, String)> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    Ok((password, confirm))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = StoreConfig::from_env().context("invalid store configuration")?;
    let state = AppState::open(&config)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    tracing::info!(
        "Opened {} (schema v{}, {} passwords)",
        config.database_url,
        state.credential_store.schema_version(),
        state.credential_store.password_storage()
    );

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            let (password, password_confirm) = if let Some(pw) = password {
                (pw.clone(), pw)
            } else {
                confirm_password("Password")?
            };

            let request = RegisterRequest {
                name,
                email,
                password,
                password_confirm,
            };

            match state.registration_service.register(request).await {
                Ok(email) => {
                    println!("✅ Registration successful for '{}'", email);
                }
                Err(RegistrationError::Validation(errors)) => {
                    for error in errors.errors() {
                        eprintln!("❌ {}: {}", error.field, error.message);
                    }
                    std::process::exit(1);
                }
                Err(err) => {
                    match err.field() {
                        Some(field) => eprintln!("❌ {}: {}", field, err),
                        None => eprintln!("❌ {}", err),
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Login {
            email,
            password,
            json,
        } => {
            let password = match password {
                Some(pw) => pw,
                None => get_password("Password")?,
            };

            match state
                .login_service
                .login(LoginRequest { email, password })
                .await
            {
                Ok(session) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&session)?);
                    } else {
                        println!("✅ Welcome, {}!", session.display_name);
                    }
                }
                Err(LoginError::Validation(errors)) => {
                    for error in errors.errors() {
                        eprintln!("❌ {}: {}", error.field, error.message);
                    }
                    std::process::exit(1);
                }
                Err(err) => {
                    eprintln!("❌ {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Exists { email } => match state.credential_store.check_email(&email).await {
            Ok(true) => println!("'{}' is registered", email),
            Ok(false) => println!("'{}' is not registered", email),
            Err(err) => {
                eprintln!("❌ Failed to check email: {}", err);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
