use clap::Parser;
use std::process::ExitCode;
use tally::args::{AddSubcommand, Args, Command, ListSubcommand};
use tally::{commands, Config, Error, Mode, Result, Session};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().tally_home().path();

    // This allows for running the program without a tracker service. When TALLY_IN_TEST_MODE is
    // set and non-zero in length, then the mode will be Mode::Test, otherwise Mode::Http.
    let mode = Mode::from_env();

    // Commands that manage the home directory or the token do not need a session.
    match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.base_url()).await?.print();
            return Ok(());
        }
        Command::Auth(auth_args) => {
            let config = Config::load(home).await?;
            if let Some(token) = auth_args.token() {
                commands::auth(&config, token).await?.print()
            } else if auth_args.logout() {
                commands::logout(&config).await?.print()
            } else {
                commands::auth_verify(&config, mode).await?.print()
            }
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(home).await?;
    let session = Session::open(&config, mode).await?;

    let _: () = match args.command() {
        Command::Init(_) | Command::Auth(_) => {}
        Command::Dashboard => commands::dashboard(&session).await?.print(),
        Command::List(list_args) => match list_args.entity() {
            ListSubcommand::Income(args) => commands::list_income(&session, args).await?.print(),
            ListSubcommand::Expenses(args) => {
                commands::list_expenses(&session, args).await?.print()
            }
        },
        Command::Categories(args) => commands::categories(&session, args).await?.print(),
        Command::Add(add_args) => match add_args.entity() {
            AddSubcommand::Income(args) => commands::add_income(&session, args).await?.print(),
            AddSubcommand::Expense(args) => commands::add_expense(&session, args).await?.print(),
        },
        Command::Update(args) => commands::update(&session, args).await?.print(),
        Command::Delete(args) => commands::delete(&session, args).await?.print(),
    };
    Ok(())
}

/// Not being signed in gets an instruction instead of an error message.
fn report(e: &Error) {
    if e.is_auth_missing() {
        debug!("{e:#}");
        error!("You are not signed in. Run 'tally auth --token <TOKEN>' to sign in.");
        return;
    }
    debug!("{e:#}");
    error!("Exiting with error: {e}");
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
