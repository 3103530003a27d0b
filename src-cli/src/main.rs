//! Estate Desk - command-line back office
//!
//! Signs in against the back-office API, keeps the credential pair in the
//! local data directory and exposes listings, users and directories as
//! subcommands. Every command prints a JSON `CommandResult`.

mod commands;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use commands::CommandResult;
use estate_core::{ApartmentFilters, Config, DirectoryKind, PageRequest, Role, UserDraft};
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "estate-desk")]
#[command(about = "Estate Desk - Real-estate back office", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the back-office API
    #[arg(long, global = true, env = "ESTATE_API_URL")]
    api_url: Option<String>,

    /// Directory holding the local credential database
    #[arg(long, global = true, env = "ESTATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the credential pair
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "ESTATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and erase stored credentials
    Logout,

    /// Show the current session
    Whoami,

    /// Show or edit your own profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Apartment listings
    #[command(subcommand)]
    Listings(ListingsCommand),

    /// User administration (admin only)
    #[command(subcommand)]
    Users(UsersCommand),

    /// Reference directories
    #[command(subcommand)]
    Directories(DirectoriesCommand),
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Update(UserFields),
}

#[derive(Subcommand, Debug)]
enum ListingsCommand {
    /// List listings visible to the signed-in user
    List(ListArgs),
    Get {
        id: String,
    },
    /// Create a listing from a JSON draft
    Create {
        #[arg(long)]
        json: String,
    },
    /// Apply a partial JSON draft to a listing
    Update {
        id: String,
        #[arg(long)]
        json: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 20)]
    limit: u32,

    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    series: Option<String>,

    #[arg(long)]
    district: Option<String>,

    #[arg(long)]
    rooms: Option<u8>,

    #[arg(long)]
    price_min: Option<f64>,

    #[arg(long)]
    price_max: Option<f64>,

    /// Only honoured for admins
    #[arg(long)]
    user_id: Option<String>,
}

impl ListArgs {
    fn split(self) -> (PageRequest, ApartmentFilters) {
        let page = PageRequest {
            page: self.page,
            limit: self.limit,
        };
        let filters = ApartmentFilters {
            search: self.search,
            series: self.series,
            district: self.district,
            rooms: self.rooms,
            price_min: self.price_min,
            price_max: self.price_max,
            user_id: self.user_id,
        };
        (page, filters)
    }
}

#[derive(Args, Debug)]
struct UserFields {
    #[arg(long)]
    full_name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    role: Option<Role>,

    #[arg(long)]
    password: Option<String>,
}

impl From<UserFields> for UserDraft {
    fn from(fields: UserFields) -> Self {
        UserDraft {
            full_name: fields.full_name,
            email: fields.email,
            role: fields.role,
            password: fields.password,
        }
    }
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List,
    Create(UserFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: UserFields,
    },
    /// Activate or deactivate an account
    Toggle {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum DirectoriesCommand {
    /// List entries of one directory, or of all of them
    List {
        kind: Option<DirectoryKind>,
    },
    Create {
        kind: DirectoryKind,
        name: String,
    },
    Update {
        kind: DirectoryKind,
        id: String,
        name: String,
    },
    Delete {
        kind: DirectoryKind,
        id: String,
    },
}

fn load_config(cli: &Cli) -> estate_core::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.data_dir {
        config.database_path = dir.join("estate.db");
    }
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn emit<T: Serialize>(result: CommandResult<T>) -> ExitCode {
    let success = result.success;
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to encode result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn dispatch(state: &AppState, command: Commands) -> ExitCode {
    match command {
        Commands::Login { email, password } => {
            emit(commands::auth::login(state, &email, &password).await)
        }
        Commands::Logout => emit(commands::auth::logout(state)),
        Commands::Whoami => emit(commands::auth::whoami(state)),

        Commands::Profile(ProfileCommand::Show) => {
            emit(commands::auth::show_profile(state).await)
        }
        Commands::Profile(ProfileCommand::Update(fields)) => {
            emit(commands::auth::update_profile(state, fields.into()).await)
        }

        Commands::Listings(cmd) => match cmd {
            ListingsCommand::List(args) => {
                let (page, filters) = args.split();
                emit(commands::listings::list(state, page, filters).await)
            }
            ListingsCommand::Get { id } => emit(commands::listings::get(state, &id).await),
            ListingsCommand::Create { json } => {
                emit(commands::listings::create(state, &json).await)
            }
            ListingsCommand::Update { id, json } => {
                emit(commands::listings::update(state, &id, &json).await)
            }
            ListingsCommand::Delete { id } => emit(commands::listings::delete(state, &id).await),
        },

        Commands::Users(cmd) => match cmd {
            UsersCommand::List => emit(commands::users::list(state).await),
            UsersCommand::Create(fields) => {
                emit(commands::users::create(state, fields.into()).await)
            }
            UsersCommand::Update { id, fields } => {
                emit(commands::users::update(state, &id, fields.into()).await)
            }
            UsersCommand::Toggle { id } => {
                emit(commands::users::toggle_status(state, &id).await)
            }
            UsersCommand::Delete { id } => emit(commands::users::delete(state, &id).await),
        },

        Commands::Directories(cmd) => match cmd {
            DirectoriesCommand::List { kind } => {
                emit(commands::directories::list(state, kind).await)
            }
            DirectoriesCommand::Create { kind, name } => {
                emit(commands::directories::create(state, kind, &name).await)
            }
            DirectoriesCommand::Update { kind, id, name } => {
                emit(commands::directories::update(state, kind, &id, &name).await)
            }
            DirectoriesCommand::Delete { kind, id } => {
                emit(commands::directories::delete(state, kind, &id).await)
            }
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return emit(CommandResult::<()>::err(e.to_string())),
    };

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { config.log_filter.as_str() };
    estate_core::init_logging(filter);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to open back office: {}", e);
            return emit(CommandResult::<()>::err(e.to_string()));
        }
    };

    // Restore the stored session before any command runs
    state.initialize().await;

    dispatch(&state, cli.command).await
}
