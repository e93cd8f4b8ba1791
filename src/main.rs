//! chatdeck CLI binary entry point.

use std::sync::Arc;

use chatdeck::app::ChatApp;
use chatdeck::auth::{guard, AuthError, AuthProvider, AuthUser, GoTrueAuthProvider, Route};
use chatdeck::cli::repl::Repl;
use chatdeck::cli::{render, AuthCommands, ChatArgs, Cli, Commands};
use chatdeck::config::ChatConfig;
use chatdeck::session::SessionStore;
use chatdeck::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse_args();

    let result = match ChatConfig::load() {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("CHATDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config: ChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    use chatdeck::cli::auth;

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Signup(args) => auth::handle_signup(&config, &args.email, &args.name).await,
            AuthCommands::Login(args) => auth::handle_login(&config, &args.email).await,
            AuthCommands::Status => auth::handle_status(&config).await,
            AuthCommands::Logout => auth::handle_logout(&config).await,
        },
        Commands::Chat(chat_args) => handle_chat(config, chat_args).await,
        Commands::Sessions => handle_sessions(&config),
    }
}

async fn handle_chat(config: ChatConfig, args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match args.endpoint {
        Some(endpoint) => config.with_generation_url(endpoint),
        None => config,
    };
    let storage: Arc<dyn KeyValueStore> = if args.ephemeral {
        Arc::new(MemoryKeyValueStore::new())
    } else {
        Arc::new(FileKeyValueStore::new(config.data_dir.clone()))
    };

    let (auth, user) = if args.no_auth {
        (None, AuthUser::Unauthenticated)
    } else {
        // The auth session always lives on disk, even for ephemeral chats.
        let auth_storage = Arc::new(FileKeyValueStore::new(config.data_dir.clone()));
        let provider = GoTrueAuthProvider::from_config(&config, auth_storage)?;
        let user = provider.current_user().await?;
        if guard(Route::Chat, &user) != Route::Chat {
            eprintln!("Run `chatdeck auth login <email>` first, or pass --no-auth.");
            return Err(AuthError::NotLoggedIn.into());
        }
        let provider: Arc<dyn AuthProvider> = Arc::new(provider);
        (Some(provider), user)
    };

    let app = ChatApp::from_config(&config, storage)?.with_user(user);
    let mut repl = Repl::new(app, auth, std::io::stdout(), true);
    repl.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

fn handle_sessions(config: &ChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open(Arc::new(FileKeyValueStore::new(config.data_dir.clone())));
    print!("{}", render::conversation_list(&store.conversations()));
    Ok(())
}
