use std::sync::Arc;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::auth::{self, Credentials};
use crate::cli::utils::{output_error, output_record, output_success, prompt_line};
use crate::cli::OutputFormat;
use crate::session::SessionStore;
use crate::storage::FileStorage;
use crate::transport::HttpTransport;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the backend")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored session")]
    Logout,

    #[command(about = "Show current session status")]
    Status,

    #[command(about = "Fetch current user information from the backend")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },
}

struct Session {
    store: SessionStore<Arc<FileStorage>>,
    transport: HttpTransport,
}

fn open_session() -> anyhow::Result<Session> {
    let storage = Arc::new(FileStorage::open_default()?);
    let transport = HttpTransport::from_config()?.with_token_source(storage.clone());
    Ok(Session {
        store: SessionStore::initialize(storage),
        transport,
    })
}

fn credentials(username: String, password: Option<String>) -> anyhow::Result<Credentials> {
    let password = match password {
        Some(password) => password,
        None => prompt_line("Password")?,
    };
    Ok(Credentials::new(username, password))
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let credentials = credentials(username, password)?;
            let mut session = open_session()?;
            let user = auth::login(&session.transport, &mut session.store, &credentials).await?;
            output_success(
                &output_format,
                &format!("Logged in as {}", credentials.username),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Logout => {
            let mut session = open_session()?;
            let was_logged_in = session.store.is_logged_in();
            auth::logout(&mut session.store);
            let message = if was_logged_in { "Logged out" } else { "No active session, storage cleared" };
            output_success(&output_format, message, None)
        }
        AuthCommands::Status => {
            let session = open_session()?;
            let state = session.store.state();
            let mut status = serde_json::Map::new();
            status.insert("logged_in".to_string(), json!(state.is_logged_in));
            status.insert("user".to_string(), Value::Object(state.current_user.clone()));
            status.insert(
                "storage".to_string(),
                json!(session.store.storage().path().display().to_string()),
            );
            output_record(&output_format, &status)
        }
        AuthCommands::Whoami => {
            let mut session = open_session()?;
            if !session.store.is_logged_in() {
                output_error(&output_format, "Not logged in", Some("NOT_LOGGED_IN"))?;
                return Err(anyhow::anyhow!("Not logged in"));
            }
            let user = auth::whoami(&session.transport, &mut session.store).await?;
            output_record(&output_format, &user)
        }
        AuthCommands::Register { username, password } => {
            let credentials = credentials(username, password)?;
            let session = open_session()?;
            let message = auth::register(&session.transport, &credentials).await?;
            output_success(&output_format, &message, Some(json!({ "username": credentials.username })))
        }
    }
}
