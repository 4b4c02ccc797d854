use clap::{Parser, Subcommand};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::{
    config::Env,
    server::{self, ServerState, media::MediaStore},
};
use yatube_common::model::group::{
    CreateGroup, GroupSlug, InvalidGroupSlugError, InvalidGroupTitleError,
};
use yatube_db::client::{DbClient, DbError};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error(transparent)]
    InvalidSlug(#[from] InvalidGroupSlugError),
    #[error(transparent)]
    InvalidTitle(#[from] InvalidGroupTitleError),
    #[error("Error creating media root: {0}")]
    MediaRoot(std::io::Error),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Debug, Parser)]
#[command(version, about = "Yatube, a small blogging site")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations, then serve HTTP (the default).
    Serve,
    /// Run migrations and exit.
    Migrate,
    /// Create a post group.
    CreateGroup {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a post group. Its posts are kept without a group.
    DeleteGroup {
        #[arg(long)]
        slug: String,
    },
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "yatube_api=debug,\
                yatube_db=debug,\
                yatube_common=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn connect(env: &Env) -> Result<DbClient, InitError> {
    let db = DbClient::connect(&env.database_url, env.worker_id, env.process_id).await?;
    db.migrate().await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let cli = Cli::parse();
    let env = get_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(env).await,
        Command::Migrate => {
            connect(&env).await?;
            info!("Migrations applied");
            Ok(())
        }
        Command::CreateGroup {
            slug,
            title,
            description,
        } => {
            let group = CreateGroup::new(title, GroupSlug::new(slug)?, description)?;
            let db = connect(&env).await?;
            db.create_group(&group).await?;
            Ok(())
        }
        Command::DeleteGroup { slug } => {
            let db = connect(&env).await?;
            let slug = GroupSlug::new(slug)?;
            if !db.delete_group(&slug).await? {
                warn!(%slug, "No such group");
            }
            Ok(())
        }
    }
}

async fn serve(env: Env) -> Result<(), InitError> {
    let db = connect(&env).await?;

    tokio::fs::create_dir_all(&env.media_root)
        .await
        .map_err(InitError::MediaRoot)?;

    let state = ServerState::new(
        Arc::new(db),
        MediaStore::new(&env.media_root),
        env.server_settings(),
    );
    let app = server::app(state);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "Could not listen for ctrl-c");
                return;
            }
            info!("Shutting down");
            shutdown.cancel();
        }
    });

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
