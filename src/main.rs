use std::{
    io::{self, BufRead},
    path::Path,
    process,
    sync::Arc,
};

use tavola::{
    application::{
        error::AppError,
        repos::{ContentRepo, MenuRepo, PostsRepo},
        sessions::hash_password,
        site,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    if let config::Command::HashPassword(args) = &command {
        return run_hash_password(args.password_file.as_deref());
    }

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::ExportSite(args) => run_export_site(settings, args).await,
        config::Command::ImportSite(args) => run_import_site(settings, args).await,
        config::Command::HashPassword(_) => Ok(()),
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let content_repo: Arc<dyn ContentRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let menu_repo: Arc<dyn MenuRepo> = repositories;

    let state = AppState::new(&settings, content_repo, posts_repo, menu_repo)?;
    info!(
        target = "tavola::serve",
        uploads = %settings.uploads.directory.display(),
        merge_strategy = %settings.content.merge_strategy,
        "application state ready"
    );

    let router = http::build_router(state);
    http::serve(&settings.server, router).await?;
    Ok(())
}

async fn run_export_site(
    settings: config::Settings,
    args: config::ExportArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let path = args.file;

    info!(
        target = "tavola::export",
        path = %path.display(),
        "Starting export"
    );

    site::export_site(
        repositories.as_ref(),
        repositories.as_ref(),
        repositories.as_ref(),
        &path,
    )
    .await?;
    info!(target = "tavola::export", "Export completed");
    Ok(())
}

async fn run_import_site(
    settings: config::Settings,
    args: config::ImportArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let path = args.file;

    info!(
        target = "tavola::import",
        path = %path.display(),
        "Starting import"
    );

    site::import_site(repositories.as_ref(), &path).await?;
    info!(target = "tavola::import", "Import completed");
    Ok(())
}

fn run_hash_password(password_file: Option<&Path>) -> Result<(), AppError> {
    let raw = match password_file {
        Some(path) => std::fs::read_to_string(path).map_err(InfraError::from)?,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(InfraError::from)?;
            line
        }
    };

    let password = raw.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AppError::unexpected("refusing to hash an empty password"));
    }

    println!("{}", hash_password(password));
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}
