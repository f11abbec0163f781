use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use cinemaempoa::{
    config::Config,
    db, dedupe,
    error::{AppResult, ImportError},
    models::ScrapeResult,
    poster::{PosterSource, PosterStore},
    posters::PosterPipeline,
    reconciler::Reconciler,
    seeds,
    tmdb::TmdbClient,
};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;

#[derive(Parser)]
#[command(name = "cinemaempoa", about = "Porto Alegre cinema schedules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a scrape result JSON file into the catalog
    ImportJson { path: PathBuf },
    /// Merge movies that share a slug
    RunDedupper,
    /// Print duplicated movies and their screenings as JSON
    DupeCheck,
    /// Insert the reference cinemas
    SeedCinemas,
    /// Look up posters for screenings without an image
    FetchPosters {
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cinemaempoa=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> AppResult<ExitCode> {
    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("cinemaempoa/0.1")
        .timeout(Duration::from_secs(config.poster_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    match cli.command {
        Command::ImportJson { path } => import_json(&db, &config, http, &path).await,
        Command::RunDedupper => {
            let summary = dedupe::run(&db).await?;
            println!(
                "{} filmes duplicados removidos ({} sessões movidas, {} sessões mescladas)",
                summary.movies_removed, summary.screenings_moved, summary.screenings_merged
            );
            Ok(ExitCode::SUCCESS)
        },
        Command::DupeCheck => {
            let report = dedupe::report(&db).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        },
        Command::SeedCinemas => {
            let added = seeds::seed_cinemas(&db).await?;
            println!("{added} salas cadastradas");
            Ok(ExitCode::SUCCESS)
        },
        Command::FetchPosters { limit, dry_run } => {
            let Some(token) = config.tmdb_access_token.clone() else {
                eprintln!("TMDB_ACCESS_TOKEN não configurado");
                return Ok(ExitCode::FAILURE);
            };
            let tmdb =
                TmdbClient::new(http.clone(), token, config.tmdb_base_url.clone(), config.tmdb_rps);
            let storage = PosterStore::new(http, config.upload_folder.clone());
            let pipeline = PosterPipeline {
                sources: vec![&tmdb as &dyn PosterSource],
                storage: &storage,
                max_concurrent: config.max_concurrent,
            };
            let result = pipeline.run(&db, limit, dry_run).await?;
            println!(
                "{} sessões processadas: {} pôsteres encontrados, {} não encontrados, {} erros, {} aguardando revisão manual",
                result.processed,
                result.posters_found,
                result.posters_not_found,
                result.errors,
                result.skipped_all_sources_tried
            );
            Ok(ExitCode::SUCCESS)
        },
    }
}

async fn import_json(
    db: &DatabaseConnection,
    config: &Config,
    http: reqwest::Client,
    path: &Path,
) -> AppResult<ExitCode> {
    let parsed = match tokio::fs::read_to_string(path).await {
        Ok(raw) => ScrapeResult::from_json(&raw),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read scrape result");
            eprintln!("Arquivo .json inválido ou não encontrado");
            return Ok(ExitCode::FAILURE);
        },
    };

    let storage = PosterStore::new(http, config.upload_folder.clone());
    let imported = match parsed {
        Ok(result) => Reconciler::new(&config.merge_policies, &storage).import(db, &result).await,
        Err(err) => Err(err),
    };

    match imported {
        Ok(count) => {
            println!("«{count}» sessões criadas com sucesso!");
            Ok(ExitCode::SUCCESS)
        },
        Err(ImportError::Malformed(_)) => {
            eprintln!("Arquivo .json inválido ou não encontrado");
            Ok(ExitCode::FAILURE)
        },
        Err(ImportError::InvalidStructure(err)) => {
            tracing::warn!(error = %err, "scrape result rejected");
            eprintln!("Arquivo .json com estrutura inválida para importação");
            Ok(ExitCode::FAILURE)
        },
        Err(ImportError::InvalidShowtime { title, value }) => {
            eprintln!("Horário «{value}» inválido para «{title}».");
            Ok(ExitCode::FAILURE)
        },
        Err(ImportError::UnknownCinema(slug)) => {
            eprintln!("Sala {slug} não encontrada.");
            Ok(ExitCode::FAILURE)
        },
        Err(err @ ImportError::Database(_)) => Err(err.into()),
    }
}
