//! Command execution: builds the library objects from settings and runs them.

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use mml_sync_core::{
    FeedClient, FeedSettings, HttpClient, ScopeKey, SyncError, SyncMode, SyncRequest,
    Synchronizer, WorkerPool, parse_from_date,
};

use crate::app::{config, output};
use crate::cli::{Cli, Command, LoadArgs};

pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Load(args) => run_load(&cli, args).await,
        Command::List => run_list(&cli).await,
    }
}

async fn run_load(cli: &Cli, args: &LoadArgs) -> Result<()> {
    let request = build_request(args)?;
    let settings = config::resolve_settings(cli.config.as_deref(), cli.workers)?;
    let feed = feed_client(&settings)?;

    let client = HttpClient::with_request_timeout(settings.request_timeout)?;
    let pool = WorkerPool::start(settings.pool, client)?;

    info!(scope = %request.scope, destination = %request.destination.display(), "loading product");
    let result = Synchronizer::new(&feed, &pool).sync_scope(&request).await;
    pool.shutdown().await;
    let report = result?;

    if !report.is_complete() {
        warn!(
            planned = report.planned,
            completed = report.completed,
            abandoned = report.abandoned,
            failed = report.failed,
            "some entries were not synced and will be retried on the next run"
        );
    }

    println!("{}", request.scope.product);
    Ok(())
}

async fn run_list(cli: &Cli) -> Result<()> {
    info!("listing available products");
    let settings = config::resolve_settings(cli.config.as_deref(), cli.workers)?;
    let feed = feed_client(&settings)?;

    let products = feed.list_products().await?;
    debug!(products = products.len(), "catalog loaded");
    print!("{}", output::format_products(&products));
    Ok(())
}

fn feed_client(settings: &config::Settings) -> Result<FeedClient> {
    let api_key = settings.require_api_key()?;
    let feed_settings = FeedSettings::new(settings.atom_url.clone(), api_key)
        .with_request_timeout(settings.request_timeout);
    Ok(FeedClient::new(feed_settings)?)
}

/// Turns `load` arguments into a request, checking preconditions in the order
/// product, version, format, destination. No I/O happens here.
pub(crate) fn build_request(args: &LoadArgs) -> Result<SyncRequest> {
    let scope = ScopeKey::new(
        args.product.clone().unwrap_or_default(),
        args.version.clone().unwrap_or_default(),
        args.format.clone().unwrap_or_default(),
    );
    if let Some(field) = scope.first_missing_field() {
        return Err(SyncError::MissingField { field }.into());
    }

    let Some(destination) = args
        .destination
        .clone()
        .filter(|path| !path.as_os_str().is_empty())
    else {
        bail!("missing required parameter: destination");
    };

    let from_date = args
        .from_date
        .as_deref()
        .map(parse_from_date)
        .transpose()?;

    Ok(SyncRequest::new(scope, destination).with_mode(SyncMode {
        force: args.force,
        missing_only: args.missing_only,
        from_date,
    }))
}
