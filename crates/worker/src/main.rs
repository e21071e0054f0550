use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use stockadvisor_core::config::{MacdCrossoverConfig, Settings};
use stockadvisor_core::domain::ticker_list::TickerList;
use stockadvisor_core::ingest::HttpMarketDataProvider;
use stockadvisor_core::observe::{RunObserver, TracingObserver};
use stockadvisor_core::storage::{FsObjectStore, ModelStore};
use stockadvisor_core::strategy::MacdCrossoverStrategy;
use stockadvisor_core::time::{resolve_as_of_override, NyseCalendar};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod run;

#[derive(Debug, Parser)]
#[command(name = "stockadvisor_worker")]
struct Args {
    /// Application namespace used to locate the data bucket.
    #[arg(long)]
    app_namespace: String,

    /// Price date (YYYY-MM-DD). Defaults to the latest NYSE session past cutover.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Generate and print the recommendation without saving it.
    #[arg(long)]
    dry_run: bool,

    /// Regenerate even if the stored recommendation is still valid.
    #[arg(long)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, &args);
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(
            app_namespace = %args.app_namespace,
            error = %format!("{err:#}"),
            "recommendation run failed"
        );
    }
    result
}

fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let bucket = settings.data_bucket_name(&args.app_namespace);
    let observer: Arc<dyn RunObserver> = Arc::new(TracingObserver);

    let store = ModelStore::new(
        FsObjectStore::new(&settings.object_store_root),
        &settings.seed_data_dir,
    )
    .with_observer(observer.clone());

    let config = MacdCrossoverConfig::from_env().context("invalid MACD strategy configuration")?;
    let price_date = resolve_as_of_override(args.as_of_date.as_deref())?;

    let ticker_list: TickerList = store
        .try_load(&bucket, &config.ticker_list_object_name)
        .with_context(|| format!("failed to load ticker list {}", config.ticker_list_object_name))?;
    tracing::info!(
        %bucket,
        list_name = %ticker_list.list_name,
        tickers = ticker_list.ticker_symbols().len(),
        "loaded ticker list"
    );

    let market_data = HttpMarketDataProvider::from_settings(settings)?;
    let calendar = NyseCalendar::from_env()?;
    let strategy = MacdCrossoverStrategy::new(config, ticker_list, calendar, market_data)?
        .with_price_date(price_date)
        .with_observer(observer);

    let opts = run::RunOptions {
        dry_run: args.dry_run,
        force: args.force,
    };
    match run::run_strategy(&strategy, &store, &bucket, chrono::Utc::now(), opts)? {
        run::RunOutcome::StillCurrent { valid_to } => {
            tracing::info!(%valid_to, "recommendation set is still valid; nothing to do");
        }
        run::RunOutcome::Generated { record, saved } => {
            tracing::info!(
                price_date = %record.price_date,
                picks = record.securities_set.len(),
                saved,
                dry_run = args.dry_run,
                "recommendation run finished"
            );
        }
    }

    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
