use anyhow::Context;
use meetgrid::{
    plan::ProposalId,
    storage::{config::Config, store::SqliteStore},
    sync::{ChangeFeed, PlanSession, SessionSettings},
    ui::theme::Theme,
};

mod cli;
use cli::{parse_args, run_summary_mode, CliArgs, USAGE};
mod tui;
use tui::{run_tui, seed_sample_plan};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let config = load_config(&args)?;
    let settings = SessionSettings::from_config(&config).context("invalid grid settings")?;

    let feed = ChangeFeed::default();
    let store = SqliteStore::open(&config.storage.database)
        .with_context(|| format!("failed to open {}", config.storage.database.display()))?
        .with_feed(feed.clone());

    if let Some(id) = &args.discard {
        let proposal_id = ProposalId::new(id.clone());
        store
            .discard_proposal(&proposal_id)
            .with_context(|| format!("failed to discard {}", proposal_id))?;
        println!("Discarded proposal {}", proposal_id);
        return Ok(());
    }

    let me = config.participant();
    tracing::info!("Acting as {} ({})", me.display_name, me.participant_id);

    let proposal_id = if args.sample {
        seed_sample_plan(&store, &me, &settings.codec).await?
    } else {
        match pick_proposal(&args, &store)? {
            Some(id) => id,
            None => {
                eprintln!("No proposals stored yet. Pass --proposal ID or try --sample.");
                return Ok(());
            }
        }
    };

    let mut session = PlanSession::new(store, proposal_id.clone(), me, settings);

    if args.summary {
        run_summary_mode(session).await?;
        return Ok(());
    }

    session.refresh().await?;
    let subscription = feed.subscribe(proposal_id);
    run_tui(session, subscription, Theme::get_by_name(&config.ui.theme)).await?;
    Ok(())
}

fn load_config(args: &CliArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_or_create_at(path),
        None => Config::load_or_create(),
    }
    .context("failed to load configuration")?;

    if let Some(db) = &args.db {
        config.storage.database = db.clone();
    }
    if let Some(participant) = &args.participant
        && *participant != config.session.participant_id
    {
        config.session.participant_id = participant.clone();
        config.session.display_name = participant.clone();
        config.session.nickname = None;
        config.session.email = None;
    }

    Ok(config)
}

fn pick_proposal(args: &CliArgs, store: &SqliteStore) -> anyhow::Result<Option<ProposalId>> {
    if let Some(id) = &args.proposal {
        return Ok(Some(ProposalId::new(id.clone())));
    }
    let latest = store.list_proposals()?.into_iter().next().map(|record| record.id);
    Ok(latest)
}

fn setup_logging() {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "meetgrid.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("meetgrid started");
}
