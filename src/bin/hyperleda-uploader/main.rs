//! Module that holds the entry point of the uploader application.

mod cli;
mod config;
mod error;

use clap::Parser;
use hyperleda::{
    api::AdminApiClient,
    crossmatch::{CrossmatchConfig, CrossmatchWorker, IdentityResolver, Resolver, TwoRadiiResolver},
    db::LedaDb,
};
use tracing::{error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::{
    cli::{ClArgs, CrossmatchMode, Subcommands},
    error::Error,
};

const ARCSEC_PER_DEG: f64 = 3600.0;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    set_up_logging();

    std::panic::set_hook(Box::new(|p| {
        error!("{}", p);
    }));

    let cl_args = ClArgs::parse();
    let config = cl_args.get_config();

    info!("Connecting to database at `{}`.", config.postgres.conn_str);
    let db = LedaDb::connect(&config.postgres).await?;
    let api = AdminApiClient::new(config.api.clone())?;

    match &cl_args.subcommand {
        Subcommands::Crossmatch(args) => {
            let crossmatch_config = args.crossmatch_config();
            match &args.mode {
                CrossmatchMode::Default { radius, pgc_column } => {
                    let resolver = IdentityResolver::new(radius / ARCSEC_PER_DEG, pgc_column.clone())?;
                    run_crossmatch(&db, &api, resolver, crossmatch_config).await?;
                }
                CrossmatchMode::TwoRadii {
                    r1,
                    r2,
                    redshift_tolerance,
                } => {
                    let resolver =
                        TwoRadiiResolver::new(r1 / ARCSEC_PER_DEG, r2 / ARCSEC_PER_DEG, *redshift_tolerance)?;
                    run_crossmatch(&db, &api, resolver, crossmatch_config).await?;
                }
            }
        }
    }

    Ok(())
}

/// Runs the worker until completion or until the process is asked to stop.
/// Cancellation is cooperative: the in-flight page completes or aborts at
/// the transport boundary and nothing is flushed afterwards.
async fn run_crossmatch<R: Resolver>(
    db: &LedaDb,
    api: &AdminApiClient,
    resolver: R,
    config: CrossmatchConfig,
) -> Result<(), Error> {
    let worker = CrossmatchWorker::new(db, api, resolver, config);
    tokio::select! {
        res = worker.run() => res?,
        _ = stop_signal() => {
            info!("received ctrl-c or terminate, stopping crossmatch");
        },
    }
    Ok(())
}

/// Resolves once the uploader is asked to stop: SIGINT or SIGTERM on unix,
/// ctrl-c elsewhere. The worker future is dropped at its next await point,
/// so the run ends between store operations without writing anything more.
async fn stop_signal() -> eyre::Result<()> {
    #[cfg(unix)]
    {
        use eyre::WrapErr;
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate()).wrap_err("cannot listen to `SIGTERM`")?;
        let mut interrupt = signal(SignalKind::interrupt()).wrap_err("cannot listen to `SIGINT`")?;
        tokio::select! {
            _ = terminate.recv() => {}
            _ = interrupt.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
