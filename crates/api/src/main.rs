use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use kirana_api::app;
use kirana_api::config::AppConfig;
use kirana_core::SystemClock;
use kirana_infra::{HttpMailRelay, IntervalTicker, LogMailer, Mailer, ReplenishmentRunner, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kirana_observability::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let stores = open_stores(&config).await?;

    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => Arc::new(
            HttpMailRelay::new(url.clone(), config.mail_relay_token.clone())
                .context("configuring mail relay")?,
        ),
        None => Arc::new(LogMailer),
    };

    let services = app::build_services(stores, mailer, Arc::new(SystemClock), &config);
    let runner = ReplenishmentRunner::spawn(
        services.reconciler(),
        IntervalTicker::new(config.reconcile_interval),
    );
    info!(
        interval_secs = config.reconcile_interval.as_secs(),
        "replenishment runner scheduled"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app::build_app(services))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    runner.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    #[cfg(feature = "postgres")]
    if let Some(url) = &config.database_url {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("connecting to postgres")?;
        let stores = Stores::postgres(pool)
            .await
            .context("preparing postgres tables")?;
        info!("using postgres document stores");
        return Ok(stores);
    }

    #[cfg(not(feature = "postgres"))]
    if config.database_url.is_some() {
        warn!("DATABASE_URL is set but postgres support is not compiled in; using in-memory stores");
    }

    Ok(Stores::in_memory())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("shutdown signal received; draining connections");
}
