use std::{net::SocketAddr, sync::Arc};

use http::HeaderValue;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use fnb_backoffice as api;
use fnb_backoffice::message_queue::{InMemoryMessageQueue, MessageQueue, RedisMessageQueue};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Job queue shared by the beat and the worker
    let queue: Arc<dyn MessageQueue> = match cfg.job_queue_backend.to_ascii_lowercase().as_str() {
        "redis" => {
            let client = Arc::new(redis::Client::open(cfg.redis_url.clone())?);
            let redis_queue = RedisMessageQueue::new(client, cfg.job_queue_namespace.clone());
            match redis_queue.ping().await {
                Ok(()) => Arc::new(redis_queue),
                Err(err) => {
                    error!(
                        "Failed to reach Redis job queue (falling back to in-memory): {}",
                        err
                    );
                    Arc::new(InMemoryMessageQueue::new())
                }
            }
        }
        _ => Arc::new(InMemoryMessageQueue::new()),
    };

    let offset = cfg.business_offset();
    if cfg.scheduler_enabled {
        api::jobs::Beat::new(queue.clone(), offset).spawn();
    } else {
        info!("Scheduler disabled; scheduled jobs will not be enqueued by this process");
    }
    if cfg.worker_enabled {
        let runner = api::jobs::JobRunner::new(db_arc.clone(), &cfg);
        api::jobs::Worker::new(queue.clone(), runner, cfg.worker_poll_interval()).spawn();
    } else {
        warn!("Worker disabled; queued jobs will wait for another worker process");
    }

    let app_state = api::AppState::new(db_arc.clone(), cfg.clone(), queue);

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        return Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into());
    };

    let app = api::app_router(app_state).layer(cors_layer);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!(
        %addr,
        business_offset = %offset,
        "fnb-backoffice listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("fnb-backoffice stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
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
    info!("Shutdown signal received");
}
