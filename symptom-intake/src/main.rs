use anyhow::Result;
use axum::{
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
};
use symptom_intake::{Config, LogFormat, create_app};
use tokio::net::TcpListener;
use tracing::{Instrument, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "symptom_intake=debug,intake_flow=debug,tower_http=debug".into()
    });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Tag every request with a correlation ID and run it inside a span carrying it
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let app = create_app(&config)?.layer(from_fn(correlation_id_middleware));
    let listener = TcpListener::bind(config.bind_addr()?).await?;
    let addr = listener.local_addr()?;

    info!(%addr, backend_url = %config.backend_url, "Symptom Intake Service starting");
    info!("API overview available at http://{}/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
