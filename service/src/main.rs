use crate::client::{ObjectStore, Storage};
use crate::config::Config;
use crate::handler::AppState;
use crate::logging::logger_setup;
use crate::router::router;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

mod client;
mod config;
mod domain;
mod handler;
mod image_service;
mod logging;
mod observability;
mod repository;
mod response_handler;
mod router;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    let tracer_provider = logger_setup(config.trace_stdout)?;
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider is already installed, keeping it");
    }

    let store = Storage::from_config(&config).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::new(config, store));

    info!("Attempting to start server at {addr}");
    let listener = TcpListener::bind(addr).await?;
    info!("Server started at {addr}");

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {e}");
        }
    })
    .await?;

    if let Some(provider) = tracer_provider {
        provider.shutdown()?;
    }
    Ok(())
}

/// Accept connections until `shutdown` resolves, then let in-flight
/// connections finish for up to `SHUTDOWN_GRACE`.
async fn serve<S>(
    listener: TcpListener,
    state: Arc<AppState<S>>,
    shutdown: impl Future<Output = ()>,
) -> std::io::Result<()>
where
    S: ObjectStore + Send + Sync + 'static,
{
    let builder = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        let (stream, _) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = &mut shutdown => break,
        };

        let io = TokioIo::new(stream);
        let state = state.clone();
        let service = service_fn(move |req| router(req, state.clone()));
        let connection = graceful.watch(builder.serve_connection(io, service).into_owned());

        tokio::task::spawn(async move {
            if let Err(err) = connection.await {
                error!("Error serving connection: {:?}", err);
            }
        });
    }

    info!("Shutting down, draining open connections");
    drop(listener);
    tokio::select! {
        _ = graceful.shutdown() => info!("All connections closed"),
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
            warn!("Connections still open after {SHUTDOWN_GRACE:?}, exiting anyway")
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::MemoryStore;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn serve_returns_after_shutdown_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(Config::default(), MemoryStore::default()));
        let (stop, stopped) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(listener, state, async {
            let _ = stopped.await;
        }));

        let status = reqwest::get(format!("http://{addr}/private/status"))
            .await
            .unwrap();
        assert_eq!(status.status(), reqwest::StatusCode::OK);
        assert_eq!(status.text().await.unwrap(), "OK");

        stop.send(()).unwrap();
        tokio::time::timeout(SHUTDOWN_GRACE * 2, server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
