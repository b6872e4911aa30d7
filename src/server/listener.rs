use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::files::FileStore;
use crate::http::connection::Connection;
use crate::http::router::Router;

/// Binds the configured address and serves connections forever.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.listen_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, cfg).await
}

/// Accepts connections on an already bound listener, one task per
/// connection.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    let store = FileStore::new(&cfg.files.directory).with_context(|| {
        format!("Cannot serve directory {}", cfg.files.directory.display())
    })?;
    info!("Serving files from {}", store.root().display());

    let router = Arc::new(Router::new(store).close_on_not_found(cfg.server.close_on_not_found));
    let settings = cfg.server.connection_settings();

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!("Error accepting connection: {}", e);
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let router = router.clone();
        let settings = settings.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, router, settings);
            if let Err(e) = conn.run().await {
                tracing::warn!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}
