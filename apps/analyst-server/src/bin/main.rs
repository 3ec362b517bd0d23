use std::sync::Arc;

use analyst_core::config::Config;
use analyst_server::{bind, init_tracing, serve, AppContext};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let ctx = AppContext::bootstrap(&config).await?;
    let (host, port) = (ctx.settings.server.host.clone(), ctx.settings.server.port);
    info!(
        embedding_model = ctx.embedding_model(),
        generation_model = ctx.generation_model(),
        "market analyst ready"
    );
    let listener = bind(&host, port).await?;
    serve(listener, Arc::new(ctx)).await
}
