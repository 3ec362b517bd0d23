use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::routes::{cors_headers, error_response, handle, HttpResponse};

pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Bind `host:port`. `host` may be a name such as `localhost` or a bare IPv6 address.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    Ok(TcpListener::bind((host, port)).await?)
}

/// Serve HTTP/1.1 on `listener` until the task is cancelled. One task per connection.
pub async fn serve(listener: TcpListener, ctx: Arc<AppContext>) -> anyhow::Result<()> {
    info!("API listening on http://{}", listener.local_addr()?);
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let ctx = Arc::clone(&ctx);

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let ctx = Arc::clone(&ctx);
                async move { Ok::<_, Infallible>(respond(&ctx, req).await) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!("HTTP connection error from {}: {}", remote_addr, e);
            }
        });
    }
}

async fn respond(ctx: &AppContext, req: Request<Incoming>) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match read_body(req.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => handle(ctx, &method, &path, &body).await,
        Err(status) => {
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                format!("Request body too large (max {MAX_BODY_BYTES} bytes)")
            } else {
                "Failed to read request body".to_string()
            };
            warn!(%method, path, %status, "rejected request body");
            let mut resp = error_response(status, &message);
            cors_headers(&mut resp);
            resp
        }
    }
}

async fn read_body<B>(body: B, max_size: usize) -> Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, max_size).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(_) => Err(StatusCode::BAD_REQUEST),
    }
}
