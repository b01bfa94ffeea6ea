//! HTTP exposition of collected metrics.
//!
//! The [`Exporter`] runs one full collection pass per scrape: it discovers
//! the pool names, runs every configured collector over them, and keeps
//! whatever was emitted even when some pools fail — a failed pool is simply
//! absent from that scrape, and the next scrape is the retry mechanism.
//! [`ApiServer`] serves the result on `/metrics`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;
use tokio::sync::mpsc;

use crate::collector::PoolCollector;
use crate::error::ResultOkLogExt;
use crate::metrics::{self, Metric};
use crate::zpool::{Client, ZpoolError};

/// Buffer between emitting collection tasks and the draining scrape
/// handler; the handler drains concurrently, so it only smooths bursts.
const EMIT_BUFFER: usize = 64;

const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4";

/// Runs all configured collectors for one scrape.
pub struct Exporter<C: Client> {
    client: C,
    collectors: Vec<PoolCollector<C>>,
}

impl<C: Client> Exporter<C> {
    pub fn new(client: C, collectors: Vec<PoolCollector<C>>) -> Self {
        Self { client, collectors }
    }

    /// Discovers pools and runs a collection pass for every collector.
    ///
    /// Per-pool failures inside a pass are logged and do not withdraw the
    /// metrics other pools already emitted. Failure to list pools at all
    /// fails the scrape.
    pub async fn gather(&self) -> Result<Vec<Metric>, ZpoolError> {
        let pools = self.client.pool_names().await?;

        let mut metrics = Vec::new();
        for collector in &self.collectors {
            let (tx, mut rx) = mpsc::channel::<Metric>(EMIT_BUFFER);
            let drain = tokio::spawn(async move {
                let mut out = Vec::new();
                while let Some(metric) = rx.recv().await {
                    out.push(metric);
                }
                out
            });

            let result = collector.collect(&pools, tx).await;
            metrics.extend(drain.await.expect("drain task panicked"));
            if let Err(err) = result {
                log::error!("collection pass failed: kind={} err={err}", collector.kind());
            }
        }
        Ok(metrics)
    }
}

async fn serve_metrics<C: Client>(State(exporter): State<Arc<Exporter<C>>>) -> Response {
    let metrics = match exporter.gather().await {
        Ok(metrics) => metrics,
        Err(err) => {
            log::error!("failed to discover pools: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to collect metrics")
                .into_response();
        }
    };
    match metrics::encode(&metrics).ok_log() {
        Some(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], body).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response(),
    }
}

async fn serve_index() -> Html<&'static str> {
    Html(
        "<html><head><title>zpool exporter</title></head>\
         <body><h1>zpool exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>",
    )
}

pub struct ApiServer {
    router: axum::Router,
}

impl ApiServer {
    pub async fn new<C: Client>(exporter: Arc<Exporter<C>>) -> Self {
        let router = axum::Router::new()
            .route("/", get(serve_index))
            .route("/metrics", get(serve_metrics::<C>))
            .with_state(exporter);
        Self { router }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("TCP Listener bind");
        axum::serve(listener, self.router.into_make_service())
            .await
            .unwrap()
    }
}
