//! Mutating admission webhook example
//!
//! Serves the DaemonSet pod mutator on `POST /mutate`. The API server only
//! talks to webhooks over TLS, so this plain HTTP listener is meant to sit
//! behind a TLS terminating proxy.
//!
//! `MUTATOR_ADDR` sets the listen address, `MUTATOR_VERBOSE=1` traces every
//! request and response body.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use ds_mutator::{Config, KubeNodeLookup, Mutator};
use kube::Client;
use tracing::Level;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Reply};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let verbose = std::env::var("MUTATOR_VERBOSE").is_ok_and(|v| v == "1" || v == "true");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let addr: SocketAddr = std::env::var("MUTATOR_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;

    let client = Client::try_default().await?;
    let config = Config::default().with_verbose(verbose);
    let mutator = Arc::new(Mutator::new((KubeNodeLookup::new(client), config)));

    let mutate = warp::post()
        .and(warp::path("mutate"))
        .and(warp::path::end())
        .and(warp::body::bytes())
        .and_then(move |body: Bytes| {
            let mutator = mutator.clone();
            async move { Ok::<_, Infallible>(reply(&mutator, &body).await) }
        });

    tracing::info!(%addr, "serving mutating webhook");
    warp::serve(mutate).run(addr).await;

    Ok(())
}

async fn reply(mutator: &Mutator<KubeNodeLookup>, body: &[u8]) -> warp::reply::Response {
    match mutator.mutate(body).await {
        Ok(review) => {
            warp::reply::with_header(review, "content-type", "application/json").into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "admission review failed");
            let status = if err.is_decode() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warp::reply::with_status(err.to_string(), status).into_response()
        }
    }
}
