//! Drives one live feed connection into one order book engine.
//!
//! Frames are handled strictly in arrival order: parse, apply, publish. The
//! only await point inside the loop is the wait for the next frame (or for a
//! shutdown signal). Whatever ends the run, the transport is closed before
//! `run` returns.

use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument};

use crate::engine::book::OrderBookEngine;
use crate::engine::types::BookView;
use crate::market_data::adapters::{FeedAdapter, FeedError};
use crate::market_data::transport::{FeedTransport, Frame, TransportError, WsTransport};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Why a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The venue closed the stream.
    Closed,
    /// A shutdown signal arrived (or every shutdown sender was dropped).
    Shutdown,
}

pub struct StreamDriver<'a, A: FeedAdapter> {
    adapter: A,
    engine: &'a mut OrderBookEngine,
}

impl<'a, A: FeedAdapter> StreamDriver<'a, A> {
    pub fn new(adapter: A, engine: &'a mut OrderBookEngine) -> Self {
        Self { adapter, engine }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn engine(&self) -> &OrderBookEngine {
        self.engine
    }

    /// Open a websocket to the adapter's feed URL and run until it ends.
    pub async fn connect_and_run<F>(
        &mut self,
        consumer: F,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<StopReason, DriverError>
    where
        F: FnMut(&BookView) + Send,
    {
        let transport = WsTransport::connect(self.adapter.ws_url()).await?;
        self.run(transport, consumer, shutdown).await
    }

    /// Run over an already connected transport. The transport is closed on
    /// every exit path, including errors.
    #[instrument(skip_all, fields(venue = %self.adapter.venue(), symbol = %self.adapter.symbol()))]
    pub async fn run<T, F>(
        &mut self,
        mut transport: T,
        mut consumer: F,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<StopReason, DriverError>
    where
        T: FeedTransport,
        F: FnMut(&BookView) + Send,
    {
        let outcome = self.pump(&mut transport, &mut consumer, &mut shutdown).await;
        transport.close().await;
        match &outcome {
            Ok(reason) => info!(?reason, applied = self.engine.applied(), "Feed run finished"),
            Err(e) => error!(error = %e, "Feed run failed"),
        }
        outcome
    }

    async fn pump<T, F>(
        &mut self,
        transport: &mut T,
        consumer: &mut F,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<StopReason, DriverError>
    where
        T: FeedTransport,
        F: FnMut(&BookView) + Send,
    {
        let subscription = self.adapter.subscription().to_string();
        debug!(%subscription, "Sending subscription");
        transport.send(subscription).await?;

        let venue = self.adapter.venue().to_string();
        loop {
            let frame = tokio::select! {
                _ = shutdown.recv() => return Ok(StopReason::Shutdown),
                frame = transport.receive() => frame?,
            };
            let text = match frame {
                Frame::Text(text) => text,
                Frame::Closed => return Ok(StopReason::Closed),
            };
            metrics::counter!("ccbot_feed_messages_total", "venue" => venue.clone()).increment(1);

            let Some(event) = self.adapter.parse(&text)? else {
                continue;
            };
            let view = self.engine.apply(event);
            metrics::counter!("ccbot_book_updates_total", "venue" => venue.clone()).increment(1);
            if let Some(spread) = view.spread().and_then(|s| s.to_f64()) {
                metrics::gauge!("ccbot_spread", "venue" => venue.clone()).set(spread);
            }
            consumer(&view);
        }
    }
}
