// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Block Clock
//!
//! Background task that keeps the devnet's block timestamp in step with wall
//! time, so identity locks taken through the API expire after `LOCK_PERIOD`
//! real seconds.
//!
//! The clock only moves forward; time advanced explicitly on the chain is
//! never rolled back.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::evm::Chain;

/// Default interval between clock syncs.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct BlockClock {
    chain: Arc<RwLock<Chain>>,
    tick_interval: Duration,
}

impl BlockClock {
    pub fn new(chain: Arc<RwLock<Chain>>) -> Self {
        Self {
            chain,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Run until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(clock.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            "Block clock starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Block clock shutting down");
                return;
            }

            self.tick(chrono::Utc::now().timestamp()).await;

            tokio::select! {
                _ = tokio::time::sleep(self.tick_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Block clock shutting down");
                    return;
                }
            }
        }
    }

    /// Move the chain clock to `now` (unix seconds) if it is behind.
    async fn tick(&self, now: i64) {
        let Ok(now) = u64::try_from(now) else {
            return;
        };
        let mut chain = self.chain.write().await;
        let current = chain.timestamp();
        if now > current {
            chain.set_timestamp(now);
            debug!(from = current, to = now, "Block clock advanced");
        }
    }
}
