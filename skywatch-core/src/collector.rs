use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::{CollectionStrategy, PerformanceConfig},
    model::{Location, WeatherResult},
    provider::ForecastProvider,
};

/// Fetches weather for a list of locations through a fixed-size pool of
/// workers while preserving input order in the output.
///
/// Results are index-tagged on a channel and written back into a pre-sized
/// buffer, so `collect` upholds `results[i].location == locations[i]` no
/// matter which requests finish first. A failed fetch only marks its own
/// slot as failed.
pub struct Collector<P> {
    provider: Arc<P>,
    workers: usize,
    dispatch_delay: Duration,
}

impl<P: ForecastProvider + 'static> Collector<P> {
    pub fn new(provider: P, performance: &PerformanceConfig) -> Self {
        let workers = match performance.strategy {
            CollectionStrategy::WorkerPool => performance.max_workers,
            CollectionStrategy::SequentialDelay => 1,
        };

        Self {
            provider: Arc::new(provider),
            workers,
            dispatch_delay: performance.collection_delay(),
        }
    }

    pub async fn collect(&self, locations: &[Location]) -> Vec<WeatherResult> {
        if locations.is_empty() {
            return Vec::new();
        }

        info!(
            locations = locations.len(),
            workers = self.workers,
            "starting weather collection"
        );

        let queue: Arc<Mutex<VecDeque<(usize, Location)>>> =
            Arc::new(Mutex::new(locations.iter().cloned().enumerate().collect()));
        let (tx, mut rx) = mpsc::channel::<(usize, WeatherResult)>(locations.len());

        let mut handles = Vec::with_capacity(self.workers);
        for worker in 0..self.workers {
            let queue = Arc::clone(&queue);
            let provider = Arc::clone(&self.provider);
            let tx = tx.clone();
            let delay = self.dispatch_delay;

            handles.push(tokio::spawn(async move {
                loop {
                    // The queue is a plain VecDeque, so a poisoned lock left
                    // behind by a panicked sibling is still safe to drain.
                    let job = queue
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .pop_front();
                    let Some((index, location)) = job else {
                        break;
                    };

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }

                    debug!(worker, index, location = %location.name, "fetching forecast");
                    let result = match provider.fetch(&location).await {
                        Ok(fetched) => {
                            WeatherResult::ok(location, fetched.current, fetched.forecast)
                        }
                        Err(err) => {
                            warn!(location = %location.name, error = %err, "fetch failed");
                            WeatherResult::failed(location, format!("{err:#}"))
                        }
                    };

                    if tx.send((index, result)).await.is_err() {
                        // Receiver is gone; nothing left to report to.
                        break;
                    }
                }
            }));
        }
        drop(tx);

        let mut slots: Vec<Option<WeatherResult>> = vec![None; locations.len()];
        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }
        for handle in handles {
            let _ = handle.await;
        }

        let successful = slots.iter().flatten().filter(|r| r.success).count();
        info!(successful, total = locations.len(), "collection finished");

        slots
            .into_iter()
            .zip(locations)
            .map(|(slot, location)| {
                slot.unwrap_or_else(|| {
                    WeatherResult::failed(location.clone(), "worker exited without a result")
                })
            })
            .collect()
    }
}
