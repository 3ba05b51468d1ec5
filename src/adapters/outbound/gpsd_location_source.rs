//! gpsd Location Source
//!
//! Implements LocationSource on top of a gpsd daemon. A background reader
//! keeps a watch open on gpsd's JSON protocol, caches the latest TPV fix
//! and fans fixes out to subscribers.

use crate::domain::entities::Location;
use crate::domain::ports::LocationSource;
use crate::domain::services::LocationUpdates;
use crate::domain::value_objects::LocationRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

/// Default gpsd endpoint.
pub const DEFAULT_GPSD_ADDR: &str = "127.0.0.1:2947";

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const FIX_BROADCAST_CAPACITY: usize = 64;

/// Time-position-velocity report. Only 2D and 3D fixes carry a position.
#[derive(Debug, Deserialize)]
struct TpvReport {
    class: String,
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    time: Option<DateTime<Utc>>,
}

/// Parse one line of gpsd output into a fix, if it is a usable TPV report.
fn parse_fix(line: &str) -> Option<Location> {
    let report: TpvReport = serde_json::from_str(line).ok()?;
    if report.class != "TPV" || report.mode < 2 {
        return None;
    }
    Some(Location::new(
        report.lat?,
        report.lon?,
        report.time.unwrap_or_else(Utc::now),
    ))
}

struct Shared {
    last: Mutex<Option<Location>>,
    fixes: broadcast::Sender<Location>,
}

impl Shared {
    fn publish(&self, fix: Location) {
        *self.last.lock() = Some(fix.clone());
        // No subscribers is fine, the fix is still cached.
        let _ = self.fixes.send(fix);
    }
}

pub struct GpsdLocationSource {
    addr: String,
    max_age: chrono::Duration,
    shared: Arc<Shared>,
}

impl GpsdLocationSource {
    /// `max_age` bounds how old the cached fix may be to count as available.
    pub fn new(addr: impl Into<String>, max_age: Duration) -> Self {
        let (fixes, _) = broadcast::channel(FIX_BROADCAST_CAPACITY);
        Self {
            addr: addr.into(),
            max_age: chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::zero()),
            shared: Arc::new(Shared {
                last: Mutex::new(None),
                fixes,
            }),
        }
    }

    /// Start the background reader. It reconnects until the runtime stops.
    pub fn start(&self) {
        let addr = self.addr.clone();
        let shared = self.shared.clone();

        tokio::spawn(async move {
            loop {
                match Self::watch(&addr, &shared).await {
                    Ok(()) => tracing::warn!("gpsd at {} closed the connection", addr),
                    Err(e) => tracing::error!("gpsd at {} failed: {:?}", addr, e),
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });
    }

    async fn watch(addr: &str, shared: &Shared) -> anyhow::Result<()> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(WATCH_COMMAND).await?;
        tracing::info!("watching gpsd at {}", addr);

        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(fix) = parse_fix(&line) {
                tracing::trace!("gpsd fix {},{}", fix.latitude, fix.longitude);
                shared.publish(fix);
            }
        }
        Ok(())
    }

    fn cached(&self) -> Option<Location> {
        let last = self.shared.last.lock().clone()?;
        if Utc::now() - last.time > self.max_age {
            return None;
        }
        Some(last)
    }
}

#[async_trait]
impl LocationSource for GpsdLocationSource {
    async fn is_last_location_available(&self) -> bool {
        self.cached().is_some()
    }

    async fn last_location(&self) -> Option<Location> {
        self.cached()
    }

    fn location_updates(&self, request: &LocationRequest) -> LocationUpdates {
        let (tx, updates) = LocationUpdates::channel(request.clone());
        let mut fixes = self.shared.fixes.subscribe();

        let producer = tokio::spawn(async move {
            loop {
                match fixes.recv().await {
                    Ok(fix) => {
                        if tx.send(fix).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("location subscriber skipped {} fixes", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        updates.with_producer(producer)
    }
}
