//! Fixed-size pool of page-source sessions behind message-passing
//! workers.
//!
//! Each session is owned by a dedicated task and reached only through
//! its mailbox, so no session handle is shared across callers. Callers
//! are spread over the workers round-robin. A worker found dead at
//! acquisition triggers replacement of the entire pool, since sessions
//! launched together tend to die together (shared backing process,
//! network cut, upstream ban).

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::errors::MarketDataError;
use crate::scrape::session::{PageSource, SessionLauncher};

const WORKER_QUEUE: usize = 32;

/// Work shipped to a session worker.
enum SessionJob {
    Fetch {
        url: String,
        reply: oneshot::Sender<Result<String, MarketDataError>>,
    },
    Probe {
        reply: oneshot::Sender<bool>,
    },
}

struct Worker {
    id: Uuid,
    tx: mpsc::Sender<SessionJob>,
}

/// Spawn a task that owns `source` and serves its mailbox until every
/// sender is dropped.
fn spawn_worker(source: Box<dyn PageSource>) -> Worker {
    let id = source.id();
    let (tx, mut rx) = mpsc::channel::<SessionJob>(WORKER_QUEUE);

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                SessionJob::Fetch { url, reply } => {
                    let result = source.fetch_html(&url).await;
                    // A dropped receiver means the caller gave up.
                    let _ = reply.send(result);
                }
                SessionJob::Probe { reply } => {
                    let _ = reply.send(source.is_alive().await);
                }
            }
        }
        debug!("Session worker {id} shutting down");
    });

    Worker { id, tx }
}

async fn probe(tx: &mpsc::Sender<SessionJob>) -> bool {
    let (reply_tx, reply_rx) = oneshot::channel();
    if tx.send(SessionJob::Probe { reply: reply_tx }).await.is_err() {
        return false;
    }
    reply_rx.await.unwrap_or(false)
}

/// Round-robin pool of scrape sessions.
pub struct SessionPool {
    launcher: Arc<dyn SessionLauncher>,
    workers: Mutex<Vec<Worker>>,
    cursor: AtomicUsize,
    size: usize,
    reinits: AtomicUsize,
}

impl fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPool")
            .field("size", &self.size)
            .field("reinits", &self.reinits)
            .finish_non_exhaustive()
    }
}

impl SessionPool {
    /// Launch `size` sessions eagerly.
    ///
    /// Startup is the one place a launch failure is fatal: a pool that
    /// cannot produce a single session is misconfiguration, not a
    /// transient fault to route around.
    pub async fn initialize(
        launcher: Arc<dyn SessionLauncher>,
        size: usize,
    ) -> Result<Self, MarketDataError> {
        if size == 0 {
            return Err(MarketDataError::Configuration(
                "session pool size must be at least 1".to_string(),
            ));
        }

        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            let source = launcher.launch().await?;
            workers.push(spawn_worker(source));
        }
        info!("Session pool ready with {size} sessions");

        Ok(Self {
            launcher,
            workers: Mutex::new(workers),
            cursor: AtomicUsize::new(0),
            size,
            reinits: AtomicUsize::new(0),
        })
    }

    /// Fetch `url` through the next session in rotation.
    pub async fn fetch_html(&self, url: &str) -> Result<String, MarketDataError> {
        let worker_tx = self.acquire().await?;

        let (reply_tx, reply_rx) = oneshot::channel();
        worker_tx
            .send(SessionJob::Fetch {
                url: url.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| MarketDataError::PoolExhausted)?;

        reply_rx.await.map_err(|_| MarketDataError::PoolExhausted)?
    }

    /// Pick the next worker, replacing the pool first if it is dead.
    async fn acquire(&self) -> Result<mpsc::Sender<SessionJob>, MarketDataError> {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.size;
        let mut workers = self.workers.lock().await;

        // A failed rebuild leaves the pool empty; try again before
        // serving so one bad window does not wedge the tier forever.
        if workers.len() != self.size {
            self.reinitialize(&mut workers).await?;
        }

        let worker = &workers[slot];
        if probe(&worker.tx).await {
            return Ok(worker.tx.clone());
        }

        warn!("Session {} is dead, reinitializing pool", worker.id);
        self.reinitialize(&mut workers).await?;
        Ok(workers[slot].tx.clone())
    }

    /// Replace every worker with a freshly launched session.
    ///
    /// Old workers drain: clearing the vec drops their pool-held
    /// senders, and each task exits once in-flight callers hang up.
    async fn reinitialize(&self, workers: &mut Vec<Worker>) -> Result<(), MarketDataError> {
        workers.clear();
        for _ in 0..self.size {
            match self.launcher.launch().await {
                Ok(source) => workers.push(spawn_worker(source)),
                Err(e) => {
                    workers.clear();
                    error!("Session pool reinitialization failed: {e}");
                    return Err(MarketDataError::PoolExhausted);
                }
            }
        }
        self.reinits.fetch_add(1, Ordering::Relaxed);
        info!("Session pool reinitialized with {} sessions", self.size);
        Ok(())
    }

    /// How many times the pool has been rebuilt since startup.
    pub fn reinit_count(&self) -> usize {
        self.reinits.load(Ordering::Relaxed)
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
