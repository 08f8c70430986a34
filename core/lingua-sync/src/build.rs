//! Export builds shared between concurrently syncing namespaces.
//!
//! Requesting an export is expensive and the remote service runs one at a
//! time, so every namespace syncing inside the same window awaits the same
//! build. An in-flight build is always reused; a finished one is reused
//! until its TTL runs out; a failed one is dropped as soon as a caller sees
//! the failure.

use crate::error::{SyncError, SyncResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use lingua_remote::{BuildRequest, BuildState, RemoteClient, unpack};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// The unpacked content of a finished export build.
#[derive(Debug)]
pub struct ExportArchive {
    pub build_id: u64,
    /// Archive path → file contents.
    pub files: BTreeMap<String, String>,
    fetched_at: Instant,
}

impl ExportArchive {
    /// Time since the archive was downloaded.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

type BuildOutput = Result<Arc<ExportArchive>, Arc<SyncError>>;

struct Slot {
    generation: u64,
    future: Shared<BoxFuture<'static, BuildOutput>>,
}

/// Polling and reuse settings for shared builds.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub request: BuildRequest,
    pub ttl: Duration,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

/// Memoizes the current export build.
pub struct SharedBuildCache {
    client: Arc<dyn RemoteClient>,
    options: BuildOptions,
    slot: Mutex<Option<Slot>>,
    generation: AtomicU64,
}

impl SharedBuildCache {
    #[must_use]
    pub fn new(client: Arc<dyn RemoteClient>, options: BuildOptions) -> Self {
        Self {
            client,
            options,
            slot: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the current build, starting one if none is usable.
    pub async fn get(&self) -> SyncResult<Arc<ExportArchive>> {
        let (generation, future) = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(current) if self.is_usable(current) => {
                    debug!("Reusing shared export build (generation {})", current.generation);
                    (current.generation, current.future.clone())
                }
                _ => {
                    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let future = run_build(Arc::clone(&self.client), self.options.clone())
                        .boxed()
                        .shared();
                    *slot = Some(Slot {
                        generation,
                        future: future.clone(),
                    });
                    (generation, future)
                }
            }
        };

        match future.await {
            Ok(archive) => Ok(archive),
            Err(err) => {
                self.evict(generation);
                Err(SyncError::Shared(err))
            }
        }
    }

    /// Drops the memoized build so the next caller starts a new one.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    /// Number of builds started so far.
    #[must_use]
    pub fn builds_started(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_usable(&self, slot: &Slot) -> bool {
        match slot.future.peek() {
            None => true,
            Some(Ok(archive)) => archive.age() < self.options.ttl,
            Some(Err(_)) => false,
        }
    }

    fn evict(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            *slot = None;
            debug!("Evicted failed export build (generation {})", generation);
        }
    }
}

async fn run_build(client: Arc<dyn RemoteClient>, options: BuildOptions) -> BuildOutput {
    match build_and_download(client.as_ref(), &options).await {
        Ok(archive) => Ok(Arc::new(archive)),
        Err(err) => {
            warn!("Export build failed: {}", err);
            Err(Arc::new(err))
        }
    }
}

async fn build_and_download(
    client: &dyn RemoteClient,
    options: &BuildOptions,
) -> SyncResult<ExportArchive> {
    let build_id = client.build_export(&options.request).await?;
    info!("Started export build {}", build_id);

    let started = Instant::now();
    loop {
        let status = client.get_build_status(build_id).await?;
        match status.status {
            BuildState::Finished => break,
            BuildState::Failed | BuildState::Canceled => {
                return Err(SyncError::BuildFailed {
                    build_id,
                    status: status.status.to_string(),
                });
            }
            BuildState::Created | BuildState::InProgress => {}
        }
        if started.elapsed() >= options.timeout {
            return Err(SyncError::Timeout {
                build_id,
                waited_secs: options.timeout.as_secs(),
            });
        }
        debug!("Export build {} at {}%", build_id, status.progress);
        sleep(options.poll_interval).await;
    }

    let url = client.build_download_url(build_id).await?;
    let bytes = client.download_build(&url).await?;
    let files = unpack(&bytes)?;
    info!(
        "Downloaded export build {} ({} files, {} bytes)",
        build_id,
        files.len(),
        bytes.len()
    );
    Ok(ExportArchive {
        build_id,
        files,
        fetched_at: Instant::now(),
    })
}
