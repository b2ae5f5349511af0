//! Asynchronous image loaders.
//!
//! A loader receives `begin` on the guest's call stack and must return at
//! once; decoded results are collected later with `poll` from the session's
//! own thread, so the bridge state is never touched concurrently.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::images::DecodedImage;

/// A finished load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub handle: u32,
    pub result: Result<DecodedImage, String>,
}

pub trait ImageLoader: Send {
    /// Start loading `source` for `handle`.  Must not block.
    fn begin(&mut self, handle: u32, source: &str);

    /// Loads that completed since the last poll, in completion order.
    fn poll(&mut self) -> Vec<LoadOutcome>;
}

// ══════════════════════════════════════════════════════════════════════════════
// Filesystem loader
// ══════════════════════════════════════════════════════════════════════════════

/// Decodes files under `root` with the `image` crate on one long-lived
/// worker thread.
///
/// Sources are relative paths below `root`.  Absolute paths and `..`
/// segments never reach the filesystem; such loads complete as failed.
pub struct FsImageLoader {
    root: PathBuf,
    jobs: Option<Sender<(u32, PathBuf)>>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            root: root.into(),
            jobs: None,
            tx,
            rx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `source` joined onto the root, if it stays below it.
    fn resolve(&self, source: &str) -> Result<PathBuf, String> {
        let relative = Path::new(source);
        let mut normal = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => normal = true,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(format!("{source}: path escapes the asset root"));
                }
            }
        }
        if !normal {
            return Err(format!("{source:?}: not a file path"));
        }
        Ok(self.root.join(relative))
    }

    fn spawn_worker(&self) -> Result<Sender<(u32, PathBuf)>, String> {
        let (jobs, queue) = mpsc::channel::<(u32, PathBuf)>();
        let done = self.tx.clone();
        thread::Builder::new()
            .name("prez-image-loader".to_string())
            .spawn(move || {
                for (handle, path) in queue {
                    let result = decode_file(&path);
                    if done.send(LoadOutcome { handle, result }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| format!("image loader thread: {e}"))?;
        Ok(jobs)
    }

    /// Queue a decode on the worker, starting it if needed.
    fn dispatch(&mut self, handle: u32, path: PathBuf) -> Result<(), String> {
        if self.jobs.is_none() {
            self.jobs = Some(self.spawn_worker()?);
        }
        if let Some(jobs) = &self.jobs {
            if jobs.send((handle, path)).is_ok() {
                return Ok(());
            }
        }
        // The worker died; the next load starts a fresh one.
        self.jobs = None;
        Err("image loader worker stopped".to_string())
    }

    fn fail(&self, handle: u32, reason: String) {
        tracing::warn!(target: "prez::images", handle, %reason, "image load rejected");
        // `rx` lives in `self`, so this cannot fail.
        let _ = self.tx.send(LoadOutcome {
            handle,
            result: Err(reason),
        });
    }
}

fn decode_file(path: &Path) -> Result<DecodedImage, String> {
    let decoded = image::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw().into(),
    })
}

impl ImageLoader for FsImageLoader {
    fn begin(&mut self, handle: u32, source: &str) {
        let path = match self.resolve(source) {
            Ok(path) => path,
            Err(reason) => return self.fail(handle, reason),
        };
        tracing::debug!(target: "prez::images", handle, path = %path.display(), "loading image");
        if let Err(reason) = self.dispatch(handle, path) {
            self.fail(handle, reason);
        }
    }

    fn poll(&mut self) -> Vec<LoadOutcome> {
        self.rx.try_iter().collect()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Manual loader
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct ManualInner {
    requests: Vec<(u32, String)>,
    finished: VecDeque<LoadOutcome>,
}

/// A loader that completes only when the paired [`ManualLoads`] says so.
pub struct ManualImageLoader {
    inner: Arc<Mutex<ManualInner>>,
}

/// Control side of a [`ManualImageLoader`].
#[derive(Clone)]
pub struct ManualLoads {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualImageLoader {
    pub fn new() -> (Self, ManualLoads) {
        let inner = Arc::new(Mutex::new(ManualInner::default()));
        (
            Self {
                inner: inner.clone(),
            },
            ManualLoads { inner },
        )
    }
}

fn lock(inner: &Mutex<ManualInner>) -> MutexGuard<'_, ManualInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ImageLoader for ManualImageLoader {
    fn begin(&mut self, handle: u32, source: &str) {
        lock(&self.inner).requests.push((handle, source.to_string()));
    }

    fn poll(&mut self) -> Vec<LoadOutcome> {
        lock(&self.inner).finished.drain(..).collect()
    }
}

impl ManualLoads {
    /// Every `(handle, source)` requested so far.
    pub fn requests(&self) -> Vec<(u32, String)> {
        lock(&self.inner).requests.clone()
    }

    /// Complete `handle` with a blank image of the given size.
    pub fn finish(&self, handle: u32, width: u32, height: u32) {
        let rgba = vec![0u8; width as usize * height as usize * 4];
        lock(&self.inner).finished.push_back(LoadOutcome {
            handle,
            result: Ok(DecodedImage {
                width,
                height,
                rgba: rgba.into(),
            }),
        });
    }

    pub fn fail(&self, handle: u32, reason: impl Into<String>) {
        lock(&self.inner).finished.push_back(LoadOutcome {
            handle,
            result: Err(reason.into()),
        });
    }
}
