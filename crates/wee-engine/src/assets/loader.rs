//! Fetch-and-decode of images into an [`AssetRegistry`].
//!
//! Transport is abstracted behind [`Fetch`]: the browser host fetches over
//! HTTP, native hosts and tools read files. Fetches complete through a
//! callback, so a host may finish them synchronously or from its own event
//! loop, in any order. Nothing here blocks and nothing is retried.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::assets::bitmap::Bitmap;
use crate::assets::registry::AssetRegistry;
use crate::error::AssetError;

/// Completion callback handed to [`Fetch::fetch`].
pub type FetchCallback = Box<dyn FnOnce(Result<Vec<u8>, AssetError>)>;

/// Byte source for assets.
pub trait Fetch {
    /// Start fetching `path`. `done` must be called exactly once.
    fn fetch(&self, path: &str, done: FetchCallback);
}

/// Reads assets from a directory on the local filesystem, synchronously.
#[derive(Debug, Clone)]
pub struct FileFetch {
    root: PathBuf,
}

impl FileFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for FileFetch {
    fn fetch(&self, path: &str, done: FetchCallback) {
        let result = std::fs::read(self.root.join(path)).map_err(|e| AssetError::Fetch {
            path: path.to_string(),
            reason: e.to_string(),
        });
        done(result);
    }
}

/// Fetch and decode one image, storing it in `registry` under `path`.
///
/// `callback` runs once the load settles, whatever the outcome; the boolean
/// success signal is `result.is_ok()`.
pub fn load_image<F, C>(fetch: &F, registry: &AssetRegistry, path: &str, callback: C)
where
    F: Fetch + ?Sized,
    C: FnOnce(Result<Rc<Bitmap>, AssetError>) + 'static,
{
    let registry = registry.clone();
    let key = path.to_string();
    fetch.fetch(
        path,
        Box::new(move |bytes| {
            let result = bytes
                .and_then(|bytes| {
                    Bitmap::decode(&bytes).map_err(|source| AssetError::Decode {
                        path: key.clone(),
                        source,
                    })
                })
                .map(|bitmap| registry.insert(&key, bitmap));
            match &result {
                Ok(bitmap) => log::debug!(
                    "loaded {} ({}x{})",
                    key,
                    bitmap.width(),
                    bitmap.height()
                ),
                Err(e) => log::warn!("{}", e),
            }
            callback(result);
        }),
    );
}

struct Batch {
    remaining: usize,
    failed: Vec<String>,
    step: Box<dyn FnMut(&str, bool)>,
    done: Option<Box<dyn FnOnce(Result<(), AssetError>)>>,
}

/// Load every path concurrently.
///
/// `step(path, success)` fires once per item as it settles. `callback` fires
/// exactly once, after every item has settled; it receives
/// `Err(AssetError::BatchFailed)` naming the failures if any item failed.
/// Successful items are in the registry either way.
pub fn load_image_list<F, P, S, C>(
    fetch: &F,
    registry: &AssetRegistry,
    paths: &[P],
    step: S,
    callback: C,
) where
    F: Fetch + ?Sized,
    P: AsRef<str>,
    S: FnMut(&str, bool) + 'static,
    C: FnOnce(Result<(), AssetError>) + 'static,
{
    if paths.is_empty() {
        callback(Ok(()));
        return;
    }

    let batch = Rc::new(RefCell::new(Batch {
        remaining: paths.len(),
        failed: Vec::new(),
        step: Box::new(step),
        done: Some(Box::new(callback)),
    }));

    for path in paths {
        let key = path.as_ref();
        let path = key.to_string();
        let batch = Rc::clone(&batch);
        load_image(fetch, registry, key, move |result| {
            let finished = {
                let mut b = batch.borrow_mut();
                (b.step)(&path, result.is_ok());
                if result.is_err() {
                    b.failed.push(path);
                }
                b.remaining -= 1;
                if b.remaining == 0 {
                    b.done.take().map(|done| (done, std::mem::take(&mut b.failed)))
                } else {
                    None
                }
            };

            if let Some((done, failed)) = finished {
                if failed.is_empty() {
                    log::info!("asset batch loaded");
                    done(Ok(()));
                } else {
                    log::warn!("asset batch finished with {} failure(s)", failed.len());
                    done(Err(AssetError::BatchFailed { failed }));
                }
            }
        });
    }
}
