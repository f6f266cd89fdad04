//! Asynchronous asset loading.
//!
//! Decoding images (or parsing meshes) can take a while, so it happens on a worker thread. The
//! rendering thread keeps drawing and polls the [`PendingAsset`] once per frame; once the asset is
//! there, the GPU upload happens on the rendering thread, the only one allowed to touch the
//! graphics context.

use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::{ImageError, RgbaImage};

use crate::mesh::MeshError;

/// Errors that might happen while loading an asset.
#[derive(Debug)]
pub enum LoadError {
  /// I/O error, including failing to spawn the worker thread.
  Io(io::Error),
  /// The image could not be decoded.
  Decode(ImageError),
  /// The mesh was parsed but is not a valid triangle mesh.
  InvalidMesh(MeshError),
  /// The worker died before producing anything. Carries the label of the asset.
  Disconnected(String),
  /// Any other failure of a caller-supplied producer.
  Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for LoadError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      LoadError::Io(ref e) => write!(f, "I/O error: {}", e),
      LoadError::Decode(ref e) => write!(f, "cannot decode image: {}", e),
      LoadError::InvalidMesh(ref e) => write!(f, "invalid mesh: {}", e),
      LoadError::Disconnected(ref label) => write!(f, "loader of {} disconnected", label),
      LoadError::Other(ref e) => write!(f, "{}", e),
    }
  }
}

impl error::Error for LoadError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      LoadError::Io(e) => Some(e),
      LoadError::Decode(e) => Some(e),
      LoadError::InvalidMesh(e) => Some(e),
      LoadError::Disconnected(_) => None,
      LoadError::Other(e) => Some(e.as_ref()),
    }
  }
}

impl From<io::Error> for LoadError {
  fn from(e: io::Error) -> Self {
    LoadError::Io(e)
  }
}

impl From<ImageError> for LoadError {
  fn from(e: ImageError) -> Self {
    match e {
      ImageError::IoError(e) => LoadError::Io(e),
      e => LoadError::Decode(e),
    }
  }
}

impl From<MeshError> for LoadError {
  fn from(e: MeshError) -> Self {
    LoadError::InvalidMesh(e)
  }
}

/// An asset being produced on a worker thread.
///
/// Poll it until it yields something, then drop it.
#[must_use]
#[derive(Debug)]
pub struct PendingAsset<T> {
  label: String,
  rx: Receiver<Result<T, LoadError>>,
}

impl<T> PendingAsset<T> {
  /// Label of the asset (a path, typically).
  pub fn label(&self) -> &str {
    &self.label
  }

  /// Check whether the asset is ready, without blocking.
  pub fn poll(&mut self) -> Option<Result<T, LoadError>> {
    match self.rx.try_recv() {
      Ok(result) => Some(result),
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => Some(Err(LoadError::Disconnected(self.label.clone()))),
    }
  }

  /// Block until the asset is ready.
  pub fn wait(self) -> Result<T, LoadError> {
    let label = self.label;
    self
      .rx
      .recv()
      .unwrap_or_else(|_| Err(LoadError::Disconnected(label)))
  }
}

/// Run a producer on a worker thread.
pub fn spawn<T, F>(label: impl Into<String>, f: F) -> Result<PendingAsset<T>, LoadError>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T, LoadError> + Send + 'static,
{
  let label = label.into();
  let (tx, rx) = mpsc::channel();

  thread::Builder::new()
    .name(format!("loader: {}", label))
    .spawn(move || {
      // the receiver might be gone already; nobody wants the result then
      let _ = tx.send(f());
    })?;

  log::debug!("loading {}", label);
  Ok(PendingAsset { label, rx })
}

/// Decode an image file on a worker thread.
///
/// The image is flipped vertically so that its first row is the bottom one, as textures expect.
pub fn spawn_image(path: impl Into<PathBuf>) -> Result<PendingAsset<RgbaImage>, LoadError> {
  let path = path.into();
  let label = path.display().to_string();

  spawn(label, move || {
    let image = image::open(&path)?;
    Ok(image.flipv().to_rgba8())
  })
}
