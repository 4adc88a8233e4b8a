// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Lazy, process-wide detector handles
//!
//! Models are expensive to load, so each back end gets exactly one handle
//! per process, created on first use. The lazy-init path is guarded by a
//! `tokio::sync::OnceCell`: concurrent first requests wait on a single load
//! instead of each triggering their own. A failed load is not cached, so a
//! later request retries (weights may have appeared on disk since).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Config;

use super::{Detector, DetectorError, ModelKind, OvDinoDetector, YoloWorldDetector};

/// Shared handle to a loaded detector.
pub type DynDetector = Arc<dyn Detector>;

type Loader = Box<dyn Fn() -> BoxFuture<'static, Result<DynDetector, DetectorError>> + Send + Sync>;

struct LazySlot {
    cell: OnceCell<DynDetector>,
    loader: Loader,
}

/// Registry of supported back ends with guarded lazy initialization.
pub struct DetectorRegistry {
    slots: HashMap<ModelKind, LazySlot>,
}

impl DetectorRegistry {
    /// Empty registry; back ends are attached with [`with_loader`].
    ///
    /// [`with_loader`]: DetectorRegistry::with_loader
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Attach a loader for a back end.
    ///
    /// The loader runs at most once concurrently and its result is cached
    /// for the process lifetime on success. Tests use this seam to count
    /// load events and to substitute stub detectors.
    pub fn with_loader<F>(mut self, kind: ModelKind, loader: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<DynDetector, DetectorError>> + Send + Sync + 'static,
    {
        self.slots.insert(
            kind,
            LazySlot {
                cell: OnceCell::new(),
                loader: Box::new(loader),
            },
        );
        self
    }

    /// Registry wired to the real ONNX adapters from the configured model
    /// paths. Loading happens on a blocking thread since committing a graph
    /// is CPU-bound.
    pub fn from_config(config: &Config) -> Self {
        let ov_dino_path = config.ov_dino_model_path.clone();
        let yolo_world_path = config.yolo_world_model_path.clone();

        Self::new()
            .with_loader(ModelKind::OvDino, move || {
                let path = ov_dino_path.clone();
                async move {
                    tokio::task::spawn_blocking(move || {
                        OvDinoDetector::load(&path).map(|d| Arc::new(d) as DynDetector)
                    })
                    .await
                    .map_err(|e| DetectorError::Unavailable(format!("load task failed: {}", e)))?
                }
                .boxed()
            })
            .with_loader(ModelKind::YoloWorld, move || {
                let path = yolo_world_path.clone();
                async move {
                    tokio::task::spawn_blocking(move || {
                        YoloWorldDetector::load(&path).map(|d| Arc::new(d) as DynDetector)
                    })
                    .await
                    .map_err(|e| DetectorError::Unavailable(format!("load task failed: {}", e)))?
                }
                .boxed()
            })
    }

    /// Resolve the handle for a back end, loading it on first use.
    pub async fn get(&self, kind: ModelKind) -> Result<DynDetector, DetectorError> {
        let slot = self.slots.get(&kind).ok_or_else(|| {
            DetectorError::Unavailable(format!("no loader registered for {}", kind))
        })?;

        let first_use = slot.cell.get().is_none();
        let detector = slot
            .cell
            .get_or_try_init(|| (slot.loader)())
            .await?
            .clone();
        if first_use {
            info!("{} back end initialized", kind);
        }
        Ok(detector)
    }

    /// Whether the back end has already been loaded.
    pub fn is_loaded(&self, kind: ModelKind) -> bool {
        self.slots
            .get(&kind)
            .map(|slot| slot.cell.get().is_some())
            .unwrap_or(false)
    }

    /// Back ends this registry can serve.
    pub fn kinds(&self) -> Vec<ModelKind> {
        ModelKind::ALL
            .into_iter()
            .filter(|kind| self.slots.contains_key(kind))
            .collect()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
