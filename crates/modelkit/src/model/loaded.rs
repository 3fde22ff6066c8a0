//! The loaded model.

use std::path::Path;

use tracing::{debug, info};
use url::Url;

use super::{LoadError, LoadModelOptions, ModelMeta, TaskKind};
use crate::features::FeaturePipeline;
use crate::inference::InnerModel;
use crate::io::{ModelFile, ModelParts};
use crate::monitor::{
    EventSink, HttpSink, HttpSinkSettings, LogPredictionArgs, LogTrueValueArgs, Monitor,
    MonitorError,
};
use crate::predict::engine::Predictor;
use crate::predict::{PredictInput, PredictOptions, PredictOutput};
use crate::utils::{run_with_threads, Parallelism};

/// Batches smaller than this are predicted on the calling thread.
const PARALLEL_BATCH_MIN_ROWS: usize = 64;

/// A model ready to predict and report.
///
/// `Model` is `Send + Sync`: predictions take `&self`, and the monitoring
/// queue is behind a mutex. Dropping the model releases everything it owns;
/// events still queued at that point are dropped with a warning.
#[derive(Debug)]
pub struct Model {
    id: String,
    task: TaskKind,
    pipeline: FeaturePipeline,
    inner: InnerModel,
    n_threads: usize,
    monitor: Monitor,
}

impl Model {
    // =========================================================================
    // Loading
    // =========================================================================

    /// Load a model file (native or JSON) from disk.
    pub fn from_path(
        path: impl AsRef<Path>,
        options: Option<LoadModelOptions>,
    ) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), n_bytes = bytes.len(), "Read model file");
        Self::from_bytes(&bytes, options)
    }

    /// Load a model from the bytes of a model file (native or JSON).
    pub fn from_bytes(bytes: &[u8], options: Option<LoadModelOptions>) -> Result<Self, LoadError> {
        let options = options.unwrap_or_default();
        let parts = ModelFile::from_bytes(bytes)?.into_parts()?;

        let base_url = options.base_url_or_default();
        let base_url = Url::parse(base_url).map_err(|source| LoadError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let sink = HttpSink::new(
            HttpSinkSettings::builder()
                .base_url(base_url)
                .timeout(options.timeout)
                .build(),
        )?;

        Ok(Self::from_parts(parts, Box::new(sink), options.n_threads))
    }

    /// Assemble a model from validated parts and an event sink.
    pub fn from_parts(parts: ModelParts, sink: Box<dyn EventSink>, n_threads: usize) -> Self {
        let ModelParts {
            id,
            task,
            pipeline,
            inner,
        } = parts;

        info!(
            model_id = %id,
            model_kind = inner.kind_name(),
            n_features = pipeline.n_features(),
            n_groups = inner.n_groups(),
            "Loaded model"
        );

        let monitor = Monitor::new(id.clone(), sink);
        Self {
            id,
            task,
            pipeline,
            inner,
            n_threads,
            monitor,
        }
    }

    /// Replace the event sink, e.g. to report somewhere other than HTTP.
    ///
    /// Events queued on the previous sink are discarded.
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.monitor = Monitor::new(self.id.clone(), sink);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &TaskKind {
        &self.task
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn inner(&self) -> &InnerModel {
        &self.inner
    }

    /// Introspection summary.
    pub fn meta(&self) -> ModelMeta {
        ModelMeta {
            id: self.id.clone(),
            task: self.task.clone(),
            column_names: self
                .pipeline
                .columns()
                .iter()
                .map(|column| column.name.clone())
                .collect(),
            n_features: self.pipeline.n_features(),
            n_groups: self.inner.n_groups(),
            model_kind: self.inner.kind_name().to_string(),
        }
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Predict one record.
    ///
    /// `None` options mean [`PredictOptions::default`].
    pub fn predict_one(
        &self,
        input: &PredictInput,
        options: Option<&PredictOptions>,
    ) -> PredictOutput {
        let default = PredictOptions::default();
        let options = options.unwrap_or(&default);
        let features = self.pipeline.compute(input);
        self.predictor().predict_features(&features, options)
    }

    /// Predict a batch of records, preserving order.
    ///
    /// Large batches are spread over the rayon pool chosen by
    /// [`LoadModelOptions::n_threads`].
    pub fn predict(
        &self,
        inputs: &[PredictInput],
        options: Option<&PredictOptions>,
    ) -> Vec<PredictOutput> {
        let n_threads = if inputs.len() < PARALLEL_BATCH_MIN_ROWS {
            1
        } else {
            self.n_threads
        };
        run_with_threads(n_threads, |parallelism: Parallelism| {
            parallelism.maybe_par_map(inputs, |input| self.predict_one(input, options))
        })
    }

    fn predictor(&self) -> Predictor<'_> {
        Predictor {
            task: &self.task,
            pipeline: &self.pipeline,
            inner: &self.inner,
        }
    }

    // =========================================================================
    // Monitoring
    // =========================================================================

    /// Report a prediction now.
    pub fn log_prediction(&self, args: LogPredictionArgs) -> Result<(), MonitorError> {
        self.monitor.log_prediction(args)
    }

    /// Report a true value now.
    pub fn log_true_value(&self, args: LogTrueValueArgs) -> Result<(), MonitorError> {
        self.monitor.log_true_value(args)
    }

    /// Queue a prediction for the next [`Model::flush_log_queue`].
    pub fn enqueue_log_prediction(&self, args: LogPredictionArgs) {
        self.monitor.enqueue_prediction(args)
    }

    /// Queue a true value for the next [`Model::flush_log_queue`].
    pub fn enqueue_log_true_value(&self, args: LogTrueValueArgs) {
        self.monitor.enqueue_true_value(args)
    }

    /// Send all queued events as one batch. Failed events stay queued.
    pub fn flush_log_queue(&self) -> Result<usize, MonitorError> {
        self.monitor.flush()
    }

    /// Number of queued events.
    pub fn log_queue_len(&self) -> usize {
        self.monitor.queued()
    }
}
