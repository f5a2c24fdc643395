//! Thermal index pipeline over streams of gridded forecast records.
//!
//! Records are pulled from a [`RecordDecoder`], grouped into batches of one
//! forecast step and ensemble member by the [`BatchAggregator`], checked by
//! the [`BatchValidator`], turned into derived grids by the
//! [`IndexPipeline`], and written back through a [`RecordEncoder`].
//! [`run`] drives the whole sequence for one input stream.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod grib;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod source;
pub mod validator;

pub use aggregator::{AggregatorStats, BatchAggregator};
pub use config::{FieldRoles, InvalidBatchPolicy, ParameterOverride, ThermalConfig};
pub use error::{PipelineError, Result};
pub use grib::{GribHandle, GribRecordDecoder, GribRecordEncoder};
pub use pipeline::{flux_scaling_factor, DerivedIndex, IndexKind, IndexPipeline};
pub use record::{Batch, GridShape, GroupKey, ParameterId, Record};
pub use runner::{run, ManifestEntry, RunManifest, RunSummary};
pub use source::{IterDecoder, RecordDecoder, RecordEncoder};
pub use validator::BatchValidator;
