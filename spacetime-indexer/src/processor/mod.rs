//! Processor module for the indexer.
//!
//! Turns object messages into bulk operations: derives centroid and bounding
//! box corners from geometries and resolves approximate validity dates.

pub mod dates;
pub mod geometry;
mod operation_translator;

pub use dates::{DateError, DateRange, DateResolver, FuzzyDateResolver};
pub use geometry::{GeoJsonDeriver, GeometryDeriver, GeometryError, GeometryExtent};
pub use operation_translator::{OperationTranslator, TranslatedBatch};
