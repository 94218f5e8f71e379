//! Translation of object messages into bulk operations.

use std::sync::Arc;

use spacetime_indexer_repository::{BulkOperation, DocumentTarget};
use spacetime_indexer_shared::{Action, IndexDocument, ObjectMessage, ObjectPayload};
use tracing::{debug, warn};

use crate::errors::IngestError;
use crate::processor::dates::{DateResolver, FuzzyDateResolver};
use crate::processor::geometry::{GeoJsonDeriver, GeometryDeriver};

/// The operations of one batch, plus the records that could not be translated.
#[derive(Debug, Default)]
pub struct TranslatedBatch {
    pub operations: Vec<BulkOperation>,
    pub rejected: Vec<IngestError>,
}

/// Translates object messages into bulk operations.
///
/// Translation never touches the engine. Create and update both become an
/// upsert of the full document; delete becomes a delete of the same target.
pub struct OperationTranslator {
    geometry: Arc<dyn GeometryDeriver>,
    dates: Arc<dyn DateResolver>,
}

impl Default for OperationTranslator {
    fn default() -> Self {
        Self::new(Arc::new(GeoJsonDeriver::new()), Arc::new(FuzzyDateResolver::new()))
    }
}

impl OperationTranslator {
    /// Create a translator with the given geometry and date strategies.
    pub fn new(geometry: Arc<dyn GeometryDeriver>, dates: Arc<dyn DateResolver>) -> Self {
        Self { geometry, dates }
    }

    /// Translate a single object message.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkOperation)` - The operation targeting `{dataset, type, id}`
    /// * `Err(IngestError)` - A record-local error; see [`IngestError::is_record_local`]
    pub fn translate(&self, message: &ObjectMessage) -> Result<BulkOperation, IngestError> {
        let payload = &message.payload;
        if payload.id.trim().is_empty() {
            return Err(IngestError::invalid_object(&payload.id, "object id is empty"));
        }

        let target = DocumentTarget::new(message.dataset(), &payload.object_type, &payload.id);

        match message.action {
            Action::Create | Action::Update => Ok(BulkOperation::Upsert {
                target,
                document: self.document(payload)?,
            }),
            Action::Delete => Ok(BulkOperation::Delete { target }),
        }
    }

    /// Translate a batch, keeping message order.
    ///
    /// A record that fails to translate is left out; the rest of the batch is
    /// unaffected.
    pub fn translate_batch(&self, messages: &[ObjectMessage]) -> TranslatedBatch {
        let mut batch = TranslatedBatch {
            operations: Vec::with_capacity(messages.len()),
            rejected: Vec::new(),
        };

        for message in messages {
            match self.translate(message) {
                Ok(operation) => batch.operations.push(operation),
                Err(e) => {
                    warn!(
                        dataset = %message.dataset(),
                        object_id = %message.payload.id,
                        error = %e,
                        "Skipping object"
                    );
                    batch.rejected.push(e);
                }
            }
        }

        debug!(
            operation_count = batch.operations.len(),
            rejected_count = batch.rejected.len(),
            "Translated batch"
        );
        batch
    }

    fn document(&self, payload: &ObjectPayload) -> Result<IndexDocument, IngestError> {
        let mut document = IndexDocument::new(&payload.id, &payload.object_type);
        document.name = payload.name.clone();
        document.extra = payload
            .extra
            .iter()
            .filter(|(key, _)| !IndexDocument::DERIVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if let Some(geometry) = &payload.geometry {
            let extent = self
                .geometry
                .derive(geometry)
                .map_err(|e| IngestError::malformed_geometry(&payload.id, e.to_string()))?;
            document.geometry = Some(geometry.clone());
            document.centroid = Some(extent.centroid);
            document.north_west = Some(extent.north_west());
            document.south_east = Some(extent.south_east());
        }

        if let Some(expression) = &payload.valid_since {
            let range = self
                .dates
                .resolve(expression)
                .map_err(|e| IngestError::date_resolution(&payload.id, e.to_string()))?;
            document.valid_since = Some(range.earliest);
        }

        if let Some(expression) = &payload.valid_until {
            let range = self
                .dates
                .resolve(expression)
                .map_err(|e| IngestError::date_resolution(&payload.id, e.to_string()))?;
            document.valid_until = Some(range.latest);
        }

        if let (Some(since), Some(until)) = (document.valid_since, document.valid_until) {
            if since > until {
                return Err(IngestError::date_resolution(
                    &payload.id,
                    "validSince is later than validUntil",
                ));
            }
        }

        Ok(document)
    }
}
