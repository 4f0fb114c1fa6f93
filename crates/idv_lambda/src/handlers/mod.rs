use crate::adapters::document_analyzer::DocumentAnalyzer;
use crate::adapters::face_comparator::FaceComparator;
use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::MessageQueue;
use crate::adapters::record_store::RecordStore;
use crate::adapters::validation_client::ValidationClient;

pub mod details;
pub mod document;
pub mod face;
pub mod ingest;
pub mod pipeline;
pub mod stages;
pub mod submit_license;
pub mod validate_license;

/// External services a stage may call, injected per invocation.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub objects: &'a dyn ObjectStore,
    pub records: &'a dyn RecordStore,
    pub faces: &'a dyn FaceComparator,
    pub documents: &'a dyn DocumentAnalyzer,
    pub notifier: &'a dyn Notifier,
    pub queue: &'a dyn MessageQueue,
    pub validator: &'a dyn ValidationClient,
}
