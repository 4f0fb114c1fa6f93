pub mod aws;
pub mod document_analyzer;
pub mod face_comparator;
pub mod notifier;
pub mod object_store;
pub mod queue;
pub mod record_store;
pub mod validation_client;
