//! In-memory collaborators for unit and integration tests.
//!
//! Every double records what it was asked to do so tests can assert on
//! writes, uploads, notifications and queued messages.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;

use idv_core::contract::APP_UUID_ATTRIBUTE;
use idv_core::matching::{
    AnalyzedDocument, DocumentAnalysis, DocumentField, FaceComparison, FaceMatch,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::adapters::document_analyzer::DocumentAnalyzer;
use crate::adapters::face_comparator::FaceComparator;
use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::MessageQueue;
use crate::adapters::record_store::{RecordItem, RecordStore};
use crate::adapters::validation_client::{HttpReply, ValidationClient};
use crate::handlers::validate_license::handle_validation_event;
use crate::handlers::Collaborators;

pub const TEST_BUCKET: &str = "documentbucket-123456789102";
pub const TEST_TABLE: &str = "applications";
pub const TEST_TOPIC: &str = "arn:aws:sns:us-east-1:123456789102:notifications";
pub const TEST_QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789102/licenses";
pub const TEST_INVOKE_URL: &str = "https://example.execute-api.us-east-1.amazonaws.com/validate";
pub const TEST_APP_UUID: &str = "8d247914";

pub const SAMPLE_DETAILS_CSV: &str = concat!(
    "DOCUMENT_NUMBER,FIRST_NAME,LAST_NAME,DATE_OF_BIRTH,ADDRESS,STATE_IN_ADDRESS,",
    "CITY_IN_ADDRESS,ZIP_CODE_IN_ADDRESS\n",
    "X123,Jo,Doe,01/02/1990,123 Any Street,WA,Seattle,98101\n",
);

/// Fields a document analyzer would report for `SAMPLE_DETAILS_CSV`.
pub fn sample_identity_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("DOCUMENT_NUMBER", "X123"),
        ("FIRST_NAME", "Jo"),
        ("LAST_NAME", "Doe"),
        ("DATE_OF_BIRTH", "01/02/1990"),
        ("ADDRESS", "123 Any Street"),
        ("STATE_IN_ADDRESS", "WA"),
        ("CITY_IN_ADDRESS", "Seattle"),
        ("ZIP_CODE_IN_ADDRESS", "98101"),
    ]
}

/// Zip archive bytes holding `entries` (name, contents).
pub fn archive_bytes(entries: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(contents)?;
    }
    Ok(zip.finish()?.into_inner())
}

pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) -> zip::result::ZipResult<()> {
    fs::write(path, archive_bytes(entries)?)?;
    Ok(())
}

/// Upload archive of one application: selfie, license and `details_csv`.
pub fn sample_archive_bytes(app_uuid: &str, details_csv: &str) -> Vec<u8> {
    let selfie = format!("{app_uuid}_selfie.png");
    let license = format!("{app_uuid}_license.png");
    let details = format!("{app_uuid}_details.csv");
    archive_bytes(&[
        (selfie.as_str(), b"selfie-image".as_slice()),
        (license.as_str(), b"license-image".as_slice()),
        (details.as_str(), details_csv.as_bytes()),
    ])
    .expect("sample archive should be written")
}

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    uploads: Mutex<Vec<String>>,
    failing_upload_suffix: Option<String>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects uploads of keys ending with `suffix`.
    pub fn failing_upload(mut self, suffix: &str) -> Self {
        self.failing_upload_suffix = Some(suffix.to_string());
        self
    }

    pub fn seed_object(&self, bucket: &str, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys uploaded so far, in upload order.
    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().expect("poisoned mutex").clone()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<(), String> {
        let body = self
            .object(bucket, key)
            .ok_or_else(|| format!("NoSuchKey: {bucket}/{key}"))?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|error| error.to_string())?;
        }
        fs::write(destination, body).map_err(|error| error.to_string())
    }

    fn upload(&self, source: &Path, bucket: &str, key: &str) -> Result<(), String> {
        if let Some(suffix) = &self.failing_upload_suffix {
            if key.ends_with(suffix.as_str()) {
                return Err(format!("simulated upload failure for key: {key}"));
            }
        }
        let body = fs::read(source).map_err(|error| error.to_string())?;
        self.seed_object(bucket, key, &body);
        self.uploads
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredItem {
    attributes: BTreeMap<String, StoredValue>,
}

impl StoredItem {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(StoredValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.attributes.get(name) {
            Some(StoredValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Table store with DynamoDB-like key handling: puts replace the whole item,
/// flag updates upsert a single attribute.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<BTreeMap<String, BTreeMap<String, StoredItem>>>,
    writes: Mutex<usize>,
    fail_writes: bool,
}

impl InMemoryRecordStore {
    pub fn with_table(table: &str) -> Self {
        let store = Self::default();
        store
            .tables
            .lock()
            .expect("poisoned mutex")
            .insert(table.to_string(), BTreeMap::new());
        store
    }

    pub fn without_tables() -> Self {
        Self::default()
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn item(&self, table: &str, app_uuid: &str) -> Option<StoredItem> {
        self.tables
            .lock()
            .expect("poisoned mutex")
            .get(table)
            .and_then(|items| items.get(app_uuid))
            .cloned()
    }

    pub fn item_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .expect("poisoned mutex")
            .get(table)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Accepted writes across all tables.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().expect("poisoned mutex")
    }

    fn write(
        &self,
        table: &str,
        app_uuid: &str,
        apply: impl FnOnce(&mut StoredItem),
    ) -> Result<(), String> {
        if self.fail_writes {
            return Err(format!("simulated write failure for table: {table}"));
        }
        let mut tables = self.tables.lock().expect("poisoned mutex");
        let items = tables
            .get_mut(table)
            .ok_or_else(|| format!("ResourceNotFoundException: {table}"))?;
        let item = items.entry(app_uuid.to_string()).or_default();
        apply(item);
        *self.writes.lock().expect("poisoned mutex") += 1;
        Ok(())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn table_exists(&self, table: &str) -> Result<bool, String> {
        Ok(self
            .tables
            .lock()
            .expect("poisoned mutex")
            .contains_key(table))
    }

    fn put_item(&self, table: &str, item: &RecordItem) -> Result<(), String> {
        let app_uuid = item
            .get(APP_UUID_ATTRIBUTE)
            .ok_or_else(|| format!("missing key attribute {APP_UUID_ATTRIBUTE}"))?
            .clone();
        self.write(table, &app_uuid, |stored| {
            stored.attributes = item
                .iter()
                .map(|(name, value)| (name.clone(), StoredValue::Text(value.clone())))
                .collect();
        })
    }

    fn set_flag(
        &self,
        table: &str,
        app_uuid: &str,
        attribute: &str,
        value: bool,
    ) -> Result<(), String> {
        self.write(table, app_uuid, |stored| {
            stored.attributes.insert(
                APP_UUID_ATTRIBUTE.to_string(),
                StoredValue::Text(app_uuid.to_string()),
            );
            stored
                .attributes
                .insert(attribute.to_string(), StoredValue::Flag(value));
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceComparisonCall {
    pub bucket: String,
    pub source_key: String,
    pub target_key: String,
    pub similarity_threshold: f32,
}

pub struct StaticFaceComparator {
    response: Result<FaceComparison, String>,
    calls: Mutex<Vec<FaceComparisonCall>>,
}

impl StaticFaceComparator {
    pub fn with_similarities(similarities: &[f32]) -> Self {
        Self {
            response: Ok(FaceComparison {
                matches: similarities
                    .iter()
                    .map(|similarity| FaceMatch {
                        similarity: *similarity,
                    })
                    .collect(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<FaceComparisonCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl FaceComparator for StaticFaceComparator {
    fn compare_faces(
        &self,
        bucket: &str,
        source_key: &str,
        target_key: &str,
        similarity_threshold: f32,
    ) -> Result<FaceComparison, String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(FaceComparisonCall {
                bucket: bucket.to_string(),
                source_key: source_key.to_string(),
                target_key: target_key.to_string(),
                similarity_threshold,
            });
        self.response.clone()
    }
}

pub struct StaticDocumentAnalyzer {
    response: Result<DocumentAnalysis, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StaticDocumentAnalyzer {
    pub fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self::with_analysis(DocumentAnalysis {
            documents: vec![AnalyzedDocument {
                fields: fields
                    .iter()
                    .map(|(field_type, value)| DocumentField {
                        field_type: field_type.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
            }],
        })
    }

    pub fn with_analysis(analysis: DocumentAnalysis) -> Self {
        Self {
            response: Ok(analysis),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (bucket, key) of every analyzed document.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl DocumentAnalyzer for StaticDocumentAnalyzer {
    fn analyze_id(&self, bucket: &str, key: &str) -> Result<DocumentAnalysis, String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((bucket.to_string(), key.to_string()));
        self.response.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub topic: String,
    pub message: String,
    pub subject: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<PublishedNotification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<PublishedNotification> {
        self.published.lock().expect("poisoned mutex").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, topic: &str, message: &str, subject: &str) -> Result<(), String> {
        if self.fail {
            return Err("simulated publish failure".to_string());
        }
        self.published
            .lock()
            .expect("poisoned mutex")
            .push(PublishedNotification {
                topic: topic.to_string(),
                message: message.to_string(),
                subject: subject.to_string(),
            });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn messages<T: DeserializeOwned>(&self) -> Vec<T> {
        self.bodies()
            .iter()
            .map(|body| serde_json::from_str(body).expect("queued body should decode"))
            .collect()
    }

    /// Queue event carrying the first sent message, as the submitter receives it.
    pub fn first_as_event(&self) -> Option<Value> {
        self.bodies()
            .first()
            .map(|body| json!({"Records": [{"eventSource": "aws:sqs", "body": body}]}))
    }
}

impl MessageQueue for RecordingQueue {
    fn send_message(&self, queue_url: &str, body: &str) -> Result<(), String> {
        if self.fail {
            return Err("simulated queue failure".to_string());
        }
        self.sent
            .lock()
            .expect("poisoned mutex")
            .push((queue_url.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct StaticValidationClient {
    reply: Result<HttpReply, String>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl StaticValidationClient {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(HttpReply {
                status,
                body: body.to_string(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// (url, body) of every request.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().expect("poisoned mutex").clone()
    }
}

impl ValidationClient for StaticValidationClient {
    fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push((url.to_string(), body.clone()));
        self.reply.clone()
    }
}

/// Routes requests through the validation stub handler, as API Gateway would.
#[derive(Default)]
pub struct EchoValidationClient {
    requests: Mutex<Vec<Value>>,
}

impl EchoValidationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("poisoned mutex").clone()
    }
}

impl ValidationClient for EchoValidationClient {
    fn post_json(&self, _url: &str, body: &Value) -> Result<HttpReply, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(body.clone());
        let response = handle_validation_event(json!({ "body": body.to_string() }));
        Ok(HttpReply {
            status: response.status_code,
            body: response.body,
        })
    }
}

/// One double per collaborator, with a happy-path default for each.
pub struct TestServices {
    pub objects: InMemoryObjectStore,
    pub records: InMemoryRecordStore,
    pub faces: StaticFaceComparator,
    pub documents: StaticDocumentAnalyzer,
    pub notifier: RecordingNotifier,
    pub queue: RecordingQueue,
    pub validator: EchoValidationClient,
}

impl Default for TestServices {
    fn default() -> Self {
        Self {
            objects: InMemoryObjectStore::new(),
            records: InMemoryRecordStore::with_table(TEST_TABLE),
            faces: StaticFaceComparator::with_similarities(&[95.0]),
            documents: StaticDocumentAnalyzer::with_fields(&sample_identity_fields()),
            notifier: RecordingNotifier::new(),
            queue: RecordingQueue::new(),
            validator: EchoValidationClient::new(),
        }
    }
}

impl TestServices {
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            objects: &self.objects,
            records: &self.records,
            faces: &self.faces,
            documents: &self.documents,
            notifier: &self.notifier,
            queue: &self.queue,
            validator: &self.validator,
        }
    }
}
