//! AWS SDK implementations of the collaborator traits.
//!
//! The traits are synchronous; each call bridges into the async SDK with
//! `block_in_place`, so handlers must run on a multi-threaded Tokio runtime.

use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::Path;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_s3::primitives::ByteStream;
use idv_core::contract::APP_UUID_ATTRIBUTE;
use idv_core::matching::{
    AnalyzedDocument, DocumentAnalysis, DocumentField, FaceComparison, FaceMatch,
};
use serde_json::Value;

use crate::adapters::document_analyzer::DocumentAnalyzer;
use crate::adapters::face_comparator::FaceComparator;
use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::MessageQueue;
use crate::adapters::record_store::{RecordItem, RecordStore};
use crate::adapters::validation_client::{HttpReply, ValidationClient};
use crate::handlers::Collaborators;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn download(&self, bucket: &str, key: &str, destination: &Path) -> Result<(), String> {
        let client = self.client.clone();
        let bytes = block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|error| format!("failed to read object from s3: {error}"))?;
            output
                .body
                .collect()
                .await
                .map(|data| data.into_bytes())
                .map_err(|error| format!("failed to stream object body: {error}"))
        })?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| format!("failed to create {}: {error}", parent.display()))?;
        }
        fs::write(destination, &bytes)
            .map_err(|error| format!("failed to write {}: {error}", destination.display()))
    }

    fn upload(&self, source: &Path, bucket: &str, key: &str) -> Result<(), String> {
        let client = self.client.clone();
        block_on(async move {
            let body = ByteStream::from_path(source)
                .await
                .map_err(|error| format!("failed to read {}: {error}", source.display()))?;
            client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to write object to s3: {error}"))
        })
    }
}

pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
}

impl RecordStore for DynamoRecordStore {
    fn table_exists(&self, table: &str) -> Result<bool, String> {
        let client = self.client.clone();
        block_on(async move {
            match client.describe_table().table_name(table).send().await {
                Ok(_) => Ok(true),
                Err(error) => {
                    let service_error = error.into_service_error();
                    if service_error.is_resource_not_found_exception() {
                        Ok(false)
                    } else {
                        Err(format!("failed to describe table: {service_error}"))
                    }
                }
            }
        })
    }

    fn put_item(&self, table: &str, item: &RecordItem) -> Result<(), String> {
        let attributes: HashMap<String, AttributeValue> = item
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
            .collect();
        let client = self.client.clone();
        block_on(async move {
            client
                .put_item()
                .table_name(table)
                .set_item(Some(attributes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to put dynamodb item: {error}"))
        })
    }

    fn set_flag(
        &self,
        table: &str,
        app_uuid: &str,
        attribute: &str,
        value: bool,
    ) -> Result<(), String> {
        let client = self.client.clone();
        block_on(async move {
            client
                .update_item()
                .table_name(table)
                .key(APP_UUID_ATTRIBUTE, AttributeValue::S(app_uuid.to_string()))
                .update_expression("SET #attribute = :value")
                .expression_attribute_names("#attribute", attribute)
                .expression_attribute_values(":value", AttributeValue::Bool(value))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to update dynamodb item: {error}"))
        })
    }
}

pub struct RekognitionFaceComparator {
    client: aws_sdk_rekognition::Client,
}

impl FaceComparator for RekognitionFaceComparator {
    fn compare_faces(
        &self,
        bucket: &str,
        source_key: &str,
        target_key: &str,
        similarity_threshold: f32,
    ) -> Result<FaceComparison, String> {
        use aws_sdk_rekognition::types::{Image, QualityFilter, S3Object};

        let image = |key: &str| {
            Image::builder()
                .s3_object(S3Object::builder().bucket(bucket).name(key).build())
                .build()
        };
        let client = self.client.clone();
        let request = client
            .compare_faces()
            .source_image(image(source_key))
            .target_image(image(target_key))
            .similarity_threshold(similarity_threshold)
            .quality_filter(QualityFilter::Auto);

        let output =
            block_on(request.send()).map_err(|error| format!("failed to compare faces: {error}"))?;

        Ok(FaceComparison {
            matches: output
                .face_matches()
                .iter()
                .map(|face_match| FaceMatch {
                    similarity: face_match.similarity().unwrap_or_default(),
                })
                .collect(),
        })
    }
}

pub struct TextractDocumentAnalyzer {
    client: aws_sdk_textract::Client,
}

impl DocumentAnalyzer for TextractDocumentAnalyzer {
    fn analyze_id(&self, bucket: &str, key: &str) -> Result<DocumentAnalysis, String> {
        use aws_sdk_textract::types::{Document, S3Object};

        let page = Document::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();
        let request = self.client.analyze_id().document_pages(page);

        let output =
            block_on(request.send()).map_err(|error| format!("failed to analyze id: {error}"))?;

        Ok(DocumentAnalysis {
            documents: output
                .identity_documents()
                .iter()
                .map(|document| AnalyzedDocument {
                    fields: document
                        .identity_document_fields()
                        .iter()
                        .filter_map(|field| {
                            Some(DocumentField {
                                field_type: field.r#type()?.text().to_string(),
                                value: field.value_detection()?.text().to_string(),
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
    }
}

pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
}

impl Notifier for SnsNotifier {
    fn publish(&self, topic: &str, message: &str, subject: &str) -> Result<(), String> {
        let request = self
            .client
            .publish()
            .topic_arn(topic)
            .message(message)
            .subject(subject);
        block_on(request.send())
            .map(|_| ())
            .map_err(|error| format!("failed to publish notification: {error}"))
    }
}

pub struct SqsMessageQueue {
    client: aws_sdk_sqs::Client,
}

impl MessageQueue for SqsMessageQueue {
    fn send_message(&self, queue_url: &str, body: &str) -> Result<(), String> {
        let request = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body);
        block_on(request.send())
            .map(|_| ())
            .map_err(|error| format!("failed to enqueue message: {error}"))
    }
}

pub struct HttpValidationClient {
    client: reqwest::Client,
}

impl ValidationClient for HttpValidationClient {
    fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, String> {
        let request = self.client.post(url).json(body);
        block_on(async move {
            let response = request
                .send()
                .await
                .map_err(|error| format!("validation request failed: {error}"))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|error| format!("failed to read validation response: {error}"))?;
            Ok(HttpReply { status, body })
        })
    }
}

/// Every AWS-backed collaborator, built once per cold start.
pub struct AwsCollaborators {
    objects: S3ObjectStore,
    records: DynamoRecordStore,
    faces: RekognitionFaceComparator,
    documents: TextractDocumentAnalyzer,
    notifier: SnsNotifier,
    queue: SqsMessageQueue,
    validator: HttpValidationClient,
}

impl AwsCollaborators {
    pub async fn load() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::from_config(&config)
    }

    pub fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self {
            objects: S3ObjectStore {
                client: aws_sdk_s3::Client::new(config),
            },
            records: DynamoRecordStore {
                client: aws_sdk_dynamodb::Client::new(config),
            },
            faces: RekognitionFaceComparator {
                client: aws_sdk_rekognition::Client::new(config),
            },
            documents: TextractDocumentAnalyzer {
                client: aws_sdk_textract::Client::new(config),
            },
            notifier: SnsNotifier {
                client: aws_sdk_sns::Client::new(config),
            },
            queue: SqsMessageQueue {
                client: aws_sdk_sqs::Client::new(config),
            },
            validator: HttpValidationClient {
                client: reqwest::Client::new(),
            },
        }
    }

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
