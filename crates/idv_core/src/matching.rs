//! Decision rules for the face and document comparison stages.
//!
//! The comparator and analyzer are opaque services; these types mirror the
//! subset of their responses the rules look at.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::{CUSTOMER_INFORMATION, SIMILARITY_THRESHOLD};
use crate::details::SubmittedDetails;
use crate::error::{Result, VerificationError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceMatch {
    pub similarity: f32,
}

/// Face comparison response; matches are ordered as the service returns them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceComparison {
    pub matches: Vec<FaceMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentField {
    pub field_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedDocument {
    pub fields: Vec<DocumentField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub documents: Vec<AnalyzedDocument>,
}

/// Recognized identity fields read off a license.
pub type ExtractedFields = BTreeMap<String, String>;

/// True iff the first reported match reaches the threshold (inclusive).
/// An empty match list is a negative outcome, not an error.
pub fn is_face_match(comparison: &FaceComparison) -> bool {
    comparison
        .matches
        .first()
        .map(|first| first.similarity >= SIMILARITY_THRESHOLD)
        .unwrap_or(false)
}

pub fn extract_identity_fields(analysis: &DocumentAnalysis) -> Result<ExtractedFields> {
    let document = analysis.documents.first().ok_or_else(|| {
        VerificationError::ExternalService(
            "document analysis returned no identity documents".to_string(),
        )
    })?;

    Ok(document
        .fields
        .iter()
        .filter(|field| CUSTOMER_INFORMATION.contains(&field.field_type.as_str()))
        .map(|field| (field.field_type.clone(), field.value.clone()))
        .collect())
}

/// Strict equality: same keys, same values. A field present on only one side
/// is a mismatch.
pub fn details_match(extracted: &ExtractedFields, submitted: &SubmittedDetails) -> bool {
    extracted == submitted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(similarities: &[f32]) -> FaceComparison {
        FaceComparison {
            matches: similarities
                .iter()
                .map(|similarity| FaceMatch {
                    similarity: *similarity,
                })
                .collect(),
        }
    }

    fn field(field_type: &str, value: &str) -> DocumentField {
        DocumentField {
            field_type: field_type.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn similarity_at_threshold_matches() {
        assert!(is_face_match(&comparison(&[80.0])));
    }

    #[test]
    fn similarity_below_threshold_does_not_match() {
        assert!(!is_face_match(&comparison(&[79.0])));
        assert!(!is_face_match(&comparison(&[79.99])));
    }

    #[test]
    fn empty_match_list_does_not_match() {
        assert!(!is_face_match(&FaceComparison::default()));
    }

    #[test]
    fn only_first_match_is_considered() {
        assert!(!is_face_match(&comparison(&[40.0, 99.0])));
    }

    #[test]
    fn extraction_keeps_only_recognized_fields() {
        let analysis = DocumentAnalysis {
            documents: vec![AnalyzedDocument {
                fields: vec![
                    field("DOCUMENT_NUMBER", "X123"),
                    field("FIRST_NAME", "Jo"),
                    field("EXPIRATION_DATE", "2030-01-01"),
                    field("VETERAN", ""),
                ],
            }],
        };

        let extracted = extract_identity_fields(&analysis).expect("document present");
        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted["DOCUMENT_NUMBER"], "X123");
        assert_eq!(extracted["FIRST_NAME"], "Jo");
    }

    #[test]
    fn extraction_fails_without_documents() {
        let error = extract_identity_fields(&DocumentAnalysis::default())
            .expect_err("no documents should fail");
        assert!(matches!(error, VerificationError::ExternalService(_)));
    }

    #[test]
    fn equal_maps_match() {
        let extracted = ExtractedFields::from([
            ("DOCUMENT_NUMBER".to_string(), "X123".to_string()),
            ("FIRST_NAME".to_string(), "Jo".to_string()),
        ]);
        assert!(details_match(&extracted, &extracted.clone()));
    }

    #[test]
    fn differing_value_does_not_match() {
        let extracted = ExtractedFields::from([("FIRST_NAME".to_string(), "Jo".to_string())]);
        let submitted = SubmittedDetails::from([("FIRST_NAME".to_string(), "Joe".to_string())]);
        assert!(!details_match(&extracted, &submitted));
    }

    // Pins the strict comparison: a submitted column the analyzer never
    // reports makes the whole comparison fail even when shared fields agree.
    #[test]
    fn extra_submitted_field_does_not_match() {
        let extracted = ExtractedFields::from([("FIRST_NAME".to_string(), "Jo".to_string())]);
        let submitted = SubmittedDetails::from([
            ("FIRST_NAME".to_string(), "Jo".to_string()),
            ("EMAIL".to_string(), "jo@example.com".to_string()),
        ]);
        assert!(!details_match(&extracted, &submitted));
    }

    #[test]
    fn missing_submitted_field_does_not_match() {
        let extracted = ExtractedFields::from([
            ("FIRST_NAME".to_string(), "Jo".to_string()),
            ("LAST_NAME".to_string(), "Doe".to_string()),
        ]);
        let submitted = SubmittedDetails::from([("FIRST_NAME".to_string(), "Jo".to_string())]);
        assert!(!details_match(&extracted, &submitted));
    }
}
