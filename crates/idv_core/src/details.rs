use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::contract::{
    ApplicationDetailsOutput, LicenseSubmissionMessage, DOCUMENT_NUMBER_FIELD, MISSING_LICENSE_ID,
};
use crate::error::{Result, VerificationError};

/// Submitted personal details: CSV header -> value of the first data row.
pub type SubmittedDetails = BTreeMap<String, String>;

pub fn parse_details_file(path: &Path) -> Result<SubmittedDetails> {
    let reader = csv::Reader::from_path(path).map_err(|error| {
        VerificationError::Parse(format!("cannot open details file {}: {error}", path.display()))
    })?;
    first_row(reader)
}

pub fn parse_details(text: &str) -> Result<SubmittedDetails> {
    first_row(csv::Reader::from_reader(text.as_bytes()))
}

// Only the first data row is ever read; trailing rows are ignored.
fn first_row<R: Read>(mut reader: csv::Reader<R>) -> Result<SubmittedDetails> {
    let headers = reader.headers().map_err(malformed("header"))?.clone();
    if headers.is_empty() {
        return Err(VerificationError::Parse("details file is empty".to_string()));
    }

    let record = reader
        .records()
        .next()
        .ok_or_else(|| VerificationError::Parse("details file has no data row".to_string()))?
        .map_err(malformed("row"))?;

    Ok(headers
        .iter()
        .zip(record.iter())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

fn malformed(part: &'static str) -> impl Fn(csv::Error) -> VerificationError {
    move |error| VerificationError::Parse(format!("invalid details {part}: {error}"))
}

/// Driver license number to submit for validation.
pub fn driver_license_id(details: &SubmittedDetails) -> String {
    details
        .get(DOCUMENT_NUMBER_FIELD)
        .cloned()
        .unwrap_or_else(|| MISSING_LICENSE_ID.to_string())
}

pub fn submission_message(app_uuid: &str, details: &SubmittedDetails) -> LicenseSubmissionMessage {
    LicenseSubmissionMessage {
        driver_license_id: driver_license_id(details),
        validation_override: true,
        uuid: app_uuid.to_string(),
    }
}

pub fn details_output(app_uuid: &str, details: &SubmittedDetails) -> ApplicationDetailsOutput {
    ApplicationDetailsOutput {
        driver_license_id: driver_license_id(details),
        validation_override: true,
        app_uuid: app_uuid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_header_and_first_row() {
        let text = "DOCUMENT_NUMBER,FIRST_NAME,LAST_NAME\nX123,Jo,Doe\nY456,Al,Roe\n";
        let details = parse_details(text).expect("details should parse");

        assert_eq!(details.len(), 3);
        assert_eq!(details["DOCUMENT_NUMBER"], "X123");
        assert_eq!(details["FIRST_NAME"], "Jo");
        assert_eq!(details["LAST_NAME"], "Doe");
    }

    #[test]
    fn rejects_empty_input() {
        let error = parse_details("").expect_err("empty csv should fail");
        assert!(matches!(error, VerificationError::Parse(_)));
    }

    #[test]
    fn rejects_header_without_rows() {
        let error = parse_details("DOCUMENT_NUMBER,FIRST_NAME\n").expect_err("no rows");
        assert_eq!(
            error,
            VerificationError::Parse("details file has no data row".to_string())
        );
    }

    #[test]
    fn rejects_row_with_wrong_field_count() {
        let error = parse_details("DOCUMENT_NUMBER,FIRST_NAME\nX123\n").expect_err("short row");
        assert!(matches!(error, VerificationError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = parse_details_file(&dir.path().join("missing_details.csv"))
            .expect_err("missing file should fail");
        assert!(matches!(error, VerificationError::Parse(_)));
    }

    #[test]
    fn reads_details_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "DOCUMENT_NUMBER,FIRST_NAME\nX123,Jo\n").expect("write csv");

        let details = parse_details_file(file.path()).expect("details should parse");
        assert_eq!(details["DOCUMENT_NUMBER"], "X123");
    }

    #[test]
    fn license_id_defaults_when_document_number_missing() {
        let details = parse_details("FIRST_NAME\nJo\n").expect("details should parse");
        let message = submission_message("8d247914", &details);

        assert_eq!(message.driver_license_id, "0");
        assert!(message.validation_override);
        assert_eq!(message.uuid, "8d247914");
    }
}
