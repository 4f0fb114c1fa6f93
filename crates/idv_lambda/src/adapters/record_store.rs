use std::collections::BTreeMap;

use idv_core::contract::APP_UUID_ATTRIBUTE;
use idv_core::error::{Result, VerificationError};
use tracing::info;

/// Whole-item attributes as written by the details writer.
pub type RecordItem = BTreeMap<String, String>;

/// Application table keyed by `APP_UUID`.
pub trait RecordStore {
    fn table_exists(&self, table: &str) -> std::result::Result<bool, String>;

    /// Creates or replaces the whole item. `item` must carry the key attribute.
    fn put_item(&self, table: &str, item: &RecordItem) -> std::result::Result<(), String>;

    /// Upserts one boolean attribute of the item keyed by `app_uuid`, leaving
    /// every other attribute untouched.
    fn set_flag(
        &self,
        table: &str,
        app_uuid: &str,
        attribute: &str,
        value: bool,
    ) -> std::result::Result<(), String>;
}

/// A table name that has been checked against the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    name: String,
}

impl TableHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub fn resolve_table(table: Option<&str>, records: &dyn RecordStore) -> Result<TableHandle> {
    let name = table
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| VerificationError::Config("TABLE must be configured".to_string()))?;

    match records.table_exists(name) {
        Ok(true) => Ok(TableHandle {
            name: name.to_string(),
        }),
        Ok(false) => Err(VerificationError::NotFound(format!("table {name} not found"))),
        Err(error) => {
            Err(VerificationError::NotFound(format!("could not open table {name}: {error}")))
        }
    }
}

pub fn put_details(
    records: &dyn RecordStore,
    table: &TableHandle,
    app_uuid: &str,
    details: &RecordItem,
) -> Result<()> {
    let mut item = details.clone();
    item.insert(APP_UUID_ATTRIBUTE.to_string(), app_uuid.to_string());
    records.put_item(table.name(), &item).map_err(|error| {
        VerificationError::Write(format!("could not put item for {app_uuid}: {error}"))
    })?;
    info!(app_uuid, table = table.name(), "details_written");
    Ok(())
}

pub fn write_outcome(
    records: &dyn RecordStore,
    table: &TableHandle,
    app_uuid: &str,
    attribute: &str,
    value: bool,
) -> Result<()> {
    records
        .set_flag(table.name(), app_uuid, attribute, value)
        .map_err(|error| {
            VerificationError::Write(format!(
                "could not update {attribute} for {app_uuid}: {error}"
            ))
        })?;
    info!(app_uuid, attribute, value, "outcome_written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryRecordStore;

    #[test]
    fn unset_table_is_a_config_error() {
        let store = InMemoryRecordStore::with_table("applications");
        assert!(matches!(
            resolve_table(None, &store),
            Err(VerificationError::Config(_))
        ));
        assert!(matches!(
            resolve_table(Some("  "), &store),
            Err(VerificationError::Config(_))
        ));
    }

    #[test]
    fn unknown_table_is_not_found() {
        let store = InMemoryRecordStore::with_table("applications");
        let error = resolve_table(Some("other"), &store).expect_err("unknown table");
        assert_eq!(
            error,
            VerificationError::NotFound("table other not found".to_string())
        );
    }

    #[test]
    fn put_details_adds_key_attribute() {
        let store = InMemoryRecordStore::with_table("applications");
        let table = resolve_table(Some("applications"), &store).expect("table exists");
        let details = RecordItem::from([("FIRST_NAME".to_string(), "Jo".to_string())]);

        put_details(&store, &table, "8d247914", &details).expect("put should succeed");

        let item = store
            .item("applications", "8d247914")
            .expect("item should be written");
        assert_eq!(item.text("FIRST_NAME"), Some("Jo"));
        assert_eq!(item.text(APP_UUID_ATTRIBUTE), Some("8d247914"));
    }

    #[test]
    fn repeated_outcome_write_is_idempotent() {
        let store = InMemoryRecordStore::with_table("applications");
        let table = resolve_table(Some("applications"), &store).expect("table exists");

        write_outcome(&store, &table, "8d247914", "LICENSE_SELFIE_MATCH", true).expect("first");
        let after_first = store.item("applications", "8d247914");
        write_outcome(&store, &table, "8d247914", "LICENSE_SELFIE_MATCH", true).expect("second");

        assert_eq!(store.item("applications", "8d247914"), after_first);
        assert_eq!(store.item_count("applications"), 1);
    }

    #[test]
    fn outcome_write_preserves_other_attributes() {
        let store = InMemoryRecordStore::with_table("applications");
        let table = resolve_table(Some("applications"), &store).expect("table exists");
        let details = RecordItem::from([("FIRST_NAME".to_string(), "Jo".to_string())]);
        put_details(&store, &table, "8d247914", &details).expect("put");

        write_outcome(&store, &table, "8d247914", "LICENSE_DETAILS_MATCH", false).expect("set");

        let item = store.item("applications", "8d247914").expect("item");
        assert_eq!(item.text("FIRST_NAME"), Some("Jo"));
        assert_eq!(item.flag("LICENSE_DETAILS_MATCH"), Some(false));
    }

    #[test]
    fn rejected_write_is_a_write_error() {
        let store = InMemoryRecordStore::with_table("applications").failing_writes();
        let table = resolve_table(Some("applications"), &store).expect("table exists");

        let error = write_outcome(&store, &table, "8d247914", "LICENSE_VALIDATION", true)
            .expect_err("write should fail");
        assert!(matches!(error, VerificationError::Write(_)));
    }
}
