//! Remove the permanent location from inventory items found by barcode

use super::{find_unique, write_outcome, JobOptions, Lookup};
use crate::batch::{Outcome, RecordMutator};
use crate::folio::{item_path, query, ApiError, FolioApi, ITEMS_PATH};
use crate::mapping::MappingEntry;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Items are kept as raw JSON; only the two location attributes are touched
pub struct ClearLocation {
    options: JobOptions,
}

impl ClearLocation {
    pub fn new(options: JobOptions) -> Self {
        Self { options }
    }
}

/// `"<id> <name>"` of the location being removed
fn describe_location(item: &Map<String, Value>) -> String {
    let id = item
        .get("permanentLocationId")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let name = item
        .get("permanentLocation")
        .and_then(|loc| loc.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    format!("{} {}", id, name).trim().to_string()
}

#[async_trait]
impl RecordMutator for ClearLocation {
    type Item = MappingEntry;

    fn name(&self) -> &'static str {
        "clear-location"
    }

    fn describe(&self, entry: &MappingEntry) -> (String, String) {
        (entry.key.clone(), String::new())
    }

    async fn apply(&self, api: &dyn FolioApi, entry: &MappingEntry) -> Result<Outcome, ApiError> {
        let barcode = &entry.key;
        let item: Map<String, Value> =
            match find_unique(api, ITEMS_PATH, "items", &query::item_by_barcode(barcode)).await? {
                Lookup::Found(item) => item,
                Lookup::NotFound => {
                    return Ok(Outcome::manual_review(format!(
                        "No item matching barcode {}",
                        barcode
                    )))
                }
                Lookup::Ambiguous(n) => {
                    return Ok(Outcome::manual_review(format!(
                        "{} items matched barcode {}",
                        n, barcode
                    )))
                }
            };
        let id = item
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Decode(format!("item with barcode {} has no id", barcode)))?
            .to_string();

        let original = describe_location(&item);
        let mut updated = item;
        let had_id = updated.remove("permanentLocationId").is_some();
        let had_location = updated.remove("permanentLocation").is_some();
        if !had_id && !had_location {
            return Ok(Outcome::unchanged("Item had no permanentLocation").with_record(id));
        }

        if self.options.dry_run {
            return Ok(Outcome::dry_run("would remove permanent location")
                .with_record(id)
                .with_original(original));
        }

        let response = api.put_json(&item_path(&id), &Value::Object(updated)).await?;
        Ok(write_outcome(&response).with_record(id).with_original(original))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::OutcomeKind;
    use crate::folio::MockFolioClient;
    use serde_json::json;

    fn entry(barcode: &str) -> MappingEntry {
        MappingEntry { key: barcode.into(), value: String::new(), line: 1 }
    }

    fn item(id: &str, barcode: &str) -> Value {
        json!({
            "id": id,
            "barcode": barcode,
            "status": {"name": "Available"},
            "permanentLocationId": "loc-stacks",
            "permanentLocation": {"id": "loc-stacks", "name": "Main Stacks"},
            "effectiveLocationId": "loc-stacks",
        })
    }

    #[tokio::test]
    async fn test_removes_both_attributes() {
        let mock = MockFolioClient::new();
        mock.add_item(item("i1", "3901")).await;

        let outcome = ClearLocation::new(JobOptions::default())
            .apply(&mock, &entry("3901"))
            .await
            .unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Updated);
        assert_eq!(outcome.original.as_deref(), Some("loc-stacks Main Stacks"));

        let stored = mock.record(&item_path("i1")).await.unwrap();
        assert!(stored.get("permanentLocationId").is_none());
        assert!(stored.get("permanentLocation").is_none());
        assert_eq!(stored["effectiveLocationId"], "loc-stacks");
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let mock = MockFolioClient::new();
        mock.add_item(item("i1", "3901")).await;
        let job = ClearLocation::new(JobOptions::default());
        job.apply(&mock, &entry("3901")).await.unwrap();

        let outcome = job.apply(&mock, &entry("3901")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Unchanged);
        assert_eq!(mock.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_barcodes() {
        let mock = MockFolioClient::new();
        mock.add_item(item("i1", "dup")).await;
        mock.add_item(item("i2", "dup")).await;
        let job = ClearLocation::new(JobOptions::default());

        let missing = job.apply(&mock, &entry("nope")).await.unwrap();
        assert_eq!(missing.kind, OutcomeKind::ManualReview);
        assert_eq!(missing.message, "No item matching barcode nope");

        let dup = job.apply(&mock, &entry("dup")).await.unwrap();
        assert_eq!(dup.kind, OutcomeKind::ManualReview);
        assert_eq!(dup.message, "2 items matched barcode dup");
        assert!(mock.writes().await.is_empty());
    }
}
