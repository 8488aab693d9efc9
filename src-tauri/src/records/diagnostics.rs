//! Diagnostic test records (`diagnosticTests/{id}`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::backend::{Document, DocumentStore, Fields};
use crate::error::{Result, VitalWatchError};
use crate::validation::is_non_empty;

pub const TESTS_COLLECTION: &str = "diagnosticTests";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticTest {
    pub id: String,
    pub name: String,
    pub result: String,
    pub date: String,
}

#[derive(Deserialize)]
struct StoredTest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    result: String,
    #[serde(default)]
    date: String,
}

impl DiagnosticTest {
    fn from_document(doc: Document) -> Result<Self> {
        let stored: StoredTest = serde_json::from_value(Value::Object(doc.fields))?;
        Ok(Self {
            id: doc.id,
            name: stored.name,
            result: stored.result,
            date: stored.date,
        })
    }
}

/// Form values for add and update. All three fields are required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiagnosticTestInput {
    pub name: String,
    pub result: String,
    pub date: String,
}

impl DiagnosticTestInput {
    pub fn validate(&self) -> Result<()> {
        if !is_non_empty(&self.name) || !is_non_empty(&self.result) || !is_non_empty(&self.date) {
            return Err(VitalWatchError::Validation(
                "Name, result and date are required.".to_string(),
            ));
        }
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            VitalWatchError::Validation("Date must be in YYYY-MM-DD format.".to_string())
        })?;
        Ok(())
    }

    fn to_fields(&self) -> Fields {
        match json!({
            "name": self.name.trim(),
            "result": self.result.trim(),
            "date": self.date.trim(),
        }) {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }
}

pub async fn list_tests(store: &dyn DocumentStore) -> Result<Vec<DiagnosticTest>> {
    let docs = store.get_all(TESTS_COLLECTION).await?;
    Ok(docs
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            DiagnosticTest::from_document(doc)
                .map_err(|e| warn!("Skipping malformed diagnostic test {}: {}", id, e))
                .ok()
        })
        .collect())
}

pub async fn add_test(store: &dyn DocumentStore, input: &DiagnosticTestInput) -> Result<String> {
    input.validate()?;
    let id = store.add(TESTS_COLLECTION, input.to_fields()).await?;
    info!("Added diagnostic test: {}", id);
    Ok(id)
}

pub async fn update_test(
    store: &dyn DocumentStore,
    id: &str,
    input: &DiagnosticTestInput,
) -> Result<()> {
    input.validate()?;
    store.update(TESTS_COLLECTION, id, input.to_fields()).await?;
    info!("Updated diagnostic test: {}", id);
    Ok(())
}

pub async fn delete_test(store: &dyn DocumentStore, id: &str) -> Result<()> {
    store.delete(TESTS_COLLECTION, id).await?;
    info!("Deleted diagnostic test: {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryStore;

    fn cbc() -> DiagnosticTestInput {
        DiagnosticTestInput {
            name: "CBC".into(),
            result: "Normal".into(),
            date: "2025-01-01".into(),
        }
    }

    #[test]
    fn test_input_validation() {
        assert!(cbc().validate().is_ok());

        let blank = DiagnosticTestInput {
            result: " ".into(),
            ..cbc()
        };
        assert_eq!(
            blank.validate().unwrap_err().user_message(),
            "Name, result and date are required."
        );

        let bad_date = DiagnosticTestInput {
            date: "01/01/2025".into(),
            ..cbc()
        };
        assert!(bad_date.validate().is_err());

        let impossible = DiagnosticTestInput {
            date: "2025-02-30".into(),
            ..cbc()
        };
        assert!(impossible.validate().is_err());
    }

    #[tokio::test]
    async fn test_add_update_delete() {
        let store = MemoryStore::new();
        let id = add_test(&store, &cbc()).await.unwrap();

        let tests = list_tests(&store).await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id, id);
        assert_eq!(tests[0].name, "CBC");

        let abnormal = DiagnosticTestInput {
            result: "Low hemoglobin".into(),
            ..cbc()
        };
        update_test(&store, &id, &abnormal).await.unwrap();
        assert_eq!(list_tests(&store).await.unwrap()[0].result, "Low hemoglobin");

        delete_test(&store, &id).await.unwrap();
        assert!(list_tests(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_store() {
        let store = MemoryStore::new();
        let blank = DiagnosticTestInput {
            name: "".into(),
            ..cbc()
        };
        assert!(add_test(&store, &blank).await.is_err());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_record_fails() {
        let store = MemoryStore::new();
        let err = update_test(&store, "missing", &cbc()).await.unwrap_err();
        assert!(matches!(err, VitalWatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_fields_list_as_empty() {
        let store = MemoryStore::new();
        store.insert(TESTS_COLLECTION, json!({ "name": "Lipid panel" }).as_object().cloned().unwrap());
        store.insert(TESTS_COLLECTION, json!({ "name": 42 }).as_object().cloned().unwrap());

        let tests = list_tests(&store).await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].result, "");
        assert_eq!(tests[0].date, "");
    }
}
