use crate::storage::{Artifact, Lakehouse, Layer};
use serde::Serialize;
use serde_json::Value;

/// Keys shown from the first record.
const SAMPLE_KEYS: usize = 5;

/// Fields tried, in order, for a human-readable sample label.
const LABEL_FIELDS: &[&str] = &["title", "summary", "Nama Film", "task_name", "Nama Tugas"];

/// Health of one bronze file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BronzeAudit {
    pub artifact: String,
    pub path: String,
    pub exists: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn sample_label(record: &Value) -> Option<String> {
    LABEL_FIELDS
        .iter()
        .find_map(|field| record.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

fn audit_one(lake: &Lakehouse, artifact: Artifact) -> BronzeAudit {
    let path = lake.artifact_path(artifact);
    let mut audit = BronzeAudit {
        artifact: artifact.name().to_string(),
        path: path.display().to_string(),
        exists: path.exists(),
        valid: false,
        records: None,
        keys: Vec::new(),
        sample: None,
        error: None,
    };
    if !audit.exists {
        return audit;
    }

    match lake.read_raw(artifact) {
        Ok(records) => {
            audit.valid = true;
            audit.records = Some(records.len());
            if let Some(first) = records.first() {
                audit.keys = first
                    .as_object()
                    .map(|obj| obj.keys().take(SAMPLE_KEYS).cloned().collect())
                    .unwrap_or_default();
                audit.sample = sample_label(first);
            }
        }
        Err(e) => audit.error = Some(e.to_string()),
    }
    audit
}

/// Check every bronze artifact. Problems are reported, never raised.
pub fn audit_bronze(lake: &Lakehouse) -> Vec<BronzeAudit> {
    Artifact::ALL
        .into_iter()
        .filter(|a| a.layer() == Layer::Bronze)
        .map(|a| audit_one(lake, a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use serde_json::json;

    #[test]
    fn test_audit_reports_missing_corrupt_and_valid() {
        let env = TestEnv::new();
        let lake = env.init_lakehouse();
        env.write_bronze(
            "raw_calendar_events.json",
            json!([{"summary": "Standup", "start": {}, "end": {}}]),
        );
        std::fs::write(env.data_path().join("bronze/raw_tasks.json"), "[{broken").unwrap();

        let audits = audit_bronze(&lake);
        assert_eq!(audits.len(), 4);

        let history = &audits[0];
        assert!(!history.exists);
        assert!(!history.valid);

        let tasks = &audits[1];
        assert!(tasks.exists);
        assert!(!tasks.valid);
        assert!(tasks.error.is_some());

        let calendar = &audits[2];
        assert!(calendar.valid);
        assert_eq!(calendar.records, Some(1));
        assert_eq!(calendar.sample.as_deref(), Some("Standup"));
        let mut keys = calendar.keys.clone();
        keys.sort();
        assert_eq!(keys, vec!["end", "start", "summary"]);
    }
}
