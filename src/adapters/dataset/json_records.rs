//! JSON-records dataset loader.
//!
//! The dataset is a JSON array of objects. Each object carries the
//! conversation under `data` and may carry `math_level`, `skill_level` and
//! `math_anxiety_level`. A non-numeric `math_level` is kept as the subject
//! name (for example "Algebra"). Other covariates that are absent, null, or
//! not an integer in 1..=5 load as absent; the run substitutes its
//! placeholder for them.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tokio::fs;

use super::DatasetError;
use crate::domain::dialogue::{
    Conversation, CovariateField, Covariates, MathLevel, StudentRecord,
};
use crate::domain::foundation::Level;

#[derive(Debug, Deserialize)]
struct RawRecord {
    data: Conversation,
    #[serde(default)]
    math_level: Value,
    #[serde(default)]
    skill_level: Value,
    #[serde(default)]
    math_anxiety_level: Value,
}

/// Parses a JSON-records document into student records.
pub fn parse_records(json: &str) -> Result<Vec<StudentRecord>, serde_json::Error> {
    let raw: Vec<RawRecord> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, record)| into_student_record(index + 1, record))
        .collect())
}

/// Reads and parses a JSON-records file.
pub async fn load_records(path: impl AsRef<Path>) -> Result<Vec<StudentRecord>, DatasetError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .await
        .map_err(|e| DatasetError::io(path, e))?;
    let records = parse_records(&json).map_err(|e| DatasetError::json(path, e))?;

    tracing::info!(path = %path.display(), records = records.len(), "Loaded dataset");
    Ok(records)
}

fn into_student_record(student_id: usize, raw: RawRecord) -> StudentRecord {
    let covariates = Covariates {
        math_level: lenient_math_level(student_id, &raw.math_level),
        skill_level: lenient_level(student_id, CovariateField::SkillLevel, &raw.skill_level),
        math_anxiety_level: lenient_level(
            student_id,
            CovariateField::MathAnxietyLevel,
            &raw.math_anxiety_level,
        ),
    };
    StudentRecord::new(raw.data).with_covariates(covariates)
}

fn lenient_math_level(student_id: usize, value: &Value) -> Option<MathLevel> {
    match value {
        Value::String(s) if s.trim().parse::<f64>().is_err() => {
            let subject = s.trim();
            if subject.is_empty() {
                None
            } else {
                Some(MathLevel::Subject(subject.to_string()))
            }
        }
        _ => lenient_level(student_id, CovariateField::MathLevel, value).map(MathLevel::Level),
    }
}

fn lenient_level(student_id: usize, field: CovariateField, value: &Value) -> Option<Level> {
    let number = match value {
        Value::Null => return None,
        // Columns with gaps are often written as floats (3.0).
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match number.map(Level::new) {
        Some(Ok(level)) => Some(level),
        _ => {
            tracing::warn!(
                student_id,
                field = field.name(),
                value = %value,
                "Covariate is not an integer in 1..=5; treating as absent"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::{Role, Turn};
    use tempfile::TempDir;

    const DATASET: &str = r#"[
        {
            "data": [
                {"role": "user", "content": "I don't get this"},
                {"role": "assistant", "content": "Let's try again"}
            ],
            "math_level": 2.0,
            "skill_level": "4",
            "math_anxiety_level": null,
            "test_inference": "ignored"
        },
        {
            "data": [{"role": "system", "content": "setup"}],
            "math_level": "Algebra",
            "skill_level": 9
        },
        {
            "data": [],
            "math_level": "7",
            "skill_level": 2.5,
            "math_anxiety_level": true
        }
    ]"#;

    #[test]
    fn parses_conversations_and_covariates() {
        let records = parse_records(DATASET).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(
            first.conversation.turns(),
            &[Turn::user("I don't get this"), Turn::assistant("Let's try again")]
        );
        assert_eq!(
            first.covariates.math_level,
            Some(MathLevel::Level(Level::new(2).unwrap()))
        );
        assert_eq!(first.covariates.skill_level.map(|l| l.value()), Some(4));
        assert_eq!(first.covariates.math_anxiety_level, None);
    }

    #[test]
    fn math_level_text_is_kept_as_subject() {
        let records = parse_records(DATASET).unwrap();
        let second = &records[1];
        assert_eq!(
            second.covariates.math_level,
            Some(MathLevel::Subject("Algebra".to_string()))
        );
        assert_eq!(second.covariates.skill_level, None);
        assert_eq!(
            second.conversation.turns()[0].role,
            Role::Other("system".to_string())
        );
    }

    #[test]
    fn invalid_covariates_load_as_absent() {
        let records = parse_records(DATASET).unwrap();
        assert_eq!(records[2].covariates, Covariates::default());
    }

    #[test]
    fn record_without_data_is_an_error() {
        assert!(parse_records(r#"[{"math_level": 1}]"#).is_err());
        assert!(parse_records(r#"{"data": []}"#).is_err());
    }

    #[tokio::test]
    async fn load_reports_path_on_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let err = load_records(&missing).await.unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "[{").unwrap();
        assert!(matches!(
            load_records(&broken).await,
            Err(DatasetError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, DATASET).unwrap();

        let records = load_records(&path).await.unwrap();
        assert_eq!(records.len(), 3);
    }
}
