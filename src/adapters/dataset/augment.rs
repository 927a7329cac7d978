//! Covariate augmentation for JSON-records datasets.
//!
//! Adds `skill_level` and `math_anxiety_level`, drawn uniformly from 1..=5,
//! to every record lacking them. Existing values and unrelated fields are
//! left untouched.

use rand::Rng;
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;

use super::DatasetError;
use crate::domain::dialogue::CovariateField;
use crate::domain::foundation::Level;

/// Covariates filled in by augmentation.
pub const AUGMENTED_FIELDS: [CovariateField; 2] =
    [CovariateField::SkillLevel, CovariateField::MathAnxietyLevel];

/// Counts from one augmentation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    pub records: usize,
    pub values_added: usize,
}

/// Fills missing covariates in place.
pub fn augment_records<R: Rng + ?Sized>(records: &mut [Map<String, Value>], rng: &mut R) -> AugmentSummary {
    let mut summary = AugmentSummary {
        records: records.len(),
        values_added: 0,
    };

    for record in records.iter_mut() {
        for field in AUGMENTED_FIELDS {
            let missing = record.get(field.name()).map_or(true, Value::is_null);
            if missing {
                let level = rng.gen_range(Level::MIN..=Level::MAX);
                record.insert(field.name().to_string(), Value::from(level));
                summary.values_added += 1;
            }
        }
    }

    summary
}

/// Reads `input`, augments it and writes pretty JSON to `output`.
///
/// Refuses to replace an existing `output` unless `force` is set.
pub async fn augment_file<R: Rng + ?Sized>(
    input: &Path,
    output: &Path,
    force: bool,
    rng: &mut R,
) -> Result<AugmentSummary, DatasetError> {
    if !force && fs::try_exists(output).await.unwrap_or(false) {
        return Err(DatasetError::OutputExists(output.to_path_buf()));
    }

    let json = fs::read_to_string(input)
        .await
        .map_err(|e| DatasetError::io(input, e))?;
    let parsed: Value = serde_json::from_str(&json).map_err(|e| DatasetError::json(input, e))?;

    let Value::Array(items) = parsed else {
        return Err(DatasetError::shape(input, "top level must be an array of records"));
    };
    let mut records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(DatasetError::shape(
                input,
                format!("record {} is not an object", index + 1),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = augment_records(&mut records, rng);

    let rendered = serde_json::to_string_pretty(&Value::Array(
        records.into_iter().map(Value::Object).collect(),
    ))
    .map_err(|e| DatasetError::json(output, e))?;
    fs::write(output, rendered)
        .await
        .map_err(|e| DatasetError::io(output, e))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        records = summary.records,
        values_added = summary.values_added,
        "Augmented dataset covariates"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use tempfile::TempDir;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn fills_missing_and_keeps_existing_values() {
        let mut records = vec![
            object(json!({"data": [], "skill_level": 2})),
            object(json!({"data": [], "math_anxiety_level": null})),
        ];
        let summary = augment_records(&mut records, &mut StdRng::seed_from_u64(3));

        assert_eq!(summary, AugmentSummary { records: 2, values_added: 3 });
        assert_eq!(records[0]["skill_level"], 2);
        for record in &records {
            for field in AUGMENTED_FIELDS {
                let value = record[field.name()].as_i64().unwrap();
                assert!((1..=5).contains(&value));
            }
        }
    }

    #[test]
    fn same_seed_gives_same_values() {
        let mut a = vec![object(json!({"data": []}))];
        let mut b = vec![object(json!({"data": []}))];
        augment_records(&mut a, &mut StdRng::seed_from_u64(11));
        augment_records(&mut b, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn augment_file_writes_output_and_respects_existing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        std::fs::write(&input, r#"[{"data": [], "math_level": 3}]"#).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let summary = augment_file(&input, &output, false, &mut rng).await.unwrap();
        assert_eq!(summary.values_added, 2);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written[0]["math_level"], 3);
        assert!(written[0]["skill_level"].is_i64());

        let again = augment_file(&input, &output, false, &mut rng).await;
        assert!(matches!(again, Err(DatasetError::OutputExists(_))));
        assert!(augment_file(&input, &output, true, &mut rng).await.is_ok());
    }

    #[tokio::test]
    async fn non_array_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(&input, r#"{"data": []}"#).unwrap();

        let result = augment_file(&input, &dir.path().join("out.json"), false, &mut StdRng::seed_from_u64(1)).await;
        assert!(matches!(result, Err(DatasetError::Shape { .. })));
    }
}
