use pgvector::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::database::models::NewApiDoc;

/// How embeddings whose length differs from the configured dimension are
/// treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionPolicy {
    /// Skip the record and count it.
    #[default]
    Strict,
    /// Zero-pad short embeddings and truncate long ones.
    Lenient,
}

impl fmt::Display for DimensionPolicy {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DimensionPolicy::Strict => write!(f, "strict"),
            DimensionPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Why a record was skipped. Skips are counted, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Malformed(String),
    MissingText,
    MissingEmbedding,
    WrongDimension { expected: usize, actual: usize },
}

impl fmt::Display for SkipReason {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed(e) => write!(f, "unparseable JSON: {e}"),
            SkipReason::MissingText => write!(f, "missing or empty text field"),
            SkipReason::MissingEmbedding => write!(f, "missing or empty embedding field"),
            SkipReason::WrongDimension { expected, actual } => {
                write!(f, "embedding has {actual} values, expected {expected}")
            }
        }
    }
}

/// Per-reason skip counters for one ingested file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub malformed: u64,
    pub missing_text: u64,
    pub missing_embedding: u64,
    pub wrong_dimension: u64,
}

impl SkipCounts {
    #[inline]
    pub fn record(&mut self, reason: &SkipReason) {
        match *reason {
            SkipReason::Malformed(_) => self.malformed += 1,
            SkipReason::MissingText => self.missing_text += 1,
            SkipReason::MissingEmbedding => self.missing_embedding += 1,
            SkipReason::WrongDimension { .. } => self.wrong_dimension += 1,
        }
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.malformed + self.missing_text + self.missing_embedding + self.wrong_dimension
    }
}

/// One accepted record from the JSONL stream, normalized and ready to stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DocRecord {
    pub chunk_id: Option<String>,
    pub source_url: Option<String>,
    pub content: String,
    pub embedding: Vec<f32>,
}

impl DocRecord {
    #[inline]
    pub fn into_new_api_doc(self, module_id: Uuid) -> NewApiDoc {
        NewApiDoc {
            module_id,
            source_url: self.source_url,
            content: self.content,
            embedding: Vector::from(self.embedding),
            chunk_id: self.chunk_id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<String>,
    source: Option<String>,
    text: Option<String>,
    embedding: Option<Vec<f32>>,
}

/// Parses one JSONL line into a normalized record. Unknown JSON fields are
/// ignored; every failure maps to a [`SkipReason`].
#[inline]
pub fn parse_line(
    line: &str,
    dimension: usize,
    policy: DimensionPolicy,
) -> Result<DocRecord, SkipReason> {
    let raw: RawRecord =
        serde_json::from_str(line).map_err(|e| SkipReason::Malformed(e.to_string()))?;

    let content = match raw.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(SkipReason::MissingText),
    };

    let embedding = match raw.embedding {
        Some(embedding) if !embedding.is_empty() => embedding,
        _ => return Err(SkipReason::MissingEmbedding),
    };

    let embedding = normalize_embedding(embedding, dimension, policy)?;

    Ok(DocRecord {
        chunk_id: raw.id.filter(|id| !id.trim().is_empty()),
        source_url: raw.source.filter(|source| !source.trim().is_empty()),
        content,
        embedding,
    })
}

/// Brings an embedding to the target dimension according to the policy.
#[inline]
pub fn normalize_embedding(
    mut embedding: Vec<f32>,
    dimension: usize,
    policy: DimensionPolicy,
) -> Result<Vec<f32>, SkipReason> {
    if embedding.is_empty() {
        return Err(SkipReason::MissingEmbedding);
    }

    if embedding.len() == dimension {
        return Ok(embedding);
    }

    match policy {
        DimensionPolicy::Strict => Err(SkipReason::WrongDimension {
            expected: dimension,
            actual: embedding.len(),
        }),
        DimensionPolicy::Lenient => {
            embedding.resize(dimension, 0.0);
            Ok(embedding)
        }
    }
}

/// First characters of a line for log messages.
#[inline]
pub fn line_preview(line: &str) -> String {
    const PREVIEW_CHARS: usize = 80;

    let mut preview: String = line.chars().take(PREVIEW_CHARS).collect();
    if line.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_line(dimension: usize) -> String {
        let embedding: Vec<f32> = (0..dimension).map(|i| i as f32).collect();
        serde_json::json!({
            "id": "chunk-1",
            "source": "https://docs.example.com/page",
            "text": "Issue tracking API overview",
            "embedding": embedding,
        })
        .to_string()
    }

    #[test]
    fn parse_valid_line() {
        let record = parse_line(&valid_line(384), 384, DimensionPolicy::Strict)
            .expect("record should parse");

        assert_eq!(record.chunk_id.as_deref(), Some("chunk-1"));
        assert_eq!(
            record.source_url.as_deref(),
            Some("https://docs.example.com/page")
        );
        assert_eq!(record.content, "Issue tracking API overview");
        assert_eq!(record.embedding.len(), 384);
    }

    #[test]
    fn parse_garbage_line() {
        let result = parse_line("not json at all {", 384, DimensionPolicy::Strict);
        assert!(matches!(result, Err(SkipReason::Malformed(_))));
    }

    #[test]
    fn parse_missing_text() {
        let line = r#"{"id": "a", "embedding": [0.1, 0.2]}"#;
        assert_eq!(
            parse_line(line, 2, DimensionPolicy::Strict),
            Err(SkipReason::MissingText)
        );

        let line = r#"{"id": "a", "text": "   ", "embedding": [0.1, 0.2]}"#;
        assert_eq!(
            parse_line(line, 2, DimensionPolicy::Strict),
            Err(SkipReason::MissingText)
        );
    }

    #[test]
    fn parse_missing_embedding() {
        let line = r#"{"id": "a", "text": "content"}"#;
        assert_eq!(
            parse_line(line, 2, DimensionPolicy::Strict),
            Err(SkipReason::MissingEmbedding)
        );

        let line = r#"{"id": "a", "text": "content", "embedding": []}"#;
        assert_eq!(
            parse_line(line, 2, DimensionPolicy::Strict),
            Err(SkipReason::MissingEmbedding)
        );
    }

    #[test]
    fn parse_ignores_unknown_fields() {
        let line = r#"{"id": "a", "text": "content", "embedding": [0.5, 0.5], "extra": {"nested": true}}"#;
        assert!(parse_line(line, 2, DimensionPolicy::Strict).is_ok());
    }

    #[test]
    fn blank_identifiers_become_none() {
        let line = r#"{"id": "  ", "source": "", "text": "content", "embedding": [0.5, 0.5]}"#;
        let record = parse_line(line, 2, DimensionPolicy::Strict).expect("record should parse");

        assert_eq!(record.chunk_id, None);
        assert_eq!(record.source_url, None);
    }

    #[test]
    fn strict_rejects_wrong_dimension() {
        let result = normalize_embedding(vec![0.5; 300], 384, DimensionPolicy::Strict);
        assert_eq!(
            result,
            Err(SkipReason::WrongDimension {
                expected: 384,
                actual: 300,
            })
        );
    }

    #[test]
    fn lenient_pads_short_embedding() {
        let normalized = normalize_embedding(vec![0.5; 300], 384, DimensionPolicy::Lenient)
            .expect("lenient policy should pad");

        assert_eq!(normalized.len(), 384);
        assert_eq!(normalized[299], 0.5);
        assert_eq!(normalized[300], 0.0);
        assert_eq!(normalized[383], 0.0);
    }

    #[test]
    fn lenient_truncates_long_embedding() {
        let oversized: Vec<f32> = (0..400).map(|i| i as f32).collect();
        let normalized = normalize_embedding(oversized, 384, DimensionPolicy::Lenient)
            .expect("lenient policy should truncate");

        assert_eq!(normalized.len(), 384);
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[383], 383.0);
    }

    #[test]
    fn exact_dimension_passes_both_policies() {
        let embedding = vec![0.25; 384];

        assert!(normalize_embedding(embedding.clone(), 384, DimensionPolicy::Strict).is_ok());
        assert!(normalize_embedding(embedding, 384, DimensionPolicy::Lenient).is_ok());
    }

    #[test]
    fn empty_embedding_rejected_by_both_policies() {
        assert_eq!(
            normalize_embedding(Vec::new(), 384, DimensionPolicy::Strict),
            Err(SkipReason::MissingEmbedding)
        );
        assert_eq!(
            normalize_embedding(Vec::new(), 384, DimensionPolicy::Lenient),
            Err(SkipReason::MissingEmbedding)
        );
    }

    #[test]
    fn skip_counts_accumulate_by_reason() {
        let mut counts = SkipCounts::default();
        counts.record(&SkipReason::Malformed("oops".to_string()));
        counts.record(&SkipReason::MissingText);
        counts.record(&SkipReason::MissingEmbedding);
        counts.record(&SkipReason::MissingEmbedding);
        counts.record(&SkipReason::WrongDimension {
            expected: 384,
            actual: 100,
        });

        assert_eq!(counts.malformed, 1);
        assert_eq!(counts.missing_text, 1);
        assert_eq!(counts.missing_embedding, 2);
        assert_eq!(counts.wrong_dimension, 1);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn line_preview_truncates_long_lines() {
        let short = "short line";
        assert_eq!(line_preview(short), short);

        let long = "x".repeat(200);
        let preview = line_preview(&long);
        assert_eq!(preview.chars().count(), 83);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn dimension_policy_serialization() {
        assert_eq!(DimensionPolicy::Strict.to_string(), "strict");
        assert_eq!(DimensionPolicy::Lenient.to_string(), "lenient");

        let policy: DimensionPolicy =
            serde_json::from_str("\"lenient\"").expect("should parse policy");
        assert_eq!(policy, DimensionPolicy::Lenient);
        assert_eq!(DimensionPolicy::default(), DimensionPolicy::Strict);
    }
}
