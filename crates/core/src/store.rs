use crate::error::StoreError;
use crate::models::StoredDocument;

pub const DEFAULT_COLLECTION: &str = "docs_collection";

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let norm_left = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let norm_right = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if norm_left == 0.0 || norm_right == 0.0 {
        return 0.0;
    }

    (dot / (norm_left * norm_right)).clamp(-1.0, 1.0)
}

/// Brute-force ranking shared by the store implementations.
pub fn rank_nearest(
    documents: Vec<StoredDocument>,
    query_vector: &[f32],
    top_k: usize,
) -> Vec<(StoredDocument, f32)> {
    let mut scored = documents
        .into_iter()
        .map(|document| {
            let score = cosine_similarity(&document.embedding, query_vector);
            (document, score)
        })
        .collect::<Vec<_>>();

    scored.sort_by(|left, right| right.1.total_cmp(&left.1));
    scored.truncate(top_k);
    scored
}

pub fn check_dimensions(expected: usize, actual: usize) -> Result<(), StoreError> {
    if expected != actual {
        return Err(StoreError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, rank_nearest};
    use crate::models::{DocumentMetadata, StoredDocument};
    use chrono::Utc;

    fn document(id: &str, embedding: Vec<f32>) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            embedding,
            text: id.to_string(),
            metadata: DocumentMetadata {
                file_name: format!("{id}.txt"),
                checksum: String::new(),
                size_bytes: 0,
                uploaded_at: Utc::now(),
            },
        }
    }

    #[test]
    fn cosine_of_parallel_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn ranking_orders_by_similarity_and_truncates() {
        let documents = vec![
            document("far", vec![0.0, 1.0]),
            document("near", vec![1.0, 0.1]),
            document("middle", vec![1.0, 1.0]),
        ];

        let ranked = rank_nearest(documents, &[1.0, 0.0], 2);
        let ids = ranked.iter().map(|(doc, _)| doc.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["near", "middle"]);
    }
}
