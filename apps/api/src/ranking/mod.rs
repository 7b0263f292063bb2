//! Ranking Orchestrator — scores every candidate against one job and returns
//! a descending-sorted list.
//!
//! Candidates with no stored representation are excluded rather than scored
//! as zero: "no data" is not "low similarity". A scoring failure aborts the
//! whole request, since a partial ranking would mislead the caller about
//! completeness.

pub mod handlers;
pub mod scoring;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::{document_id, IngestRole};
use crate::models::job::JobRow;
use crate::ranking::scoring::SimilarityScorer;
use crate::vector_index::VectorIndex;

/// One ranked entry; higher score means more similar.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResult {
    pub candidate_id: Uuid,
    pub candidate_username: String,
    pub similarity_score: f32,
}

/// A candidate as the orchestrator sees it: identity plus whatever stored
/// representation the index had for them (`None` when nothing is stored).
pub struct CandidateRepresentation {
    pub candidate_id: Uuid,
    pub username: String,
    pub vector: Option<Vec<f32>>,
}

/// Scores the given candidates against the job vector and sorts the result.
///
/// Ordering: strictly descending by score, then ascending candidate id so a
/// fixed input set always ranks identically.
pub async fn score_candidates(
    scorer: &dyn SimilarityScorer,
    job_vector: &[f32],
    candidates: Vec<CandidateRepresentation>,
) -> Result<Vec<SimilarityResult>, AppError> {
    let mut results = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let Some(vector) = candidate.vector else {
            continue;
        };
        let score = scorer.score(job_vector, &vector).await?;
        results.push(SimilarityResult {
            candidate_id: candidate.candidate_id,
            candidate_username: candidate.username,
            similarity_score: score,
        });
    }

    results.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    Ok(results)
}

/// Full ranking for one job: load all candidates, fetch the job's and every
/// candidate's stored vector in one batched index read, score, sort.
pub async fn rank_candidates(
    pool: &PgPool,
    index: &dyn VectorIndex,
    scorer: &dyn SimilarityScorer,
    job: &JobRow,
) -> Result<Vec<SimilarityResult>, AppError> {
    let candidates: Vec<(Uuid, String)> = sqlx::query_as(
        "SELECT u.id, u.username FROM users u \
         JOIN candidate_profiles p ON p.user_id = u.id \
         ORDER BY u.id",
    )
    .fetch_all(pool)
    .await?;

    let job_doc_id = document_id(IngestRole::JobDescription, job.id);
    let mut ids: Vec<String> = candidates
        .iter()
        .map(|(id, _)| document_id(IngestRole::Resume, *id))
        .collect();
    ids.push(job_doc_id.clone());

    let mut vectors = index.fetch(&ids).await?;

    let job_vector = vectors.remove(&job_doc_id).ok_or_else(|| {
        AppError::ScoringUnavailable(
            "job has no stored representation; ingest a JD file first".to_string(),
        )
    })?;

    let representations = candidates
        .into_iter()
        .map(|(id, username)| CandidateRepresentation {
            candidate_id: id,
            username,
            vector: vectors.remove(&document_id(IngestRole::Resume, id)),
        })
        .collect();

    score_candidates(scorer, &job_vector, representations).await
}
