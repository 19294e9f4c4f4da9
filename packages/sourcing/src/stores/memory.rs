//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, SourcingError};
use crate::traits::store::{CandidateQuery, CandidateSort, CandidateStore, JobStore};
use crate::types::candidate::{Candidate, CandidateScore, CandidateStatus};
use crate::types::job::SourcingJob;

/// In-memory store for jobs and candidates.
///
/// Useful for testing and development. Not suitable for production as data
/// is lost on restart; the checkpoint guarantees only hold on a durable
/// backend.
pub struct MemoryStore {
    jobs: RwLock<HashMap<Uuid, SourcingJob>>,
    candidates: RwLock<HashMap<Uuid, Candidate>>,
    by_job_url: RwLock<HashMap<(Uuid, String), Uuid>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            candidates: RwLock::new(HashMap::new()),
            by_job_url: RwLock::new(HashMap::new()),
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.jobs.write().unwrap().clear();
        self.candidates.write().unwrap().clear();
        self.by_job_url.write().unwrap().clear();
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.read().unwrap().len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: &SourcingJob) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(SourcingError::storage(format!(
                "job {} already exists",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<SourcingJob>> {
        Ok(self.jobs.read().unwrap().get(&id).cloned())
    }

    async fn update_job(&self, job: &SourcingJob) -> Result<()> {
        self.jobs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn insert_candidate(&self, candidate: &Candidate) -> Result<()> {
        let key = (candidate.job_id, candidate.profile_url.clone());
        let mut index = self.by_job_url.write().unwrap();
        if index.contains_key(&key) {
            return Ok(());
        }
        index.insert(key, candidate.id);
        self.candidates
            .write()
            .unwrap()
            .insert(candidate.id, candidate.clone());
        Ok(())
    }

    async fn update_candidate(&self, candidate: &Candidate) -> Result<()> {
        let mut candidates = self.candidates.write().unwrap();
        if !candidates.contains_key(&candidate.id) {
            return Err(SourcingError::storage(format!(
                "candidate {} does not exist",
                candidate.id
            )));
        }
        candidates.insert(candidate.id, candidate.clone());
        Ok(())
    }

    async fn candidate_exists(&self, job_id: Uuid, profile_url: &str) -> Result<bool> {
        Ok(self
            .by_job_url
            .read()
            .unwrap()
            .contains_key(&(job_id, profile_url.to_string())))
    }

    async fn get_candidate_by_url(
        &self,
        job_id: Uuid,
        profile_url: &str,
    ) -> Result<Option<Candidate>> {
        let index = self.by_job_url.read().unwrap();
        let Some(id) = index.get(&(job_id, profile_url.to_string())) else {
            return Ok(None);
        };
        Ok(self.candidates.read().unwrap().get(id).cloned())
    }

    async fn count_contactable(&self, job_id: Uuid) -> Result<usize> {
        Ok(self
            .candidates
            .read()
            .unwrap()
            .values()
            .filter(|c| c.job_id == job_id && c.has_contact_info)
            .count())
    }

    async fn get_candidates(
        &self,
        job_id: Uuid,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>> {
        let candidates = self.candidates.read().unwrap();
        let mut rows: Vec<Candidate> = candidates
            .values()
            .filter(|c| c.job_id == job_id)
            .filter(|c| !query.only_scored || c.is_scored)
            .filter(|c| match query.min_score {
                Some(min) => c.score.as_ref().map(|s| s.total >= min).unwrap_or(false),
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match query.sort {
                CandidateSort::Score => {
                    let a_total = a.score.as_ref().map(|s| s.total);
                    let b_total = b.score.as_ref().map(|s| s.total);
                    a_total.cmp(&b_total)
                }
                CandidateSort::CreatedAt => a.created_at.cmp(&b.created_at),
                CandidateSort::Name => a.full_name.cmp(&b.full_name),
            };
            // Equal keys fall back to creation order for a stable listing
            let ordering = match ordering {
                Ordering::Equal => a.created_at.cmp(&b.created_at),
                other => other,
            };
            if query.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let rows = rows.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }

    async fn find_unscored(&self, job_id: Uuid, limit: usize) -> Result<Vec<Candidate>> {
        let candidates = self.candidates.read().unwrap();
        let mut rows: Vec<Candidate> = candidates
            .values()
            .filter(|c| c.job_id == job_id && c.status == CandidateStatus::Saved && !c.is_scored)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn apply_score(&self, candidate_id: Uuid, score: &CandidateScore) -> Result<()> {
        let mut candidates = self.candidates.write().unwrap();
        let candidate = candidates.get_mut(&candidate_id).ok_or_else(|| {
            SourcingError::storage(format!("candidate {candidate_id} does not exist"))
        })?;
        candidate.apply_score(score.clone());
        Ok(())
    }

    async fn find_first_seen(
        &self,
        owner_id: Uuid,
        profile_url: &str,
        excluding_job: Uuid,
    ) -> Result<Option<Uuid>> {
        let candidates = self.candidates.read().unwrap();
        Ok(candidates
            .values()
            .filter(|c| {
                c.owner_id == owner_id
                    && c.profile_url == profile_url
                    && c.job_id != excluding_job
            })
            .min_by_key(|c| c.created_at)
            .map(|c| c.job_id))
    }
}
