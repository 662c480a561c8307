//! Memory Store: long-term, per-user facts recalled across sessions.
//! Writes to a remote memory provider first, then mirrors the
//! result locally keyed by `factId = tail_of(remoteId, '/')` — the
//! invariant that makes a single-attempt delete correct.

use std::sync::Arc;

use agentrt_capabilities::{DocumentDbPort, MemoryProviderPort};
use agentrt_domain::error::Result;
use agentrt_domain::memory::{fact_id_from_remote, MemoryFact};
use agentrt_domain::trace::TraceEvent;

fn collection(user_id: &str) -> String {
    format!("users/{user_id}/memories")
}

pub struct MemoryStore {
    provider: Arc<dyn MemoryProviderPort>,
    docs: Arc<dyn DocumentDbPort>,
}

impl MemoryStore {
    pub fn new(provider: Arc<dyn MemoryProviderPort>, docs: Arc<dyn DocumentDbPort>) -> Self {
        Self { provider, docs }
    }

    /// Writes one extracted fact: remote append, then local mirror under the
    /// remote-assigned `factId`.
    pub async fn extract_and_save(&self, user_id: &str, fact_text: &str) -> Result<MemoryFact> {
        let remote_id = self.provider.append(user_id, fact_text).await?;
        let fact_id = fact_id_from_remote(&remote_id);
        let fact = MemoryFact {
            fact_id: fact_id.clone(),
            user_id: user_id.to_string(),
            text: fact_text.to_string(),
            created_at: chrono::Utc::now(),
            remote_id,
        };
        self.docs.put(&collection(user_id), &fact_id, serde_json::to_value(&fact)?).await?;
        TraceEvent::MemoryFactWritten { user_id: user_id.to_string(), fact_id: fact_id.clone() }.emit();
        Ok(fact)
    }

    /// Extracts a turn's candidate facts independently: a failure saving one
    /// fact never prevents the others from being written.
    pub async fn save_all(&self, user_id: &str, fact_texts: Vec<String>) -> Vec<MemoryFact> {
        let mut saved = Vec::with_capacity(fact_texts.len());
        for text in fact_texts {
            match self.extract_and_save(user_id, &text).await {
                Ok(fact) => saved.push(fact),
                Err(e) => tracing::warn!(user_id, error = %e, "failed to save one extracted memory fact, continuing with the rest"),
            }
        }
        saved
    }

    /// Queries the remote provider; on failure, degrades to a substring scan
    /// over the local mirror.
    pub async fn recall(&self, user_id: &str, query: &str) -> Result<Vec<MemoryFact>> {
        match self.provider.search(user_id, query).await {
            Ok(remote_facts) => Ok(remote_facts
                .into_iter()
                .map(|rf| MemoryFact {
                    fact_id: String::new(),
                    user_id: user_id.to_string(),
                    text: rf.text,
                    created_at: chrono::Utc::now(),
                    remote_id: String::new(),
                })
                .collect()),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "remote memory search failed, falling back to local substring scan");
                let query_lower = query.to_lowercase();
                let all = self.list(user_id).await?;
                Ok(all.into_iter().filter(|f| query_lower.is_empty() || f.text.to_lowercase().contains(&query_lower)).collect())
            }
        }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<MemoryFact>> {
        let docs = self.docs.list(&collection(user_id)).await?;
        let mut facts = Vec::with_capacity(docs.len());
        for (_, value) in docs {
            if let Ok(fact) = serde_json::from_value::<MemoryFact>(value) {
                facts.push(fact);
            }
        }
        facts.sort_by_key(|f| f.created_at);
        Ok(facts)
    }

    /// Deletes the remote record (best-effort — an already-absent record is
    /// success) then unconditionally deletes the local mirror. The local
    /// delete is authoritative for user-visible state.
    pub async fn delete(&self, user_id: &str, fact_id: &str) -> Result<()> {
        let remote_id = self
            .docs
            .get(&collection(user_id), fact_id)
            .await?
            .and_then(|v| serde_json::from_value::<MemoryFact>(v).ok())
            .map(|f| f.remote_id);

        let remote_delete_ok = if let Some(remote_id) = &remote_id {
            match self.provider.delete(user_id, remote_id).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(user_id, fact_id, error = %e, "remote memory delete failed, proceeding with local delete anyway");
                    false
                }
            }
        } else {
            false
        };

        self.docs.delete(&collection(user_id), fact_id).await?;
        TraceEvent::MemoryFactDeleted { user_id: user_id.to_string(), fact_id: fact_id.to_string(), remote_delete_ok }.emit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_capabilities::mock::{InMemoryDocumentDb, InMemoryMemoryProvider};

    fn store() -> MemoryStore {
        MemoryStore::new(
            Arc::new(InMemoryMemoryProvider::new("proj", "us-west1")),
            Arc::new(InMemoryDocumentDb::new()),
        )
    }

    #[tokio::test]
    async fn fact_id_matches_remote_tail() {
        let store = store();
        let fact = store.extract_and_save("u1", "likes oat milk lattes").await.unwrap();
        assert!(fact.remote_id.ends_with(&fact.fact_id));
    }

    #[tokio::test]
    async fn delete_is_idempotent_even_with_no_remote_mirror() {
        let store = store();
        let fact = store.extract_and_save("u1", "prefers dark mode").await.unwrap();
        store.delete("u1", &fact.fact_id).await.unwrap();
        // second delete of an already-absent record must still succeed
        store.delete("u1", &fact.fact_id).await.unwrap();
        assert!(store.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_all_continues_past_a_single_failed_fact() {
        let store = store();
        let saved = store.save_all("u1", vec!["fact a".into(), "fact b".into()]).await;
        assert_eq!(saved.len(), 2);
    }
}
