use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short atomic statement derived from a completed turn and stored in
/// long-term memory.
///
/// **Invariant:** `factId == tail_of(remoteId, '/')`. The store computes
/// `factId` itself from the resource name the long-term memory provider
/// returns, and writes the local record under that exact id, so deletion
/// targets the same name in both stores and succeeds on the first attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFact {
    pub fact_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub remote_id: String,
}

/// Extract the final `/`-delimited path segment of a provider resource name.
///
/// `"projects/p/locations/l/memories/m1"` -> `"m1"`. A name with no `/`
/// is returned unchanged.
pub fn fact_id_from_remote(remote_id: &str) -> String {
    remote_id
        .rsplit('/')
        .next()
        .unwrap_or(remote_id)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_of_nested_resource_name() {
        assert_eq!(
            fact_id_from_remote("projects/p/locations/l/memories/m1"),
            "m1"
        );
    }

    #[test]
    fn tail_of_bare_id_is_unchanged() {
        assert_eq!(fact_id_from_remote("m1"), "m1");
    }

    #[test]
    fn tail_of_trailing_slash_is_empty() {
        assert_eq!(fact_id_from_remote("a/b/"), "");
    }
}
