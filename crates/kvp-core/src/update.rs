use serde::{Deserialize, Serialize};

/// One incremental change to the mapping.
///
/// Arrival order defines precedence: when two updates touch the same key,
/// the later one wins.
///
/// JSON form is tagged by `op`:
/// `{"op":"put","key":"a","value":1}` / `{"op":"drop","key":"a"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Update<K, V> {
    /// Insert or overwrite `key`.
    Put { key: K, value: V },
    /// Remove `key`; a no-op when absent.
    Drop { key: K },
}

impl<K, V> Update<K, V> {
    pub fn put(key: K, value: V) -> Self {
        Self::Put { key, value }
    }

    pub fn drop(key: K) -> Self {
        Self::Drop { key }
    }

    pub fn key(&self) -> &K {
        match self {
            Self::Put { key, .. } | Self::Drop { key } => key,
        }
    }

    pub fn is_put(&self) -> bool {
        matches!(self, Self::Put { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_tagged_json() {
        let put: Update<String, i64> =
            serde_json::from_str(r#"{"op":"put","key":"a","value":7}"#).unwrap();
        assert_eq!(put, Update::put("a".to_string(), 7));

        let drop: Update<String, i64> = serde_json::from_str(r#"{"op":"drop","key":"a"}"#).unwrap();
        assert_eq!(drop, Update::drop("a".to_string()));
        assert_eq!(drop.key(), "a");
        assert!(!drop.is_put());
    }

    #[test]
    fn reject_unknown_op() {
        let res: Result<Update<String, i64>, _> =
            serde_json::from_str(r#"{"op":"upsert","key":"a","value":7}"#);
        assert!(res.is_err());
    }

    #[test]
    fn reject_put_without_value() {
        let res: Result<Update<String, i64>, _> = serde_json::from_str(r#"{"op":"put","key":"a"}"#);
        assert!(res.is_err());
    }
}
