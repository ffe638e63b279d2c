//! Query-string construction for upstream filters.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query parameters are not even: got {len} keys and values")]
    NotEven { len: usize },
}

/// Escapes a key or value the way HTML form encoding does (space becomes `+`).
pub fn query_escape(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}

/// Builds `k1=v1&k2=v2` from an alternating key/value list.
///
/// ```rust
/// use provcap_core::query::{build_query, QueryError};
///
/// assert_eq!(build_query(&["a", "1", "b", "2"]).as_deref(), Ok("a=1&b=2"));
/// assert_eq!(build_query(&["a"]), Err(QueryError::NotEven { len: 1 }));
/// ```
pub fn build_query<S: AsRef<str>>(keys_and_values: &[S]) -> Result<String, QueryError> {
    if keys_and_values.len() % 2 != 0 {
        return Err(QueryError::NotEven {
            len: keys_and_values.len(),
        });
    }

    let pairs = keys_and_values
        .chunks_exact(2)
        .map(|pair| {
            format!(
                "{}={}",
                query_escape(pair[0].as_ref()),
                query_escape(pair[1].as_ref())
            )
        })
        .collect::<Vec<_>>();

    Ok(pairs.join("&"))
}
