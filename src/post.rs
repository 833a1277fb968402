use std::fmt;

use serde::{Deserialize, Serialize};

/// One fetched record, displayed as a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// Value produced by a column accessor.
///
/// Ordering is numeric for integers and lexical for text. Integers sort before
/// text, which only matters if a column ever mixes both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_posts(n: usize) -> Vec<Post> {
    (1..=n as i64)
        .map(|id| Post {
            user_id: (id - 1) / 10 + 1,
            id,
            title: format!("title {id:03}"),
            body: format!("body of post {id}"),
        })
        .collect()
}
