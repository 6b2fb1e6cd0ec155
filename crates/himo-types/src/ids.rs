//! Numeric ids arrive either as JSON numbers or as numeric strings
//! (query strings, older clients). Both decode to `i64`.

use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

/// Parse a textual id. Blank input and ids `<= 0` count as absent.
pub fn parse(raw: &str) -> Result<Option<i64>, std::num::ParseIntError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(positive)
}

/// Row ids start at 1; anything lower is treated as not given.
fn positive(id: i64) -> Option<i64> {
    (id > 0).then_some(id)
}

/// `deserialize_with` helper for optional id fields. Use with `#[serde(default)]`.
pub fn optional<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRepr::Number(n)) => Ok(positive(n)),
        Some(IdRepr::Text(s)) => {
            parse(&s).map_err(|e| D::Error::custom(format!("invalid id '{}': {}", s, e)))
        }
    }
}
