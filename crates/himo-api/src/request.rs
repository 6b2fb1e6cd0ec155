use std::collections::HashMap;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decode a JSON body. An empty body decodes as the type's default.
pub fn parse_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid(format!("Invalid request body: {}", e)))
}

/// Optional numeric id from the query string. Present but non-numeric is an error.
pub fn query_id(params: &HashMap<String, String>, key: &str) -> Result<Option<i64>, ApiError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => himo_types::ids::parse(raw)
            .map_err(|_| ApiError::invalid(format!("Invalid {}", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use himo_types::api::AuthRequest;

    #[test]
    fn empty_body_is_default() {
        let req: AuthRequest = parse_body(&Bytes::from_static(b"  ")).unwrap();
        assert!(req.action.is_none());
        assert!(req.username.is_empty());
    }

    #[test]
    fn malformed_body_is_invalid_input() {
        let err = parse_body::<AuthRequest>(&Bytes::from_static(b"{nope")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn query_ids() {
        let params = HashMap::from([
            ("userId".to_string(), "42".to_string()),
            ("chatId".to_string(), "abc".to_string()),
        ]);
        assert_eq!(query_id(&params, "userId").unwrap(), Some(42));
        assert_eq!(query_id(&params, "adminId").unwrap(), None);
        assert!(query_id(&params, "chatId").is_err());
    }
}
