use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// The caller, as identified by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

/// Extractor that requires an identity.
/// Returns 401 if the configured user header is missing or blank.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_from_header(parts, &state.config.auth.user_header)
            .map(|id| CurrentUser { id })
            .ok_or(AppError::Unauthorized)
    }
}

fn user_from_header(parts: &Parts, header_name: &str) -> Option<String> {
    parts
        .headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<(&str, &str)>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_configured_header() {
        let parts = parts_with(Some(("x-user-id", " user-42 ")));
        assert_eq!(
            user_from_header(&parts, "x-user-id"),
            Some("user-42".to_string())
        );
    }

    #[test]
    fn missing_or_blank_header_is_anonymous() {
        assert_eq!(user_from_header(&parts_with(None), "x-user-id"), None);
        let blank = parts_with(Some(("x-user-id", "  ")));
        assert_eq!(user_from_header(&blank, "x-user-id"), None);
    }

    #[test]
    fn other_headers_are_ignored() {
        let parts = parts_with(Some(("x-forwarded-user", "user-42")));
        assert_eq!(user_from_header(&parts, "x-user-id"), None);
        assert_eq!(
            user_from_header(&parts, "x-forwarded-user"),
            Some("user-42".to_string())
        );
    }
}
