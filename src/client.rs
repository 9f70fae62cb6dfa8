//! Response handling shared by the Sheets and Docs clients.

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{Result, WorkspaceError};
use crate::models::ApiErrorResponse;

/// Turn a non-success response into an `ApiError`, preferring the message in
/// Google's error envelope over the raw body.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(WorkspaceError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(WorkspaceError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}

/// Check the status and decode the JSON body.
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}

/// Append path segments to a base URL, percent-encoding each one.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| WorkspaceError::InvalidUrlOrId(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| WorkspaceError::InvalidUrlOrId(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint(
            "https://sheets.googleapis.com/v4/",
            &["spreadsheets", "abc", "values", "My Sheet!A1:B2"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/My%20Sheet!A1:B2"
        );
    }

    #[test]
    fn test_endpoint_with_colon_method() {
        let url = endpoint("https://docs.googleapis.com/v1", &["documents", "doc1:batchUpdate"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://docs.googleapis.com/v1/documents/doc1:batchUpdate"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(endpoint("not a url", &["x"]).is_err());
    }
}
