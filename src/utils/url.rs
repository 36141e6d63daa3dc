//! URL utilities for consistent endpoint construction
//!
//! The server base URL may arrive from the CLI, the environment, or the
//! config file, with or without trailing slashes. Everything that builds a
//! request URL goes through here so endpoints never end up double-slashed.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use ollaterm::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and endpoint path.
///
/// # Examples
///
/// ```
/// use ollaterm::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434", "api/tags"),
///     "http://localhost:11434/api/tags"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:11434/", "/v1/models"),
///     "http://localhost:11434/v1/models"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_slashes() {
        assert_eq!(
            normalize_base_url("http://localhost:11434"),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_base_url("http://localhost:11434/"),
            "http://localhost:11434"
        );
        assert_eq!(
            normalize_base_url("http://localhost:11434///"),
            "http://localhost:11434"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn construct_handles_slash_combinations() {
        assert_eq!(
            construct_api_url("http://localhost:11434", "api/generate"),
            "http://localhost:11434/api/generate"
        );
        assert_eq!(
            construct_api_url("http://localhost:11434/", "api/generate"),
            "http://localhost:11434/api/generate"
        );
        assert_eq!(
            construct_api_url("http://localhost:11434", "/v1/completions"),
            "http://localhost:11434/v1/completions"
        );
        assert_eq!(
            construct_api_url("http://localhost:11434///", "/v1/completions"),
            "http://localhost:11434/v1/completions"
        );
    }
}
