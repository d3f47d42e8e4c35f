//! Response-shape differences between CKAN releases under test.

use crate::error::{Error, Result};
use crate::fixtures::remove_keys;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum CkanVersion {
    /// 2.8 and earlier.
    #[default]
    V2_8,
    V2_9,
}

impl CkanVersion {
    /// Adjust an expected package fixture captured from a 2.8 instance.
    ///
    /// 2.9 dropped revisions and added `metadata_modified` to each resource;
    /// the latter is instance-specific so it is expected as `null`.
    #[must_use]
    pub fn adapt_expected(self, expected: &Value) -> Value {
        match self {
            Self::V2_8 => expected.clone(),
            Self::V2_9 => {
                let mut adapted = remove_keys(expected, &["revision_id"]);
                if let Some(resources) = adapted.get_mut("resources").and_then(Value::as_array_mut) {
                    for resource in resources.iter_mut().filter_map(Value::as_object_mut) {
                        resource.insert("metadata_modified".to_string(), Value::Null);
                    }
                }
                adapted
            }
        }
    }

    /// The dataset-search payload inside a response.
    ///
    /// 2.9 wraps `/api/3` search responses in a `result` envelope; returns
    /// `None` when that envelope is expected but absent.
    #[must_use]
    pub fn unwrap_search_response<'a>(self, response: &'a Value, base_url: &str) -> Option<&'a Value> {
        if self == Self::V2_9 && base_url.ends_with("/3") {
            response.get("result")
        } else {
            Some(response)
        }
    }

    /// Query parameter names used for paging dataset searches.
    #[must_use]
    pub fn search_paging_params(self, base_url: &str) -> (&'static str, &'static str) {
        if base_url.ends_with("/3") || self == Self::V2_9 {
            ("rows", "start")
        } else {
            ("limit", "offset")
        }
    }

    /// File name of the stored dataset-search fixture for this version.
    #[must_use]
    pub const fn search_dataset_fixture(self) -> &'static str {
        match self {
            Self::V2_8 => "stable/search_dataset.inner.test.json",
            Self::V2_9 => "stable/search_dataset-2.9.inner.test.json",
        }
    }
}

impl FromStr for CkanVersion {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let mut parts = trimmed.split('.');
        let major = parts.next().and_then(|part| part.parse::<u32>().ok());
        let minor = parts.next().and_then(|part| part.parse::<u32>().ok());
        match (major, minor) {
            (Some(2), Some(minor)) if minor >= 9 => Ok(Self::V2_9),
            (Some(2), Some(_)) => Ok(Self::V2_8),
            _ => Err(Error::config(format!(
                "unsupported ckan_version {trimmed:?} (expected e.g. \"2.8\" or \"2.9\")"
            ))),
        }
    }
}

impl fmt::Display for CkanVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2_8 => write!(f, "2.8"),
            Self::V2_9 => write!(f, "2.9"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_release_strings() {
        assert_eq!("2.9".parse::<CkanVersion>().unwrap(), CkanVersion::V2_9);
        assert_eq!(" 2.9.5 ".parse::<CkanVersion>().unwrap(), CkanVersion::V2_9);
        assert_eq!("2.10".parse::<CkanVersion>().unwrap(), CkanVersion::V2_9);
        assert_eq!("2.8".parse::<CkanVersion>().unwrap(), CkanVersion::V2_8);
        assert!("3".parse::<CkanVersion>().is_err());
        assert!("banana".parse::<CkanVersion>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for version in [CkanVersion::V2_8, CkanVersion::V2_9] {
            assert_eq!(version.to_string().parse::<CkanVersion>().unwrap(), version);
        }
    }

    #[test]
    fn v2_9_drops_revisions_and_nulls_resource_modification() {
        let expected = json!({
            "name": "example",
            "revision_id": "r1",
            "resources": [{"url": "u", "revision_id": "r2"}],
            "organization": {"revision_id": "r3", "name": "org"},
        });
        let adapted = CkanVersion::V2_9.adapt_expected(&expected);
        assert_eq!(
            adapted,
            json!({
                "name": "example",
                "resources": [{"url": "u", "metadata_modified": null}],
                "organization": {"name": "org"},
            })
        );
        assert_eq!(CkanVersion::V2_8.adapt_expected(&expected), expected);
    }

    #[test]
    fn search_envelope_only_unwrapped_for_v2_9_api_3() {
        let wrapped = json!({"result": {"count": 1}});
        assert_eq!(
            CkanVersion::V2_9.unwrap_search_response(&wrapped, "https://x/api/3"),
            Some(&json!({"count": 1}))
        );
        assert_eq!(
            CkanVersion::V2_9.unwrap_search_response(&wrapped, "https://x/api"),
            Some(&wrapped)
        );
        assert_eq!(
            CkanVersion::V2_8.unwrap_search_response(&wrapped, "https://x/api/3"),
            Some(&wrapped)
        );
        assert_eq!(
            CkanVersion::V2_9.unwrap_search_response(&json!({"count": 1}), "https://x/api/3"),
            None
        );
    }

    #[test]
    fn paging_params_follow_endpoint_and_version() {
        assert_eq!(CkanVersion::V2_8.search_paging_params("https://x/api"), ("limit", "offset"));
        assert_eq!(CkanVersion::V2_8.search_paging_params("https://x/api/3"), ("rows", "start"));
        assert_eq!(CkanVersion::V2_9.search_paging_params("https://x/api"), ("rows", "start"));
    }
}
