//! Name Resolution
//!
//! Derives, from a request path alone:
//! - the api group an operation belongs to
//! - the operation name (last path segment)
//! - a flattened full name, unique enough to key client functions on
//!
//! Paths are split on `/` with empty segments dropped, so leading, trailing
//! and doubled slashes never produce empty names.

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::NamingConfig;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Resolves group/operation/full names for request paths
#[derive(Debug, Clone)]
pub struct NameResolver {
    tag_index: Option<usize>,
    api_cut: Vec<usize>,
    base_name: Option<String>,
}

impl NameResolver {
    pub fn new(config: &NamingConfig) -> Self {
        let base_name = config
            .base_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| config.base_url.as_deref().map(base_name).filter(|n| !n.is_empty()));
        Self {
            tag_index: config.tag_index,
            api_cut: config.api_cut.clone(),
            base_name,
        }
    }

    /// Service base name prefixed to full names, if any
    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    /// Group name: the configured tag segment when the path has one, else the
    /// second-to-last segment, else the only segment
    pub fn api_name(&self, path: &str) -> String {
        let segments = segments(path);
        if let Some(index) = self.tag_index {
            if let Some(segment) = segments.get(index) {
                return segment.to_string();
            }
        }
        match segments.len() {
            0 => String::new(),
            1 => segments[0].to_string(),
            n => segments[n - 2].to_string(),
        }
    }

    /// Last non-empty segment
    pub fn operation_name(&self, path: &str) -> String {
        segments(path).last().map(|s| s.to_string()).unwrap_or_default()
    }

    /// All segments minus the cut indices, camel-cased and joined with `_`
    pub fn full_name(&self, path: &str) -> String {
        let joined = segments(path)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !self.api_cut.contains(i))
            .map(|(_, s)| camel_case(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        match &self.base_name {
            Some(base) if joined.is_empty() => base.clone(),
            Some(base) => format!("{}_{}", base, joined),
            None => joined,
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Service name from a base URL: slashes removed, camel-cased
pub fn base_name(base_url: &str) -> String {
    camel_case(&base_url.replace('/', ""))
}

/// Uppercase the first character, leave the rest alone
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// camelCase: split into words on separators, case changes and
/// letter/digit boundaries; first word lowercase, the rest capitalized
pub fn camel_case(s: &str) -> String {
    words(s)
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i == 0 {
                lower
            } else {
                capitalize_first(&lower)
            }
        })
        .collect()
}

fn words(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    for chunk in SEPARATORS.split(s).filter(|c| !c.is_empty()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && is_boundary(chars[i - 1], c, chars.get(i + 1).copied()) {
                out.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

fn is_boundary(prev: char, c: char, next: Option<char>) -> bool {
    let lower_to_upper = (prev.is_lowercase() || prev.is_numeric()) && c.is_uppercase();
    // end of an acronym: "XMLHttp" splits before the "H"
    let acronym_end =
        prev.is_uppercase() && c.is_uppercase() && next.is_some_and(|n| n.is_lowercase());
    let digit_edge = prev.is_numeric() != c.is_numeric();
    lower_to_upper || acronym_end || digit_edge
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(tag_index: Option<usize>, api_cut: Vec<usize>) -> NameResolver {
        NameResolver::new(&NamingConfig {
            tag_index,
            api_cut,
            ..NamingConfig::default()
        })
    }

    #[test]
    fn test_api_name_default() {
        let names = resolver(None, vec![]);
        assert_eq!(names.api_name("/user/get"), "user");
        assert_eq!(names.api_name("/api/v1/order/list"), "order");
        assert_eq!(names.api_name("/health"), "health");
        assert_eq!(names.api_name("/"), "");
    }

    #[test]
    fn test_api_name_tag_index() {
        let names = resolver(Some(1), vec![]);
        assert_eq!(names.api_name("/api/user/profile/get"), "user");
        // too short for the tag index: fall back
        assert_eq!(names.api_name("/user"), "user");
    }

    #[test]
    fn test_operation_name() {
        let names = resolver(None, vec![]);
        assert_eq!(names.operation_name("/user/get"), "get");
        assert_eq!(names.operation_name("/user/get/"), "get");
        assert_eq!(names.operation_name(""), "");
    }

    #[test]
    fn test_full_name_with_cut() {
        let names = resolver(None, vec![0]);
        assert_eq!(names.full_name("/api/user-info/get_by_id"), "userInfo_getById");

        let names = resolver(None, vec![]);
        assert_eq!(names.full_name("/api/user-info/get_by_id"), "api_userInfo_getById");
    }

    #[test]
    fn test_full_name_base_prefix() {
        let names = NameResolver::new(&NamingConfig {
            base_url: Some("/mall-api".to_string()),
            ..NamingConfig::default()
        });
        assert_eq!(names.base_name(), Some("mallApi"));
        assert_eq!(names.full_name("/user/get"), "mallApi_user_get");

        let names = NameResolver::new(&NamingConfig {
            base_name: Some("shop".to_string()),
            base_url: Some("/mall-api".to_string()),
            ..NamingConfig::default()
        });
        assert_eq!(names.full_name("/user/get"), "shop_user_get");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("get-user_info"), "getUserInfo");
        assert_eq!(camel_case("getUserInfo"), "getUserInfo");
        assert_eq!(camel_case("XMLHttpRequest"), "xmlHttpRequest");
        assert_eq!(camel_case("{id}"), "id");
        assert_eq!(camel_case("user2name"), "user2Name");
        assert_eq!(camel_case("--"), "");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("list"), "List");
        assert_eq!(capitalize_first("getById"), "GetById");
        assert_eq!(capitalize_first(""), "");
    }
}
