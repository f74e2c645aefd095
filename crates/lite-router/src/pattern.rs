//! Route templates.
//!
//! A template such as `/foo/:id/:x` compiles to the anchored expression
//! `^/foo/([^/]+)/([^/]+)$`. Each capture group is paired with its `:name`,
//! and the OpenAPI form of the template is `/foo/{id}/{x}`.

use regex::Regex;
use thiserror::Error;

use crate::Params;

/// Template compilation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternError {
    /// The template does not start with `/`.
    #[error("route `{0}` must start with '/'")]
    NotAbsolute(String),

    /// A `:` segment without a name.
    #[error("route `{0}` has an unnamed parameter")]
    EmptyName(String),

    /// The same `:name` appears twice.
    #[error("route `{template}` repeats parameter `{name}`")]
    DuplicateName {
        /// Template.
        template: String,
        /// Repeated name.
        name: String,
    },

    /// The generated expression did not compile.
    #[error("route `{template}` is not a valid pattern: {reason}")]
    Regex {
        /// Template.
        template: String,
        /// Regex error.
        reason: String,
    },
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    canonical: String,
    names: Vec<String>,
    regex: Regex,
}

impl PathPattern {
    /// Compiles a template.
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        if !template.starts_with('/') {
            return Err(PatternError::NotAbsolute(template.to_string()));
        }

        let mut names: Vec<String> = Vec::new();
        let mut expr = String::from("^");
        let mut canonical = String::new();

        for segment in template.split('/').skip(1) {
            expr.push('/');
            canonical.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::EmptyName(template.to_string()));
                }
                if names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateName {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                names.push(name.to_string());
                expr.push_str("([^/]+)");
                canonical.push('{');
                canonical.push_str(name);
                canonical.push('}');
            } else {
                expr.push_str(&regex::escape(segment));
                canonical.push_str(segment);
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::Regex {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            canonical,
            names,
            regex,
        })
    }

    /// The template as registered, e.g. `/foo/:id`.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The OpenAPI form, e.g. `/foo/{id}`.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Parameter names in template order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The compiled expression.
    #[must_use]
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Matches a request path, returning the captured parameters.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    caps.get(i + 1)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn compiles_named_segments() {
        let pattern = PathPattern::parse("/foo/:id/:x").unwrap();
        assert_eq!(pattern.as_regex().as_str(), "^/foo/([^/]+)/([^/]+)$");
        assert_eq!(pattern.canonical(), "/foo/{id}/{x}");
        assert_eq!(pattern.names(), ["id", "x"]);
    }

    #[test]
    fn captures_values() {
        let pattern = PathPattern::parse("/foo/:id/:x").unwrap();
        let params = pattern.captures("/foo/123/abc").unwrap();
        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("x"), Some("abc"));

        assert!(pattern.captures("/foo/123").is_none());
        assert!(pattern.captures("/foo/123/abc/def").is_none());
        assert!(pattern.captures("/bar/123/abc").is_none());
    }

    #[test]
    fn static_templates_capture_nothing() {
        let pattern = PathPattern::parse("/foo").unwrap();
        assert!(pattern.names().is_empty());
        assert!(pattern.captures("/foo").unwrap().is_empty());
        assert!(pattern.captures("/foo/").is_none());

        let root = PathPattern::parse("/").unwrap();
        assert!(root.captures("/").is_some());
        assert_eq!(root.canonical(), "/");
    }

    #[test]
    fn literal_segments_are_escaped() {
        let pattern = PathPattern::parse("/v1.0/items").unwrap();
        assert!(pattern.captures("/v1.0/items").is_some());
        assert!(pattern.captures("/v1x0/items").is_none());
    }

    #[test]
    fn rejects_bad_templates() {
        assert_eq!(
            PathPattern::parse("foo").unwrap_err(),
            PatternError::NotAbsolute("foo".to_string())
        );
        assert_eq!(
            PathPattern::parse("/foo/:").unwrap_err(),
            PatternError::EmptyName("/foo/:".to_string())
        );
        assert!(matches!(
            PathPattern::parse("/:id/:id").unwrap_err(),
            PatternError::DuplicateName { .. }
        ));
    }

    proptest! {
        #[test]
        fn every_named_segment_is_captured(
            names in proptest::collection::hash_set("[a-z]{1,6}", 0..5),
            value in "[a-zA-Z0-9_-]{1,8}",
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let template: String = names.iter().map(|n| format!("/seg/:{n}")).collect();
            let template = if template.is_empty() { "/".to_string() } else { template };
            let path = template
                .split('/')
                .map(|s| if s.starts_with(':') { value.as_str() } else { s })
                .collect::<Vec<_>>()
                .join("/");

            let pattern = PathPattern::parse(&template).unwrap();
            let params = pattern.captures(&path).unwrap();
            prop_assert_eq!(params.len(), names.len());
            for name in &names {
                prop_assert_eq!(params.get(name), Some(value.as_str()));
            }
        }
    }
}
