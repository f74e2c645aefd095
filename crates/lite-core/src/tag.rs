//! Field annotation grammar.
//!
//! Every request field carries one annotation of the form
//! `LOCATION=NAME[,flag[,flag...]]`:
//!
//! | Location | Meaning | Extra clauses |
//! |---|---|---|
//! | `path=id` | path segment `:id` | none |
//! | `query=page` | first `page` query value | none |
//! | `header=X-Trace` | request header | `isauth`, `scheme=…`, `name=…` |
//! | `cookie=session` | cookie value | none |
//! | `req=body` | request body | accepted content types |
//!
//! ```
//! use lite_core::tag::{parse, TagLocation};
//!
//! let tag = parse("header=Authorization,isauth,scheme=bearer").unwrap();
//! assert_eq!(tag.location, TagLocation::Header);
//! assert_eq!(tag.auth.unwrap().scheme, "bearer");
//! ```

use std::fmt;

use thiserror::Error;

/// Header that may carry `isauth`.
pub const AUTHORIZATION: &str = "Authorization";

/// Scheme used when `isauth` is given without `scheme=`.
pub const DEFAULT_AUTH_SCHEME: &str = "bearer";

/// Where a tagged field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagLocation {
    /// `path=`
    Path,
    /// `query=`
    Query,
    /// `header=`
    Header,
    /// `cookie=`
    Cookie,
    /// `req=body`
    Body,
}

impl fmt::Display for TagLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        })
    }
}

/// Security hints of an `isauth` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTag {
    /// HTTP auth scheme (`bearer`, `basic`, ...).
    pub scheme: String,
    /// Registry name of the security scheme.
    pub name: String,
}

/// A parsed field annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Location clause.
    pub location: TagLocation,
    /// External name; `body` for the request body.
    pub name: String,
    /// Content types listed after `req=body`.
    pub content_types: Vec<String>,
    /// Present when a header carries `isauth`.
    pub auth: Option<AuthTag>,
}

/// Annotation syntax errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagError {
    /// The annotation is blank.
    #[error("empty annotation")]
    Empty,

    /// The first clause is not `LOCATION=NAME`.
    #[error("expected LOCATION=NAME, found `{0}`")]
    MissingLocation(String),

    /// The location is not one of path, query, header, cookie or req.
    #[error("unknown location `{0}`")]
    UnknownLocation(String),

    /// `req=` names something other than `body`.
    #[error("`req={0}` is not supported, use `req=body`")]
    UnknownRequestPart(String),

    /// `LOCATION=` with nothing after it.
    #[error("{0} annotation has an empty name")]
    EmptyName(TagLocation),

    /// A clause the location does not accept.
    #[error("{location} annotation does not accept `{flag}`")]
    UnknownFlag {
        /// Location of the annotation.
        location: TagLocation,
        /// Offending clause.
        flag: String,
    },

    /// `isauth` on a header other than `Authorization`.
    #[error("isauth is only valid on the Authorization header, not `{0}`")]
    AuthOnOtherHeader(String),

    /// `scheme=` or `name=` without `isauth`.
    #[error("`{0}` requires isauth")]
    AuthFlagWithoutIsAuth(String),

    /// A body content type that is not `type/subtype`.
    #[error("invalid content type `{0}`")]
    InvalidContentType(String),
}

/// Parses one field annotation.
pub fn parse(annotation: &str) -> Result<Tag, TagError> {
    let mut clauses = annotation.split(',').map(str::trim);
    let first = clauses.next().filter(|c| !c.is_empty()).ok_or(TagError::Empty)?;

    let (key, value) = first
        .split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| TagError::MissingLocation(first.to_string()))?;

    let location = match key {
        "path" => TagLocation::Path,
        "query" => TagLocation::Query,
        "header" => TagLocation::Header,
        "cookie" => TagLocation::Cookie,
        "req" if value == "body" => TagLocation::Body,
        "req" => return Err(TagError::UnknownRequestPart(value.to_string())),
        other => return Err(TagError::UnknownLocation(other.to_string())),
    };
    if value.is_empty() {
        return Err(TagError::EmptyName(location));
    }

    let mut tag = Tag {
        location,
        name: value.to_string(),
        content_types: Vec::new(),
        auth: None,
    };

    match location {
        TagLocation::Body => {
            for clause in clauses.filter(|c| !c.is_empty()) {
                if !is_media_type(clause) {
                    return Err(TagError::InvalidContentType(clause.to_string()));
                }
                tag.content_types.push(clause.to_ascii_lowercase());
            }
        }
        TagLocation::Header => parse_header_flags(&mut tag, clauses)?,
        _ => {
            if let Some(flag) = clauses.find(|c| !c.is_empty()) {
                return Err(TagError::UnknownFlag {
                    location,
                    flag: flag.to_string(),
                });
            }
        }
    }

    Ok(tag)
}

fn parse_header_flags<'a>(
    tag: &mut Tag,
    clauses: impl Iterator<Item = &'a str>,
) -> Result<(), TagError> {
    let mut is_auth = false;
    let mut scheme = None;
    let mut name = None;

    for clause in clauses.filter(|c| !c.is_empty()) {
        match clause.split_once('=') {
            None if clause == "isauth" => is_auth = true,
            Some(("scheme", v)) if !v.trim().is_empty() => scheme = Some(v.trim().to_string()),
            Some(("name", v)) if !v.trim().is_empty() => name = Some(v.trim().to_string()),
            _ => {
                return Err(TagError::UnknownFlag {
                    location: TagLocation::Header,
                    flag: clause.to_string(),
                })
            }
        }
    }

    if !is_auth {
        if scheme.is_some() {
            return Err(TagError::AuthFlagWithoutIsAuth("scheme".to_string()));
        }
        if name.is_some() {
            return Err(TagError::AuthFlagWithoutIsAuth("name".to_string()));
        }
        return Ok(());
    }

    if !tag.name.eq_ignore_ascii_case(AUTHORIZATION) {
        return Err(TagError::AuthOnOtherHeader(tag.name.clone()));
    }
    tag.auth = Some(AuthTag {
        scheme: scheme.unwrap_or_else(|| DEFAULT_AUTH_SCHEME.to_string()),
        name: name.unwrap_or_else(|| AUTHORIZATION.to_string()),
    });
    Ok(())
}

fn is_media_type(clause: &str) -> bool {
    match clause.split_once('/') {
        Some((ty, sub)) => !ty.is_empty() && !sub.is_empty() && !clause.contains(char::is_whitespace),
        None => false,
    }
}
