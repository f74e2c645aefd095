//! Attribute parsing shared by the derives.
//!
//! Only the serde attributes that change the wire shape are read; everything
//! else is skipped so it can coexist with any other serde configuration.

use syn::meta::ParseNestedMeta;
use syn::{Attribute, LitStr, Token};

/// Serde case conventions accepted by `rename_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn from_str(value: &str) -> Option<Self> {
        Some(match value {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            _ => return None,
        })
    }

    /// Applies the rule to a snake_case field name.
    pub fn apply_to_field(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_string(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Pascal => field
                .split('_')
                .map(capitalize)
                .collect(),
            Self::Camel => {
                let pascal = Self::Pascal.apply_to_field(field);
                lowercase_first(&pascal)
            }
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
        }
    }

    /// Applies the rule to a PascalCase variant name.
    pub fn apply_to_variant(self, variant: &str) -> String {
        match self {
            Self::Pascal => variant.to_string(),
            Self::Lower => variant.to_ascii_lowercase(),
            Self::Upper => variant.to_ascii_uppercase(),
            Self::Camel => lowercase_first(variant),
            Self::Snake => {
                let mut snake = String::new();
                for (i, ch) in variant.char_indices() {
                    if i > 0 && ch.is_uppercase() {
                        snake.push('_');
                    }
                    snake.push(ch.to_ascii_lowercase());
                }
                snake
            }
            Self::ScreamingSnake => Self::Snake.apply_to_variant(variant).to_ascii_uppercase(),
            Self::Kebab => Self::Snake.apply_to_variant(variant).replace('_', "-"),
            Self::ScreamingKebab => Self::ScreamingSnake
                .apply_to_variant(variant)
                .replace('_', "-"),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn lowercase_first(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// Container-level serde attributes.
#[derive(Debug, Default)]
pub struct SerdeContainer {
    pub rename: Option<String>,
    pub rename_all: Option<RenameRule>,
    pub transparent: bool,
}

/// Field- or variant-level serde attributes.
#[derive(Debug, Default)]
pub struct SerdeField {
    pub rename: Option<String>,
    pub flatten: bool,
    pub skip: bool,
}

impl SerdeContainer {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    out.rename = rename_value(&meta)?;
                } else if meta.path.is_ident("rename_all") {
                    let rule = rename_value(&meta)?;
                    if let Some(rule) = rule {
                        out.rename_all = Some(RenameRule::from_str(&rule).ok_or_else(|| {
                            meta.error(format!("unknown rename_all rule `{rule}`"))
                        })?);
                    }
                } else if meta.path.is_ident("transparent") {
                    out.transparent = true;
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

impl SerdeField {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    out.rename = rename_value(&meta)?;
                } else if meta.path.is_ident("flatten") {
                    out.flatten = true;
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    out.skip = true;
                    skip_meta(&meta)?;
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

/// Reads `rename = "x"` or the serialize half of `rename(serialize = "x")`.
fn rename_value(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        let lit: LitStr = meta.value()?.parse()?;
        return Ok(Some(lit.value()));
    }
    let mut value = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            let lit: LitStr = inner.value()?.parse()?;
            value = Some(lit.value());
        } else {
            skip_meta(&inner)?;
        }
        Ok(())
    })?;
    Ok(value)
}

/// Consumes an attribute argument we do not care about.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

/// Container-level `#[lite(...)]` options.
#[derive(Debug, Default)]
pub struct LiteContainer {
    pub validate: bool,
}

impl LiteContainer {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("lite")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("validate") {
                    out.validate = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown lite container option, expected `validate`"))
                }
            })?;
        }
        Ok(out)
    }
}

/// Field-level `#[lite("LOCATION=NAME,...")]` annotation.
pub fn lite_tag(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut found = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("lite")) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a field may carry only one lite annotation",
            ));
        }
        found = Some(attr.parse_args::<LitStr>()?);
    }
    Ok(found)
}

/// Strips the `r#` prefix of raw identifiers.
pub fn unraw(ident: &syn::Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn field_rules() {
        let field = "file_name";
        assert_eq!(RenameRule::Camel.apply_to_field(field), "fileName");
        assert_eq!(RenameRule::Pascal.apply_to_field(field), "FileName");
        assert_eq!(RenameRule::Kebab.apply_to_field(field), "file-name");
        assert_eq!(RenameRule::ScreamingSnake.apply_to_field(field), "FILE_NAME");
        assert_eq!(RenameRule::ScreamingKebab.apply_to_field(field), "FILE-NAME");
        assert_eq!(RenameRule::Lower.apply_to_field(field), "file_name");
        assert_eq!(RenameRule::Camel.apply_to_field("id"), "id");
    }

    #[test]
    fn variant_rules() {
        let variant = "OnHold";
        assert_eq!(RenameRule::Snake.apply_to_variant(variant), "on_hold");
        assert_eq!(RenameRule::Camel.apply_to_variant(variant), "onHold");
        assert_eq!(RenameRule::Kebab.apply_to_variant(variant), "on-hold");
        assert_eq!(RenameRule::Lower.apply_to_variant(variant), "onhold");
        assert_eq!(RenameRule::ScreamingSnake.apply_to_variant(variant), "ON_HOLD");
    }

    #[test]
    fn container_attrs() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[serde(rename = "response", deny_unknown_fields)]),
            parse_quote!(#[serde(rename_all = "camelCase")]),
        ];
        let parsed = SerdeContainer::parse(&attrs).unwrap();
        assert_eq!(parsed.rename.as_deref(), Some("response"));
        assert_eq!(parsed.rename_all, Some(RenameRule::Camel));
        assert!(!parsed.transparent);
    }

    #[test]
    fn field_attrs_skip_unrelated_options() {
        let attrs: Vec<Attribute> = vec![parse_quote!(
            #[serde(default, rename(serialize = "fileName", deserialize = "file"), skip_serializing_if = "Option::is_none")]
        )];
        let parsed = SerdeField::parse(&attrs).unwrap();
        assert_eq!(parsed.rename.as_deref(), Some("fileName"));
        assert!(!parsed.skip);
        assert!(!parsed.flatten);

        let attrs: Vec<Attribute> = vec![parse_quote!(#[serde(flatten)])];
        assert!(SerdeField::parse(&attrs).unwrap().flatten);
    }

    #[test]
    fn unknown_rename_rule_is_an_error() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[serde(rename_all = "Train-Case")])];
        assert!(SerdeContainer::parse(&attrs).is_err());
    }

    #[test]
    fn lite_annotations() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[lite("path=id")])];
        assert_eq!(lite_tag(&attrs).unwrap().unwrap().value(), "path=id");

        let attrs: Vec<Attribute> = vec![parse_quote!(#[lite("path=id")]), parse_quote!(#[lite("query=id")])];
        assert!(lite_tag(&attrs).is_err());

        let attrs: Vec<Attribute> = vec![parse_quote!(#[lite(validate)])];
        assert!(LiteContainer::parse(&attrs).unwrap().validate);
    }
}
