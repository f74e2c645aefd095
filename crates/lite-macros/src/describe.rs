//! `#[derive(Describe)]` expansion.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, Data, DeriveInput, Fields, GenericParam};

use crate::attrs::{unraw, SerdeContainer, SerdeField};

/// Expands `#[derive(Describe)]`.
pub fn expand_describe(input: DeriveInput) -> syn::Result<TokenStream> {
    let container = SerdeContainer::parse(&input.attrs)?;
    let body = match &input.data {
        Data::Struct(data) => describe_struct(&input, &container, &data.fields)?,
        Data::Enum(data) => {
            if data.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) {
                quote! { lite_core::TypeShape::String }
            } else {
                quote! { lite_core::TypeShape::Unsupported("enum with data") }
            }
        }
        Data::Union(_) => quote! { lite_core::TypeShape::Unsupported("union") },
    };

    let ident = &input.ident;
    let mut generics = input.generics.clone();
    let type_params: Vec<_> = generics.type_params().map(|p| p.ident.clone()).collect();
    {
        let where_clause = generics.make_where_clause();
        for param in &type_params {
            where_clause
                .predicates
                .push(parse_quote!(#param: lite_core::Describe));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics lite_core::Describe for #ident #ty_generics #where_clause {
            fn shape() -> lite_core::TypeShape {
                #body
            }
        }
    })
}

fn describe_struct(
    input: &DeriveInput,
    container: &SerdeContainer,
    fields: &Fields,
) -> syn::Result<TokenStream> {
    match fields {
        Fields::Unit => Ok(quote! { lite_core::TypeShape::Unit }),
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            let ty = &unnamed.unnamed[0].ty;
            Ok(quote! { <#ty as lite_core::Describe>::shape() })
        }
        Fields::Unnamed(_) => Ok(quote! { lite_core::TypeShape::Unsupported("tuple struct") }),
        Fields::Named(named) => {
            if container.transparent {
                let kept: Vec<_> = named
                    .named
                    .iter()
                    .filter(|f| SerdeField::parse(&f.attrs).map_or(true, |a| !a.skip))
                    .collect();
                if let [only] = kept.as_slice() {
                    let ty = &only.ty;
                    return Ok(quote! { <#ty as lite_core::Describe>::shape() });
                }
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "transparent struct must have exactly one field",
                ));
            }

            let mut entries = Vec::new();
            for field in &named.named {
                let attrs = SerdeField::parse(&field.attrs)?;
                if attrs.skip {
                    continue;
                }
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let rust_name = unraw(ident);
                let wire = attrs.rename.unwrap_or_else(|| {
                    container
                        .rename_all
                        .map_or_else(|| rust_name.clone(), |rule| rule.apply_to_field(&rust_name))
                });
                let ty = &field.ty;
                entries.push(if attrs.flatten {
                    quote! { lite_core::FieldShape::flattened(#wire, <#ty as lite_core::Describe>::shape()) }
                } else {
                    quote! { lite_core::FieldShape::new(#wire, <#ty as lite_core::Describe>::shape()) }
                });
            }

            let base = container
                .rename
                .clone()
                .unwrap_or_else(|| unraw(&input.ident));
            let type_params: Vec<_> = input
                .generics
                .params
                .iter()
                .filter_map(|p| match p {
                    GenericParam::Type(t) => Some(&t.ident),
                    _ => None,
                })
                .collect();
            let name = if type_params.is_empty() {
                quote! { #base }
            } else {
                quote! {
                    {
                        let params: ::std::vec::Vec<::std::string::String> = ::std::vec![
                            #(lite_core::dive_name(&<#type_params as lite_core::Describe>::shape())),*
                        ];
                        ::std::format!("{}_{}", #base, params.join("_"))
                    }
                }
            };

            Ok(quote! {
                lite_core::TypeShape::Struct(lite_core::StructShape::new(#name, || {
                    ::std::vec![#(#entries),*]
                }))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: DeriveInput) -> String {
        expand_describe(input).unwrap().to_string()
    }

    #[test]
    fn named_struct_uses_wire_names() {
        let out = expand(parse_quote! {
            #[serde(rename_all = "camelCase")]
            struct Pet {
                pet_name: String,
                #[serde(rename = "years")]
                age: u8,
                #[serde(skip)]
                cache: Vec<u8>,
            }
        });
        assert!(out.contains("\"petName\""));
        assert!(out.contains("\"years\""));
        assert!(!out.contains("cache"));
        assert!(out.contains("StructShape :: new (\"Pet\""));
    }

    #[test]
    fn container_rename_is_the_schema_name() {
        let out = expand(parse_quote! {
            #[serde(rename = "response")]
            struct Reply { message: String }
        });
        assert!(out.contains("StructShape :: new (\"response\""));
    }

    #[test]
    fn flatten_is_carried() {
        let out = expand(parse_quote! {
            struct Outer { #[serde(flatten)] inner: Inner }
        });
        assert!(out.contains("FieldShape :: flattened (\"inner\""));
    }

    #[test]
    fn newtypes_and_transparent_forward_the_inner_shape() {
        let out = expand(parse_quote! { struct Id(u64); });
        assert!(out.contains("< u64 as lite_core :: Describe > :: shape ()"));
        assert!(!out.contains("StructShape"));

        let out = expand(parse_quote! {
            #[serde(transparent)]
            struct Wrapper { value: String }
        });
        assert!(out.contains("< String as lite_core :: Describe > :: shape ()"));
        assert!(!out.contains("StructShape"));
    }

    #[test]
    fn enums() {
        let out = expand(parse_quote! { enum Status { Active, OnHold } });
        assert!(out.contains("TypeShape :: String"));

        let out = expand(parse_quote! { enum Payload { Text(String), Empty } });
        assert!(out.contains("Unsupported (\"enum with data\")"));
    }

    #[test]
    fn generic_structs_get_bounds_and_a_dived_name() {
        let out = expand(parse_quote! {
            struct Page<T> { items: Vec<T> }
        });
        assert!(out.contains("T : lite_core :: Describe"));
        assert!(out.contains("dive_name"));
    }
}
