//! `#[derive(LiteRequest)]` expansion.
//!
//! The macro only moves metadata around: annotations are emitted verbatim and
//! parsed at route registration, so a malformed tag surfaces as a
//! registration error naming the field.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

use crate::attrs::{lite_tag, unraw, LiteContainer};

/// Expands `#[derive(LiteRequest)]`.
pub fn expand_request(input: DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "LiteRequest cannot be derived for generic types",
        ));
    }
    let container = LiteContainer::parse(&input.attrs)?;

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "LiteRequest needs named fields; use ContextNoRequest for handlers without input",
                ))
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "LiteRequest cannot be derived for tuple structs",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "LiteRequest can only be derived for structs",
            ))
        }
    };

    let mut raw_fields = Vec::new();
    let mut binds = Vec::new();
    for (index, field) in named.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = unraw(ident);
        let ty = &field.ty;

        match lite_tag(&field.attrs)? {
            Some(tag) => {
                raw_fields.push(quote! {
                    lite_core::RawField::tagged(#name, #tag, <#ty as lite_core::Describe>::shape())
                });
                binds.push(quote! {
                    #ident: lite_extract::bind_field::<#ty>(cx, desc.field(#index)?)?
                });
            }
            None => {
                raw_fields.push(quote! {
                    lite_core::RawField::embedded(
                        #name,
                        <#ty as lite_core::Describe>::shape(),
                        <#ty as lite_extract::LiteRequest>::fields,
                    )
                });
                binds.push(quote! {
                    #ident: <#ty as lite_extract::LiteRequest>::bind(cx, desc.embedded(#index)?)?
                });
            }
        }
    }

    let validatable = container.validate.then(|| {
        quote! {
            fn validatable(&self) -> ::std::option::Option<&dyn lite_extract::Validate> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let ident = &input.ident;
    Ok(quote! {
        impl lite_extract::LiteRequest for #ident {
            fn fields() -> ::std::vec::Vec<lite_core::RawField> {
                ::std::vec![#(#raw_fields),*]
            }

            fn bind(
                cx: &lite_extract::ExtractionContext,
                desc: &lite_core::RequestDescriptor,
            ) -> ::std::result::Result<Self, lite_core::HttpError> {
                ::std::result::Result::Ok(Self {
                    #(#binds),*
                })
            }

            #validatable
        }
    })
}
