// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;
use syn::parse_macro_input;

/// Generate a `DError` implementation for a tree-structured error
/// enum.
///
/// Every variant is labelled with its own name as a `&'static str`.
/// Single-field tuple variants are treated as wrapping a child error
/// and are walked into, unless annotated with `#[leaf]`:
///
/// ```ignore
/// #[derive(DError)]
/// enum ActionError {
///     InvalidTtl(TtlHeader),
///     #[leaf]
///     Other(u32),
/// }
///
/// #[derive(DError)]
/// enum TtlHeader {
///     Mpls,
///     Ipv4,
/// }
/// ```
///
/// `ActionError::InvalidTtl(TtlHeader::Ipv4)` then walks as
/// `InvalidTtl`, `Ipv4` without touching `fmt`.
#[proc_macro_derive(DError, attributes(leaf))]
pub fn derive_derror(
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let DeriveInput { ident, data, generics, .. } =
        parse_macro_input!(input as DeriveInput);

    let syn::Data::Enum(data) = data else {
        return syn::Error::new(
            ident.span(),
            "cannot autoderive `DError` for struct or union",
        )
        .to_compile_error()
        .into();
    };

    let mut name_arms: Vec<TokenStream> = vec![];
    let mut child_arms: Vec<TokenStream> = vec![];

    for variant in data.variants {
        let var_name = variant.ident;
        let label = syn::LitStr::new(&var_name.to_string(), var_name.span());
        let known_leaf =
            variant.attrs.iter().any(|v| v.path().is_ident("leaf"));

        let (name_arm, child_arm) = match variant.fields {
            syn::Fields::Unnamed(fields) => (
                quote! { Self::#var_name(..) => #label, },
                if !known_leaf && fields.unnamed.len() == 1 {
                    quote! { Self::#var_name(f) => Some(f), }
                } else {
                    quote! { Self::#var_name(..) => None, }
                },
            ),
            syn::Fields::Named(_) => (
                quote! { Self::#var_name { .. } => #label, },
                quote! { Self::#var_name { .. } => None, },
            ),
            syn::Fields::Unit => (
                quote! { Self::#var_name => #label, },
                quote! { Self::#var_name => None, },
            ),
        };

        name_arms.push(name_arm);
        child_arms.push(child_arm);
    }

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics DError for #ident #ty_generics #where_clause {
            fn discriminant(&self) -> &'static str {
                match self {
                    #( #name_arms )*
                }
            }

            fn child(&self) -> Option<&dyn DError> {
                match self {
                    #( #child_arms )*
                }
            }
        }
    }
    .into()
}
