//! Derivation of `MemberName` trait.

use darling::{FromDeriveInput, FromMeta};
use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use syn::{Data, DeriveInput, Fields, Ident};

use crate::utils::{find_meta_attrs, to_snake_case};

#[derive(Debug, Default, FromMeta)]
struct VariantAttrs {
    rename: Option<String>,
}

#[derive(Debug)]
struct MemberEnum {
    ident: Ident,
    variants: Vec<(Ident, String)>,
}

impl MemberEnum {
    fn impl_member_name(&self) -> impl ToTokens {
        let ident = &self.ident;
        let match_arms = self.variants.iter().map(|(variant, name)| {
            quote!(Self::#variant => #name,)
        });

        quote! {
            impl ::decoy::MemberName for #ident {
                fn name(&self) -> &'static str {
                    match *self {
                        #(#match_arms)*
                    }
                }
            }
        }
    }
}

impl FromDeriveInput for MemberEnum {
    fn from_derive_input(input: &DeriveInput) -> darling::Result<Self> {
        let data = match &input.data {
            Data::Enum(data) => data,
            _ => {
                let message = "Member names can only be derived for enums";
                return Err(darling::Error::custom(message).with_span(&input.ident));
            }
        };
        if let Some(param) = input.generics.params.first() {
            let message = "generic member enums are not supported";
            return Err(darling::Error::custom(message).with_span(param));
        }

        let mut errors = vec![];
        let mut variants = vec![];
        for variant in &data.variants {
            if !matches!(variant.fields, Fields::Unit) {
                let message = "only unit variants are supported";
                errors.push(darling::Error::custom(message).with_span(&variant.fields));
                continue;
            }
            let attrs = find_meta_attrs("member", None, &variant.attrs)
                .map(|meta| VariantAttrs::from_nested_meta(&meta))
                .unwrap_or_else(|| Ok(VariantAttrs::default()));
            match attrs {
                Ok(attrs) => {
                    let name = attrs
                        .rename
                        .unwrap_or_else(|| to_snake_case(&variant.ident.to_string()));
                    variants.push((variant.ident.clone(), name));
                }
                Err(err) => errors.push(err.with_span(&variant.ident)),
            }
        }

        if !errors.is_empty() {
            return Err(darling::Error::multiple(errors));
        }
        Ok(Self {
            ident: input.ident.clone(),
            variants,
        })
    }
}

impl ToTokens for MemberEnum {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let member_name_impl = self.impl_member_name();
        tokens.extend(quote! {
            #member_name_impl
        });
    }
}

pub(crate) fn impl_member(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse(input) {
        Ok(input) => input,
        Err(err) => return err.into_compile_error().into(),
    };
    let member_enum = match MemberEnum::from_derive_input(&input) {
        Ok(member_enum) => member_enum,
        Err(err) => return err.write_errors().into(),
    };
    let tokens = quote!(#member_enum);
    tokens.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deriving_member_names() {
        let input: DeriveInput = syn::parse_quote! {
            #[derive(Debug, Clone, Copy, Member)]
            enum UserMember {
                FirstName,
                #[member(rename = "lastName")]
                LastName,
                HTTPClient,
            }
        };
        let member_enum = MemberEnum::from_derive_input(&input).unwrap();
        let names: Vec<_> = member_enum
            .variants
            .iter()
            .map(|(_, name)| name.as_str())
            .collect();
        assert_eq!(names, ["first_name", "lastName", "http_client"]);

        let member_impl = member_enum.impl_member_name();
        let member_impl: syn::ItemImpl = syn::parse_quote!(#member_impl);
        let expected: syn::ItemImpl = syn::parse_quote! {
            impl ::decoy::MemberName for UserMember {
                fn name(&self) -> &'static str {
                    match *self {
                        Self::FirstName => "first_name",
                        Self::LastName => "lastName",
                        Self::HTTPClient => "http_client",
                    }
                }
            }
        };
        assert_eq!(member_impl, expected, "{}", quote!(#member_impl));
    }

    #[test]
    fn deriving_for_empty_enum() {
        let input: DeriveInput = syn::parse_quote!(enum Empty {});
        let member_enum = MemberEnum::from_derive_input(&input).unwrap();
        assert!(member_enum.variants.is_empty());
    }

    #[test]
    fn errors_on_unsupported_inputs() {
        let input: DeriveInput = syn::parse_quote!(struct Test;);
        let err = MemberEnum::from_derive_input(&input).unwrap_err();
        assert!(err.to_string().contains("only be derived for enums"), "{err}");

        let input: DeriveInput = syn::parse_quote! {
            enum Test {
                Unit,
                Tuple(u8),
                Struct { value: u8 },
            }
        };
        let err = MemberEnum::from_derive_input(&input).unwrap_err();
        assert_eq!(err.len(), 2);
    }
}
