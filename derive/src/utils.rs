//! Misc utils.

use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, FnArg, Ident, NestedMeta, Pat, PatType};

pub(crate) fn find_meta_attrs(
    name: &str,
    cr: Option<&str>,
    args: &[Attribute],
) -> Option<NestedMeta> {
    args.iter()
        .filter_map(|attr| attr.parse_meta().ok())
        .find(|meta| match_path(meta.path(), name, cr))
        .map(NestedMeta::from)
}

/// Removes attributes matching `name` (possibly prefixed with the `cr` crate name).
pub(crate) fn strip_attrs(name: &str, cr: Option<&str>, attrs: &mut Vec<Attribute>) {
    attrs.retain(|attr| !match_path(&attr.path, name, cr));
}

fn match_path(path: &syn::Path, name: &str, cr: Option<&str>) -> bool {
    if path.is_ident(name) {
        return true;
    } else if let Some(cr) = cr {
        if path.segments.len() == 2 {
            let crate_segment = &path.segments[0];
            let name_segment = &path.segments[1];
            return crate_segment.ident == cr && name_segment.ident == name;
        }
    }
    false
}

/// Reference to `self` in the generated code, if the argument is a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReceiverKind {
    /// `&self`, `&mut self` or `self: SmartPtr<Self>`.
    Deref,
    /// `self` / `mut self`.
    Value,
}

pub(crate) fn receiver_kind(arg: &FnArg) -> Option<(ReceiverKind, Span)> {
    match arg {
        FnArg::Receiver(receiver) => {
            let kind = if receiver.reference.is_some() {
                ReceiverKind::Deref
            } else {
                ReceiverKind::Value
            };
            Some((kind, receiver.self_token.span()))
        }
        FnArg::Typed(PatType { pat, .. }) => {
            if let Pat::Ident(pat_ident) = pat.as_ref() {
                if pat_ident.ident == "self" {
                    return Some((ReceiverKind::Deref, pat_ident.ident.span()));
                }
            }
            None
        }
    }
}

pub(crate) fn to_snake_case(ident: &str) -> String {
    let chars: Vec<_> = ident.chars().collect();
    let mut output = String::with_capacity(ident.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|prev| chars[prev]);
            let after_lower =
                prev.map_or(false, |prev| prev.is_lowercase() || prev.is_ascii_digit());
            let acronym_end = prev.map_or(false, char::is_uppercase)
                && chars.get(i + 1).map_or(false, |next| next.is_lowercase());
            if after_lower || acronym_end {
                output.push('_');
            }
            output.extend(ch.to_lowercase());
        } else {
            output.push(ch);
        }
    }
    output
}

pub(crate) fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Derives an enum variant ident from the member name.
pub(crate) fn variant_ident(name: &str, span: Span) -> darling::Result<Ident> {
    let pascal_case = to_pascal_case(name);
    syn::parse_str::<Ident>(&pascal_case)
        .map(|ident| Ident::new(&ident.to_string(), span))
        .map_err(|_| {
            let message = format!("cannot derive enum variant name from member name `{name}`");
            syn::Error::new(span, message).into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_paths() {
        let path: syn::Path = syn::parse_quote!(test);
        assert!(match_path(&path, "test", None));
        assert!(match_path(&path, "test", Some("crate")));
        assert!(!match_path(&path, "other", None));
        assert!(!match_path(&path, "other", Some("crate")));
        assert!(match_path(&path, "test", Some("crater")));

        let path: syn::Path = syn::parse_quote!(decoy::test);
        assert!(!match_path(&path, "test", None));
        assert!(match_path(&path, "test", Some("decoy")));
        assert!(!match_path(&path, "other", Some("decoy")));
        assert!(!match_path(&path, "test", Some("decoys")));
    }

    #[test]
    fn stripping_attrs() {
        let method: syn::TraitItemMethod = syn::parse_quote! {
            #[doc = "Test method"]
            #[fake(get)]
            #[decoy::fake(rename = "test")]
            #[allow(unused)]
            fn test(&self) -> u8;
        };
        let mut attrs = method.attrs;
        strip_attrs("fake", Some("decoy"), &mut attrs);
        let paths: Vec<_> = attrs.iter().map(|attr| attr.path.clone()).collect();
        let expected: Vec<syn::Path> = vec![syn::parse_quote!(doc), syn::parse_quote!(allow)];
        assert_eq!(paths, expected);
    }

    #[test]
    fn detecting_receivers() {
        let sig: syn::Signature = syn::parse_quote! {
            fn test(&mut self, self_: u8)
        };
        let kinds: Vec<_> = sig
            .inputs
            .iter()
            .map(|arg| receiver_kind(arg).map(|(kind, _)| kind))
            .collect();
        assert_eq!(kinds, [Some(ReceiverKind::Deref), None]);

        let sig: syn::Signature = syn::parse_quote!(fn test(mut self));
        let kind = receiver_kind(&sig.inputs[0]).map(|(kind, _)| kind);
        assert_eq!(kind, Some(ReceiverKind::Value));

        let sig: syn::Signature = syn::parse_quote!(fn test(self: Box<Self>));
        let kind = receiver_kind(&sig.inputs[0]).map(|(kind, _)| kind);
        assert_eq!(kind, Some(ReceiverKind::Deref));
    }

    #[test]
    fn converting_case() {
        assert_eq!(to_snake_case("Find"), "find");
        assert_eq!(to_snake_case("FunctionOne"), "function_one");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("Value2Str"), "value2_str");

        assert_eq!(to_pascal_case("find"), "Find");
        assert_eq!(to_pascal_case("set_value"), "SetValue");
        assert_eq!(to_pascal_case("functionOne"), "FunctionOne");
        assert_eq!(to_pascal_case("_private"), "Private");
    }

    #[test]
    fn deriving_variant_idents() {
        let ident = variant_ident("functionOne", Span::call_site()).unwrap();
        assert_eq!(ident, "FunctionOne");
        let err = variant_ident("self", Span::call_site()).unwrap_err();
        assert!(err.to_string().contains("cannot derive enum variant"), "{err}");
        variant_ident("1st", Span::call_site()).unwrap_err();
    }
}
