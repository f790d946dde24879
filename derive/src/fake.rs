//! `#[fake]` attribute for traits.

use darling::{util::Override, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{quote, quote_spanned, ToTokens};
use syn::{
    parse::Parser, punctuated::Punctuated, spanned::Spanned, token::Comma, FnArg, Ident,
    ItemTrait, NestedMeta, Pat, PatIdent, ReturnType, Signature, TraitItem, TraitItemMethod, Type,
    Visibility,
};

use crate::utils::{find_meta_attrs, receiver_kind, strip_attrs, variant_ident, ReceiverKind};

#[derive(Debug, Default, FromMeta)]
struct FakeAttrs {
    shape: Option<String>,
    member: Option<String>,
    static_member: Option<String>,
}

impl FakeAttrs {
    fn parse(attr: TokenStream) -> darling::Result<Self> {
        let meta = Punctuated::<NestedMeta, Comma>::parse_terminated.parse(attr)?;
        let meta: Vec<_> = meta.into_iter().collect();
        Self::from_list(&meta)
    }

    fn ident(name: Option<&str>, default: String, span: Span) -> darling::Result<Ident> {
        let name = name.map_or(default, str::to_owned);
        syn::parse_str::<Ident>(&name)
            .map(|ident| Ident::new(&ident.to_string(), span))
            .map_err(|err| {
                let message = format!("invalid type name `{name}`: {err}");
                syn::Error::new(span, message).into()
            })
    }
}

#[derive(Debug, Default, FromMeta)]
struct MethodAttrs {
    get: Option<Override<String>>,
    set: Option<Override<String>>,
    rename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Function,
    Getter,
    Setter,
}

#[derive(Debug)]
struct FakeMethod {
    sig: Signature,
    role: Role,
    name: String,
    variant: Ident,
    receiver: Option<ReceiverKind>,
    args: Vec<Ident>,
    returns_self: bool,
}

impl FakeMethod {
    fn check_signature(sig: &Signature) -> darling::Result<()> {
        if let Some(const_token) = &sig.constness {
            let message = "const functions are not supported";
            return Err(darling::Error::custom(message).with_span(const_token));
        }
        if let Some(async_token) = &sig.asyncness {
            let message = "async functions are not supported";
            return Err(darling::Error::custom(message).with_span(async_token));
        }
        if let Some(variadic) = &sig.variadic {
            let message = "variadic functions are not supported";
            return Err(darling::Error::custom(message).with_span(variadic));
        }
        Ok(())
    }

    fn new(method: &TraitItemMethod) -> darling::Result<Self> {
        let attrs = find_meta_attrs("fake", Some("decoy"), &method.attrs)
            .map(|meta| MethodAttrs::from_nested_meta(&meta))
            .unwrap_or_else(|| Ok(MethodAttrs::default()))?;
        let mut sig = method.sig.clone();
        Self::check_signature(&sig)?;

        let receiver = sig.inputs.first().and_then(receiver_kind);
        let (receiver, receiver_span) = match receiver {
            Some((kind, span)) => (Some(kind), Some(span)),
            None => (None, None),
        };
        let args = Self::take_args(receiver.is_some(), &mut sig);
        let (role, name) = Self::role_and_name(&attrs, &sig, args.len())?;
        let variant = variant_ident(&name, sig.ident.span())?;
        let returns_self = match &sig.output {
            ReturnType::Type(_, ty) => {
                matches!(
                    ty.as_ref(),
                    Type::Path(path) if path.qself.is_none() && path.path.is_ident("Self")
                )
            }
            ReturnType::Default => false,
        };
        if returns_self && role != Role::Function {
            let message = "properties cannot have `Self` type";
            return Err(darling::Error::custom(message).with_span(&sig.output));
        }
        if let (Some(ReceiverKind::Value), Some(span), Role::Getter | Role::Setter) =
            (receiver, receiver_span, role)
        {
            let message = "property accessors must take `self` by reference";
            return Err(syn::Error::new(span, message).into());
        }

        Ok(Self {
            sig,
            role,
            name,
            variant,
            receiver,
            args,
            returns_self,
        })
    }

    fn role_and_name(
        attrs: &MethodAttrs,
        sig: &Signature,
        arg_count: usize,
    ) -> darling::Result<(Role, String)> {
        let method_name = syn::ext::IdentExt::unraw(&sig.ident).to_string();
        match (&attrs.get, &attrs.set, &attrs.rename) {
            (None, None, rename) => {
                let name = rename.clone().unwrap_or(method_name);
                Ok((Role::Function, name))
            }
            (Some(get), None, None) => {
                if arg_count != 0 {
                    let message = "getters cannot have arguments besides the receiver";
                    return Err(darling::Error::custom(message).with_span(&sig.inputs));
                }
                if matches!(sig.output, ReturnType::Default) {
                    let message = "getters must return a value";
                    return Err(darling::Error::custom(message).with_span(&sig.ident));
                }
                let name = match get {
                    Override::Inherit => method_name,
                    Override::Explicit(name) => name.clone(),
                };
                Ok((Role::Getter, name))
            }
            (None, Some(set), None) => {
                if arg_count != 1 {
                    let message = "setters must have exactly one argument besides the receiver";
                    return Err(darling::Error::custom(message).with_span(&sig.inputs));
                }
                if let ReturnType::Type(..) = &sig.output {
                    let message = "setters cannot return a value";
                    return Err(darling::Error::custom(message).with_span(&sig.output));
                }
                let name = match set {
                    Override::Inherit => method_name
                        .strip_prefix("set_")
                        .map_or_else(|| method_name.clone(), str::to_owned),
                    Override::Explicit(name) => name.clone(),
                };
                Ok((Role::Setter, name))
            }
            (Some(_), Some(_), _) => {
                let message = "`get` and `set` cannot be specified together";
                Err(darling::Error::custom(message).with_span(&sig.ident))
            }
            (_, _, Some(_)) => {
                let message = "`rename` cannot be used with `get` / `set`; \
                     specify the name in the accessor attr instead, e.g. `#[fake(get = \"name\")]`";
                Err(darling::Error::custom(message).with_span(&sig.ident))
            }
        }
    }

    fn take_args(skip_receiver: bool, sig: &mut Signature) -> Vec<Ident> {
        let iter = sig
            .inputs
            .iter_mut()
            .enumerate()
            .skip(usize::from(skip_receiver));
        let iter = iter.map(|(i, arg)| {
            let span = arg.span();
            if let FnArg::Typed(pat_type) = arg {
                let ident = Ident::new(&format!("__arg{i}"), span);
                let simple_pat = Box::new(Pat::Ident(PatIdent {
                    attrs: vec![],
                    by_ref: None,
                    mutability: None,
                    ident: ident.clone(),
                    subpat: None,
                }));
                pat_type.pat = simple_pat;
                ident
            } else {
                unreachable!() // receivers may only be in the first position
            }
        });
        iter.collect()
    }

    fn is_static(&self) -> bool {
        self.receiver.is_none()
    }

    fn fake_ref(&self) -> Option<proc_macro2::TokenStream> {
        self.receiver.map(|kind| match kind {
            ReceiverKind::Deref => quote!(&*self),
            ReceiverKind::Value => quote!(&self),
        })
    }

    fn body(&self, shape: &Ident, member_ty: &Ident) -> proc_macro2::TokenStream {
        let variant = &self.variant;
        let member = quote!(#member_ty::#variant);
        let args = &self.args;
        let (target, prelude) = if let Some(fake_ref) = self.fake_ref() {
            (quote!(::decoy::Fake::<#shape>), fake_ref)
        } else {
            let target = quote!(::decoy::FakeConstructor::<#shape>);
            (target, quote!(&__constructor))
        };
        let constructor = if self.is_static() {
            Some(quote!(let __constructor = ::decoy::FakeConstructor::<#shape>::current();))
        } else {
            None
        };

        match self.role {
            Role::Function => {
                let call = quote! {
                    #target::call(
                        #prelude,
                        #member,
                        ::std::vec![#(::core::convert::Into::<::decoy::Value>::into(#args),)*],
                    )
                };
                let output = if !self.returns_self {
                    quote!(::decoy::__private::convert_return(#member, __value))
                } else if self.is_static() {
                    quote!(__constructor.construct())
                } else {
                    quote!(::core::clone::Clone::clone(#prelude))
                };
                quote! {
                    #constructor
                    let __value = #call;
                    #output
                }
            }
            Role::Getter => quote! {
                #constructor
                let __value = #target::get(#prelude, #member);
                ::decoy::__private::convert_return(#member, __value)
            },
            Role::Setter => quote! {
                #constructor
                #target::set(#prelude, #member, #(#args)*);
            },
        }
    }

    fn impl_method(&self, shape: &Ident, member_ty: &Ident) -> proc_macro2::TokenStream {
        let sig = &self.sig;
        let body = self.body(shape, member_ty);
        quote_spanned! {sig.span()=>
            #[allow(clippy::let_unit_value, unused_variables)]
            #sig {
                #body
            }
        }
    }
}

#[derive(Debug)]
struct Member {
    variant: Ident,
    name: String,
    role: Role,
}

#[derive(Debug)]
struct Fake {
    item: ItemTrait,
    shape: Ident,
    member_ty: Ident,
    static_member_ty: Ident,
    methods: Vec<FakeMethod>,
    members: Vec<Member>,
    static_members: Vec<Member>,
}

impl Fake {
    fn new(attrs: FakeAttrs, mut item: ItemTrait) -> darling::Result<Self> {
        if let Some(param) = item.generics.params.first() {
            let message = "generic traits are not supported";
            return Err(darling::Error::custom(message).with_span(param));
        }
        if item.auto_token.is_some() {
            let message = "auto traits are not supported";
            return Err(darling::Error::custom(message).with_span(&item.ident));
        }

        let trait_name = item.ident.to_string();
        let span = item.ident.span();
        let shape = FakeAttrs::ident(attrs.shape.as_deref(), format!("{trait_name}Shape"), span)?;
        let member_ty =
            FakeAttrs::ident(attrs.member.as_deref(), format!("{trait_name}Member"), span)?;
        let static_member_ty = FakeAttrs::ident(
            attrs.static_member.as_deref(),
            format!("{trait_name}StaticMember"),
            span,
        )?;

        let mut errors = vec![];
        let mut methods = vec![];
        for trait_item in &mut item.items {
            match trait_item {
                TraitItem::Method(method) => {
                    match FakeMethod::new(method) {
                        Ok(method) => methods.push(method),
                        Err(err) => errors.push(err),
                    }
                    strip_attrs("fake", Some("decoy"), &mut method.attrs);
                }
                TraitItem::Type(ty) => {
                    let message = "associated types are not supported";
                    errors.push(darling::Error::custom(message).with_span(&ty.ident));
                }
                TraitItem::Const(constant) => {
                    let message = "associated constants are not supported";
                    errors.push(darling::Error::custom(message).with_span(&constant.ident));
                }
                other => {
                    let message = "unsupported trait item";
                    errors.push(darling::Error::custom(message).with_span(&*other));
                }
            }
        }

        let mut members = vec![];
        let mut static_members = vec![];
        for method in &methods {
            let target = if method.is_static() {
                &mut static_members
            } else {
                &mut members
            };
            if let Err(err) = Self::add_member(target, method) {
                errors.push(err);
            }
        }

        if !errors.is_empty() {
            return Err(darling::Error::multiple(errors));
        }
        Ok(Self {
            item,
            shape,
            member_ty,
            static_member_ty,
            methods,
            members,
            static_members,
        })
    }

    fn add_member(members: &mut Vec<Member>, method: &FakeMethod) -> darling::Result<()> {
        let existing = members
            .iter()
            .find(|member| member.name == method.name || member.variant == method.variant);
        let Some(existing) = existing else {
            members.push(Member {
                variant: method.variant.clone(),
                name: method.name.clone(),
                role: method.role,
            });
            return Ok(());
        };

        let is_accessor_pair = existing.name == method.name
            && matches!(
                (existing.role, method.role),
                (Role::Getter, Role::Setter) | (Role::Setter, Role::Getter)
            );
        if is_accessor_pair {
            Ok(())
        } else {
            let message = format!(
                "member `{}` conflicts with member `{}` defined previously",
                method.name, existing.name
            );
            Err(darling::Error::custom(message).with_span(&method.sig.ident))
        }
    }

    fn member_enum(
        vis: &Visibility,
        ident: &Ident,
        members: &[Member],
        doc: &str,
    ) -> impl ToTokens {
        let variants = members.iter().map(|member| {
            let variant = &member.variant;
            let doc = format!("`{}` member.", member.name);
            quote!(#[doc = #doc] #variant,)
        });
        let match_arms = members.iter().map(|member| {
            let variant = &member.variant;
            let name = &member.name;
            quote!(Self::#variant => #name,)
        });

        quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #vis enum #ident {
                #(#variants)*
            }

            impl ::decoy::MemberName for #ident {
                fn name(&self) -> &'static str {
                    match *self {
                        #(#match_arms)*
                    }
                }
            }
        }
    }

    fn impl_shape(&self) -> impl ToTokens {
        let vis = &self.item.vis;
        let trait_name = &self.item.ident;
        let shape = &self.shape;
        let member_ty = &self.member_ty;
        let static_member_ty = &self.static_member_ty;

        let shape_doc = format!("Shape of fakes implementing [`{trait_name}`].");
        let member_doc = format!("Instance members of [`{trait_name}`].");
        let static_member_doc = format!("Static members of [`{trait_name}`].");
        let member_enum = Self::member_enum(vis, member_ty, &self.members, &member_doc);
        let static_member_enum = Self::member_enum(
            vis,
            static_member_ty,
            &self.static_members,
            &static_member_doc,
        );

        quote! {
            #member_enum
            #static_member_enum

            #[doc = #shape_doc]
            #[derive(Debug)]
            #vis enum #shape {}

            impl ::decoy::Shape for #shape {
                type Member = #member_ty;
                type StaticMember = #static_member_ty;

                fn registry() -> &'static ::decoy::Registry<Self> {
                    static REGISTRY: ::decoy::Registry<#shape> = ::decoy::Registry::new();
                    &REGISTRY
                }
            }
        }
    }

    fn impl_trait(&self) -> impl ToTokens {
        let unsafety = &self.item.unsafety;
        let trait_name = &self.item.ident;
        let shape = &self.shape;
        let methods = self.methods.iter().map(|method| {
            let member_ty = if method.is_static() {
                &self.static_member_ty
            } else {
                &self.member_ty
            };
            method.impl_method(shape, member_ty)
        });

        quote! {
            #unsafety impl #trait_name for ::decoy::Fake<#shape> {
                #(#methods)*
            }
        }
    }
}

impl ToTokens for Fake {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let item = &self.item;
        let shape = self.impl_shape();
        let trait_impl = self.impl_trait();
        tokens.extend(quote! {
            #item
            #shape
            #trait_impl
        });
    }
}

pub(crate) fn impl_fake(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match FakeAttrs::parse(attr) {
        Ok(attrs) => attrs,
        Err(err) => return err.write_errors().into(),
    };
    let item: ItemTrait = match syn::parse(item) {
        Ok(item) => item,
        Err(err) => return err.into_compile_error().into(),
    };
    match Fake::new(attrs, item) {
        Ok(fake) => quote!(#fake).into(),
        Err(err) => err.write_errors().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_method(method: TraitItemMethod) -> darling::Result<FakeMethod> {
        FakeMethod::new(&method)
    }

    #[test]
    fn transforming_args() {
        let method = parse_method(syn::parse_quote! {
            fn test(&self, _: u8, name: &str, values: impl Iterator<Item = u8>) -> usize;
        })
        .unwrap();

        assert_eq!(method.role, Role::Function);
        assert_eq!(method.name, "test");
        assert_eq!(method.variant, "Test");
        assert_eq!(method.receiver, Some(ReceiverKind::Deref));
        assert_eq!(
            method.args.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["__arg1", "__arg2", "__arg3"]
        );
        let expected: Signature = syn::parse_quote! {
            fn test(&self, __arg1: u8, __arg2: &str, __arg3: impl Iterator<Item = u8>) -> usize
        };
        assert_eq!(method.sig, expected);
    }

    #[test]
    fn parsing_accessors() {
        let getter = parse_method(syn::parse_quote! {
            #[fake(get)]
            fn value(&self) -> String;
        })
        .unwrap();
        assert_eq!((getter.role, getter.name.as_str()), (Role::Getter, "value"));

        let setter = parse_method(syn::parse_quote! {
            #[fake(set)]
            fn set_value(&mut self, value: String);
        })
        .unwrap();
        assert_eq!((setter.role, setter.name.as_str()), (Role::Setter, "value"));
        assert_eq!(setter.variant, "Value");

        let setter = parse_method(syn::parse_quote! {
            #[decoy::fake(set = "currentValue")]
            fn update(&self, value: String);
        })
        .unwrap();
        assert_eq!(setter.name, "currentValue");
        assert_eq!(setter.variant, "CurrentValue");

        let renamed = parse_method(syn::parse_quote! {
            #[fake(rename = "functionOne")]
            fn function_one(&self);
        })
        .unwrap();
        assert_eq!((renamed.role, renamed.name.as_str()), (Role::Function, "functionOne"));
    }

    #[test]
    fn accessor_errors() {
        let err = parse_method(syn::parse_quote! {
            #[fake(get)]
            fn value(&self, x: u8) -> String;
        })
        .unwrap_err();
        assert!(err.to_string().contains("getters cannot have arguments"), "{err}");

        let err = parse_method(syn::parse_quote! {
            #[fake(set)]
            fn set_value(&self) -> bool;
        })
        .unwrap_err();
        assert!(err.to_string().contains("setters must have exactly one"), "{err}");

        let err = parse_method(syn::parse_quote! {
            #[fake(get, rename = "other")]
            fn value(&self) -> u8;
        })
        .unwrap_err();
        assert!(err.to_string().contains("`rename` cannot be used"), "{err}");

        let err = parse_method(syn::parse_quote! {
            #[fake(get)]
            fn value(self) -> u8;
        })
        .unwrap_err();
        assert!(err.to_string().contains("take `self` by reference"), "{err}");
    }

    #[test]
    fn error_on_async_fn() {
        let err = parse_method(syn::parse_quote! {
            async fn test(&self) -> u8;
        })
        .unwrap_err();
        assert!(err.to_string().contains("async functions"), "{err}");
    }

    #[test]
    fn instance_function_body() {
        let method = parse_method(syn::parse_quote! {
            fn test(&self, x: u8, y: &str) -> bool;
        })
        .unwrap();
        let shape: Ident = syn::parse_quote!(TestShape);
        let member_ty: Ident = syn::parse_quote!(TestMember);
        let body = method.body(&shape, &member_ty);
        let body: syn::Block = syn::parse_quote!({ #body });

        let expected: syn::Block = syn::parse_quote!({
            let __value = ::decoy::Fake::<TestShape>::call(
                &*self,
                TestMember::Test,
                ::std::vec![
                    ::core::convert::Into::<::decoy::Value>::into(__arg1),
                    ::core::convert::Into::<::decoy::Value>::into(__arg2),
                ],
            );
            ::decoy::__private::convert_return(TestMember::Test, __value)
        });
        assert_eq!(body, expected, "{}", quote!(#body));
    }

    #[test]
    fn static_constructor_body() {
        let method = parse_method(syn::parse_quote! {
            fn new(url: String) -> Self where Self: Sized;
        })
        .unwrap();
        assert!(method.is_static());
        assert!(method.returns_self);

        let shape: Ident = syn::parse_quote!(TestShape);
        let member_ty: Ident = syn::parse_quote!(TestStaticMember);
        let body = method.body(&shape, &member_ty);
        let body: syn::Block = syn::parse_quote!({ #body });

        let expected: syn::Block = syn::parse_quote!({
            let __constructor = ::decoy::FakeConstructor::<TestShape>::current();
            let __value = ::decoy::FakeConstructor::<TestShape>::call(
                &__constructor,
                TestStaticMember::New,
                ::std::vec![::core::convert::Into::<::decoy::Value>::into(__arg0),],
            );
            __constructor.construct()
        });
        assert_eq!(body, expected, "{}", quote!(#body));
    }

    #[test]
    fn setter_body() {
        let method = parse_method(syn::parse_quote! {
            #[fake(set)]
            fn set_value(&mut self, value: u32);
        })
        .unwrap();
        let shape: Ident = syn::parse_quote!(TestShape);
        let member_ty: Ident = syn::parse_quote!(TestMember);
        let body = method.body(&shape, &member_ty);
        let body: syn::Block = syn::parse_quote!({ #body });

        let expected: syn::Block = syn::parse_quote!({
            ::decoy::Fake::<TestShape>::set(&*self, TestMember::Value, __arg1);
        });
        assert_eq!(body, expected, "{}", quote!(#body));
    }

    #[test]
    fn generating_shape() {
        let item: ItemTrait = syn::parse_quote! {
            pub trait Counter {
                #[fake(get)]
                fn count(&self) -> u32;
                #[fake(set)]
                fn set_count(&mut self, count: u32);
                fn reset(&mut self);
                fn create() -> Self where Self: Sized;
            }
        };
        let fake = Fake::new(FakeAttrs::default(), item).unwrap();
        assert_eq!(fake.shape, "CounterShape");

        let names: Vec<_> = fake.members.iter().map(|member| member.name.as_str()).collect();
        assert_eq!(names, ["count", "reset"]);
        let names: Vec<_> = fake
            .static_members
            .iter()
            .map(|member| member.name.as_str())
            .collect();
        assert_eq!(names, ["create"]);

        let expected: ItemTrait = syn::parse_quote! {
            pub trait Counter {
                fn count(&self) -> u32;
                fn set_count(&mut self, count: u32);
                fn reset(&mut self);
                fn create() -> Self where Self: Sized;
            }
        };
        assert_eq!(fake.item, expected);
    }

    #[test]
    fn custom_type_names() {
        let attrs = FakeAttrs {
            shape: Some("Test".to_owned()),
            member: Some("fn".to_owned()),
            static_member: None,
        };
        let item: ItemTrait = syn::parse_quote! {
            trait Counter {}
        };
        let err = Fake::new(attrs, item).unwrap_err();
        assert!(err.to_string().contains("invalid type name `fn`"), "{err}");
    }

    #[test]
    fn errors_are_combined() {
        let item: ItemTrait = syn::parse_quote! {
            trait Test {
                type Output;
                const VALUE: u8;
                fn test(&self);
                #[fake(rename = "test")]
                fn other(&self);
            }
        };
        let err = Fake::new(FakeAttrs::default(), item).unwrap_err();
        assert_eq!(err.len(), 3);
        let err = err.to_string();
        assert!(err.contains("associated types"), "{err}");
    }
}
