//! Procedural macros for `decoy`. See the main crate docs for details.

#![recursion_limit = "128"]

extern crate proc_macro;

mod fake;
mod member;
mod utils;

use proc_macro::TokenStream;

/// Derives a fake for a trait.
///
/// The macro is placed on a trait declaration and generates the following items next to it
/// (with the same visibility as the trait):
///
/// - `{Trait}Member` enum with a variant for each instance member
/// - `{Trait}StaticMember` enum with a variant for each static member (i.e., a method
///   without a receiver)
/// - `{Trait}Shape` marker implementing `decoy::Shape`
/// - Implementation of the trait for `decoy::Fake<{Trait}Shape>`.
///
/// Method args must be convertible into `decoy::Value`, and return types must implement
/// `decoy::FromValue`. Methods returning `Self` record the call and return a fake sharing
/// the mock state.
///
/// # Container attributes
///
/// - `shape`, `member`, `static_member`: override names of the generated types,
///   e.g., `#[fake(shape = "TestShape")]`.
///
/// # Method attributes
///
/// - `#[fake(get)]` / `#[fake(get = "name")]`: marks a property getter. Getters take no args
///   besides the receiver.
/// - `#[fake(set)]` / `#[fake(set = "name")]`: marks a property setter. Setters take a single
///   arg besides the receiver and return nothing. By default, the `set_` prefix is stripped
///   from the method name.
/// - `#[fake(rename = "name")]`: changes the member name of a function.
///
/// Associated types and constants, `async` and `const` functions are not supported.
#[proc_macro_attribute]
pub fn fake(attr: TokenStream, item: TokenStream) -> TokenStream {
    fake::impl_fake(attr, item)
}

/// Derives `decoy::MemberName` for an enum with unit variants.
///
/// Member names are variant names converted to snake case; a name can be overridden
/// with `#[member(rename = "name")]`.
#[proc_macro_derive(Member, attributes(member))]
pub fn member_derive(input: TokenStream) -> TokenStream {
    member::impl_member(input)
}
