mod document;

use proc_macro::TokenStream;

/// Derive macro for the `Document` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Document)]
/// #[document(collection = "users")]
/// struct User {
///     #[document(id)]
///     pub key: String,
///     #[document(index)]
///     pub email: String,
///     pub name: String,
/// }
/// ```
///
/// - `#[document(collection = "...")]` sets the store collection.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[document(id)]` marks the field used as the public identifier.
///   If omitted, defaults to a field named `id`.
/// - `#[document(index)]` marks a field usable to scope a bare-model fetch.
///
/// Field keys follow `#[serde(rename = "...")]` when present.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    document::derive_document(input)
}
