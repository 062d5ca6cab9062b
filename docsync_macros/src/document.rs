use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr};

pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let type_name = to_snake_case(&name.to_string());
    let collection = extract_collection(input)?;

    let fields = named_fields(input)?;
    let id_attribute = extract_id_attribute(input, &fields)?;
    let indexes = extract_indexes(&fields)?;

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics docsync::Document for #name #ty_generics #where_clause {
            fn schema() -> docsync::ModelSchema {
                docsync::ModelSchema::new(#type_name)
                    .collection(#collection)
                    .id_attribute(#id_attribute)
                    #(.index(#indexes))*
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<Vec<&Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter().collect()),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "Document derive: only structs with named fields are supported",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "Document derive: only structs are supported",
        )),
    }
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;

        if let Some(c) = collection {
            return Ok(c);
        }
    }

    // Default: snake_case struct name + "s"
    Ok(format!("{}s", to_snake_case(&input.ident.to_string())))
}

/// Flags set by `#[document(...)]` on a field.
#[derive(Default)]
struct FieldFlags {
    id: bool,
    index: bool,
}

fn field_flags(field: &Field) -> syn::Result<FieldFlags> {
    let mut flags = FieldFlags::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("document") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                flags.id = true;
                Ok(())
            } else if meta.path.is_ident("index") {
                flags.index = true;
                Ok(())
            } else {
                Err(meta.error("expected `id` or `index`"))
            }
        })?;
    }
    Ok(flags)
}

/// Serialized key of a field: its `#[serde(rename)]` or its name.
fn field_key(field: &Field) -> syn::Result<String> {
    for attr in &field.attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let mut rename = None;
        // Other serde options are not ours to validate.
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
        if let Some(rename) = rename {
            return Ok(rename);
        }
    }

    match &field.ident {
        Some(ident) => Ok(ident.to_string().trim_start_matches("r#").to_string()),
        None => Err(syn::Error::new_spanned(field, "Document derive: unnamed field")),
    }
}

fn extract_id_attribute(input: &DeriveInput, fields: &[&Field]) -> syn::Result<String> {
    for field in fields {
        if field_flags(field)?.id {
            return field_key(field);
        }
    }

    // Default: look for a field named "id"
    for field in fields {
        if field.ident.as_ref().is_some_and(|ident| ident == "id") {
            return field_key(field);
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "Document derive: no field marked with #[document(id)] and no field named `id`",
    ))
}

fn extract_indexes(fields: &[&Field]) -> syn::Result<Vec<String>> {
    let mut indexes = Vec::new();
    for field in fields {
        if field_flags(field)?.index {
            indexes.push(field_key(field)?);
        }
    }
    Ok(indexes)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
