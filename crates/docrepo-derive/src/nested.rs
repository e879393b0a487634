use crate::{
    field::{FieldArgs, resolve_fields, sanitize_tokens, shape_tokens},
    util::{reject_generics, serde_options},
};
use darling::{FromDeriveInput, ast::Data};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Generics, Ident, ext::IdentExt};

///
/// NestedArgs
/// A composite stored inside an entity; carries field markers but no
/// storage location of its own.
///

#[derive(FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs(serde))]
struct NestedArgs {
    ident: Ident,
    generics: Generics,
    data: Data<(), FieldArgs>,
    attrs: Vec<Attribute>,
}

// derive_nested
pub fn derive_nested(input: TokenStream) -> TokenStream {
    expand(input).unwrap_or_else(darling::Error::write_errors)
}

fn expand(input: TokenStream) -> darling::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let args = NestedArgs::from_derive_input(&input)?;
    reject_generics(&args.generics)?;

    let serde = serde_options(&args.attrs)?;
    let fields = args
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?
        .fields;
    let fields = resolve_fields(fields, serde.rename_all.as_deref())?;
    if let Some(keyed) = fields.iter().find(|field| field.args.key) {
        return Err(darling::Error::custom("nested types have no key").with_span(&keyed.ident));
    }

    let ident = &args.ident;
    let shape = shape_tokens(&ident.unraw().to_string(), &fields);
    let sanitize = sanitize_tokens(&fields);

    Ok(quote! {
        impl ::docrepo::traits::Shape for #ident {
            const SHAPE: &'static ::docrepo::model::field::ShapeModel = #shape;
        }

        impl ::docrepo::sanitize::Sanitize for #ident {
            fn sanitize(&mut self) {
                #sanitize
            }
        }
    })
}
