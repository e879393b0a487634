use crate::{
    field::{Field, FieldArgs, resolve_fields, sanitize_tokens, shape_tokens},
    util::{opt_str, reject_generics, serde_options},
};
use darling::{FromDeriveInput, FromMeta, ast::Data};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Generics, Ident, ext::IdentExt};

///
/// ClassIndex
/// `#[entity(index(name = "..", field = "a.b"))]` on the struct.
///

#[derive(Debug, FromMeta)]
struct ClassIndex {
    name: String,
    field: String,
}

///
/// EntityArgs
///

#[derive(FromDeriveInput)]
#[darling(attributes(entity), supports(struct_named), forward_attrs(serde))]
struct EntityArgs {
    ident: Ident,
    generics: Generics,
    data: Data<(), FieldArgs>,
    attrs: Vec<Attribute>,

    #[darling(default)]
    database: Option<String>,

    #[darling(default)]
    collection: Option<String>,

    #[darling(default)]
    audit: Option<String>,

    #[darling(multiple, rename = "index")]
    indexes: Vec<ClassIndex>,
}

// derive_entity
pub fn derive_entity(input: TokenStream) -> TokenStream {
    expand(input).unwrap_or_else(darling::Error::write_errors)
}

fn expand(input: TokenStream) -> darling::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let args = EntityArgs::from_derive_input(&input)?;
    reject_generics(&args.generics)?;

    let serde = serde_options(&args.attrs)?;
    let fields = args
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?
        .fields;
    let fields = resolve_fields(fields, serde.rename_all.as_deref())?;
    let key = key_field(&args.ident, &fields)?;

    let ident = &args.ident;
    let type_name = ident.unraw().to_string();
    let shape = shape_tokens(&type_name, &fields);
    let sanitize = sanitize_tokens(&fields);

    let database = opt_str(args.database.as_deref());
    let collection = opt_str(args.collection.as_deref());
    let audit = opt_str(args.audit.as_deref());
    let key_name = &key.stored;
    let key_ident = &key.ident;
    let key_ty = &key.ty;
    let class_indexes = args.indexes.iter().map(|index| {
        let name = &index.name;
        let field = &index.field;
        quote!(::docrepo::model::index::FieldIndexModel::new(#name, #field))
    });

    Ok(quote! {
        impl ::docrepo::traits::Shape for #ident {
            const SHAPE: &'static ::docrepo::model::field::ShapeModel = #shape;
        }

        impl ::docrepo::sanitize::Sanitize for #ident {
            fn sanitize(&mut self) {
                #sanitize
            }
        }

        impl ::docrepo::traits::Entity for #ident {
            type Key = #key_ty;

            const MODEL: &'static ::docrepo::model::entity::EntityModel =
                &::docrepo::model::entity::EntityModel {
                    type_name: #type_name,
                    database: #database,
                    collection: #collection,
                    audit_collection: #audit,
                    key_field: ::core::option::Option::Some(#key_name),
                    shape: <Self as ::docrepo::traits::Shape>::SHAPE,
                    indexes: &[#(#class_indexes),*],
                };

            fn key(&self) -> Self::Key {
                ::core::clone::Clone::clone(&self.#key_ident)
            }
        }
    })
}

// The field marked `#[entity(key)]`, else the one named `id`.
fn key_field<'a>(ident: &Ident, fields: &'a [Field]) -> darling::Result<&'a Field> {
    let mut marked = fields.iter().filter(|field| field.args.key);

    match (marked.next(), marked.next()) {
        (Some(key), None) => Ok(key),
        (Some(_), Some(second)) => Err(darling::Error::custom(
            "only one field may be marked #[entity(key)]",
        )
        .with_span(&second.ident)),
        (None, _) => fields
            .iter()
            .find(|field| field.ident.unraw() == "id")
            .ok_or_else(|| {
                darling::Error::custom("entity needs an #[entity(key)] field or a field named `id`")
                    .with_span(ident)
            }),
    }
}
