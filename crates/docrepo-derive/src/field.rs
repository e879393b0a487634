use crate::util::{is_plain, opt_str, rename_field, serde_options, wrapped};
use darling::{FromField, FromMeta, ast::NestedMeta};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Ident, Type, ext::IdentExt};

///
/// IndexArgs
///
/// `#[entity(index)]` or `#[entity(index(name = "..", unique, ..))]`.
/// Repeatable; fields sharing a name form one compound index.
///

#[derive(Debug, Default, FromMeta)]
struct IndexOptions {
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    unique: bool,
    #[darling(default)]
    case_insensitive: bool,
    #[darling(default)]
    partial_filter: Option<String>,
}

#[derive(Debug, Default)]
pub struct IndexArgs(IndexOptions);

impl FromMeta for IndexArgs {
    fn from_word() -> darling::Result<Self> {
        Ok(Self::default())
    }

    fn from_list(items: &[NestedMeta]) -> darling::Result<Self> {
        IndexOptions::from_list(items).map(Self)
    }
}

///
/// GeoArgs
/// `#[entity(geo)]` or `#[entity(geo = "Name")]`.
///

#[derive(Debug, Default)]
pub struct GeoArgs {
    name: Option<String>,
}

impl FromMeta for GeoArgs {
    fn from_word() -> darling::Result<Self> {
        Ok(Self::default())
    }

    fn from_string(value: &str) -> darling::Result<Self> {
        Ok(Self {
            name: Some(value.to_string()),
        })
    }
}

///
/// FieldArgs
///

#[derive(FromField)]
#[darling(attributes(entity), forward_attrs(serde))]
pub struct FieldArgs {
    pub ident: Option<Ident>,
    pub ty: Type,
    pub attrs: Vec<Attribute>,

    #[darling(default)]
    pub key: bool,

    #[darling(default)]
    pub nested: bool,

    #[darling(default)]
    pub expire: bool,

    #[darling(default)]
    pub geo: Option<GeoArgs>,

    #[darling(multiple, rename = "index")]
    pub indexes: Vec<IndexArgs>,
}

///
/// Kind
///

enum Kind {
    Text,
    Value,
    Nested(Type),
    NestedList(Type),
}

impl Kind {
    fn classify(ty: &Type, nested: bool) -> Self {
        let ty = wrapped(ty, "Option").unwrap_or(ty);

        if nested {
            if let Some(inner) = wrapped(ty, "Vec") {
                return Self::NestedList(inner.clone());
            }
            let inner = wrapped(ty, "Box").unwrap_or(ty);
            return Self::Nested(inner.clone());
        }

        let item = wrapped(ty, "Vec").unwrap_or(ty);
        let item = wrapped(item, "Option").unwrap_or(item);
        if is_plain(item, "String") {
            Self::Text
        } else {
            Self::Value
        }
    }

    fn tokens(&self) -> TokenStream {
        match self {
            Self::Text => quote!(::docrepo::model::field::FieldKind::Text),
            Self::Value => quote!(::docrepo::model::field::FieldKind::Value),
            Self::Nested(inner) => quote! {
                ::docrepo::model::field::FieldKind::Nested(
                    <#inner as ::docrepo::traits::Shape>::SHAPE
                )
            },
            Self::NestedList(inner) => quote! {
                ::docrepo::model::field::FieldKind::NestedList(
                    <#inner as ::docrepo::traits::Shape>::SHAPE
                )
            },
        }
    }

    const fn sanitizes(&self) -> bool {
        !matches!(self, Self::Value)
    }
}

///
/// Field
/// A stored field with its document name resolved.
///

pub struct Field {
    pub ident: Ident,
    pub ty: Type,
    pub stored: String,
    pub args: FieldArgs,
    kind: Kind,
}

impl Field {
    fn model_tokens(&self) -> TokenStream {
        let name = &self.stored;
        let kind = self.kind.tokens();
        let expire = self.args.expire;
        let geo = match &self.args.geo {
            Some(geo) => {
                let geo_name = opt_str(geo.name.as_deref());
                quote! {
                    ::core::option::Option::Some(::docrepo::model::index::GeoMarker { name: #geo_name })
                }
            }
            None => quote!(::core::option::Option::None),
        };
        let markers = self.args.indexes.iter().map(|IndexArgs(index)| {
            let marker_name = opt_str(index.name.as_deref());
            let unique = index.unique;
            let case_insensitive = index.case_insensitive;
            let partial_filter = opt_str(index.partial_filter.as_deref());

            quote! {
                ::docrepo::model::index::IndexMarker {
                    name: #marker_name,
                    unique: #unique,
                    case_insensitive: #case_insensitive,
                    partial_filter: #partial_filter,
                }
            }
        });

        quote! {
            ::docrepo::model::field::FieldModel {
                name: #name,
                kind: #kind,
                indexes: &[#(#markers),*],
                geo: #geo,
                expire: #expire,
            }
        }
    }
}

/// Resolve stored names and kinds; `#[serde(skip)]` fields are left out.
pub fn resolve_fields(
    fields: Vec<FieldArgs>,
    rename_all: Option<&str>,
) -> darling::Result<Vec<Field>> {
    let mut errors = darling::Error::accumulator();
    let mut out = Vec::with_capacity(fields.len());

    for args in fields {
        let Some(ident) = args.ident.clone() else {
            errors.push(darling::Error::custom("fields must be named").with_span(&args.ty));
            continue;
        };
        let Some(serde) = errors.handle(serde_options(&args.attrs).map_err(darling::Error::from))
        else {
            continue;
        };
        if serde.skip {
            if args.key {
                errors.push(darling::Error::custom("the key field cannot be skipped").with_span(&ident));
            }
            continue;
        }

        let plain = ident.unraw().to_string();
        let stored = match (serde.rename, rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => {
                if let Some(renamed) = rename_field(&plain, rule) {
                    renamed
                } else {
                    errors.push(
                        darling::Error::custom(format!("unsupported rename_all rule '{rule}'"))
                            .with_span(&ident),
                    );
                    continue;
                }
            }
            (None, None) => plain,
        };

        out.push(Field {
            kind: Kind::classify(&args.ty, args.nested),
            ty: args.ty.clone(),
            ident,
            stored,
            args,
        });
    }

    errors.finish_with(out)
}

pub fn shape_tokens(name: &str, fields: &[Field]) -> TokenStream {
    let models = fields.iter().map(Field::model_tokens);

    quote! {
        &::docrepo::model::field::ShapeModel {
            name: #name,
            fields: &[#(#models),*],
        }
    }
}

pub fn sanitize_tokens(fields: &[Field]) -> TokenStream {
    let calls = fields
        .iter()
        .filter(|field| field.kind.sanitizes())
        .map(|field| {
            let ident = &field.ident;
            quote!(::docrepo::sanitize::Sanitize::sanitize(&mut self.#ident);)
        });

    quote!(#(#calls)*)
}
