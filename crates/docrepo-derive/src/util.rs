use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Expr, ExprLit, GenericArgument, Generics, Lit, Meta, PathArguments, Token, Type,
    punctuated::Punctuated,
};

///
/// SerdeOptions
/// The subset of `#[serde(...)]` that changes stored field names.
///

#[derive(Debug, Default)]
pub struct SerdeOptions {
    pub rename: Option<String>,
    pub rename_all: Option<String>,
    pub skip: bool,
}

pub fn serde_options(attrs: &[Attribute]) -> syn::Result<SerdeOptions> {
    let mut options = SerdeOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in metas {
            match &meta {
                Meta::Path(path) if path.is_ident("skip") => options.skip = true,
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    options.rename = Some(lit_str(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("rename_all") => {
                    options.rename_all = Some(lit_str(&nv.value)?);
                }
                _ => {}
            }
        }
    }

    Ok(options)
}

fn lit_str(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit.value()),
        _ => Err(syn::Error::new_spanned(expr, "expected a string literal")),
    }
}

/// Apply a serde `rename_all` rule to a snake_case field name.
pub fn rename_field(field: &str, rule: &str) -> Option<String> {
    let renamed = match rule {
        "lowercase" | "snake_case" => field.to_string(),
        "UPPERCASE" | "SCREAMING_SNAKE_CASE" => field.to_uppercase(),
        "camelCase" => field.to_case(Case::Camel),
        "PascalCase" => field.to_case(Case::Pascal),
        "kebab-case" => field.to_case(Case::Kebab),
        "SCREAMING-KEBAB-CASE" => field.to_case(Case::Kebab).to_uppercase(),
        _ => return None,
    };

    Some(renamed)
}

///
/// TYPES
///

/// Inner type of a one-argument wrapper such as `Option<T>` or `Vec<T>`.
pub fn wrapped<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }

    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };

    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

pub fn is_plain(ty: &Type, ident: &str) -> bool {
    matches!(
        ty,
        Type::Path(path)
            if path.qself.is_none()
                && path.path.segments.last().is_some_and(|segment| {
                    segment.ident == ident && segment.arguments.is_none()
                })
    )
}

pub fn reject_generics(generics: &Generics) -> darling::Result<()> {
    if generics.params.is_empty() {
        Ok(())
    } else {
        Err(darling::Error::custom("generic types cannot carry static metadata").with_span(generics))
    }
}

///
/// TOKENS
///

pub fn opt_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}
