use crate::{
    error::ConfigError,
    model::{
        entity::EntityModel,
        field::{FieldModel, ShapeModel},
        index::IndexMarker,
    },
    query::Filter,
    schema::{EntityDescriptor, IndexGroup},
    store::Namespace,
};
use std::collections::BTreeMap;

/// Audit collection used when an entity declares none.
pub const DEFAULT_AUDIT_COLLECTION: &str = "Audit";

///
/// ResolveContext
///
/// Deployment inputs that shape the database name.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ResolveContext<'a> {
    pub prefix: &'a str,
    pub suffix: &'a str,
    pub default_database: Option<&'a str>,
}

///
/// resolve
/// Build the descriptor for `model` under `ctx`.
///
/// Markers are visited class-level first, then fields in declaration
/// order with each field's own markers ahead of its nested fields. When
/// several markers of one group carry a partial filter the last one wins.
///

pub fn resolve(
    model: &'static EntityModel,
    ctx: &ResolveContext<'_>,
) -> Result<EntityDescriptor, ConfigError> {
    let key_field = non_blank(model.key_field)
        .filter(|key| model.has_field(key))
        .ok_or(ConfigError::MissingIdentifier {
            entity: model.type_name,
        })?;

    let base = non_blank(model.database)
        .or_else(|| non_blank(ctx.default_database))
        .unwrap_or(model.type_name);
    let database = format!("{}{base}{}", ctx.prefix, ctx.suffix);
    let collection = non_blank(model.collection).unwrap_or(model.type_name);
    let audit_collection = non_blank(model.audit_collection).unwrap_or(DEFAULT_AUDIT_COLLECTION);

    let mut resolver = Resolver {
        entity: model.type_name,
        indexes: BTreeMap::new(),
        expiry_field: None,
        geo_fields: BTreeMap::new(),
    };

    for class_index in model.indexes {
        let field = class_index.field.trim();
        if field.is_empty() {
            return Err(ConfigError::EmptyIndexPath {
                entity: model.type_name,
                index: class_index.name.to_string(),
            });
        }
        let name = non_blank(Some(class_index.name)).unwrap_or(field);
        resolver.group(name).fields.insert(field.to_string());
    }

    resolver.walk(model.shape, None)?;

    Ok(EntityDescriptor {
        type_name: model.type_name,
        namespace: Namespace::new(database, collection),
        audit_collection: audit_collection.to_string(),
        key_field,
        indexes: resolver.indexes,
        expiry_field: resolver.expiry_field,
        geo_fields: resolver.geo_fields,
    })
}

struct Resolver {
    entity: &'static str,
    indexes: BTreeMap<String, IndexGroup>,
    expiry_field: Option<String>,
    geo_fields: BTreeMap<String, String>,
}

impl Resolver {
    fn group(&mut self, name: &str) -> &mut IndexGroup {
        self.indexes
            .entry(name.to_string())
            .or_insert_with(|| IndexGroup::new(name))
    }

    // `parent` is `None` at the top level; expiry and geo markers count there only.
    fn walk(&mut self, shape: &'static ShapeModel, parent: Option<&str>) -> Result<(), ConfigError> {
        for field in shape.fields {
            let path = match parent {
                Some(parent) => format!("{parent}.{}", field.name),
                None => field.name.to_string(),
            };

            for marker in field.indexes {
                self.merge_marker(&path, marker)?;
            }
            if parent.is_none() {
                self.top_level_markers(field)?;
            }
            if let Some(nested) = field.kind.nested_shape() {
                self.walk(nested, Some(&path))?;
            }
        }

        Ok(())
    }

    fn merge_marker(&mut self, path: &str, marker: &IndexMarker) -> Result<(), ConfigError> {
        let entity = self.entity;
        let name = non_blank(marker.name).unwrap_or(path);
        let partial = match non_blank(marker.partial_filter) {
            Some(text) => Some(Filter::parse(text).map_err(|source| {
                ConfigError::InvalidPartialFilter {
                    entity,
                    index: name.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        let group = self.group(name);
        group.fields.insert(path.to_string());
        group.unique |= marker.unique;
        group.case_insensitive |= marker.case_insensitive;
        // An empty filter covers every document; it is no filter at all.
        if let Some(filter) = partial.filter(|filter| !filter.is_all()) {
            group.partial_filter = Some(filter.to_document());
        }

        Ok(())
    }

    fn top_level_markers(&mut self, field: &FieldModel) -> Result<(), ConfigError> {
        if field.expire {
            if let Some(first) = &self.expiry_field {
                return Err(ConfigError::MultipleExpiryFields {
                    entity: self.entity,
                    first: first.clone(),
                    second: field.name.to_string(),
                });
            }
            self.expiry_field = Some(field.name.to_string());
        }

        if let Some(geo) = field.geo {
            let name = non_blank(geo.name).unwrap_or(field.name);
            self.geo_fields
                .insert(name.to_string(), field.name.to_string());
        }

        Ok(())
    }
}

// Whitespace-only markers count as absent.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
