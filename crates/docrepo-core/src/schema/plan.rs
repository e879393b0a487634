use crate::{
    schema::EntityDescriptor,
    store::{Collation, DocumentCollection, IndexRequest, StoreError},
};
use std::{collections::HashSet, time::Duration};

///
/// plan_indexes
/// One request per index group, then the expiry index, then one
/// 2dsphere index per geospatial field.
///

#[must_use]
pub fn plan_indexes(descriptor: &EntityDescriptor) -> Vec<IndexRequest> {
    let mut requests = Vec::with_capacity(
        descriptor.indexes.len()
            + usize::from(descriptor.expiry_field.is_some())
            + descriptor.geo_fields.len(),
    );

    for group in descriptor.indexes.values() {
        let mut request = IndexRequest::ascending(group.name.clone(), group.fields.iter().cloned());
        request.unique = group.unique;
        request.collation = group.case_insensitive.then(Collation::case_insensitive);
        request.partial_filter.clone_from(&group.partial_filter);
        requests.push(request);
    }

    if let Some(field) = &descriptor.expiry_field {
        let mut request = IndexRequest::ascending(format!("{field}_1"), [field.clone()]);
        request.expire_after = Some(Duration::ZERO);
        requests.push(request);
    }

    for (name, field) in &descriptor.geo_fields {
        requests.push(IndexRequest::sphere_2d(name.clone(), field.clone()));
    }

    requests
}

///
/// submit_indexes
/// Create every request whose name does not already exist on the collection.
/// Returns the number of indexes created.
///

pub async fn submit_indexes(
    collection: &dyn DocumentCollection,
    requests: Vec<IndexRequest>,
) -> Result<usize, StoreError> {
    let namespace = collection.namespace().full_name();
    let existing: HashSet<String> = collection.list_index_names().await?.into_iter().collect();
    let mut created = 0;

    for request in requests {
        if existing.contains(&request.name) {
            tracing::debug!(namespace = %namespace, index = %request.name, "index exists, skipping");
            continue;
        }

        collection.create_index(&request).await?;
        tracing::info!(
            namespace = %namespace,
            index = %request.name,
            fields = ?request.fields(),
            unique = request.unique,
            "index created"
        );
        created += 1;
    }

    Ok(created)
}
