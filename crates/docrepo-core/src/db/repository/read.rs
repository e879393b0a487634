use crate::{
    db::{
        StorageAccessor,
        repository::{
            PageInfo, PaginatedResult, from_document, key_filter, key_value, page::page_window,
        },
    },
    error::Error,
    query::{Filter, QueryError, Sort, SortDirection},
    schema::EntityDescriptor,
    store::FindQuery,
    traits::Entity,
};
use async_trait::async_trait;

///
/// ReadRepository
///
/// Non-mutating queries, always served by the read handle. Implementors
/// supply the accessor; every query has a default body built on it.
///

#[async_trait]
pub trait ReadRepository: Send + Sync {
    type Entity: Entity;

    fn accessor(&self) -> &StorageAccessor<Self::Entity>;

    fn descriptor(&self) -> &EntityDescriptor {
        self.accessor().descriptor()
    }

    async fn get(
        &self,
        id: &<Self::Entity as Entity>::Key,
    ) -> Result<Option<Self::Entity>, Error> {
        let filter = key_filter(self.descriptor(), id)?;

        self.find_one(&filter).await
    }

    /// Every entity whose key is in `ids`, ordered by key.
    async fn get_many(
        &self,
        ids: &[<Self::Entity as Entity>::Key],
    ) -> Result<Vec<Self::Entity>, Error> {
        let keys = ids.iter().map(key_value).collect::<Result<Vec<_>, _>>()?;
        let filter = Filter::In(self.descriptor().key_field.to_string(), keys);

        self.get_all(&filter, None, None, None).await
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Self::Entity>, Error> {
        let accessor = self.accessor();
        let found = accessor.run(accessor.read_handle().find_one(filter)).await?;

        found.map(from_document).transpose()
    }

    async fn find_one_text(&self, filter: &str) -> Result<Option<Self::Entity>, Error> {
        let filter = parse_filter(filter)?;

        self.find_one(&filter).await
    }

    /// Matching entities, sorted by key unless `sort` says otherwise.
    /// Paging applies only when both `page` and `page_size` are given.
    async fn get_all(
        &self,
        filter: &Filter,
        sort: Option<&Sort>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Vec<Self::Entity>, Error> {
        let accessor = self.accessor();
        let sort = match sort {
            Some(sort) if !sort.is_empty() => sort.clone(),
            _ => Sort::ascending(self.descriptor().key_field),
        };

        let mut query = FindQuery::new(filter.clone()).sort(sort);
        if let Some((skip, limit)) = page_window(page, page_size) {
            query = query.skip(skip).limit(limit);
        }

        let docs = accessor.run(accessor.read_handle().find(query)).await?;

        docs.into_iter().map(from_document).collect()
    }

    async fn get_all_text(
        &self,
        filter: &str,
        sort: Option<&str>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Vec<Self::Entity>, Error> {
        let filter = parse_filter(filter)?;
        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => Some(Sort::parse(text)?),
            None => None,
        };

        self.get_all(&filter, sort.as_ref(), page, page_size).await
    }

    /// One page of results plus the total count of matches.
    ///
    /// `sort_by` names a field case-insensitively; absent, `"null"` and
    /// `"undefined"` all mean the key field.
    async fn get_paginated(
        &self,
        filter: &Filter,
        page: Option<i64>,
        page_size: Option<i64>,
        sort_by: Option<&str>,
        descending: bool,
    ) -> Result<PaginatedResult<Self::Entity>, Error> {
        let sort_field = resolve_sort_field::<Self::Entity>(self.descriptor(), sort_by)?;
        let sort = Sort::default().then(sort_field, SortDirection::from_descending(descending));

        let items = self.get_all(filter, Some(&sort), page, page_size).await?;
        let total_count = self.count(filter).await?;

        Ok(PaginatedResult {
            items,
            page_info: PageInfo {
                page_number: page,
                page_size,
                total_count,
                sort_by: sort_field.to_string(),
                descending,
            },
        })
    }

    async fn count(&self, filter: &Filter) -> Result<u64, Error> {
        let accessor = self.accessor();

        accessor.run(accessor.read_handle().count(filter)).await
    }

    async fn count_text(&self, filter: &str) -> Result<u64, Error> {
        let filter = parse_filter(filter)?;

        self.count(&filter).await
    }
}

// Blank text means match-all.
fn parse_filter(text: &str) -> Result<Filter, QueryError> {
    if text.trim().is_empty() {
        Ok(Filter::All)
    } else {
        Filter::parse(text)
    }
}

fn resolve_sort_field<E: Entity>(
    descriptor: &EntityDescriptor,
    sort_by: Option<&str>,
) -> Result<&'static str, QueryError> {
    match sort_by.map(str::trim) {
        None | Some("" | "null" | "undefined") => Ok(descriptor.key_field),
        Some(name) => E::MODEL
            .find_field(name)
            .ok_or_else(|| QueryError::UnknownField {
                entity: E::MODEL.type_name,
                field: name.to_string(),
            }),
    }
}
