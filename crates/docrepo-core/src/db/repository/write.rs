use crate::{
    db::repository::{ReadRepository, from_document, key_filter, to_document},
    error::Error,
    query::{Document, Filter, QueryError, UpdateDocument},
    sanitize::Sanitize,
    store::{FindAndModifyOptions, ReturnDocument},
    traits::Entity,
};
use async_trait::async_trait;

///
/// ReplaceOptions
///
/// Options for version-checked replacement; upsert is off by default.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReplaceOptions {
    pub upsert: bool,
}

///
/// WriteRepository
///
/// Mutations through the write handle. The first write in a namespace
/// provisions its indexes.
///

#[async_trait]
pub trait WriteRepository: ReadRepository {
    /// Insert `entity` after trimming its text fields.
    async fn add(&self, mut entity: Self::Entity) -> Result<Self::Entity, Error> {
        entity.sanitize();
        let doc = to_document(&entity)?;
        let accessor = self.accessor();

        accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                handle.insert_one(doc).await.map_err(Error::from)
            })
            .await?;

        Ok(entity)
    }

    async fn add_range(&self, mut entities: Vec<Self::Entity>) -> Result<Vec<Self::Entity>, Error> {
        entities.sanitize();
        let docs = entities
            .iter()
            .map(to_document)
            .collect::<Result<Vec<_>, _>>()?;
        let accessor = self.accessor();

        accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                handle.insert_many(docs).await.map_err(Error::from)
            })
            .await?;

        Ok(entities)
    }

    /// Replace by key, inserting when absent.
    async fn update(&self, mut entity: Self::Entity) -> Result<Self::Entity, Error> {
        entity.sanitize();
        let filter = key_filter(self.descriptor(), &entity.key())?;
        let doc = to_document(&entity)?;
        let accessor = self.accessor();

        accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                handle
                    .replace_one(&filter, doc, true)
                    .await
                    .map_err(Error::from)
            })
            .await?;

        Ok(entity)
    }

    /// Remove by key; returns whether anything was removed.
    async fn delete(&self, id: &<Self::Entity as Entity>::Key) -> Result<bool, Error> {
        let filter = key_filter(self.descriptor(), id)?;
        let accessor = self.accessor();

        let removed = accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                handle.delete_one(&filter).await.map_err(Error::from)
            })
            .await?;

        Ok(removed > 0)
    }

    async fn find_and_delete(
        &self,
        id: &<Self::Entity as Entity>::Key,
    ) -> Result<Option<Self::Entity>, Error> {
        let filter = key_filter(self.descriptor(), id)?;
        let accessor = self.accessor();

        let removed = accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                handle.find_one_and_delete(&filter).await.map_err(Error::from)
            })
            .await?;

        removed.map(from_document).transpose()
    }

    /// Optimistic replacement.
    ///
    /// With no `expected_version` this is an unconditional upsert. Otherwise
    /// the stored document is replaced only while `version_field` still
    /// equals `expected_version`; a mismatch writes nothing and reports
    /// `false`. With `options.upsert` the entity is inserted only when no
    /// document with its key exists.
    async fn update_with_version(
        &self,
        mut entity: Self::Entity,
        version_field: &str,
        expected_version: Option<i64>,
        options: ReplaceOptions,
    ) -> Result<(bool, Self::Entity), Error> {
        let Some(expected) = expected_version else {
            return Ok((true, self.update(entity).await?));
        };
        check_fields::<Self::Entity>([version_field])?;

        entity.sanitize();
        let by_key = key_filter(self.descriptor(), &entity.key())?;
        let by_version = by_key.clone().and(Filter::eq(version_field, expected));
        let doc = to_document(&entity)?;
        let accessor = self.accessor();

        let written = accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                let outcome = handle.replace_one(&by_version, doc.clone(), false).await?;
                if outcome.matched > 0 || !options.upsert {
                    return Ok::<_, Error>(outcome.matched > 0);
                }

                // Insert-only: an existing document under the key is left untouched.
                let update = doc
                    .into_iter()
                    .fold(UpdateDocument::new(), |update, (field, value)| {
                        update.set_on_insert(field, value)
                    });
                let existing = handle
                    .find_one_and_update(
                        &by_key,
                        &update,
                        FindAndModifyOptions {
                            upsert: true,
                            return_document: ReturnDocument::Before,
                        },
                    )
                    .await?;

                Ok(existing.is_none())
            })
            .await?;

        Ok((written, entity))
    }

    /// Atomic find-and-replace of the first document matching `filter`.
    async fn upsert(
        &self,
        entity: Self::Entity,
        filter: &Filter,
        options: FindAndModifyOptions,
    ) -> Result<Option<Self::Entity>, Error> {
        let doc = to_document(&entity)?;
        let accessor = self.accessor();

        let found = accessor
            .run(async move {
                let handle = accessor.write_handle().await?;
                handle
                    .find_one_and_replace(filter, doc, options)
                    .await
                    .map_err(Error::from)
            })
            .await?;

        found.map(from_document).transpose()
    }

    /// Find the first match, creating it from `field_values` when missing.
    /// Field values are insert-time defaults and never touch an existing match.
    async fn find_or_create(
        &self,
        filter: &Filter,
        field_values: Document,
        options: FindAndModifyOptions,
    ) -> Result<Option<Self::Entity>, Error> {
        check_fields::<Self::Entity>(field_values.keys().map(String::as_str))?;
        let update = field_values
            .into_iter()
            .fold(UpdateDocument::new(), |update, (field, value)| {
                update.set_on_insert(field, value)
            });

        find_and_modify(self, filter, update, options).await
    }

    /// Assign `field_values` on the first match, creating it when upsert
    /// is enabled.
    async fn find_and_update(
        &self,
        filter: &Filter,
        field_values: Document,
        options: FindAndModifyOptions,
    ) -> Result<Option<Self::Entity>, Error> {
        check_fields::<Self::Entity>(field_values.keys().map(String::as_str))?;
        let update = field_values
            .into_iter()
            .fold(UpdateDocument::new(), |update, (field, value)| {
                update.set(field, value)
            });

        find_and_modify(self, filter, update, options).await
    }
}

async fn find_and_modify<R: WriteRepository + ?Sized>(
    repo: &R,
    filter: &Filter,
    update: UpdateDocument,
    options: FindAndModifyOptions,
) -> Result<Option<R::Entity>, Error> {
    let accessor = repo.accessor();

    let found = accessor
        .run(async move {
            let handle = accessor.write_handle().await?;
            handle
                .find_one_and_update(filter, &update, options)
                .await
                .map_err(Error::from)
        })
        .await?;

    found.map(from_document).transpose()
}

// Each name must start with a declared field; nested paths are accepted
// below any declared field.
fn check_fields<'a, E: Entity>(names: impl IntoIterator<Item = &'a str>) -> Result<(), QueryError> {
    for name in names {
        let head = name.split('.').next().unwrap_or(name);
        if !E::MODEL.has_field(head) {
            return Err(QueryError::UnknownField {
                entity: E::MODEL.type_name,
                field: name.to_string(),
            });
        }
    }

    Ok(())
}
