//! Tag lookups and edits on `video_tag`.

use crate::error::{CatalogError, CatalogResult};
use crate::model::{Tag, TagFilter};
use medialib_sql::predicate::{eq, in_list, like};
use medialib_sql::{Executable, GenericClient, Record, RowExt, SqlResult, Statement, query};

pub(crate) const TAG_TABLE: &str = "video_tag";

fn tag_select(filter: &TagFilter) -> SqlResult<Statement> {
    let ids = (!filter.id_in.is_empty()).then(|| in_list("id", filter.id_in.iter().copied()));
    Ok(Statement::new(TAG_TABLE)?
        .select(["id", "name"])
        .and(ids)
        .and(like("name", filter.name.as_deref())))
}

fn name_count(name: &str, exclude_id: Option<i32>) -> SqlResult<Statement> {
    let mut stmt = Statement::new(TAG_TABLE)?.count().and(eq("name", name));
    if let Some(id) = exclude_id {
        stmt = stmt.and_fmt("id != %L", &[id.into()])?;
    }
    Ok(stmt)
}

fn validate_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::invalid("tag name must not be empty"));
    }
    Ok(())
}

/// All tags.
pub async fn list_tags(conn: &impl GenericClient) -> CatalogResult<Vec<Tag>> {
    query_tags(conn, &TagFilter::default()).await
}

/// Tags matching `filter`.
pub async fn query_tags(conn: &impl GenericClient, filter: &TagFilter) -> CatalogResult<Vec<Tag>> {
    Ok(tag_select(filter)?.fetch_all_as(conn).await?)
}

/// Whether a tag other than `exclude_id` already uses `name`.
pub async fn tag_name_taken(
    conn: &impl GenericClient,
    name: &str,
    exclude_id: Option<i32>,
) -> CatalogResult<bool> {
    let count: i32 = name_count(name, exclude_id)?
        .fetch_one(conn)
        .await?
        .try_get_column("count")?;
    Ok(count > 0)
}

/// Rename tag `id`, or create a tag when `id` is `None`. Returns the tag id.
///
/// Fails with [`CatalogError::Conflict`] when another tag has the name.
pub async fn save_tag(
    conn: &impl GenericClient,
    id: Option<i32>,
    name: &str,
) -> CatalogResult<i32> {
    validate_name(name)?;
    if tag_name_taken(conn, name, id).await? {
        return Err(CatalogError::conflict(format!("tag name '{name}' already exists")));
    }

    let row = match id {
        Some(id) => query("UPDATE video_tag SET name = $1 WHERE id = $2 RETURNING id")
            .bind(name.to_string())
            .bind(id)
            .fetch_opt(conn)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("tag {id}")))?,
        None => {
            Statement::new(TAG_TABLE)?
                .insert_one(Record::new().set("name", name))
                .fetch_one(conn)
                .await?
        }
    };
    let tag_id: i32 = row.try_get_column("id")?;

    #[cfg(feature = "tracing")]
    tracing::info!(target: "medialib.catalog", tag_id, name, "tag saved");
    Ok(tag_id)
}

/// Delete tag `id`. Returns the number of rows removed.
pub async fn delete_tag(conn: &impl GenericClient, id: i32) -> CatalogResult<u64> {
    let removed = Statement::new(TAG_TABLE)?
        .delete()
        .and(eq("id", id))
        .execute(conn)
        .await?;

    #[cfg(feature = "tracing")]
    tracing::info!(target: "medialib.catalog", tag_id = id, removed, "tag deleted");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingClient;

    #[test]
    fn unfiltered_select() {
        let sql = tag_select(&TagFilter::default()).unwrap().render().unwrap();
        assert_eq!(sql, "SELECT id, name FROM video_tag");
    }

    #[test]
    fn filtered_select() {
        let filter = TagFilter {
            id_in: vec![1, 3],
            name: Some("dra".to_string()),
        };
        let sql = tag_select(&filter).unwrap().render().unwrap();
        assert_eq!(
            sql,
            "SELECT id, name FROM video_tag WHERE id IN ('1','3') AND name LIKE '%dra%'"
        );
    }

    #[test]
    fn name_count_excludes_the_edited_tag() {
        let sql = name_count("it's", Some(4)).unwrap().render().unwrap();
        assert_eq!(
            sql,
            "SELECT count(1)::int AS count FROM video_tag WHERE name = 'it''s' AND id != '4'"
        );

        let sql = name_count("drama", None).unwrap().render().unwrap();
        assert_eq!(
            sql,
            "SELECT count(1)::int AS count FROM video_tag WHERE name = 'drama'"
        );
    }

    #[tokio::test]
    async fn list_tags_runs_one_select() {
        let client = RecordingClient::default();
        let tags = list_tags(&client).await.unwrap();
        assert!(tags.is_empty());
        assert_eq!(client.log(), ["SELECT id, name FROM video_tag"]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_any_sql() {
        let client = RecordingClient::default();
        let err = save_tag(&client, None, "  ").await.unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
        assert!(client.log().is_empty());
    }

    #[tokio::test]
    async fn save_tag_checks_the_name_first() {
        let client = RecordingClient::default();
        // The recording client returns no rows, so the count lookup comes back empty.
        let err = save_tag(&client, Some(2), "drama").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            client.log(),
            ["SELECT count(1)::int AS count FROM video_tag WHERE name = 'drama' AND id != '2'"]
        );
    }

    #[tokio::test]
    async fn delete_tag_by_id() {
        let client = RecordingClient::default();
        assert_eq!(delete_tag(&client, 3).await.unwrap(), 1);
        assert_eq!(client.log(), ["DELETE FROM video_tag WHERE id = '3';"]);
    }
}
