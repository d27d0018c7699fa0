//! Video search and edits over `video` and `relation_video_tag`.
//!
//! Writes that touch both tables run in one pooled transaction.

use crate::error::{CatalogError, CatalogResult};
use crate::model::{NewVideo, Tag, TagFilter, Video, VideoFilter, VideoPage, VideoTag};
use crate::tags::query_tags;
use medialib_sql::predicate::{self, eq, in_list, like};
use medialib_sql::{
    Column, ConnectionPool, EmptyInsertPolicy, Executable, GenericClient, Predicate, RowExt,
    SqlError, SqlResult, Statement, run_transaction, sql_row,
};
use std::collections::HashMap;

const VIDEO_TABLE: &str = "video";
const RELATION_TABLE: &str = "relation_video_tag";

/// WHERE fragments shared by the page query and its count. Unset filters are absent.
fn video_conditions(filter: &VideoFilter) -> SqlResult<Vec<Predicate>> {
    let by_tag = if filter.tag_ids.is_empty() {
        Predicate::Absent
    } else {
        let related = Statement::new((RELATION_TABLE, "r"))?
            .select(["r.id"])
            .and("r.video_id = v.id")
            .and(in_list("r.tag_id", filter.tag_ids.iter().copied()));
        predicate::exists(&related)?
    };
    let by_id = if filter.ids.is_empty() {
        Predicate::Absent
    } else {
        in_list("v.id", filter.ids.iter().copied())
    };

    Ok(vec![
        like("v.title", filter.title.as_deref()),
        eq("v.release_year", filter.release_year),
        by_tag,
        by_id,
    ])
}

fn video_select(conditions: &[Predicate], filter: &VideoFilter) -> SqlResult<Statement> {
    Ok(Statement::new((VIDEO_TABLE, "v"))?
        .select([
            Column::new("v.id"),
            Column::new("v.title"),
            Column::aliased("v.release_year", "releaseDate"),
            Column::aliased("v.cover_img", "coverImg"),
            Column::new("v.path"),
            Column::new("v.content"),
        ])
        .and_all(conditions)
        .offset_opt(filter.offset)
        .limit_opt(filter.limit))
}

fn video_count(conditions: &[Predicate]) -> SqlResult<Statement> {
    Ok(Statement::new((VIDEO_TABLE, "v"))?
        .count()
        .and_all(conditions))
}

fn relation_insert(video_id: i32, tag_ids: &[i32]) -> SqlResult<Statement> {
    Ok(Statement::new(RELATION_TABLE)?
        .insert(["video_id", "tag_id"])
        .values(tag_ids.iter().map(|tag_id| sql_row![video_id, *tag_id]))
        .on_empty_insert(EmptyInsertPolicy::Noop))
}

fn relation_delete(video_id: i32) -> SqlResult<Statement> {
    Ok(Statement::new(RELATION_TABLE)?
        .delete()
        .and(eq("video_id", video_id)))
}

/// One page of videos matching `filter`, each with its tags.
///
/// An empty first page skips the count query.
pub async fn query_videos(
    conn: &impl GenericClient,
    filter: &VideoFilter,
) -> CatalogResult<VideoPage> {
    let conditions = video_conditions(filter)?;
    let mut videos: Vec<Video> = video_select(&conditions, filter)?
        .fetch_all_as(conn)
        .await?;
    if videos.is_empty() && filter.offset.unwrap_or(0) <= 0 {
        return Ok(VideoPage::default());
    }

    let total: i32 = video_count(&conditions)?
        .fetch_one(conn)
        .await?
        .try_get_column("count")?;
    if videos.is_empty() {
        return Ok(VideoPage {
            rows: videos,
            total,
        });
    }

    let video_ids: Vec<i32> = videos.iter().map(|v| v.id).collect();
    let relations: Vec<VideoTag> = Statement::new(RELATION_TABLE)?
        .select(["tag_id", "video_id"])
        .and(in_list("video_id", video_ids))
        .fetch_all_as(conn)
        .await?;

    if !relations.is_empty() {
        let mut tag_ids: Vec<i32> = relations.iter().map(|r| r.tag_id).collect();
        tag_ids.sort_unstable();
        tag_ids.dedup();
        let tag_filter = TagFilter {
            id_in: tag_ids,
            name: None,
        };
        let tags: HashMap<i32, Tag> = query_tags(conn, &tag_filter)
            .await?
            .into_iter()
            .map(|tag| (tag.id, tag))
            .collect();

        for video in &mut videos {
            // Relations to deleted tags are skipped.
            video.tags = relations
                .iter()
                .filter(|r| r.video_id == video.id)
                .filter_map(|r| tags.get(&r.tag_id).cloned())
                .collect();
        }
    }

    Ok(VideoPage {
        rows: videos,
        total,
    })
}

/// Video `id` with its tags.
pub async fn get_video(conn: &impl GenericClient, id: i32) -> CatalogResult<Video> {
    let filter = VideoFilter {
        ids: vec![id],
        ..VideoFilter::default()
    };
    query_videos(conn, &filter)
        .await?
        .rows
        .into_iter()
        .next()
        .ok_or_else(|| CatalogError::NotFound(format!("video {id}")))
}

/// Whether a video is already stored under directory `path`.
pub async fn video_path_taken(conn: &impl GenericClient, path: &str) -> CatalogResult<bool> {
    let count: i32 = Statement::new(VIDEO_TABLE)?
        .count()
        .and(eq("path", path))
        .fetch_one(conn)
        .await?
        .try_get_column("count")?;
    Ok(count > 0)
}

/// Insert a video and its tag relations. Returns the new video id.
pub async fn add_video<P: ConnectionPool>(pool: &P, video: &NewVideo) -> CatalogResult<i32> {
    video.validate()?;
    let video = video.clone();
    let id = run_transaction(pool, move |tx| {
        Box::pin(async move {
            let id: i32 = Statement::new(VIDEO_TABLE)?
                .insert_one(video.to_record()?)
                .fetch_one(tx)
                .await?
                .try_get_column("id")?;
            relation_insert(id, &video.tags)?.execute(tx).await?;
            Ok(id)
        })
    })
    .await?;

    #[cfg(feature = "tracing")]
    tracing::info!(target: "medialib.catalog", video_id = id, "video added");
    Ok(id)
}

/// Overwrite video `id` and replace its tag relations.
///
/// A `None` content keeps the stored content.
pub async fn update_video<P: ConnectionPool>(
    pool: &P,
    id: i32,
    video: &NewVideo,
) -> CatalogResult<()> {
    video.validate()?;
    let video = video.clone();
    run_transaction(pool, move |tx| {
        Box::pin(async move {
            let updated = Statement::new(VIDEO_TABLE)?
                .update(video.to_record()?)
                .and(eq("id", id))
                .execute(tx)
                .await?;
            if updated == 0 {
                return Err(SqlError::not_found(format!("video {id}")));
            }
            relation_delete(id)?.execute(tx).await?;
            relation_insert(id, &video.tags)?.execute(tx).await?;
            Ok(())
        })
    })
    .await?;

    #[cfg(feature = "tracing")]
    tracing::info!(target: "medialib.catalog", video_id = id, "video updated");
    Ok(())
}

/// Delete video `id` and its tag relations.
pub async fn delete_video<P: ConnectionPool>(pool: &P, id: i32) -> CatalogResult<()> {
    run_transaction(pool, move |tx| {
        Box::pin(async move {
            relation_delete(id)?.execute(tx).await?;
            let removed = Statement::new(VIDEO_TABLE)?
                .delete()
                .and(eq("id", id))
                .execute(tx)
                .await?;
            if removed == 0 {
                return Err(SqlError::not_found(format!("video {id}")));
            }
            Ok(())
        })
    })
    .await?;

    #[cfg(feature = "tracing")]
    tracing::info!(target: "medialib.catalog", video_id = id, "video deleted");
    Ok(())
}

#[cfg(test)]
mod tests;
