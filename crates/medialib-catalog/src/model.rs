//! Catalog records and the filters used to look them up.

use crate::error::{CatalogError, CatalogResult};
use medialib_sql::{FromRow, Record, Row, RowExt, SqlResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Earliest release year accepted for a video.
pub const MIN_RELEASE_YEAR: i32 = 1900;
/// Latest release year accepted for a video.
pub const MAX_RELEASE_YEAR: i32 = 2099;

/// A row of `video_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

impl FromRow for Tag {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            name: row.try_get_column("name")?,
        })
    }
}

/// A row of `video` together with its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i32,
    pub title: String,
    pub release_date: Option<i32>,
    pub cover_img: Option<String>,
    /// Directory name under the media root.
    pub path: String,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Video {
    /// Public URL of the cover image, if the video has one.
    pub fn cover_url(&self, base: &str) -> Option<String> {
        self.cover_img
            .as_deref()
            .map(|cover| media_url(base, &[&self.path, cover]))
    }
}

/// Selected as `releaseDate` / `coverImg`; tags are attached afterwards.
impl FromRow for Video {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            release_date: row.try_get_column("releaseDate")?,
            cover_img: row.try_get_column("coverImg")?,
            path: row.try_get_column("path")?,
            content: row.try_get_column("content")?,
            tags: Vec::new(),
        })
    }
}

/// A row of `relation_video_tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTag {
    pub video_id: i32,
    pub tag_id: i32,
}

impl FromRow for VideoTag {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(Self {
            video_id: row.try_get_column("video_id")?,
            tag_id: row.try_get_column("tag_id")?,
        })
    }
}

/// Fields for creating or replacing a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    pub release_date: i32,
    pub cover_img: String,
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
}

impl NewVideo {
    pub fn validate(&self) -> CatalogResult<()> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::invalid("title must not be empty"));
        }
        if self.path.trim().is_empty() {
            return Err(CatalogError::invalid("path must not be empty"));
        }
        if !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&self.release_date) {
            return Err(CatalogError::invalid(format!(
                "release year {} is outside {MIN_RELEASE_YEAR}..={MAX_RELEASE_YEAR}",
                self.release_date
            )));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.tags.iter().find(|id| !seen.insert(**id)) {
            return Err(CatalogError::invalid(format!("tag {dup} is listed twice")));
        }
        Ok(())
    }

    /// Column values of the `video` row. A missing `content` renders as no column.
    pub fn to_record(&self) -> SqlResult<Record> {
        Record::from_json(json!({
            "title": self.title,
            "release_year": self.release_date,
            "cover_img": self.cover_img,
            "path": self.path,
            "content": self.content,
        }))
    }
}

/// Lookup options for [`crate::tags::query_tags`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagFilter {
    /// Only these ids. Empty means no id filter.
    pub id_in: Vec<i32>,
    /// Substring of the name.
    pub name: Option<String>,
}

/// Lookup options for [`crate::videos::query_videos`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoFilter {
    pub ids: Vec<i32>,
    /// Videos carrying at least one of these tags.
    pub tag_ids: Vec<i32>,
    pub title: Option<String>,
    pub release_year: Option<i32>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// One page of videos and the number of matches across all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoPage {
    pub rows: Vec<Video>,
    pub total: i32,
}

/// Join `base` and `parts` with `/`, without doubling separators.
pub fn media_url(base: &str, parts: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(part);
    }
    url
}
