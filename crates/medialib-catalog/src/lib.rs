//! # medialib-catalog
//!
//! Tag and video data access for the media library, built on `medialib-sql`.
//!
//! Reads take any `GenericClient` (a pooled client, a plain client or a
//! transaction). Writes spanning several tables take the pool and run in one
//! transaction.
//!
//! ```ignore
//! use medialib_catalog::{VideoFilter, connect, query_videos};
//! use medialib_sql::DbConfig;
//!
//! let pool = connect(&DbConfig::from_env()?)?;
//! let client = pool.get().await?;
//! let page = query_videos(&client, &VideoFilter {
//!     tag_ids: vec![2, 5],
//!     limit: Some(20),
//!     ..VideoFilter::default()
//! })
//! .await?;
//! println!("{} of {}", page.rows.len(), page.total);
//! ```

pub mod error;
pub mod model;
pub mod tags;
pub mod videos;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CatalogError, CatalogResult};
pub use model::{NewVideo, Tag, TagFilter, Video, VideoFilter, VideoPage, VideoTag, media_url};
pub use tags::{delete_tag, list_tags, query_tags, save_tag, tag_name_taken};
pub use videos::{
    add_video, delete_video, get_video, query_videos, update_video, video_path_taken,
};

use deadpool_postgres::Pool;
use medialib_sql::{DbConfig, create_pool_with_config};

/// Build the connection pool and make `config` the statement defaults.
pub fn connect(config: &DbConfig) -> CatalogResult<Pool> {
    config.install_statement_defaults();
    let pool = create_pool_with_config(config)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        target: "medialib.catalog",
        max_pool_size = config.max_pool_size,
        empty_insert = ?config.empty_insert,
        "catalog pool created"
    );
    Ok(pool)
}

/// [`connect`] with the configuration read from the environment.
pub fn connect_from_env() -> CatalogResult<Pool> {
    connect(&DbConfig::from_env()?)
}
