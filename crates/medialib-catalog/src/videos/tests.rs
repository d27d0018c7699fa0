use super::*;
use crate::testing::{RecordingClient, RecordingPool};
use medialib_sql::NOOP_SQL;

const VIDEO_COLUMNS: &str = r#"SELECT v.id, v.title, v.release_year AS "releaseDate", v.cover_img AS "coverImg", v.path, v.content FROM video AS v"#;

fn heat(tags: Vec<i32>) -> NewVideo {
    NewVideo {
        title: "Heat".to_string(),
        release_date: 1995,
        cover_img: "cover.jpg".to_string(),
        path: "abc".to_string(),
        content: None,
        tags,
    }
}

#[test]
fn unfiltered_page() {
    let filter = VideoFilter::default();
    let conditions = video_conditions(&filter).unwrap();
    assert_eq!(
        video_select(&conditions, &filter).unwrap().render().unwrap(),
        VIDEO_COLUMNS
    );
    assert_eq!(
        video_count(&conditions).unwrap().render().unwrap(),
        "SELECT count(1)::int AS count FROM video AS v"
    );
}

#[test]
fn every_filter_is_applied_to_page_and_count() {
    let filter = VideoFilter {
        ids: vec![7],
        tag_ids: vec![2, 5],
        title: Some("he".to_string()),
        release_year: Some(1995),
        offset: Some(0),
        limit: Some(20),
    };
    let conditions = video_conditions(&filter).unwrap();
    let expected_where = "WHERE v.title LIKE '%he%' AND v.release_year = '1995' \
        AND EXISTS(SELECT r.id FROM relation_video_tag AS r WHERE r.video_id = v.id AND r.tag_id IN ('2','5')) \
        AND v.id IN ('7')";

    assert_eq!(
        video_select(&conditions, &filter).unwrap().render().unwrap(),
        format!("{VIDEO_COLUMNS} {expected_where} OFFSET 0 LIMIT 20")
    );
    assert_eq!(
        video_count(&conditions).unwrap().render().unwrap(),
        format!("SELECT count(1)::int AS count FROM video AS v {expected_where}")
    );
}

#[test]
fn blank_title_is_not_a_filter() {
    let filter = VideoFilter {
        title: Some(String::new()),
        ..VideoFilter::default()
    };
    let conditions = video_conditions(&filter).unwrap();
    assert_eq!(
        video_select(&conditions, &filter).unwrap().render().unwrap(),
        VIDEO_COLUMNS
    );
}

#[test]
fn relation_rows() {
    assert_eq!(
        relation_insert(7, &[1, 3]).unwrap().render().unwrap(),
        "INSERT INTO relation_video_tag (video_id,tag_id) VALUES ('7','1'),('7','3') RETURNING video_id,tag_id,id;"
    );
    assert_eq!(relation_insert(7, &[]).unwrap().render().unwrap(), NOOP_SQL);
}

#[tokio::test]
async fn empty_first_page_skips_the_count() {
    let client = RecordingClient::default();
    let page = query_videos(&client, &VideoFilter::default()).await.unwrap();
    assert_eq!(page, VideoPage::default());
    assert_eq!(client.log(), [VIDEO_COLUMNS]);
}

#[tokio::test]
async fn missing_video_is_not_found() {
    let client = RecordingClient::default();
    let err = get_video(&client, 9).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref m) if m == "video 9"));
    assert_eq!(
        client.log(),
        [format!("{VIDEO_COLUMNS} WHERE v.id IN ('9')")]
    );
}

#[tokio::test]
async fn path_lookup() {
    let client = RecordingClient::default();
    // No count row comes back from the recording client.
    assert!(video_path_taken(&client, "abc").await.is_err());
    assert_eq!(
        client.log(),
        ["SELECT count(1)::int AS count FROM video WHERE path = 'abc'"]
    );
}

#[tokio::test]
async fn add_video_rolls_back_without_an_id() {
    let pool = RecordingPool::default();
    let err = add_video(&pool, &heat(vec![1])).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(
        pool.log(),
        [
            "acquire",
            "BEGIN",
            "INSERT INTO video (title,release_year,cover_img,path) VALUES ('Heat','1995','cover.jpg','abc') RETURNING title,release_year,cover_img,path,id;",
            "ROLLBACK",
            "release"
        ]
    );
}

#[tokio::test]
async fn invalid_video_never_opens_a_transaction() {
    let pool = RecordingPool::default();
    let mut video = heat(vec![]);
    video.release_date = 3000;
    let err = add_video(&pool, &video).await.unwrap_err();

    assert!(matches!(err, CatalogError::Invalid(_)));
    assert!(pool.log().is_empty());
}

#[tokio::test]
async fn update_video_replaces_relations() {
    let pool = RecordingPool::default();
    update_video(&pool, 4, &heat(vec![1, 3])).await.unwrap();

    assert_eq!(
        pool.log(),
        [
            "acquire",
            "BEGIN",
            "UPDATE video SET title = 'Heat', release_year = '1995', cover_img = 'cover.jpg', path = 'abc' WHERE id = '4';",
            "DELETE FROM relation_video_tag WHERE video_id = '4';",
            "INSERT INTO relation_video_tag (video_id,tag_id) VALUES ('4','1'),('4','3') RETURNING video_id,tag_id,id;",
            "COMMIT",
            "release"
        ]
    );
}

#[tokio::test]
async fn update_of_missing_video_rolls_back() {
    let pool = RecordingPool::affecting(0);
    let err = update_video(&pool, 4, &heat(vec![1])).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(pool.log()[3], "ROLLBACK");
    assert_eq!(pool.log().len(), 5);
}

#[tokio::test]
async fn delete_video_removes_relations_first() {
    let pool = RecordingPool::default();
    delete_video(&pool, 4).await.unwrap();

    assert_eq!(
        pool.log(),
        [
            "acquire",
            "BEGIN",
            "DELETE FROM relation_video_tag WHERE video_id = '4';",
            "DELETE FROM video WHERE id = '4';",
            "COMMIT",
            "release"
        ]
    );
}

#[tokio::test]
async fn failed_delete_keeps_relations() {
    let pool = RecordingPool::failing_on("DELETE FROM video WHERE");
    let err = delete_video(&pool, 4).await.unwrap_err();

    assert!(matches!(err, CatalogError::Sql(SqlError::Connection(_))));
    assert_eq!(
        pool.log(),
        [
            "acquire",
            "BEGIN",
            "DELETE FROM relation_video_tag WHERE video_id = '4';",
            "DELETE FROM video WHERE id = '4';",
            "ROLLBACK",
            "release"
        ]
    );
}
