//! Pool construction from configuration. No database is contacted.

use medialib_catalog::{CatalogError, connect};
use medialib_sql::{DbConfig, EmptyInsertPolicy, NOOP_SQL, SqlError, Statement};

#[test]
fn connect_installs_defaults_and_checks_the_url() {
    let bad = DbConfig::new("postgres://media@localhost:notaport/media");
    let err = connect(&bad).unwrap_err();
    assert!(matches!(err, CatalogError::Sql(SqlError::Connection(_))));

    let config = DbConfig::new("postgres://media@localhost/media")
        .max_pool_size(2)
        .search_path("media_center,public")
        .empty_insert(EmptyInsertPolicy::Noop);
    let pool = connect(&config).unwrap();
    assert_eq!(pool.status().max_size, 2);

    let sql = Statement::new("relation_video_tag")
        .unwrap()
        .insert(["video_id", "tag_id"])
        .render()
        .unwrap();
    assert_eq!(sql, NOOP_SQL);
}
