//! Compile-only checks for the pooled execution API.
//!
//! Nothing here touches a database; the functions only have to type-check.

#![allow(dead_code)]
#![cfg(feature = "pool")]

use medialib_sql::{
    Executable, FromRow, GenericClient, IsolationLevel, Record, RowExt, SqlResult, Statement,
    TransactionOptions, query, run_transaction, run_transaction_with,
};

struct Tag {
    id: i32,
    name: String,
}

impl FromRow for Tag {
    fn from_row(row: &tokio_postgres::Row) -> SqlResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            name: row.try_get_column("name")?,
        })
    }
}

fn assert_send<T: Send>(_: &T) {}

async fn _list_tags(conn: &impl GenericClient) -> SqlResult<Vec<Tag>> {
    Statement::new("video_tag")?
        .select(["id", "name"])
        .fetch_all_as::<Tag>(conn)
        .await
}

async fn _rename(conn: &impl GenericClient, id: i32, name: String) -> SqlResult<i32> {
    let row = query("UPDATE video_tag SET name = $1 WHERE id = $2 RETURNING id")
        .bind(name)
        .bind(id)
        .fetch_one(conn)
        .await?;
    row.try_get_column("id")
}

async fn _insert_in_transaction(pool: &deadpool_postgres::Pool, title: String) -> SqlResult<i32> {
    run_transaction(pool, move |tx| {
        Box::pin(async move {
            let row = Statement::new("video")?
                .insert_one(Record::new().set("title", title))
                .fetch_one(tx)
                .await?;
            row.try_get_column("id")
        })
    })
    .await
}

fn _transaction_future_is_send(pool: &deadpool_postgres::Pool) {
    let fut = _insert_in_transaction(pool, "Heat".to_string());
    assert_send(&fut);

    let opts = TransactionOptions::new()
        .isolation(IsolationLevel::RepeatableRead)
        .read_only(true);
    let fut = run_transaction_with(pool, opts, |tx| {
        Box::pin(async move { _list_tags(tx).await })
    });
    assert_send(&fut);
}

async fn _macro_on_pool(pool: &deadpool_postgres::Pool) -> SqlResult<u64> {
    medialib_sql::transaction!(pool, tx, {
        Statement::new("relation_video_tag")?
            .delete()
            .and("video_id = '1'")
            .execute(tx)
            .await
    })
}

async fn _plain_client(client: &tokio_postgres::Client) -> SqlResult<Vec<Tag>> {
    _list_tags(client).await
}

async fn _pooled_client(pool: &deadpool_postgres::Pool) -> SqlResult<Vec<Tag>> {
    let client = pool.get().await?;
    _list_tags(&client).await
}
