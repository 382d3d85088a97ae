//! End-to-end persistence against an in-memory SQLite database.

#![cfg(feature = "sqlite")]

use chrono::{NaiveDate, NaiveDateTime};
use schemaless::prelude::*;
use schemaless::EngineExecutor;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Model)]
#[orm(table = "User")]
struct User {
    id: i64,
    #[orm(required)]
    name: String,
    signup_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Model)]
struct Post {
    id: i64,
    #[orm(required, ddl = "int not null")]
    user_id: i64,
    title: String,
    score: f64,
    published: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Model)]
struct Event {
    id: i64,
    name: String,
    attendees: i64,
    start_date: Option<NaiveDateTime>,
}

fn mapper() -> Mapper<SqlStore<SqliteExecutor>> {
    Mapper::new(SqlStore::new(SqliteExecutor::open_in_memory().unwrap()))
}

async fn setup() -> Mapper<SqlStore<SqliteExecutor>> {
    let mapper = mapper();
    mapper.create_table::<User>().await.unwrap();
    mapper.create_table::<Post>().await.unwrap();
    mapper
}

fn user(name: &str) -> User {
    User::from_record(record! { "name" => name }).unwrap()
}

#[tokio::test]
async fn test_persist_assigns_sequential_ids() {
    let mapper = setup().await;

    let mut abdul = user("Abdul");
    let mut brenda = user("Brenda");
    mapper.persist(&mut abdul).await.unwrap();
    mapper.persist(&mut brenda).await.unwrap();

    assert_eq!(abdul.id(), Some(1));
    assert_eq!(brenda.id(), Some(2));
    assert_eq!(mapper.get_count::<User>(&Criteria::new()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_persist_twice_updates_in_place() {
    let mapper = setup().await;

    let mut abdul = user("Abdul");
    mapper.persist(&mut abdul).await.unwrap();
    abdul.set_name("Abdul K.");
    mapper.persist(&mut abdul).await.unwrap();

    let all: Vec<User> = mapper.get(&Criteria::new(), None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name(), "Abdul K.");
    assert_eq!(all[0].id(), abdul.id());
}

#[tokio::test]
async fn test_values_round_trip_through_the_table() {
    let mapper = setup().await;
    let signed_up = NaiveDate::from_ymd_opt(2016, 3, 4)
        .and_then(|d| d.and_hms_opt(10, 20, 30))
        .unwrap();

    let mut abdul = user("O'Brien; DROP TABLE User");
    abdul.set_signup_date(signed_up);
    mapper.persist(&mut abdul).await.unwrap();

    let mut post = Post::from_record(record! {
        "userId" => abdul.id(),
        "title" => "hello",
        "score" => 4.5,
        "published" => true,
    })
    .unwrap();
    mapper.persist(&mut post).await.unwrap();

    let found: User = mapper
        .get_single(&Criteria::new().eq("id", abdul.id()), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, abdul);

    let found: Post = mapper
        .get_single(&Criteria::new().eq("title", "hello"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, post);
}

#[tokio::test]
async fn test_get_orders_and_limits() {
    let mapper = setup().await;
    for name in ["Carla", "Abdul", "Brenda"] {
        mapper.persist(&mut user(name)).await.unwrap();
    }

    let by_id: Vec<User> = mapper.get(&Criteria::new(), None).await.unwrap();
    let names: Vec<&str> = by_id.iter().map(|u| u.name().as_str()).collect();
    assert_eq!(names, ["Carla", "Abdul", "Brenda"]);

    let order = OrderBy::desc(User::COL_NAME);
    let top: Vec<User> = mapper
        .get_limited(&Criteria::new(), Some(&order), 2)
        .await
        .unwrap();
    let names: Vec<&str> = top.iter().map(|u| u.name().as_str()).collect();
    assert_eq!(names, ["Carla", "Brenda"]);

    let none: Option<User> = mapper
        .get_single(&Criteria::new().eq("name", "Nobody"), None)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_get_associated_loads_owner() {
    let mapper = setup().await;
    let mut abdul = user("Abdul");
    mapper.persist(&mut abdul).await.unwrap();

    let mut post = Post::from_record(record! { "userId" => abdul.id(), "title" => "hi" }).unwrap();
    mapper.persist(&mut post).await.unwrap();

    let owner: Option<User> = mapper.get_associated(&post).await.unwrap();
    assert_eq!(owner, Some(abdul));

    post.set_user_id(999);
    let owner: Option<User> = mapper.get_associated(&post).await.unwrap();
    assert_eq!(owner, None);
}

#[tokio::test]
async fn test_delete_by_model_id_and_criteria() {
    let mapper = setup().await;
    let mut users: Vec<User> = ["Abdul", "Brenda", "Carla", "Dmitri"]
        .into_iter()
        .map(user)
        .collect();
    for u in &mut users {
        mapper.persist(u).await.unwrap();
    }

    mapper.delete_model(&users[0]).await.unwrap();
    mapper.delete_by_id::<User>(users[1].id()).await.unwrap();
    mapper
        .delete::<User>(&Criteria::new().eq("name", "Carla"))
        .await
        .unwrap();

    let left: Vec<User> = mapper.get(&Criteria::new(), None).await.unwrap();
    assert_eq!(left, [users[3].clone()]);

    mapper.delete::<User>(&Criteria::new()).await.unwrap();
    assert_eq!(mapper.get_count::<User>(&Criteria::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_required_columns_are_enforced_by_the_table() {
    let mapper = setup().await;
    let err = mapper
        .store()
        .save("Post", "id", &record! { "title" => "orphan" })
        .await
        .unwrap_err();
    assert!(err.is_execution());
}

#[tokio::test]
async fn test_missing_table_is_an_execution_error() {
    let mapper = mapper();
    let err = mapper.get::<User>(&Criteria::new(), None).await.unwrap_err();
    assert!(err.is_execution());
}

#[tokio::test]
async fn test_connect_from_config() {
    let config = StoreConfig::from_pairs([("dbengine", "sqlite")]).unwrap();
    let store = SqlStore::connect(&config).unwrap();
    assert!(matches!(store.executor(), EngineExecutor::Sqlite(_)));

    let mapper = Mapper::new(store.with_timeout(Duration::from_secs(5)));
    mapper.create_table::<User>().await.unwrap();
    let mut abdul = user("Abdul");
    mapper.persist(&mut abdul).await.unwrap();
    assert_eq!(abdul.id(), Some(1));
}

#[test]
fn test_unsupported_engine_is_rejected() {
    let config = StoreConfig::from_pairs([("dbengine", "mysql")]).unwrap();
    let err = SqlStore::connect(&config).unwrap_err();
    assert!(matches!(err, OrmError::UnsupportedEngine(_)));
}

#[tokio::test]
async fn test_null_columns_read_as_defaults() {
    let mapper = mapper();
    mapper.create_table::<Event>().await.unwrap();

    // "null" is written as the SQL keyword, not as text.
    let mut event = Event::from_record(record! { "name" => "null" }).unwrap();
    mapper.persist(&mut event).await.unwrap();
    mapper
        .store()
        .execute("INSERT INTO `Event` (`name`, `attendees`) VALUES ('party', NULL)")
        .await
        .unwrap();

    let events: Vec<Event> = mapper.get(&Criteria::new(), None).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name(), "");
    assert_eq!(events[0].id(), event.id());
    assert_eq!(events[1].name(), "party");
    assert_eq!(*events[1].attendees(), 0);
    assert_eq!(*events[1].start_date(), None);
}

#[tokio::test]
async fn test_dates_keep_sub_second_precision() {
    let mapper = mapper();
    mapper.create_table::<Event>().await.unwrap();
    let starts = NaiveDate::from_ymd_opt(2020, 1, 2)
        .and_then(|d| d.and_hms_milli_opt(3, 4, 5, 678))
        .unwrap();

    let mut event = Event::default();
    event.set_name("launch").set_start_date(starts);
    mapper.persist(&mut event).await.unwrap();

    let found: Event = mapper
        .get_single(&Criteria::new().eq("id", event.id()), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*found.start_date(), Some(starts));
    assert_eq!(found, event);
}
