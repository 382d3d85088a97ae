//! PostgreSQL persistence. Runs only when `DATABASE_URL` is set.

#![cfg(feature = "postgres")]

use schemaless::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Model)]
#[orm(table = "schemaless_pg_account")]
struct Account {
    id: i64,
    #[orm(required, ddl = "varchar(64) not null")]
    owner: String,
    balance: f64,
    active: bool,
}

#[tokio::test]
async fn postgres_crud_roundtrip() -> OrmResult<()> {
    let _ = dotenvy::dotenv();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping postgres_crud_roundtrip");
            return Ok(());
        }
    };

    let pool = create_pool(&database_url)?;
    let mapper = Mapper::new(SqlStore::new(PgExecutor::new(pool)));
    mapper
        .store()
        .execute("DROP TABLE IF EXISTS \"schemaless_pg_account\"")
        .await?;
    mapper.create_table::<Account>().await?;

    let mut alice = Account::from_record(record! {
        "owner" => "alice",
        "balance" => 10.5,
        "active" => true,
    })?;
    mapper.persist(&mut alice).await?;
    assert!(alice.is_persisted());

    let mut bob = Account::from_record(record! { "owner" => "bob" })?;
    mapper.persist(&mut bob).await?;
    assert_eq!(mapper.get_count::<Account>(&Criteria::new()).await?, 2);

    alice.set_balance(20.0);
    mapper.persist(&mut alice).await?;
    let found: Option<Account> = mapper
        .get_single(&Criteria::new().eq(Account::COL_OWNER, "alice"), None)
        .await?;
    assert_eq!(found.as_ref(), Some(&alice));

    let ordered: Vec<Account> = mapper
        .get(&Criteria::new(), Some(&OrderBy::desc(Account::COL_OWNER)))
        .await?;
    let owners: Vec<&str> = ordered.iter().map(|a| a.owner().as_str()).collect();
    assert_eq!(owners, ["bob", "alice"]);

    mapper.delete_model(&bob).await?;
    assert_eq!(mapper.get_count::<Account>(&Criteria::new()).await?, 1);

    mapper
        .store()
        .execute("DROP TABLE \"schemaless_pg_account\"")
        .await?;
    Ok(())
}
