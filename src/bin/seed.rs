use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    taskboard::init_tracing("taskboard=info,seed=info");

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations").run(&db).await?;

    if taskboard::seed::load_demo(&db, OffsetDateTime::now_utc()).await? {
        tracing::info!("sample data created");
    }
    Ok(())
}
