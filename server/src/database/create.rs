use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: i64 = 1;

/// Open (creating if missing) the database at `url` and bring its schema up
/// to date.
///
/// WAL keeps readers off the writer's back; the busy timeout lets a writer
/// wait for the lock held by a concurrent ledger transaction instead of
/// failing outright.
pub async fn open_database(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;
    Ok(pool)
}

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_schema(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

/// Create all tables for a brand-new database.
async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Balances can never go negative, whatever the caller does.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id         TEXT    PRIMARY KEY,
            name       TEXT    NOT NULL UNIQUE,
            email      TEXT    NOT NULL UNIQUE,
            password   TEXT    NOT NULL,
            coins      INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
            gems       INTEGER NOT NULL DEFAULT 0 CHECK (gems >= 0),
            is_admin   INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_stats (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT    NOT NULL UNIQUE,
            games   INTEGER NOT NULL DEFAULT 0,
            wins    INTEGER NOT NULL DEFAULT 0,
            top5    INTEGER NOT NULL DEFAULT 0,
            kills   INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS store_items (
            id               TEXT    PRIMARY KEY,
            name             TEXT    NOT NULL,
            description      TEXT    NOT NULL DEFAULT '',
            item_type        INTEGER NOT NULL,
            coins_price      INTEGER NOT NULL DEFAULT 0 CHECK (coins_price >= 0),
            gems_price       INTEGER NOT NULL DEFAULT 0 CHECK (gems_price >= 0),
            image_id         TEXT    NOT NULL UNIQUE,
            on_sale          INTEGER NOT NULL DEFAULT 0,
            sale_coins_price INTEGER NOT NULL DEFAULT 0 CHECK (sale_coins_price >= 0),
            sale_gems_price  INTEGER NOT NULL DEFAULT 0 CHECK (sale_gems_price >= 0),
            created_at       INTEGER NOT NULL,
            updated_at       INTEGER NOT NULL,
            UNIQUE(name, item_type)
        )",
    )
    .execute(&mut *tx)
    .await?;

    // Possessions. `equipped` is at most 1 for a given (user, item_type).
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users_store_items (
            user_id       TEXT    NOT NULL,
            store_item_id TEXT    NOT NULL,
            equipped      INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, store_item_id),
            FOREIGN KEY (user_id)       REFERENCES users(id)       ON DELETE CASCADE,
            FOREIGN KEY (store_item_id) REFERENCES store_items(id) ON DELETE CASCADE
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS news (
            id          TEXT    PRIMARY KEY,
            title       TEXT    NOT NULL UNIQUE,
            description TEXT    NOT NULL DEFAULT '',
            image_link  TEXT    NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        )",
    )
    .execute(&mut *tx)
    .await?;

    // --- Indexes --------------------------------------------------------
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_store_items_type     ON store_items(item_type)")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_users_store_items_user ON users_store_items(user_id, equipped)",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_created_at      ON news(created_at)")
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Apply any schema migrations required to reach `SCHEMA_VERSION`.
///
/// Uses `PRAGMA user_version` as the migration counter.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let current_version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Database schema at version {}; target version {}. Running migrations…",
        current_version, SCHEMA_VERSION
    );

    // v0 → v1 is the initial schema created above.
    // Add future migration arms here.

    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await?;

    info!("Schema version set to {}.", SCHEMA_VERSION);
    Ok(())
}
