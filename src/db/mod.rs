mod categories;
mod images;
mod posts;
pub mod reactions;
mod sessions;
mod users;

use sqlx::PgPool;

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Postgres for the `db` tests, taken from `DATABASE_URL`.
/// Tests return early when it is unset.
#[cfg(test)]
pub(crate) async fn test_database() -> Option<Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(Database::new(pool))
}

#[cfg(test)]
impl Database {
    /// A fresh user with one thread; returns (user id, thread id)
    pub(crate) async fn seed_thread(&self, tag: &str) -> (uuid::Uuid, i64) {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let user = self
            .create_user(&format!("{}@example.com", suffix), &suffix[..20], "hash")
            .await
            .expect("create user");
        let thread = self
            .create_thread(user.id, &user.username, tag, "content", &[tag.to_string()])
            .await
            .expect("create thread");
        (user.id, thread.id)
    }
}
