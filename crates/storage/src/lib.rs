use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use travelwise_core::{Notification, NotificationKind, SavedItem, SavedItemKind};

pub trait NotificationRepository: Send + Sync {
    /// Newest first.
    async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>>;
    async fn push_notification(&self, notification: Notification) -> Result<()>;
    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<bool>;
    async fn mark_all_read(&self, user_id: &str) -> Result<u64>;
}

pub trait SavedItemRepository: Send + Sync {
    /// Returns false when the user already saved an item of that kind and name.
    async fn save_item(&self, item: SavedItem) -> Result<bool>;
    async fn list_saved(&self, user_id: &str) -> Result<Vec<SavedItem>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    notifications: Arc<RwLock<HashMap<String, Vec<Notification>>>>,
    saved: Arc<RwLock<HashMap<String, Vec<SavedItem>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationRepository for MemoryStore {
    async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let mut items = self
            .notifications
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn push_notification(&self, notification: Notification) -> Result<()> {
        let mut guard = self.notifications.write();
        let items = guard.entry(notification.user_id.clone()).or_default();
        items.retain(|existing| existing.id != notification.id);
        items.push(notification);
        Ok(())
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<bool> {
        let mut guard = self.notifications.write();
        let Some(item) = guard
            .get_mut(user_id)
            .and_then(|items| items.iter_mut().find(|item| item.id == notification_id))
        else {
            return Ok(false);
        };
        item.unread = false;
        Ok(true)
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let mut updated = 0_u64;
        if let Some(items) = self.notifications.write().get_mut(user_id) {
            for item in items.iter_mut().filter(|item| item.unread) {
                item.unread = false;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

impl SavedItemRepository for MemoryStore {
    async fn save_item(&self, item: SavedItem) -> Result<bool> {
        let mut guard = self.saved.write();
        let items = guard.entry(item.user_id.clone()).or_default();
        let duplicate = items
            .iter()
            .any(|existing| existing.kind == item.kind && existing.name.eq_ignore_ascii_case(&item.name));
        if duplicate {
            return Ok(false);
        }
        items.push(item);
        Ok(true)
    }

    async fn list_saved(&self, user_id: &str) -> Result<Vec<SavedItem>> {
        Ok(self.saved.read().get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // every connection to `:memory:` opens a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
              id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              kind TEXT NOT NULL,
              title TEXT NOT NULL,
              message TEXT NOT NULL,
              created_at TEXT NOT NULL,
              unread INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saved_items (
              user_id TEXT NOT NULL,
              kind TEXT NOT NULL,
              name TEXT NOT NULL COLLATE NOCASE,
              city TEXT NOT NULL,
              saved_at TEXT NOT NULL,
              PRIMARY KEY (user_id, kind, name)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|_| Utc::now())
}

impl NotificationRepository for SqliteStore {
    async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, title, message, created_at, unread
            FROM notifications
            WHERE user_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .filter_map(|row| {
                let kind = NotificationKind::parse(row.get::<String, _>("kind").as_str())?;
                Some(Notification {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    kind,
                    title: row.get("title"),
                    message: row.get("message"),
                    created_at: parse_timestamp(&row.get::<String, _>("created_at")),
                    unread: row.get::<i64, _>("unread") != 0,
                })
            })
            .collect();

        Ok(items)
    }

    async fn push_notification(&self, notification: Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, created_at, unread)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
              title=excluded.title,
              message=excluded.message,
              unread=excluded.unread
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.created_at.to_rfc3339())
        .bind(i64::from(notification.unread))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET unread = 0 WHERE user_id = ?1 AND id = ?2")
            .bind(user_id)
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET unread = 0 WHERE user_id = ?1 AND unread = 1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

impl SavedItemRepository for SqliteStore {
    async fn save_item(&self, item: SavedItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO saved_items (user_id, kind, name, city, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, kind, name) DO NOTHING
            "#,
        )
        .bind(&item.user_id)
        .bind(item.kind.as_str())
        .bind(&item.name)
        .bind(&item.city)
        .bind(item.saved_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_saved(&self, user_id: &str) -> Result<Vec<SavedItem>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, kind, name, city, saved_at
            FROM saved_items
            WHERE user_id = ?1
            ORDER BY saved_at, rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .filter_map(|row| {
                let kind = SavedItemKind::parse(row.get::<String, _>("kind").as_str())?;
                Some(SavedItem {
                    user_id: row.get("user_id"),
                    kind,
                    name: row.get("name"),
                    city: row.get("city"),
                    saved_at: parse_timestamp(&row.get::<String, _>("saved_at")),
                })
            })
            .collect();

        Ok(items)
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl NotificationRepository for Store {
    async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        match self {
            Store::Memory(store) => store.list_notifications(user_id).await,
            Store::Sqlite(store) => store.list_notifications(user_id).await,
        }
    }

    async fn push_notification(&self, notification: Notification) -> Result<()> {
        match self {
            Store::Memory(store) => store.push_notification(notification).await,
            Store::Sqlite(store) => store.push_notification(notification).await,
        }
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<bool> {
        match self {
            Store::Memory(store) => store.mark_read(user_id, notification_id).await,
            Store::Sqlite(store) => store.mark_read(user_id, notification_id).await,
        }
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        match self {
            Store::Memory(store) => store.mark_all_read(user_id).await,
            Store::Sqlite(store) => store.mark_all_read(user_id).await,
        }
    }
}

impl SavedItemRepository for Store {
    async fn save_item(&self, item: SavedItem) -> Result<bool> {
        match self {
            Store::Memory(store) => store.save_item(item).await,
            Store::Sqlite(store) => store.save_item(item).await,
        }
    }

    async fn list_saved(&self, user_id: &str) -> Result<Vec<SavedItem>> {
        match self {
            Store::Memory(store) => store.list_saved(user_id).await,
            Store::Sqlite(store) => store.list_saved(user_id).await,
        }
    }
}
