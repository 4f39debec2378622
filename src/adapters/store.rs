use crate::domain::model::Keyed;
use crate::domain::ports::Repository;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local repository keeping entities in insertion order.
///
/// Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Keyed + Clone + Send + Sync,
{
    async fn find_by_key(&self, key: &str) -> Result<Option<T>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.key() == Some(key)).cloned())
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        Ok(self.items.read().await.clone())
    }

    async fn save(&self, item: T) -> Result<T> {
        let item = match item.key() {
            Some(_) => item,
            None => item.with_key(Uuid::new_v4().to_string()),
        };

        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(item)
    }

    async fn delete_by_key(&self, key: &str) -> Result<()> {
        self.items.write().await.retain(|item| item.key() != Some(key));
        Ok(())
    }
}
