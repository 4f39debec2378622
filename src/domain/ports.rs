use crate::utils::error::{RemoteError, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Persistence collaborator behind the CRUD services.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    async fn find_by_key(&self, key: &str) -> Result<Option<T>>;
    async fn find_all(&self) -> Result<Vec<T>>;
    async fn save(&self, item: T) -> Result<T>;
    async fn delete_by_key(&self, key: &str) -> Result<()>;
}

/// One keyed downstream lookup, already classified and retried.
#[async_trait]
pub trait Lookup: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn lookup(&self, key: &str) -> std::result::Result<Self::Output, RemoteError>;
}

/// A live feed of entities from a downstream stream endpoint.
pub trait StreamSource: Send + Sync {
    type Item: Send + 'static;

    fn stream(&self) -> BoxStream<'static, std::result::Result<Self::Item, RemoteError>>;
}

pub trait ConfigProvider: Send + Sync {
    fn bind_address(&self) -> &str;
    fn movie_info_url(&self) -> &str;
    fn reviews_url(&self) -> &str;
}
