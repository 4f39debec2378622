use crate::core::broadcast::{ReplayChannel, SubscriptionError};
use crate::domain::model::MovieInfo;
use crate::domain::ports::Repository;
use crate::utils::error::Result;
use futures::stream::BoxStream;
use std::sync::Arc;

/// CRUD over movie infos; every successful create is broadcast.
#[derive(Clone)]
pub struct MovieInfoService {
    repository: Arc<dyn Repository<MovieInfo>>,
    sink: ReplayChannel<MovieInfo>,
}

impl MovieInfoService {
    pub fn new(repository: Arc<dyn Repository<MovieInfo>>, sink: ReplayChannel<MovieInfo>) -> Self {
        Self { repository, sink }
    }

    pub async fn add_movie_info(&self, movie_info: MovieInfo) -> Result<MovieInfo> {
        movie_info.validate()?;
        let saved = self.repository.save(movie_info).await?;
        tracing::info!(id = saved.movie_info_id.as_deref().unwrap_or_default(), "Movie info saved");
        self.sink.publish(saved.clone());
        Ok(saved)
    }

    pub async fn get_all_movie_infos(&self) -> Result<Vec<MovieInfo>> {
        self.repository.find_all().await
    }

    pub async fn get_movie_infos_by_year(&self, year: i32) -> Result<Vec<MovieInfo>> {
        let all = self.repository.find_all().await?;
        Ok(all.into_iter().filter(|m| m.year == year).collect())
    }

    pub async fn get_movie_info_by_id(&self, id: &str) -> Result<Option<MovieInfo>> {
        self.repository.find_by_key(id).await
    }

    /// Returns `None` when no movie info has this id.
    pub async fn update_movie_info(&self, updated: MovieInfo, id: &str) -> Result<Option<MovieInfo>> {
        let Some(mut existing) = self.repository.find_by_key(id).await? else {
            return Ok(None);
        };
        existing.name = updated.name;
        existing.year = updated.year;
        existing.cast = updated.cast;
        existing.release_date = updated.release_date;
        self.repository.save(existing).await.map(Some)
    }

    pub async fn delete_movie_info(&self, id: &str) -> Result<()> {
        self.repository.delete_by_key(id).await
    }

    pub fn stream(&self) -> BoxStream<'static, std::result::Result<MovieInfo, SubscriptionError>> {
        self.sink.subscribe().into_stream()
    }
}
