use crate::core::broadcast::{ReplayChannel, SubscriptionError};
use crate::domain::model::Review;
use crate::domain::ports::Repository;
use crate::utils::error::Result;
use futures::stream::BoxStream;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReviewService {
    repository: Arc<dyn Repository<Review>>,
    sink: ReplayChannel<Review>,
}

impl ReviewService {
    pub fn new(repository: Arc<dyn Repository<Review>>, sink: ReplayChannel<Review>) -> Self {
        Self { repository, sink }
    }

    pub async fn add_review(&self, review: Review) -> Result<Review> {
        review.validate()?;
        let saved = self.repository.save(review).await?;
        self.sink.publish(saved.clone());
        Ok(saved)
    }

    /// All reviews, or only those of one movie when `movie_info_id` is set.
    pub async fn get_reviews(&self, movie_info_id: Option<&str>) -> Result<Vec<Review>> {
        let all = self.repository.find_all().await?;
        Ok(match movie_info_id {
            Some(id) => all
                .into_iter()
                .filter(|r| r.movie_info_id.as_deref() == Some(id))
                .collect(),
            None => all,
        })
    }

    pub async fn update_review(&self, updated: Review, id: &str) -> Result<Option<Review>> {
        let Some(mut existing) = self.repository.find_by_key(id).await? else {
            return Ok(None);
        };
        existing.comment = updated.comment;
        existing.rating = updated.rating;
        self.repository.save(existing).await.map(Some)
    }

    pub async fn delete_review(&self, id: &str) -> Result<()> {
        if self.repository.find_by_key(id).await?.is_some() {
            self.repository.delete_by_key(id).await?;
        }
        Ok(())
    }

    pub fn stream(&self) -> BoxStream<'static, std::result::Result<Review, SubscriptionError>> {
        self.sink.subscribe().into_stream()
    }
}
