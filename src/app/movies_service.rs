use crate::adapters::clients::{MovieInfoClient, ReviewsClient};
use crate::core::orchestrator::Aggregator;
use crate::domain::model::{Movie, MovieInfo};
use crate::utils::error::RemoteError;
use futures::stream::BoxStream;

/// Gateway use cases: one aggregated movie, or the live movie-info feed.
#[derive(Clone)]
pub struct MoviesService {
    aggregator: Aggregator<MovieInfoClient, ReviewsClient>,
}

impl MoviesService {
    pub fn new(movie_info_client: MovieInfoClient, reviews_client: ReviewsClient) -> Self {
        Self {
            aggregator: Aggregator::new(movie_info_client, reviews_client),
        }
    }

    pub async fn retrieve_movie_by_id(&self, movie_id: &str) -> Result<Movie, RemoteError> {
        let result = self.aggregator.assemble(movie_id).await?;
        Ok(Movie {
            movie_info: result.primary,
            review_list: result.related,
        })
    }

    pub fn retrieve_movie_infos(&self) -> BoxStream<'static, Result<MovieInfo, RemoteError>> {
        self.aggregator.stream_primary()
    }
}
