use crate::core::client::DownstreamClient;
use crate::domain::model::{MovieInfo, Review};
use crate::domain::ports::{Lookup, StreamSource};
use crate::utils::error::RemoteError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Primary lookup: `GET {movie_info_url}/{id}` and its NDJSON stream.
#[derive(Debug, Clone)]
pub struct MovieInfoClient {
    inner: DownstreamClient,
}

impl MovieInfoClient {
    pub fn new(inner: DownstreamClient) -> Self {
        Self { inner }
    }

    pub async fn retrieve_movie_info(&self, movie_id: &str) -> Result<MovieInfo, RemoteError> {
        let url = self.inner.endpoint(Some(movie_id), &[]);
        self.inner.invoke(url, movie_id).await
    }

    pub fn retrieve_movie_info_stream(&self) -> BoxStream<'static, Result<MovieInfo, RemoteError>> {
        self.inner.invoke_stream(self.inner.endpoint(Some("stream"), &[]))
    }
}

#[async_trait]
impl Lookup for MovieInfoClient {
    type Output = MovieInfo;

    async fn lookup(&self, key: &str) -> Result<MovieInfo, RemoteError> {
        self.retrieve_movie_info(key).await
    }
}

impl StreamSource for MovieInfoClient {
    type Item = MovieInfo;

    fn stream(&self) -> BoxStream<'static, Result<MovieInfo, RemoteError>> {
        self.retrieve_movie_info_stream()
    }
}

/// Related-items lookup: `GET {reviews_url}?movieInfoId={id}`.
#[derive(Debug, Clone)]
pub struct ReviewsClient {
    inner: DownstreamClient,
}

impl ReviewsClient {
    pub fn new(inner: DownstreamClient) -> Self {
        Self { inner }
    }

    pub async fn retrieve_reviews(&self, movie_info_id: &str) -> Result<Vec<Review>, RemoteError> {
        let url = self.inner.endpoint(None, &[("movieInfoId", movie_info_id)]);
        self.inner.invoke(url, movie_info_id).await
    }
}

#[async_trait]
impl Lookup for ReviewsClient {
    type Output = Vec<Review>;

    async fn lookup(&self, key: &str) -> Result<Vec<Review>, RemoteError> {
        self.retrieve_reviews(key).await
    }
}
