use crate::utils::error::Result;
use crate::utils::validation::Violations;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    #[serde(default)]
    pub movie_info_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(rename = "release_date")]
    pub release_date: NaiveDate,
}

impl MovieInfo {
    pub fn validate(&self) -> Result<()> {
        let mut violations = Violations::new();
        violations
            .check(!self.name.trim().is_empty(), "movieInfo.name is required")
            .check(self.year > 0, "movieInfo.year must be a positive number")
            .check(
                !self.cast.is_empty() && self.cast.iter().all(|c| !c.trim().is_empty()),
                "movieInfo.cast can not be empty",
            );
        violations.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub movie_info_id: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: f64,
}

impl Review {
    pub fn validate(&self) -> Result<()> {
        let mut violations = Violations::new();
        violations
            .check(
                self.movie_info_id.is_some(),
                "rating.movieInfoId : must not be null",
            )
            .check(
                self.rating >= 0.0,
                "rating.negative : please pass a non-negative value",
            );
        violations.into_result()
    }
}

/// The assembled aggregate: a movie's info plus its reviews.
///
/// `review_list` is empty, never absent, when the movie has no reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub movie_info: MovieInfo,
    pub review_list: Vec<Review>,
}

/// Entities that carry their own storage key.
pub trait Keyed {
    fn key(&self) -> Option<&str>;
    fn with_key(self, key: String) -> Self;
}

impl Keyed for MovieInfo {
    fn key(&self) -> Option<&str> {
        self.movie_info_id.as_deref()
    }

    fn with_key(mut self, key: String) -> Self {
        self.movie_info_id = Some(key);
        self
    }
}

impl Keyed for Review {
    fn key(&self) -> Option<&str> {
        self.review_id.as_deref()
    }

    fn with_key(mut self, key: String) -> Self {
        self.review_id = Some(key);
        self
    }
}
