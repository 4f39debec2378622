pub mod movie_info_service;
pub mod movies_service;
pub mod review_service;
