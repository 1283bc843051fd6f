pub mod bar_repository;
pub mod signal_repository;

pub type RepositoryResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
