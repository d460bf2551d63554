//! Category backend port
//!
//! Categories are only consumed to resolve human-readable names to ids.

use async_trait::async_trait;
use resolver_domain::Category;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("Category backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn get_all_categories(&self) -> Result<Vec<Category>, CategoryError>;
}

/// Fixed in-memory category list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryRepository {
    categories: Vec<Category>,
}

impl InMemoryCategoryRepository {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn get_all_categories(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.categories.clone())
    }
}
