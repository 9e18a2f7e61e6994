use std::sync::Arc;

use crate::api::AuthorId;
use crate::domain::{Book, BookSummary, BookUpdateRequest};
use crate::repository::{BookRepository, RepositoryError};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Inserts the book or overwrites the one stored under `isbn`.
    /// The isbn from the caller wins over the one in the summary.
    /// Returns the stored book and whether it was created by this call
    #[tracing::instrument(skip(self, book_summary))]
    pub async fn create_update(
        &self,
        isbn: &str,
        book_summary: BookSummary,
    ) -> Result<(Book, bool), ServiceError> {
        let normalized = book_summary.with_isbn(isbn.to_string());

        let (book, created) = self
            .repository
            .upsert_book(normalized.to_record())
            .await
            .map_err(|err| match err {
                RepositoryError::AuthorNotFound(author_id) => {
                    ServiceError::InvalidAuthor(author_id)
                }
                other => other.into(),
            })?;

        if created {
            tracing::info!("Created book {}", isbn);
        } else {
            tracing::info!("Updated book {}", isbn);
        }
        Ok((book, created))
    }

    /// Lists all books, or only those of `author_id` when given
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, author_id: Option<AuthorId>) -> Result<Vec<Book>, ServiceError> {
        Ok(self.repository.list_books(author_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, isbn: &str) -> Result<Option<Book>, ServiceError> {
        Ok(self.repository.get_book(isbn).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn partial_update(
        &self,
        isbn: &str,
        patch: BookUpdateRequest,
    ) -> Result<Book, ServiceError> {
        let updated = self
            .repository
            .update_book(isbn, patch)
            .await?
            .ok_or_else(|| ServiceError::BookNotFound(isbn.to_string()))?;
        tracing::info!("Patched book {}", isbn);
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, isbn: &str) -> Result<(), ServiceError> {
        if self.repository.delete_book(isbn).await? {
            tracing::info!("Deleted book {}", isbn);
        } else {
            tracing::debug!("Book {} already absent", isbn);
        }
        Ok(())
    }
}
