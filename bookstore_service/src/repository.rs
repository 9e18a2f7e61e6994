pub use in_memory_repository::InMemoryBookstoreRepository;
pub use postgres_repository::{PostgresBookstoreRepository, PostgresBookstoreRepositoryConfig};

use crate::api::AuthorId;
use crate::domain::{Author, AuthorUpdateRequest, Book, BookRecord, BookUpdateRequest};

mod in_memory_repository;
mod postgres_repository;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("Author {0} not found")]
    AuthorNotFound(AuthorId),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Stores a new author, returns it with the id assigned by the repository
    async fn insert_author(&self, author: Author) -> Result<Author, RepositoryError>;
    /// Lists all authors in storage order
    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError>;
    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>, RepositoryError>;
    /// Overwrites every field of an existing author, returns None if it does not exist
    async fn replace_author(
        &self,
        id: AuthorId,
        author: Author,
    ) -> Result<Option<Author>, RepositoryError>;
    /// Applies the patch to an existing author, returns None if it does not exist
    async fn update_author(
        &self,
        id: AuthorId,
        patch: AuthorUpdateRequest,
    ) -> Result<Option<Author>, RepositoryError>;
    /// Deletes the author together with their books, returns false if there was nothing to delete
    async fn delete_author(&self, id: AuthorId) -> Result<bool, RepositoryError>;
    /// Existence query of the repository contract. Writes never call it first,
    /// they fold the check into the statement itself
    async fn author_exists(&self, id: AuthorId) -> Result<bool, RepositoryError>;
}

#[async_trait::async_trait]
pub trait BookRepository: Send + Sync {
    /// Inserts the book or overwrites the one with the same isbn.
    /// Returns the stored book and true if no book with this isbn existed before the write.
    /// Fails with AuthorNotFound and writes nothing if the author does not exist
    async fn upsert_book(&self, record: BookRecord) -> Result<(Book, bool), RepositoryError>;
    /// Lists all books, or only those of the given author
    async fn list_books(&self, author_id: Option<AuthorId>) -> Result<Vec<Book>, RepositoryError>;
    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, RepositoryError>;
    /// Applies the patch to an existing book, returns None if it does not exist
    async fn update_book(
        &self,
        isbn: &str,
        patch: BookUpdateRequest,
    ) -> Result<Option<Book>, RepositoryError>;
    /// Returns false if there was nothing to delete
    async fn delete_book(&self, isbn: &str) -> Result<bool, RepositoryError>;
    /// Existence query of the repository contract, see `AuthorRepository::author_exists`
    async fn book_exists(&self, isbn: &str) -> Result<bool, RepositoryError>;
}
