pub use author_service::AuthorService;
pub use book_service::BookService;

use crate::api::{AuthorId, Isbn};
use crate::repository::RepositoryError;

mod author_service;
mod book_service;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Author {0} not found")]
    AuthorNotFound(AuthorId),

    #[error("Book {0} not found")]
    BookNotFound(Isbn),

    #[error("Book references author {0} that does not exist")]
    InvalidAuthor(AuthorId),

    #[error("Repository failure {0}")]
    Repository(#[from] RepositoryError),
}
