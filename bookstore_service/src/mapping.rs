//! Conversions between the wire shapes in [`crate::api`] and [`crate::domain`].

use crate::api::{
    AuthorDto, AuthorSummaryDto, AuthorUpdateRequestDto, BookSummaryDto, BookUpdateRequestDto,
};
use crate::domain::{
    Author, AuthorSummary, AuthorUpdateRequest, Book, BookSummary, BookUpdateRequest,
};

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum MappingError {
    #[error("Author {0} was never persisted and has no id")]
    UnsavedAuthor(String),
}

impl From<AuthorDto> for Author {
    fn from(dto: AuthorDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            age: dto.age,
            description: dto.description,
            image: dto.image,
        }
    }
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
            age: author.age,
            description: author.description,
            image: author.image,
        }
    }
}

impl From<AuthorUpdateRequestDto> for AuthorUpdateRequest {
    fn from(dto: AuthorUpdateRequestDto) -> Self {
        Self {
            name: dto.name,
            age: dto.age,
            description: dto.description,
            image: dto.image,
        }
    }
}

impl From<AuthorSummaryDto> for AuthorSummary {
    fn from(dto: AuthorSummaryDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            image: dto.image,
        }
    }
}

impl TryFrom<Author> for AuthorSummaryDto {
    type Error = MappingError;

    fn try_from(author: Author) -> Result<Self, Self::Error> {
        let id = author
            .id
            .ok_or_else(|| MappingError::UnsavedAuthor(author.name.clone()))?;
        Ok(Self {
            id,
            name: Some(author.name),
            image: Some(author.image),
        })
    }
}

impl From<BookSummaryDto> for BookSummary {
    fn from(dto: BookSummaryDto) -> Self {
        Self {
            isbn: dto.isbn,
            title: dto.title,
            description: dto.description,
            image: dto.image,
            author: dto.author.into(),
        }
    }
}

impl TryFrom<Book> for BookSummaryDto {
    type Error = MappingError;

    fn try_from(book: Book) -> Result<Self, Self::Error> {
        Ok(Self {
            isbn: book.isbn,
            title: book.title,
            description: book.description,
            image: book.image,
            author: book.author.try_into()?,
        })
    }
}

impl From<BookUpdateRequestDto> for BookUpdateRequest {
    fn from(dto: BookUpdateRequestDto) -> Self {
        Self {
            title: dto.title,
            description: dto.description,
            image: dto.image,
        }
    }
}
