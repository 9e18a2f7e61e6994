//! Entities persisted by the repository and the requests the workflows accept.
//!
//! Entities derive value equality so tests can compare whole rows. The store
//! itself only ever compares them by key (`Author::id`, `Book::isbn`).

use crate::api::{AuthorId, Isbn};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    /// Assigned by the repository on first insert, never changed afterwards
    pub id: Option<AuthorId>,
    pub name: String,
    pub age: i32,
    pub description: String,
    pub image: String,
}

impl Author {
    /// Returns the same author with a different identity
    pub fn with_id(self, id: AuthorId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub description: String,
    pub image: String,
    pub author: Author,
}

/// Row written by the book upsert. The author is referenced by id only and is
/// resolved by the repository at write time
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BookRecord {
    pub isbn: Isbn,
    pub title: String,
    pub description: String,
    pub image: String,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AuthorSummary {
    pub id: AuthorId,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BookSummary {
    pub isbn: Isbn,
    pub title: String,
    pub description: String,
    pub image: String,
    pub author: AuthorSummary,
}

impl BookSummary {
    pub fn with_isbn(self, isbn: Isbn) -> Self {
        Self { isbn, ..self }
    }

    pub fn to_record(&self) -> BookRecord {
        BookRecord {
            isbn: self.isbn.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            author_id: self.author.id,
        }
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct AuthorUpdateRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl AuthorUpdateRequest {
    /// Takes every field set in the patch, keeps the current value otherwise
    pub fn merge_into(&self, author: &Author) -> Author {
        Author {
            id: author.id,
            name: self.name.clone().unwrap_or_else(|| author.name.clone()),
            age: self.age.unwrap_or(author.age),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| author.description.clone()),
            image: self.image.clone().unwrap_or_else(|| author.image.clone()),
        }
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct BookUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl BookUpdateRequest {
    /// Takes every field set in the patch, keeps the current value otherwise.
    /// isbn and author are always kept
    pub fn merge_into(&self, book: &Book) -> Book {
        Book {
            isbn: book.isbn.clone(),
            title: self.title.clone().unwrap_or_else(|| book.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| book.description.clone()),
            image: self.image.clone().unwrap_or_else(|| book.image.clone()),
            author: book.author.clone(),
        }
    }
}

#[cfg(test)]
mod domain_tests {
    use super::*;

    fn author() -> Author {
        Author {
            id: Some(1),
            name: "John Doe".to_string(),
            age: 10,
            description: "bla".to_string(),
            image: "test.jpg".to_string(),
        }
    }

    #[test]
    fn test_empty_author_patch_keeps_everything() {
        let existing = author();
        assert_eq!(AuthorUpdateRequest::default().merge_into(&existing), existing);
    }

    #[test]
    fn test_author_patch_changes_only_given_fields() {
        let existing = author();
        let patch = AuthorUpdateRequest {
            age: Some(15),
            image: Some("other.jpg".to_string()),
            ..AuthorUpdateRequest::default()
        };

        assert_eq!(
            patch.merge_into(&existing),
            Author {
                age: 15,
                image: "other.jpg".to_string(),
                ..existing
            }
        );
    }

    #[test]
    fn test_book_patch_never_touches_isbn_and_author() {
        let existing = Book {
            isbn: "111-111-111111-111".to_string(),
            title: "Test Book A".to_string(),
            description: "A test description".to_string(),
            image: "test.jpg".to_string(),
            author: author(),
        };
        let patch = BookUpdateRequest {
            title: Some("Other title".to_string()),
            ..BookUpdateRequest::default()
        };

        let merged = patch.merge_into(&existing);
        assert_eq!(merged.isbn, existing.isbn);
        assert_eq!(merged.author, existing.author);
        assert_eq!(merged.title, "Other title");
        assert_eq!(merged.description, existing.description);
    }
}
