use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::api::{AuthorId, Isbn};
use crate::domain::{Author, AuthorUpdateRequest, Book, BookRecord, BookUpdateRequest};
use crate::repository::{AuthorRepository, BookRepository, RepositoryError};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<Isbn, BookRecord>,
}

impl Tables {
    fn resolve_book(&self, record: &BookRecord) -> Result<Book, RepositoryError> {
        let author = self.authors.get(&record.author_id).ok_or_else(|| {
            RepositoryError::Other(format!(
                "Book {} references missing author {}",
                record.isbn, record.author_id
            ))
        })?;
        Ok(Book {
            isbn: record.isbn.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
            author: author.clone(),
        })
    }
}

/// Keeps authors and books behind one lock so every operation is a single
/// atomic read-decide-write
#[derive(Default)]
pub struct InMemoryBookstoreRepository {
    author_sequence_generator: AtomicI64,
    tables: parking_lot::RwLock<Tables>,
}

#[async_trait::async_trait]
impl AuthorRepository for InMemoryBookstoreRepository {
    async fn insert_author(&self, author: Author) -> Result<Author, RepositoryError> {
        let id = self.author_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        let author = author.with_id(id);
        self.tables.write().authors.insert(id, author.clone());
        Ok(author)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError> {
        Ok(self.tables.read().authors.values().cloned().collect())
    }

    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>, RepositoryError> {
        Ok(self.tables.read().authors.get(&id).cloned())
    }

    async fn replace_author(
        &self,
        id: AuthorId,
        author: Author,
    ) -> Result<Option<Author>, RepositoryError> {
        let mut locked_tables = self.tables.write();
        Ok(locked_tables.authors.get_mut(&id).map(|existing| {
            *existing = author.with_id(id);
            existing.clone()
        }))
    }

    async fn update_author(
        &self,
        id: AuthorId,
        patch: AuthorUpdateRequest,
    ) -> Result<Option<Author>, RepositoryError> {
        let mut locked_tables = self.tables.write();
        Ok(locked_tables.authors.get_mut(&id).map(|existing| {
            *existing = patch.merge_into(existing);
            existing.clone()
        }))
    }

    async fn delete_author(&self, id: AuthorId) -> Result<bool, RepositoryError> {
        let mut locked_tables = self.tables.write();
        if locked_tables.authors.remove(&id).is_none() {
            return Ok(false);
        }
        locked_tables.books.retain(|_, book| book.author_id != id);
        Ok(true)
    }

    async fn author_exists(&self, id: AuthorId) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().authors.contains_key(&id))
    }
}

#[async_trait::async_trait]
impl BookRepository for InMemoryBookstoreRepository {
    async fn upsert_book(&self, record: BookRecord) -> Result<(Book, bool), RepositoryError> {
        let mut locked_tables = self.tables.write();
        if !locked_tables.authors.contains_key(&record.author_id) {
            return Err(RepositoryError::AuthorNotFound(record.author_id));
        }
        let book = locked_tables.resolve_book(&record)?;
        let existed = locked_tables
            .books
            .insert(record.isbn.clone(), record)
            .is_some();
        Ok((book, !existed))
    }

    async fn list_books(&self, author_id: Option<AuthorId>) -> Result<Vec<Book>, RepositoryError> {
        let locked_tables = self.tables.read();
        locked_tables
            .books
            .values()
            .filter(|record| author_id.map_or(true, |id| record.author_id == id))
            .map(|record| locked_tables.resolve_book(record))
            .collect()
    }

    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, RepositoryError> {
        let locked_tables = self.tables.read();
        locked_tables
            .books
            .get(isbn)
            .map(|record| locked_tables.resolve_book(record))
            .transpose()
    }

    async fn update_book(
        &self,
        isbn: &str,
        patch: BookUpdateRequest,
    ) -> Result<Option<Book>, RepositoryError> {
        let mut locked_tables = self.tables.write();
        let Some(record) = locked_tables.books.get(isbn) else {
            return Ok(None);
        };
        let book = patch.merge_into(&locked_tables.resolve_book(record)?);
        let updated_record = BookRecord {
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            description: book.description.clone(),
            image: book.image.clone(),
            author_id: record.author_id,
        };
        locked_tables.books.insert(book.isbn.clone(), updated_record);
        Ok(Some(book))
    }

    async fn delete_book(&self, isbn: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().books.remove(isbn).is_some())
    }

    async fn book_exists(&self, isbn: &str) -> Result<bool, RepositoryError> {
        Ok(self.tables.read().books.contains_key(isbn))
    }
}
