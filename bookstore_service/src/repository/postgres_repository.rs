use anyhow::Context;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row, Statement};

use crate::api::AuthorId;
use crate::domain::{Author, AuthorUpdateRequest, Book, BookRecord, BookUpdateRequest};
use crate::repository::{AuthorRepository, BookRepository, RepositoryError};

const AUTHOR_COLUMNS: &str = "id, name, age, description, image";
const BOOK_WITH_AUTHOR_COLUMNS: &str =
    "b.isbn, b.title, b.description, b.image, a.id, a.name, a.age, a.description, a.image";

pub struct PostgresBookstoreRepository {
    client: Client,
}

pub struct PostgresBookstoreRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl PostgresBookstoreRepository {
    pub async fn init(config: PostgresBookstoreRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}/{}",
            config.username, config.password, config.hostname, config.database
        );
        tracing::info!(
            "Connecting to postgres at {}/{}",
            config.hostname,
            config.database
        );
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS authors (
            id              BIGSERIAL PRIMARY KEY,
            name            TEXT NOT NULL,
            age             INTEGER NOT NULL,
            description     TEXT NOT NULL,
            image           TEXT NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup authors table")?;

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            isbn            TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            image           TEXT NOT NULL,
            author_id       BIGINT NOT NULL REFERENCES authors (id) ON DELETE CASCADE
            )
        ",
            )
            .await
            .context("Failed to setup books table")?;

        Ok(Self { client })
    }
}

fn author_from_row(row: &Row, offset: usize) -> Result<Author, RepositoryError> {
    Ok(Author {
        id: Some(row.try_get(offset)?),
        name: row.try_get(offset + 1)?,
        age: row.try_get(offset + 2)?,
        description: row.try_get(offset + 3)?,
        image: row.try_get(offset + 4)?,
    })
}

/// Expects the columns in the order of `BOOK_WITH_AUTHOR_COLUMNS`
fn book_from_row(row: &Row) -> Result<Book, RepositoryError> {
    Ok(Book {
        isbn: row.try_get(0)?,
        title: row.try_get(1)?,
        description: row.try_get(2)?,
        image: row.try_get(3)?,
        author: author_from_row(row, 4)?,
    })
}

#[async_trait::async_trait]
impl AuthorRepository for PostgresBookstoreRepository {
    async fn insert_author(&self, author: Author) -> Result<Author, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "INSERT INTO authors (name, age, description, image) VALUES ($1, $2, $3, $4) RETURNING {AUTHOR_COLUMNS}"
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &author.name,
                    &author.age,
                    &author.description,
                    &author.image,
                ],
            )
            .await?;

        author_from_row(
            rows.first()
                .ok_or_else(|| RepositoryError::Other("Id not returned".to_string()))?,
            0,
        )
    }

    async fn list_authors(&self) -> Result<Vec<Author>, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!("SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id"))
            .await?;

        let rows = self.client.query(&stmt, &[]).await?;
        rows.iter().map(|row| author_from_row(row, 0)).collect()
    }

    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ($1)"
            ))
            .await?;

        let rows = self.client.query(&stmt, &[&id]).await?;
        rows.first().map(|row| author_from_row(row, 0)).transpose()
    }

    async fn replace_author(
        &self,
        id: AuthorId,
        author: Author,
    ) -> Result<Option<Author>, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "UPDATE authors SET name = $2, age = $3, description = $4, image = $5 WHERE id = ($1) RETURNING {AUTHOR_COLUMNS}"
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &id,
                    &author.name,
                    &author.age,
                    &author.description,
                    &author.image,
                ],
            )
            .await?;
        rows.first().map(|row| author_from_row(row, 0)).transpose()
    }

    async fn update_author(
        &self,
        id: AuthorId,
        patch: AuthorUpdateRequest,
    ) -> Result<Option<Author>, RepositoryError> {
        // COALESCE keeps the stored value for every field missing in the patch
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "UPDATE authors SET
                    name = COALESCE($2, name),
                    age = COALESCE($3, age),
                    description = COALESCE($4, description),
                    image = COALESCE($5, image)
                WHERE id = ($1) RETURNING {AUTHOR_COLUMNS}"
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &id,
                    &patch.name,
                    &patch.age,
                    &patch.description,
                    &patch.image,
                ],
            )
            .await?;
        rows.first().map(|row| author_from_row(row, 0)).transpose()
    }

    async fn delete_author(&self, id: AuthorId) -> Result<bool, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM authors WHERE id = ($1)")
            .await?;

        Ok(self.client.execute(&stmt, &[&id]).await? > 0)
    }

    async fn author_exists(&self, id: AuthorId) -> Result<bool, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT EXISTS (SELECT 1 FROM authors WHERE id = ($1))")
            .await?;

        let row = self.client.query_one(&stmt, &[&id]).await?;
        Ok(row.try_get(0)?)
    }
}

#[async_trait::async_trait]
impl BookRepository for PostgresBookstoreRepository {
    async fn upsert_book(&self, record: BookRecord) -> Result<(Book, bool), RepositoryError> {
        // xmax is 0 only for a freshly inserted tuple, so the insert and the
        // "did it exist before" decision are one statement
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "WITH b AS (
                    INSERT INTO books (isbn, title, description, image, author_id)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (isbn) DO UPDATE SET
                        title = EXCLUDED.title,
                        description = EXCLUDED.description,
                        image = EXCLUDED.image,
                        author_id = EXCLUDED.author_id
                    RETURNING *, (xmax = 0) AS created
                )
                SELECT {BOOK_WITH_AUTHOR_COLUMNS}, b.created
                FROM b JOIN authors a ON a.id = b.author_id"
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[
                    &record.isbn,
                    &record.title,
                    &record.description,
                    &record.image,
                    &record.author_id,
                ],
            )
            .await;

        match rows {
            Ok(rows) => {
                let row = rows
                    .first()
                    .ok_or_else(|| RepositoryError::Other("Book not returned".to_string()))?;
                Ok((book_from_row(row)?, row.try_get(9)?))
            }
            Err(err)
                if err
                    .as_db_error()
                    // This is foreign key validation error
                    .map(|db_err| db_err.code() == &SqlState::FOREIGN_KEY_VIOLATION)
                    .unwrap_or_default() =>
            {
                Err(RepositoryError::AuthorNotFound(record.author_id))
            }
            Err(other_err) => Err(other_err.into()),
        }
    }

    async fn list_books(&self, author_id: Option<AuthorId>) -> Result<Vec<Book>, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {BOOK_WITH_AUTHOR_COLUMNS}
                FROM books b JOIN authors a ON a.id = b.author_id
                WHERE ($1::BIGINT IS NULL OR b.author_id = $1)
                ORDER BY b.isbn"
            ))
            .await?;

        let rows = self.client.query(&stmt, &[&author_id]).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "SELECT {BOOK_WITH_AUTHOR_COLUMNS}
                FROM books b JOIN authors a ON a.id = b.author_id
                WHERE b.isbn = ($1)"
            ))
            .await?;

        let rows = self.client.query(&stmt, &[&isbn]).await?;
        rows.first().map(book_from_row).transpose()
    }

    async fn update_book(
        &self,
        isbn: &str,
        patch: BookUpdateRequest,
    ) -> Result<Option<Book>, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(&format!(
                "WITH b AS (
                    UPDATE books SET
                        title = COALESCE($2, title),
                        description = COALESCE($3, description),
                        image = COALESCE($4, image)
                    WHERE isbn = ($1)
                    RETURNING *
                )
                SELECT {BOOK_WITH_AUTHOR_COLUMNS}
                FROM b JOIN authors a ON a.id = b.author_id"
            ))
            .await?;

        let rows = self
            .client
            .query(
                &stmt,
                &[&isbn, &patch.title, &patch.description, &patch.image],
            )
            .await?;
        rows.first().map(book_from_row).transpose()
    }

    async fn delete_book(&self, isbn: &str) -> Result<bool, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE isbn = ($1)")
            .await?;

        Ok(self.client.execute(&stmt, &[&isbn]).await? > 0)
    }

    async fn book_exists(&self, isbn: &str) -> Result<bool, RepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT EXISTS (SELECT 1 FROM books WHERE isbn = ($1))")
            .await?;

        let row = self.client.query_one(&stmt, &[&isbn]).await?;
        Ok(row.try_get(0)?)
    }
}

#[cfg(test)]
mod postgres_bookstore_repository_tests {
    use serial_test::file_serial;
    use testcontainers::core::IntoContainerPort;
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};

    use super::*;

    async fn start_postgres_container_and_init_repo(
    ) -> (ContainerAsync<GenericImage>, PostgresBookstoreRepository) {
        let _pg_container = GenericImage::new("postgres", "latest")
            .with_mapped_port(5432, 5432.tcp())
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres");

        for _ in 0..10 {
            if let Ok(repo) =
                PostgresBookstoreRepository::init(PostgresBookstoreRepositoryConfig {
                    hostname: "127.0.0.1".to_string(),
                    username: "postgres".to_string(),
                    password: "postgres".to_string(),
                    database: "postgres".to_string(),
                })
                .await
            {
                return (_pg_container, repo);
            }
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        panic!("Failed to setup postgres container")
    }

    fn author_details(name: &str) -> Author {
        Author {
            id: None,
            name: name.to_string(),
            age: 10,
            description: "bla".to_string(),
            image: "test.jpg".to_string(),
        }
    }

    fn book_record(isbn: &str, author_id: AuthorId) -> BookRecord {
        BookRecord {
            isbn: isbn.to_string(),
            title: "Test Book A".to_string(),
            description: "A test description".to_string(),
            image: "test.jpg".to_string(),
            author_id,
        }
    }

    #[tokio::test]
    #[cfg_attr(not(feature = "postgres_tests"), ignore = "needs docker")]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Simple test to cover author management
    /// Combined into big unit test to avoid duplicate setup
    /// 1. Lists authors - expects empty
    /// 2. Adds two authors and reads them back
    /// 3. Replaces and patches the first one
    /// 4. Updates on unknown id report nothing to update
    /// 5. Deletes the author twice
    async fn test_author_management() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;
        assert!(repo.list_authors().await.unwrap().is_empty());

        let john = repo
            .insert_author(author_details("John Doe"))
            .await
            .expect("Failed to add author");
        let don = repo
            .insert_author(author_details("Don"))
            .await
            .expect("Failed to add author");
        let john_id = john.id.expect("Id not assigned");

        assert_eq!(repo.get_author(john_id).await.unwrap(), Some(john.clone()));
        assert_eq!(repo.list_authors().await.unwrap(), vec![john, don]);

        let replaced = repo
            .replace_author(john_id, author_details("Jane"))
            .await
            .unwrap()
            .expect("Author not found");
        assert_eq!(replaced, author_details("Jane").with_id(john_id));

        let patched = repo
            .update_author(
                john_id,
                AuthorUpdateRequest {
                    description: Some("patched".to_string()),
                    ..AuthorUpdateRequest::default()
                },
            )
            .await
            .unwrap()
            .expect("Author not found");
        assert_eq!(
            patched,
            Author {
                description: "patched".to_string(),
                ..replaced
            }
        );

        let unknown_id = john_id + 1000;
        assert_eq!(
            repo.replace_author(unknown_id, author_details("x"))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            repo.update_author(unknown_id, AuthorUpdateRequest::default())
                .await
                .unwrap(),
            None
        );

        assert!(repo.delete_author(john_id).await.unwrap());
        assert!(!repo.delete_author(john_id).await.unwrap());
        assert!(!repo.author_exists(john_id).await.unwrap());
    }

    #[tokio::test]
    #[cfg_attr(not(feature = "postgres_tests"), ignore = "needs docker")]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Simple test to cover book management
    /// 1. Upserts a book for unknown author - rejected, nothing written
    /// 2. Upserts a new book - created
    /// 3. Upserts the same isbn again - updated
    /// 4. Lists with and without author filter
    /// 5. Patches the book
    /// 6. Deletes the author and checks the book is gone with them
    async fn test_book_management() {
        let (_container, repo) = start_postgres_container_and_init_repo().await;
        let author = repo.insert_author(author_details("John Doe")).await.unwrap();
        let author_id = author.id.expect("Id not assigned");

        let rejected = repo.upsert_book(book_record("1", author_id + 1000)).await;
        assert!(matches!(
            rejected,
            Err(RepositoryError::AuthorNotFound(..))
        ));
        assert!(!repo.book_exists("1").await.unwrap());

        let (book, created) = repo
            .upsert_book(book_record("1", author_id))
            .await
            .expect("Failed to upsert");
        assert!(created);
        assert_eq!(book.author, author);

        let (book, created) = repo
            .upsert_book(BookRecord {
                description: "updated".to_string(),
                ..book_record("1", author_id)
            })
            .await
            .expect("Failed to upsert");
        assert!(!created);
        assert_eq!(book.description, "updated");

        assert_eq!(repo.list_books(None).await.unwrap(), vec![book.clone()]);
        assert_eq!(
            repo.list_books(Some(author_id)).await.unwrap(),
            vec![book.clone()]
        );
        assert!(repo
            .list_books(Some(author_id + 1000))
            .await
            .unwrap()
            .is_empty());

        let patched = repo
            .update_book(
                "1",
                BookUpdateRequest {
                    title: Some("patchedTitle".to_string()),
                    ..BookUpdateRequest::default()
                },
            )
            .await
            .unwrap()
            .expect("Book not found");
        assert_eq!(
            patched,
            Book {
                title: "patchedTitle".to_string(),
                ..book
            }
        );
        assert_eq!(repo.get_book("1").await.unwrap(), Some(patched));
        assert_eq!(
            repo.update_book("2", BookUpdateRequest::default())
                .await
                .unwrap(),
            None
        );

        assert!(repo.delete_author(author_id).await.unwrap());
        assert!(!repo.book_exists("1").await.unwrap());
        assert!(!repo.delete_book("1").await.unwrap());
    }
}
