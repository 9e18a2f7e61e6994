use anyhow::{bail, Context};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryTransientMiddleware, Retryable, RetryableStrategy};
use reqwest_tracing::TracingMiddleware;

use crate::api::{
    AuthorDto, AuthorId, AuthorUpdateRequestDto, BookSummaryDto, BookUpdateRequestDto,
};

const MAX_RETRIES: u32 = 3;

/// Retries only requests that could not connect, so nothing was sent to the service.
/// Any response, including a 5xx, is final.
struct ConnectFailureStrategy;

impl RetryableStrategy for ConnectFailureStrategy {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(reqwest_middleware::Error::Reqwest(err)) if err.is_connect() => {
                Some(Retryable::Transient)
            }
            Err(_) => Some(Retryable::Fatal),
        }
    }
}

pub struct BookstoreClient {
    url: String,
    client: ClientWithMiddleware,
}

impl BookstoreClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                ConnectFailureStrategy,
            ))
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Calls POST /v1/authors endpoint
    /// Returns the author with the id assigned by the service
    pub async fn create_author(&self, author: AuthorDto) -> anyhow::Result<AuthorDto> {
        let response = self
            .client
            .post(format!("{}/v1/authors", self.url))
            .json(&author)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            bail!("Failed to create author, status {}", response.status())
        }
        Ok(response.json().await?)
    }

    /// Calls GET /v1/authors endpoint
    pub async fn list_authors(&self) -> anyhow::Result<Vec<AuthorDto>> {
        let response = self
            .client
            .get(format!("{}/v1/authors", self.url))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to list authors, status {}", response.status())
        }
    }

    /// Calls GET /v1/authors/{id} endpoint
    /// Returns None if the author does not exist
    pub async fn get_author(&self, author_id: AuthorId) -> anyhow::Result<Option<AuthorDto>> {
        let response = self
            .client
            .get(format!("{}/v1/authors/{}", self.url, author_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to get author, status {}", response.status())
        }
    }

    /// Calls PUT /v1/authors/{id} endpoint
    pub async fn full_update_author(
        &self,
        author_id: AuthorId,
        author: AuthorDto,
    ) -> anyhow::Result<AuthorDto> {
        let response = self
            .client
            .put(format!("{}/v1/authors/{}", self.url, author_id))
            .json(&author)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to update author, status {}", response.status())
        }
    }

    /// Calls PATCH /v1/authors/{id} endpoint
    pub async fn partial_update_author(
        &self,
        author_id: AuthorId,
        patch: AuthorUpdateRequestDto,
    ) -> anyhow::Result<AuthorDto> {
        let response = self
            .client
            .patch(format!("{}/v1/authors/{}", self.url, author_id))
            .json(&patch)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to patch author, status {}", response.status())
        }
    }

    /// Calls DELETE /v1/authors/{id} endpoint
    pub async fn delete_author(&self, author_id: AuthorId) -> anyhow::Result<()> {
        let response = self
            .client
            .delete(format!("{}/v1/authors/{}", self.url, author_id))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to delete author, status {}", response.status())
        }
        Ok(())
    }

    /// Calls PUT /v1/books/{isbn} endpoint
    /// Returns the stored book and true if the book was created, false if it was updated
    pub async fn upsert_book(
        &self,
        isbn: &str,
        book: BookSummaryDto,
    ) -> anyhow::Result<(BookSummaryDto, bool)> {
        let response = self
            .client
            .put(format!("{}/v1/books/{}", self.url, isbn))
            .json(&book)
            .send()
            .await?;
        let created = match response.status() {
            StatusCode::CREATED => true,
            StatusCode::OK => false,
            status => bail!("Failed to upsert book, status {}", status),
        };
        Ok((response.json().await?, created))
    }

    /// Calls GET /v1/books endpoint, optionally filtered by author
    pub async fn list_books(
        &self,
        author_id: Option<AuthorId>,
    ) -> anyhow::Result<Vec<BookSummaryDto>> {
        let mut request = self.client.get(format!("{}/v1/books", self.url));
        if let Some(author_id) = author_id {
            request = request.query(&[("author", author_id)]);
        }
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to list books, status {}", response.status())
        }
    }

    /// Calls GET /v1/books/{isbn} endpoint
    /// Returns None if the book does not exist
    pub async fn get_book(&self, isbn: &str) -> anyhow::Result<Option<BookSummaryDto>> {
        let response = self
            .client
            .get(format!("{}/v1/books/{}", self.url, isbn))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to get book, status {}", response.status())
        }
    }

    /// Calls PATCH /v1/books/{isbn} endpoint
    pub async fn partial_update_book(
        &self,
        isbn: &str,
        patch: BookUpdateRequestDto,
    ) -> anyhow::Result<BookSummaryDto> {
        let response = self
            .client
            .patch(format!("{}/v1/books/{}", self.url, isbn))
            .json(&patch)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            bail!("Failed to patch book, status {}", response.status())
        }
    }

    /// Calls DELETE /v1/books/{isbn} endpoint
    pub async fn delete_book(&self, isbn: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .delete(format!("{}/v1/books/{}", self.url, isbn))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("Failed to delete book, status {}", response.status())
        }
        Ok(())
    }
}
