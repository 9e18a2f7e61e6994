use std::sync::Arc;

use crate::api::AuthorId;
use crate::domain::{Author, AuthorUpdateRequest};
use crate::repository::AuthorRepository;
use crate::services::ServiceError;

/// Author workflows. Each operation is a single repository call, so a failure
/// never leaves a partial write behind
#[derive(Clone)]
pub struct AuthorService {
    repository: Arc<dyn AuthorRepository>,
}

impl AuthorService {
    pub fn new(repository: Arc<dyn AuthorRepository>) -> Self {
        Self { repository }
    }

    /// Fails with InvalidInput if the author already carries an id
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, author: Author) -> Result<Author, ServiceError> {
        if let Some(id) = author.id {
            return Err(ServiceError::InvalidInput(format!(
                "Author id {} must not be set on create",
                id
            )));
        }
        let created = self.repository.insert_author(author).await?;
        tracing::info!("Created author {:?}", created.id);
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Author>, ServiceError> {
        Ok(self.repository.list_authors().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: AuthorId) -> Result<Option<Author>, ServiceError> {
        Ok(self.repository.get_author(id).await?)
    }

    /// Replaces every field of the author, the id from the payload is ignored
    #[tracing::instrument(skip(self))]
    pub async fn full_update(&self, id: AuthorId, author: Author) -> Result<Author, ServiceError> {
        let updated = self
            .repository
            .replace_author(id, author.with_id(id))
            .await?
            .ok_or(ServiceError::AuthorNotFound(id))?;
        tracing::info!("Replaced author {}", id);
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn partial_update(
        &self,
        id: AuthorId,
        patch: AuthorUpdateRequest,
    ) -> Result<Author, ServiceError> {
        let updated = self
            .repository
            .update_author(id, patch)
            .await?
            .ok_or(ServiceError::AuthorNotFound(id))?;
        tracing::info!("Patched author {}", id);
        Ok(updated)
    }

    /// Deleting an author that does not exist is not an error
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: AuthorId) -> Result<(), ServiceError> {
        if self.repository.delete_author(id).await? {
            tracing::info!("Deleted author {}", id);
        } else {
            tracing::debug!("Author {} already absent", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod author_service_tests {
    use std::sync::Arc;

    use crate::domain::{Author, AuthorUpdateRequest};
    use crate::repository::{AuthorRepository, InMemoryBookstoreRepository};
    use crate::services::{AuthorService, ServiceError};

    fn test_author_a(id: Option<i64>) -> Author {
        Author {
            id,
            name: "John Doe".to_string(),
            age: 10,
            description: "bla".to_string(),
            image: "test.jpg".to_string(),
        }
    }

    fn setup() -> (Arc<InMemoryBookstoreRepository>, AuthorService) {
        let repository = Arc::new(InMemoryBookstoreRepository::default());
        (repository.clone(), AuthorService::new(repository))
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_round_trips() {
        let (_, service) = setup();

        let created = service
            .create(test_author_a(None))
            .await
            .expect("Failed to create author");

        assert_eq!(created, test_author_a(Some(1)));
        assert_eq!(service.get_by_id(1).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_create_with_id_is_invalid_input() {
        let (repository, service) = setup();

        let result = service.create(test_author_a(Some(99))).await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(..))));
        assert!(repository.list_authors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_missing_get() {
        let (_, service) = setup();
        assert!(service.list().await.unwrap().is_empty());
        assert_eq!(service.get_by_id(999).await.unwrap(), None);

        let a = service.create(test_author_a(None)).await.unwrap();
        let b = service
            .create(Author {
                name: "Don".to_string(),
                ..test_author_a(None)
            })
            .await
            .unwrap();

        assert_eq!(service.list().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_full_update_forces_path_id() {
        let (_, service) = setup();
        service.create(test_author_a(None)).await.unwrap();

        let replacement = Author {
            id: Some(42),
            name: "Don".to_string(),
            age: 15,
            description: "other".to_string(),
            image: "other.jpg".to_string(),
        };
        let updated = service
            .full_update(1, replacement.clone())
            .await
            .expect("Failed to update");

        assert_eq!(updated, replacement.with_id(1));
        assert_eq!(service.get_by_id(1).await.unwrap(), Some(updated));
        assert_eq!(service.get_by_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_full_update_of_unknown_author_leaves_store_unchanged() {
        let (_, service) = setup();
        let existing = service.create(test_author_a(None)).await.unwrap();

        let result = service.full_update(999, test_author_a(None)).await;

        assert!(matches!(result, Err(ServiceError::AuthorNotFound(999))));
        assert_eq!(service.list().await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn test_partial_update_with_empty_patch_changes_nothing() {
        let (_, service) = setup();
        let existing = service.create(test_author_a(None)).await.unwrap();

        let updated = service
            .partial_update(1, AuthorUpdateRequest::default())
            .await
            .unwrap();

        assert_eq!(updated, existing);
        assert_eq!(service.get_by_id(1).await.unwrap(), Some(existing));
    }

    #[tokio::test]
    async fn test_partial_update_changes_only_the_given_field() {
        let patches_and_expected = vec![
            (
                AuthorUpdateRequest {
                    name: Some("Don".to_string()),
                    ..AuthorUpdateRequest::default()
                },
                Author {
                    name: "Don".to_string(),
                    ..test_author_a(Some(1))
                },
            ),
            (
                AuthorUpdateRequest {
                    age: Some(15),
                    ..AuthorUpdateRequest::default()
                },
                Author {
                    age: 15,
                    ..test_author_a(Some(1))
                },
            ),
            (
                AuthorUpdateRequest {
                    description: Some("updated".to_string()),
                    ..AuthorUpdateRequest::default()
                },
                Author {
                    description: "updated".to_string(),
                    ..test_author_a(Some(1))
                },
            ),
            (
                AuthorUpdateRequest {
                    image: Some("other.jpg".to_string()),
                    ..AuthorUpdateRequest::default()
                },
                Author {
                    image: "other.jpg".to_string(),
                    ..test_author_a(Some(1))
                },
            ),
        ];

        for (patch, expected) in patches_and_expected {
            let (_, service) = setup();
            service.create(test_author_a(None)).await.unwrap();

            let updated = service.partial_update(1, patch).await.unwrap();

            assert_eq!(updated, expected);
            assert_eq!(service.get_by_id(1).await.unwrap(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_partial_update_of_unknown_author_fails() {
        let (_, service) = setup();

        let result = service
            .partial_update(999, AuthorUpdateRequest::default())
            .await;

        assert!(matches!(result, Err(ServiceError::AuthorNotFound(999))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (repository, service) = setup();
        service.create(test_author_a(None)).await.unwrap();

        service.delete(1).await.expect("Failed to delete");
        assert!(!repository.author_exists(1).await.unwrap());

        service.delete(1).await.expect("Failed to delete twice");
        service.delete(999).await.expect("Failed to delete unknown");
        assert!(!repository.author_exists(999).await.unwrap());
    }
}
