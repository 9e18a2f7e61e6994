use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type AuthorId = i64;
pub type Isbn = String;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Full representation of an author.
/// `id` must be absent when creating an author and is ignored on full update
pub struct AuthorDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AuthorId>,
    pub name: String,
    pub age: i32,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Patch to author details. Only the specified fields are changed, the rest keeps its current value
pub struct AuthorUpdateRequestDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Reference to an author embedded in a book, only `id` is required
pub struct AuthorSummaryDto {
    pub id: AuthorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Book as sent to and returned from the books endpoints.
/// On upsert the isbn from the path always wins over the one in the body
pub struct BookSummaryDto {
    #[serde(default)]
    pub isbn: Isbn,
    pub title: String,
    pub description: String,
    pub image: String,
    pub author: AuthorSummaryDto,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Patch to book details. isbn and author can not be changed this way
pub struct BookUpdateRequestDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct BookListQuery {
    /// Only books written by this author are returned when set
    pub author: Option<AuthorId>,
}
