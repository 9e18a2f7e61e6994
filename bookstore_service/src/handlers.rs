use actix_web::http::header::LOCATION;
use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpResponse;
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{
    AuthorDto, AuthorId, AuthorUpdateRequestDto, BookListQuery, BookSummaryDto,
    BookUpdateRequestDto,
};
use crate::domain::{Author, Book};
use crate::services::{AuthorService, BookService, ServiceError};

/// Single place where workflow failures become status codes.
/// Both kinds of "not found on update" are client errors, an unknown author
/// in a book upsert is reported as a server error
fn error_response(operation: &str, err: ServiceError) -> HttpResponse {
    match err {
        ServiceError::InvalidInput(_)
        | ServiceError::AuthorNotFound(_)
        | ServiceError::BookNotFound(_) => {
            tracing::info!("{} rejected: {}", operation, err);
            HttpResponse::BadRequest().finish()
        }
        ServiceError::InvalidAuthor(_) => {
            tracing::warn!("{} failed: {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
        ServiceError::Repository(_) => {
            tracing::error!("{} failed {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn book_summaries(books: Vec<Book>) -> Result<Vec<BookSummaryDto>, HttpResponse> {
    books
        .into_iter()
        .map(BookSummaryDto::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| {
            tracing::error!("Failed to map books {}", err);
            HttpResponse::InternalServerError().finish()
        })
}

fn book_summary(book: Book) -> Result<BookSummaryDto, HttpResponse> {
    BookSummaryDto::try_from(book).map_err(|err| {
        tracing::error!("Failed to map book {}", err);
        HttpResponse::InternalServerError().finish()
    })
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn create_author(
    author_service: Data<AuthorService>,
    author: web::Json<AuthorDto>,
) -> Result<HttpResponse, Error> {
    Ok(
        match author_service.create(author.into_inner().into()).await {
            Ok(created) => HttpResponse::Created()
                .append_header((
                    LOCATION,
                    format!("/v1/authors/{}", created.id.unwrap_or_default()),
                ))
                .json(AuthorDto::from(created)),
            Err(err) => error_response("Create author", err),
        },
    )
}

#[api_v2_operation]
pub async fn list_authors(author_service: Data<AuthorService>) -> Result<HttpResponse, Error> {
    Ok(match author_service.list().await {
        Ok(authors) => HttpResponse::Ok().json(
            authors
                .into_iter()
                .map(AuthorDto::from)
                .collect::<Vec<_>>(),
        ),
        Err(err) => error_response("List authors", err),
    })
}

#[api_v2_operation]
pub async fn get_author(
    author_service: Data<AuthorService>,
    author_id: web::Path<AuthorId>,
) -> Result<HttpResponse, Error> {
    Ok(match author_service.get_by_id(author_id.into_inner()).await {
        Ok(Some(author)) => HttpResponse::Ok().json(AuthorDto::from(author)),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(err) => error_response("Get author", err),
    })
}

#[api_v2_operation]
pub async fn full_update_author(
    author_service: Data<AuthorService>,
    author_id: web::Path<AuthorId>,
    author: web::Json<AuthorDto>,
) -> Result<HttpResponse, Error> {
    let author: Author = author.into_inner().into();
    Ok(
        match author_service
            .full_update(author_id.into_inner(), author)
            .await
        {
            Ok(updated) => HttpResponse::Ok().json(AuthorDto::from(updated)),
            Err(err) => error_response("Full update author", err),
        },
    )
}

#[api_v2_operation]
pub async fn partial_update_author(
    author_service: Data<AuthorService>,
    author_id: web::Path<AuthorId>,
    patch: web::Json<AuthorUpdateRequestDto>,
) -> Result<HttpResponse, Error> {
    Ok(
        match author_service
            .partial_update(author_id.into_inner(), patch.into_inner().into())
            .await
        {
            Ok(updated) => HttpResponse::Ok().json(AuthorDto::from(updated)),
            Err(err) => error_response("Partial update author", err),
        },
    )
}

#[api_v2_operation]
pub async fn delete_author(
    author_service: Data<AuthorService>,
    author_id: web::Path<AuthorId>,
) -> Result<HttpResponse, Error> {
    Ok(match author_service.delete(author_id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("Delete author", err),
    })
}

#[api_v2_operation]
pub async fn create_update_book(
    book_service: Data<BookService>,
    isbn: web::Path<String>,
    book: web::Json<BookSummaryDto>,
) -> Result<HttpResponse, Error> {
    Ok(
        match book_service
            .create_update(&isbn, book.into_inner().into())
            .await
        {
            Ok((saved_book, created)) => match book_summary(saved_book) {
                Ok(summary) if created => HttpResponse::Created().json(summary),
                Ok(summary) => HttpResponse::Ok().json(summary),
                Err(response) => response,
            },
            Err(err) => error_response("Create or update book", err),
        },
    )
}

#[api_v2_operation]
pub async fn list_books(
    book_service: Data<BookService>,
    query: web::Query<BookListQuery>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.list(query.author).await {
        Ok(books) => match book_summaries(books) {
            Ok(summaries) => HttpResponse::Ok().json(summaries),
            Err(response) => response,
        },
        Err(err) => error_response("List books", err),
    })
}

#[api_v2_operation]
pub async fn get_book(
    book_service: Data<BookService>,
    isbn: web::Path<String>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.get(&isbn).await {
        Ok(Some(book)) => match book_summary(book) {
            Ok(summary) => HttpResponse::Ok().json(summary),
            Err(response) => response,
        },
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(err) => error_response("Get book", err),
    })
}

#[api_v2_operation]
pub async fn partial_update_book(
    book_service: Data<BookService>,
    isbn: web::Path<String>,
    patch: web::Json<BookUpdateRequestDto>,
) -> Result<HttpResponse, Error> {
    Ok(
        match book_service
            .partial_update(&isbn, patch.into_inner().into())
            .await
        {
            Ok(updated) => match book_summary(updated) {
                Ok(summary) => HttpResponse::Ok().json(summary),
                Err(response) => response,
            },
            Err(err) => error_response("Partial update book", err),
        },
    )
}

#[api_v2_operation]
pub async fn delete_book(
    book_service: Data<BookService>,
    isbn: web::Path<String>,
) -> Result<HttpResponse, Error> {
    Ok(match book_service.delete(&isbn).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("Delete book", err),
    })
}
