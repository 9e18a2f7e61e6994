use paperclip::actix::web;

use crate::handlers;

/// Rejects unparsable path segments such as `/v1/authors/abc` with 400
pub fn path_config() -> actix_web::web::PathConfig {
    actix_web::web::PathConfig::default()
        .error_handler(|err, _req| actix_web::error::ErrorBadRequest(err))
}

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/v1")
                .service(
                    web::resource("/authors")
                        .route(web::post().to(handlers::create_author))
                        .route(web::get().to(handlers::list_authors)),
                )
                .service(
                    web::resource("/authors/{author_id}")
                        .route(web::get().to(handlers::get_author))
                        .route(web::put().to(handlers::full_update_author))
                        .route(web::patch().to(handlers::partial_update_author))
                        .route(web::delete().to(handlers::delete_author)),
                )
                .service(web::resource("/books").route(web::get().to(handlers::list_books)))
                .service(
                    web::resource("/books/{isbn}")
                        .route(web::put().to(handlers::create_update_book))
                        .route(web::get().to(handlers::get_book))
                        .route(web::patch().to(handlers::partial_update_book))
                        .route(web::delete().to(handlers::delete_book)),
                ),
        );
}
