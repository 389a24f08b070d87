//! HTTP handlers and route configuration.

mod health;
mod posts;
mod settings;
mod versions;
mod views;

use actix_web::web;

/// Configure all application routes.
///
/// Static segments (`/due`, `/publish-due`) are registered before the
/// `{id}` routes so they are matched first.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/due", web::get().to(posts::list_due))
                    .route("/publish-due", web::post().to(posts::publish_due))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete))
                    .route("/{id}/draft", web::delete().to(posts::delete_draft))
                    .route("/{id}/publish", web::post().to(posts::publish))
                    .route("/{id}/schedule", web::post().to(posts::schedule))
                    .route("/{id}/versions", web::get().to(versions::list))
                    .route("/{id}/versions", web::post().to(versions::create))
                    .route("/{id}/versions/{number}", web::get().to(versions::get))
                    .route(
                        "/{id}/versions/{number}/restore",
                        web::post().to(versions::restore),
                    )
                    .route("/{id}/views", web::get().to(views::count))
                    .route("/{id}/views", web::post().to(views::record)),
            )
            .service(
                web::scope("/settings")
                    .route("", web::get().to(settings::get))
                    .route("", web::put().to(settings::update)),
            ),
    );
}
