pub mod admin;
pub mod auth;
pub mod catalog;
pub mod comments;
pub mod health;
pub mod profile;
pub mod projects;

use actix_web::web;

use crate::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Corps ou query string illisibles : même format d'erreur que le reste de l'API
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| AppError::validation(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| AppError::validation(err.to_string()).into());

    cfg.service(
        web::scope("/api")
            .app_data(json_config)
            .app_data(query_config)
            .service(health::health_check)
            .service(catalog::home)
            .service(catalog::list_categories)
            .configure(auth::auth_routes)
            .configure(profile::profile_routes)
            .configure(projects::project_routes)
            .configure(comments::comment_routes)
            .configure(admin::admin_routes)
    );
}
