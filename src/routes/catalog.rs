use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::services::catalog_service::CatalogService;

/// GET /home - Mieux notés, derniers, mis en avant, catégories (PUBLIC)
#[get("/home")]
pub async fn home(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let home = CatalogService::home(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(home))
}

/// GET /categories (PUBLIC)
#[get("/categories")]
pub async fn list_categories(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let categories = CatalogService::list_categories(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}
