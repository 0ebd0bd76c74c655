use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateCategoryRequest, FeatureRequest, ProjectResponse, ReportListQuery};
use crate::services::catalog_service::CatalogService;
use crate::services::engagement_service::EngagementService;

// Toutes ces routes exigent un compte staff (vérifié par les services)

/// POST /admin/categories - Créer une catégorie
#[post("/categories")]
pub async fn create_category(
    auth_user: AuthUser,
    body: web::Json<CreateCategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let category =
        CatalogService::create_category(db.get_ref(), auth_user.user_id, &body.name, &body.description).await?;
    Ok(HttpResponse::Created().json(category))
}

/// POST /admin/projects/{id}/feature - Mettre en avant (ou non) un projet
#[post("/projects/{id}/feature")]
pub async fn set_featured(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<FeatureRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let project =
        CatalogService::set_featured(db.get_ref(), auth_user.user_id, path.into_inner(), body.is_featured).await?;
    Ok(HttpResponse::Ok().json(ProjectResponse::from(&project)))
}

/// GET /admin/reports?unresolved=true - Signalements, plus récents d'abord
#[get("/reports")]
pub async fn list_reports(
    auth_user: AuthUser,
    query: web::Query<ReportListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let reports = EngagementService::list_reports(db.get_ref(), auth_user.user_id, query.unresolved).await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// POST /admin/reports/{id}/resolve - Marquer un signalement comme traité
#[post("/reports/{id}/resolve")]
pub async fn resolve_report(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let report = EngagementService::resolve_report(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(create_category)
            .service(set_featured)
            .service(list_reports)
            .service(resolve_report)
    );
}
