use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    CommentRequest, CreateProjectRequest, DonateRequest, ProjectListQuery, ProjectResponse,
    RateRequest, ReportRequest,
};
use crate::services::catalog_service::CatalogService;
use crate::services::donation_service::DonationService;
use crate::services::engagement_service::EngagementService;
use crate::services::lifecycle_service::LifecycleService;

/// GET /projects?search=&category=&page= - Projets actifs paginés (PUBLIC)
#[get("")]
pub async fn list_projects(
    query: web::Query<ProjectListQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let page = CatalogService::list_projects(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /projects - Créer un projet (PROTÉGÉE)
#[post("")]
pub async fn create_project(
    auth_user: AuthUser,
    body: web::Json<CreateProjectRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let project = CatalogService::create_project(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ProjectResponse::from(&project)))
}

/// GET /projects/{id} - Détail d'un projet actif (PUBLIC)
#[get("/{id}")]
pub async fn project_detail(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let detail = CatalogService::project_detail(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /projects/{id}/donate - Faire un don (PROTÉGÉE)
#[post("/{id}/donate")]
pub async fn donate(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<DonateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let donation = DonationService::donate(
        db.get_ref(),
        path.into_inner(),
        auth_user.user_id,
        body.amount.as_deref().unwrap_or_default(),
        &body.message,
    )
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": format!("Thank you for your donation of {} EGP!", donation.amount),
        "donation": donation
    })))
}

/// POST /projects/{id}/rate - Noter un projet 1..5 (PROTÉGÉE)
#[post("/{id}/rate")]
pub async fn rate(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<RateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let rating = EngagementService::rate(db.get_ref(), path.into_inner(), auth_user.user_id, body.rating.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(rating))
}

/// POST /projects/{id}/comments - Commenter ou répondre (PROTÉGÉE)
#[post("/{id}/comments")]
pub async fn add_comment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CommentRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let comment = EngagementService::comment(
        db.get_ref(),
        path.into_inner(),
        auth_user.user_id,
        &body.content,
        body.parent_comment.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Created().json(comment))
}

/// POST /projects/{id}/report - Signaler un projet (PROTÉGÉE)
#[post("/{id}/report")]
pub async fn report_project(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ReportRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let report = EngagementService::report_project(db.get_ref(), path.into_inner(), auth_user.user_id, &body.reason)
        .await?;
    Ok(HttpResponse::Created().json(report))
}

/// POST /projects/{id}/cancel - Annuler son projet (< 25% de l'objectif) (PROTÉGÉE)
#[post("/{id}/cancel")]
pub async fn cancel_project(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let project = LifecycleService::cancel(db.get_ref(), path.into_inner(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(ProjectResponse::from(&project)))
}

pub fn project_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .service(list_projects)
            .service(create_project)
            .service(project_detail)
            .service(donate)
            .service(rate)
            .service(add_comment)
            .service(report_project)
            .service(cancel_project)
    );
}
