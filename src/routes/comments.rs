use actix_web::{delete, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::ReportRequest;
use crate::services::engagement_service::EngagementService;

/// POST /comments/{id}/report - Signaler un commentaire (PROTÉGÉE)
#[post("/{id}/report")]
pub async fn report_comment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<ReportRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let report = EngagementService::report_comment(db.get_ref(), path.into_inner(), auth_user.user_id, &body.reason)
        .await?;
    Ok(HttpResponse::Created().json(report))
}

/// DELETE /comments/{id} - Supprimer son commentaire (PROTÉGÉE)
#[delete("/{id}")]
pub async fn delete_comment(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    EngagementService::delete_comment(db.get_ref(), path.into_inner(), auth_user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/comments")
            .service(report_comment)
            .service(delete_comment)
    );
}
