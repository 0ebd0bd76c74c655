use actix_web::{get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{DeleteAccountRequest, ProfileResponse, ProfileUpdateRequest, ProjectResponse};
use crate::services::catalog_service::CatalogService;
use crate::services::donation_service::DonationService;
use crate::services::identity_service::IdentityService;

/// GET /profile - Profil + projets actifs + donations de l'utilisateur (PROTÉGÉE)
#[get("")]
pub async fn get_profile(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = IdentityService::get_user(db.get_ref(), auth_user.user_id).await?;
    let projects = CatalogService::projects_for_creator(db.get_ref(), user.id).await?;
    let donations = DonationService::donations_for_user(db.get_ref(), user.id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user,
        projects: projects.iter().map(ProjectResponse::from).collect(),
        donations,
    }))
}

/// PUT /profile - Modifier son profil (PROTÉGÉE)
#[put("")]
pub async fn update_profile(
    auth_user: AuthUser,
    body: web::Json<ProfileUpdateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let user = IdentityService::update_profile(db.get_ref(), auth_user.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(user))
}

/// POST /profile/delete - Supprimer son compte, mot de passe requis (PROTÉGÉE)
#[post("/delete")]
pub async fn delete_account(
    auth_user: AuthUser,
    body: web::Json<DeleteAccountRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    IdentityService::delete_account(db.get_ref(), auth_user.user_id, &body.password).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Your account has been deleted successfully."
    })))
}

pub fn profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(get_profile)
            .service(update_profile)
            .service(delete_account)
    );
}
