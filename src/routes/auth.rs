use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    RegisterResponse, ResetPasswordRequest,
};
use crate::services::identity_service::IdentityService;
use crate::services::notification_service::Notifier;

/// POST /auth/register - Créer un compte inactif + envoyer le lien d'activation (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, AppError> {
    let registered = IdentityService::register(db.get_ref(), notifier.get_ref(), body.into_inner()).await?;

    let message = if registered.activation_email_sent {
        "Registration successful. Please check your email to activate your account."
    } else {
        "Registration successful, but the activation email could not be sent. Please contact support."
    };

    Ok(HttpResponse::Created().json(RegisterResponse {
        user: registered.user,
        activation_email_sent: registered.activation_email_sent,
        message: message.to_string(),
    }))
}

/// GET /auth/activate/{token} - Activer le compte (PUBLIC)
#[get("/activate/{token}")]
pub async fn activate(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, AppError> {
    let user = IdentityService::activate(db.get_ref(), notifier.get_ref(), &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Your account has been activated. You can now log in.",
        "user_id": user.id
    })))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let (token, user) = IdentityService::login(db.get_ref(), &config.jwt_secret, &body.email, &body.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
        email: user.email,
    }))
}

/// POST /auth/forgot-password - Envoyer un lien de reset (PUBLIC)
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, AppError> {
    let requested = IdentityService::request_password_reset(db.get_ref(), notifier.get_ref(), &body.email).await?;

    // Le token reste valide même si l'envoi échoue
    let message = if requested.email_sent {
        "A password reset link has been sent to your email."
    } else {
        "A password reset link was created, but the email could not be sent. Please try again later."
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "email_sent": requested.email_sent,
        "message": message
    })))
}

/// POST /auth/reset-password/{token} - Choisir un nouveau mot de passe (PUBLIC)
#[post("/reset-password/{token}")]
pub async fn reset_password(
    path: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    IdentityService::reset_password(db.get_ref(), &path.into_inner(), &body.password, &body.confirm_password).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password reset successfully. You can now login with your new password."
    })))
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth_user)
}

/// POST /auth/change-password - Changer son mot de passe (PROTÉGÉE)
#[post("/change-password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    IdentityService::change_password(db.get_ref(), auth_user.user_id, &body.current_password, &body.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(activate)
            .service(login)
            .service(forgot_password)
            .service(reset_password)
            .service(me)
            .service(change_password)
    );
}
