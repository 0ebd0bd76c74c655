// ============================================================================
// SERVICE : IDENTITÉ (inscription, activation, login, reset password, profil)
// ============================================================================
//
// Points d'attention:
//   - Un compte est créé inactif, il est activé par le token envoyé par email
//   - Tokens (activation et reset) : usage unique, expirent 24h après création,
//     supprimés quand ils sont utilisés ou détectés expirés
//   - L'envoi d'email est best-effort : il a lieu APRÈS le commit et son
//     échec ne change pas le résultat de l'opération
//
// ============================================================================

use chrono::{Duration, NaiveDateTime, Utc};
use regex::Regex;
use sea_orm::*;
use std::sync::LazyLock;
use validator::ValidateEmail;

use crate::error::{AppError, AppResult};
use crate::models::dto::{ProfileUpdateRequest, RegisterRequest};
use crate::models::{activation_tokens, password_reset_tokens, users};
use crate::services::notification_service::Notifier;
use crate::utils::{jwt, password, tokens};

/// Numéro de mobile égyptien : 010, 011, 012, 015 + 8 chiffres (+20 ou 0 optionnel)
static EGYPTIAN_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+20|0)?1[0125][0-9]{8}$").expect("valid phone regex"));

pub const TOKEN_VALIDITY_HOURS: i64 = 24;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn is_valid_phone(phone: &str) -> bool {
    EGYPTIAN_PHONE.is_match(phone)
}

/// Règle commune au reset et au changement de mot de passe
pub fn check_new_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Un token est expiré quand now - created_at > 24h
pub fn is_token_expired(created_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    now - created_at > Duration::hours(TOKEN_VALIDITY_HOURS)
}

#[derive(Debug)]
pub struct RegisteredUser {
    pub user: users::Model,
    pub activation_email_sent: bool,
}

#[derive(Debug)]
pub struct PasswordResetRequested {
    pub token: password_reset_tokens::Model,
    pub email_sent: bool,
}

pub struct IdentityService;

impl IdentityService {
    /// Inscription. Ordre de validation : champs requis -> mots de passe identiques
    /// -> format email -> format téléphone -> email unique -> téléphone unique.
    /// Rien n'est écrit si une validation échoue.
    pub async fn register(
        db: &DatabaseConnection,
        notifier: &Notifier,
        request: RegisterRequest,
    ) -> AppResult<RegisteredUser> {
        // 1. Champs requis
        let (first_name, last_name, email, password_raw, confirm, phone) = match (
            non_empty(&request.first_name),
            non_empty(&request.last_name),
            non_empty(&request.email),
            non_empty(&request.password),
            non_empty(&request.confirm_password),
            non_empty(&request.mobile_phone),
        ) {
            (Some(f), Some(l), Some(e), Some(p), Some(c), Some(m)) => (f, l, e, p, c, m),
            _ => return Err(AppError::validation("All fields are required.")),
        };
        let email = email.to_lowercase();

        // 2. Mots de passe
        if password_raw != confirm {
            return Err(AppError::validation("Passwords do not match."));
        }

        // 3. Formats
        if !email.validate_email() {
            return Err(AppError::validation("Enter a valid email address."));
        }
        if !is_valid_phone(&phone) {
            return Err(AppError::validation("Enter a valid Egyptian mobile phone number."));
        }

        let password_hash = password::hash_password(&password_raw).map_err(AppError::Internal)?;

        let txn = db.begin().await?;

        // 4. Unicité email puis téléphone
        if users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(AppError::validation("Email already registered."));
        }
        if users::Entity::find()
            .filter(users::Column::MobilePhone.eq(&phone))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(AppError::validation("Mobile phone already registered."));
        }

        // 5. User inactif + token d'activation (même transaction)
        let now = Utc::now().naive_utc();
        let user = users::ActiveModel {
            username: Set(email.clone()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            first_name: Set(first_name),
            last_name: Set(last_name),
            mobile_phone: Set(phone),
            profile_picture: Set(non_empty(&request.profile_picture)),
            birthdate: Set(None),
            facebook_profile: Set(None),
            country: Set(None),
            is_active: Set(false),
            is_staff: Set(false),
            date_joined: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_unique_violation)?;

        let token = activation_tokens::ActiveModel {
            user_id: Set(user.id),
            token: Set(tokens::generate_token()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!(user_id = user.id, "user registered (inactive)");

        // 6. Email d'activation (best-effort)
        let link = notifier.activation_link(&token.token);
        let activation_email_sent = notifier.send_activation_email(&user, &link).await;

        Ok(RegisteredUser {
            user,
            activation_email_sent,
        })
    }

    /// Consomme un token d'activation. Token expiré : supprimé puis Expired.
    pub async fn activate(
        db: &DatabaseConnection,
        notifier: &Notifier,
        token: &str,
    ) -> AppResult<users::Model> {
        let activation = activation_tokens::Entity::find()
            .filter(activation_tokens::Column::Token.eq(token))
            .one(db)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Activation link is invalid or has already been used.")
            })?;

        if is_token_expired(activation.created_at, Utc::now().naive_utc()) {
            activation.delete(db).await?;
            return Err(AppError::Expired(
                "Activation link has expired. Please register again.".to_string(),
            ));
        }

        let txn = db.begin().await?;

        let user = users::Entity::find_by_id(activation.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;

        let mut active_user: users::ActiveModel = user.into();
        active_user.is_active = Set(true);
        let user = active_user.update(&txn).await?;

        // Le DELETE échoue à 0 ligne si une activation concurrente l'a déjà consommé
        let deleted = activation_tokens::Entity::delete_by_id(activation.id)
            .exec(&txn)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(AppError::not_found(
                "Activation link is invalid or has already been used.",
            ));
        }

        txn.commit().await?;
        tracing::info!(user_id = user.id, "account activated");

        // Email de bienvenue (best-effort)
        notifier.send_welcome_email(&user).await;

        Ok(user)
    }

    /// Login par email + mot de passe, retourne un JWT
    pub async fn login(
        db: &DatabaseConnection,
        jwt_secret: &str,
        email: &str,
        password_raw: &str,
    ) -> AppResult<(String, users::Model)> {
        let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await?
            .ok_or_else(invalid)?;

        let valid = password::verify_password(password_raw, &user.password_hash)
            .map_err(AppError::Internal)?;
        if !valid {
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AppError::permission(
                "Account not activated. Please check your email.",
            ));
        }

        let token = jwt::generate_token(user.id, &user.email, jwt_secret).map_err(AppError::Internal)?;
        Ok((token, user))
    }

    /// Crée un token de reset (remplace l'éventuel token précédent) et envoie l'email
    pub async fn request_password_reset(
        db: &DatabaseConnection,
        notifier: &Notifier,
        email: &str,
    ) -> AppResult<PasswordResetRequested> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("No user found with this email address."))?;

        let txn = db.begin().await?;

        password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;

        let token = password_reset_tokens::ActiveModel {
            user_id: Set(user.id),
            token: Set(tokens::generate_token()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        let link = notifier.password_reset_link(&token.token);
        let email_sent = notifier.send_password_reset_email(&user, &link).await;

        Ok(PasswordResetRequested { token, email_sent })
    }

    /// Change le mot de passe avec un token de reset (même règles que l'activation)
    pub async fn reset_password(
        db: &DatabaseConnection,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<users::Model> {
        let reset = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Invalid password reset link."))?;

        if is_token_expired(reset.created_at, Utc::now().naive_utc()) {
            reset.delete(db).await?;
            return Err(AppError::Expired("Password reset link has expired.".to_string()));
        }

        check_new_password(new_password)?;
        if new_password != confirm_password {
            return Err(AppError::validation("Passwords do not match."));
        }

        let password_hash = password::hash_password(new_password).map_err(AppError::Internal)?;

        let txn = db.begin().await?;

        let user = users::Entity::find_by_id(reset.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;

        let mut active_user: users::ActiveModel = user.into();
        active_user.password_hash = Set(password_hash);
        let user = active_user.update(&txn).await?;

        let deleted = password_reset_tokens::Entity::delete_by_id(reset.id)
            .exec(&txn)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(AppError::not_found("Invalid password reset link."));
        }

        txn.commit().await?;
        tracing::info!(user_id = user.id, "password reset");
        Ok(user)
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = Self::get_user(db, user_id).await?;

        if !password::verify_password(current_password, &user.password_hash).map_err(AppError::Internal)? {
            return Err(AppError::Unauthorized("Current password is incorrect.".to_string()));
        }
        check_new_password(new_password)?;

        let password_hash = password::hash_password(new_password).map_err(AppError::Internal)?;
        let mut active_user: users::ActiveModel = user.into();
        active_user.password_hash = Set(password_hash);
        active_user.update(db).await?;
        Ok(())
    }

    pub async fn get_user(db: &DatabaseConnection, user_id: i32) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))
    }

    /// Actions d'administration (catégories, projets mis en avant, signalements)
    pub async fn require_staff(db: &DatabaseConnection, user_id: i32) -> AppResult<users::Model> {
        let user = Self::get_user(db, user_id).await?;
        if !user.is_staff {
            return Err(AppError::permission("Staff access required."));
        }
        Ok(user)
    }

    /// Mise à jour du profil. Seuls les champs fournis sont modifiés.
    pub async fn update_profile(
        db: &DatabaseConnection,
        user_id: i32,
        request: ProfileUpdateRequest,
    ) -> AppResult<users::Model> {
        let user = Self::get_user(db, user_id).await?;

        if let Some(phone) = non_empty(&request.mobile_phone) {
            if !is_valid_phone(&phone) {
                return Err(AppError::validation("Enter a valid Egyptian mobile phone number."));
            }
            let taken = users::Entity::find()
                .filter(users::Column::MobilePhone.eq(&phone))
                .filter(users::Column::Id.ne(user_id))
                .one(db)
                .await?
                .is_some();
            if taken {
                return Err(AppError::validation("Mobile phone already registered."));
            }
        }

        let mut active_user: users::ActiveModel = user.into();
        if let Some(first_name) = non_empty(&request.first_name) {
            active_user.first_name = Set(first_name);
        }
        if let Some(last_name) = non_empty(&request.last_name) {
            active_user.last_name = Set(last_name);
        }
        if let Some(phone) = non_empty(&request.mobile_phone) {
            active_user.mobile_phone = Set(phone);
        }
        if let Some(picture) = non_empty(&request.profile_picture) {
            active_user.profile_picture = Set(Some(picture));
        }
        if let Some(birthdate) = request.birthdate {
            active_user.birthdate = Set(Some(birthdate));
        }
        if let Some(facebook) = non_empty(&request.facebook_profile) {
            active_user.facebook_profile = Set(Some(facebook));
        }
        if let Some(country) = non_empty(&request.country) {
            active_user.country = Set(Some(country));
        }

        let user = active_user.update(db).await.map_err(map_unique_violation)?;
        Ok(user)
    }

    /// Supprime le compte (et en cascade : projets, donations, notes, commentaires)
    pub async fn delete_account(
        db: &DatabaseConnection,
        user_id: i32,
        password_raw: &str,
    ) -> AppResult<()> {
        let user = Self::get_user(db, user_id).await?;

        if !password::verify_password(password_raw, &user.password_hash).map_err(AppError::Internal)? {
            return Err(AppError::Unauthorized("Incorrect password. Please try again.".to_string()));
        }

        user.delete(db).await?;
        tracing::info!(user_id, "account deleted");
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// Course entre deux inscriptions identiques : la contrainte UNIQUE tranche
fn map_unique_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::validation("Email or mobile phone already registered.")
        }
        _ => AppError::Database(err),
    }
}
