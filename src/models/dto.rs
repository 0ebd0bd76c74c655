//pour les requêtes et les réponses structurées
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::{categories, donations, users};

// Les formulaires envoient des nombres tantôt en string, tantôt en nombre JSON :
// on garde la valeur brute en string, le parsing (et son message d'erreur) est fait
// par les services dans l'ordre de validation attendu
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ----------------------------------------------------------------------------
// Identité
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub mobile_phone: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password cannot be empty"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 150))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub last_name: Option<String>,
    pub mobile_phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    #[validate(url(message = "Invalid Facebook profile URL"))]
    pub facebook_profile: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: users::Model,
    pub activation_email_sent: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: users::Model,
    pub projects: Vec<ProjectResponse>,
    pub donations: Vec<donations::Model>,
}

// ----------------------------------------------------------------------------
// Catalogue
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub details: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub total_target: Option<String>,
    pub tags: Option<String>,
    pub start_date: Option<String>, // YYYY-MM-DD
    pub end_date: Option<String>,   // YYYY-MM-DD
    #[serde(default)]
    pub images: Vec<String>, // références, dans l'ordre d'arrivée
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    pub is_featured: bool,
}

/// Projet tel qu'exposé par l'API (avec les valeurs calculées du cycle de vie)
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: i32,
    pub creator_id: i32,
    pub category_id: i32,
    pub title: String,
    pub details: String,
    pub total_target: Decimal,
    pub current_amount: Decimal,
    pub tags: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub is_featured: bool,
    pub status: String,
    pub progress_percent: Decimal,
    pub can_cancel: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub items: Vec<ProjectResponse>,
    pub page: u64,
    pub num_pages: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub replies: Vec<CommentThread>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    pub project: ProjectResponse,
    pub images: Vec<String>,
    pub avg_rating: f64,
    pub similar_projects: Vec<ProjectResponse>,
    pub comments: Vec<CommentThread>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub highest_rated: Vec<ProjectResponse>,
    pub latest: Vec<ProjectResponse>,
    pub featured: Vec<ProjectResponse>,
    pub categories: Vec<categories::Model>,
}

// ----------------------------------------------------------------------------
// Ledger + engagement
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DonateRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RateRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub parent_comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportListQuery {
    #[serde(default)]
    pub unresolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_accepts_string_or_number() {
        let a: DonateRequest = serde_json::from_str(r#"{"amount": "12.50"}"#).unwrap();
        assert_eq!(a.amount.as_deref(), Some("12.50"));

        let b: DonateRequest = serde_json::from_str(r#"{"amount": 7.25, "message": "go"}"#).unwrap();
        assert_eq!(b.amount.as_deref(), Some("7.25"));
        assert_eq!(b.message, "go");

        let c: DonateRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(c.amount, None);
    }

    #[test]
    fn test_profile_update_rejects_bad_url() {
        let req = ProfileUpdateRequest {
            facebook_profile: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
