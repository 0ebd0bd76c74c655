// Outils partagés par les tests : base SQLite en mémoire + fixtures

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::db;
use crate::models::{categories, projects, users};
use crate::services::notification_service::{Mailer, Notifier, OutgoingEmail};
use crate::utils::password;

pub const TEST_PASSWORD: &str = "password123";

/// Base SQLite en mémoire avec le schéma complet.
/// Une seule connexion : chaque connexion SQLite en mémoire a sa propre base.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("sqlite connection");
    db::create_schema(&db).await.expect("schema creation");
    db
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal literal")
}

/// Utilisateur déjà activé, mot de passe TEST_PASSWORD
pub async fn create_user(db: &DatabaseConnection, email: &str, phone: &str) -> users::Model {
    users::ActiveModel {
        username: Set(email.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password::hash_password(TEST_PASSWORD).expect("hash")),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        mobile_phone: Set(phone.to_string()),
        profile_picture: Set(None),
        birthdate: Set(None),
        facebook_profile: Set(None),
        country: Set(None),
        is_active: Set(true),
        is_staff: Set(false),
        date_joined: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn create_staff(db: &DatabaseConnection, email: &str, phone: &str) -> users::Model {
    let user = create_user(db, email, phone).await;
    let mut active: users::ActiveModel = user.into();
    active.is_staff = Set(true);
    active.update(db).await.expect("promote staff")
}

pub async fn create_category(db: &DatabaseConnection, name: &str) -> categories::Model {
    categories::ActiveModel {
        name: Set(name.to_string()),
        description: Set(format!("{} projects", name)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert category")
}

/// Projet actif qui commence aujourd'hui et dure 30 jours
pub async fn create_project(
    db: &DatabaseConnection,
    creator_id: i32,
    category_id: i32,
    target: Decimal,
) -> projects::Model {
    create_project_with(db, creator_id, category_id, target, "Smart Water System", "iot, water").await
}

pub async fn create_project_with(
    db: &DatabaseConnection,
    creator_id: i32,
    category_id: i32,
    target: Decimal,
    title: &str,
    tags: &str,
) -> projects::Model {
    let now = Utc::now().naive_utc();
    projects::ActiveModel {
        creator_id: Set(creator_id),
        category_id: Set(category_id),
        title: Set(title.to_string()),
        details: Set(format!("Details about {}", title)),
        total_target: Set(target),
        current_amount: Set(Decimal::ZERO),
        tags: Set(tags.to_string()),
        start_date: Set(now),
        end_date: Set(now + Duration::days(30)),
        is_featured: Set(false),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert project")
}

/// Projet en mémoire (sans base) pour tester les règles pures
pub fn project_with_amounts(target: Decimal, current: Decimal) -> projects::Model {
    let now = Utc::now().naive_utc();
    projects::Model {
        id: 1,
        creator_id: 1,
        category_id: 1,
        title: "Project".to_string(),
        details: "Details".to_string(),
        total_target: target,
        current_amount: current,
        tags: String::new(),
        start_date: now,
        end_date: now + Duration::days(10),
        is_featured: false,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_user(id: i32, email: &str) -> users::Model {
    users::Model {
        id,
        username: email.to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        first_name: "Mona".to_string(),
        last_name: "Hassan".to_string(),
        mobile_phone: "01012345678".to_string(),
        profile_picture: None,
        birthdate: None,
        facebook_profile: None,
        country: None,
        is_active: false,
        is_staff: false,
        date_joined: Utc::now().naive_utc(),
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        self.sent.lock().expect("mailer lock").push(email.clone());
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), String> {
        Err("SMTP server unavailable".to_string())
    }
}

pub fn recording_notifier() -> (Notifier, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let notifier = Notifier::new(mailer.clone(), "http://site.test", "no-reply@site.test");
    (notifier, mailer)
}

pub fn failing_notifier() -> Notifier {
    Notifier::new(Arc::new(FailingMailer), "http://site.test", "no-reply@site.test")
}

/// Extrait le token du dernier lien envoyé (".../activate/<token>")
pub fn token_from_last_email(mailer: &RecordingMailer) -> String {
    let sent = mailer.sent();
    let last = sent.last().expect("an email was sent");
    last.text
        .split_whitespace()
        .find(|word| word.starts_with("http://site.test/api/auth/"))
        .and_then(|link| link.rsplit('/').next())
        .expect("link in email")
        .to_string()
}
