use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub username: String, // = email (login par email)
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)] // Ne jamais exposer le hash en JSON
    pub password_hash: String, // Format Django: pbkdf2_sha256$iterations$salt$hash
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub mobile_phone: String,
    pub profile_picture: Option<String>, // Référence vers le stockage externe
    pub birthdate: Option<Date>,
    pub facebook_profile: Option<String>,
    pub country: Option<String>,
    pub is_active: bool, // false jusqu'à l'activation par email
    pub is_staff: bool,
    pub date_joined: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::activation_tokens::Entity")]
    ActivationToken,

    #[sea_orm(has_one = "super::password_reset_tokens::Entity")]
    PasswordResetToken,

    #[sea_orm(has_many = "super::projects::Entity")]
    Projects,

    #[sea_orm(has_many = "super::donations::Entity")]
    Donations,
}

impl Related<super::activation_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivationToken.def()
    }
}

impl Related<super::password_reset_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PasswordResetToken.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::donations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
