// ============================================================================
// MODÈLE : PASSWORD RESET TOKENS
// ============================================================================
//
// Description:
//   Même contrat que activation_tokens (24h, usage unique, supprimé après
//   usage) mais le token autorise un changement de mot de passe.
//
// Colonnes de la table password_reset_tokens:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - user_id (INTEGER, UNIQUE, NOT NULL, FK vers users)
//   - token (VARCHAR, UNIQUE, NOT NULL)
//   - created_at (TIMESTAMP, NOT NULL)
//
// Workflow:
//   1. User demande reset via POST /api/auth/forgot-password
//   2. Backend remplace l'ancien token éventuel par un nouveau
//   3. Backend envoie email avec lien contenant le token
//   4. Frontend envoie POST /api/auth/reset-password/{token} + nouveau password
//   5. Backend vérifie: token existe, pas expiré
//   6. Backend change le password et supprime le token
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,

    #[sea_orm(unique)]
    pub token: String,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
