// ============================================================================
// MODÈLE : ACTIVATION TOKENS
// ============================================================================
//
// Description:
//   Token d'activation de compte envoyé par email à l'inscription.
//
// Colonnes de la table activation_tokens:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - user_id (INTEGER, UNIQUE, NOT NULL, FK vers users) - un seul token par user
//   - token (VARCHAR, UNIQUE, NOT NULL) - 48 caractères alphanumériques
//   - created_at (TIMESTAMP, NOT NULL)
//
// Workflow:
//   1. User s'inscrit via POST /api/auth/register
//   2. Backend crée le user avec is_active = false
//   3. Backend génère le token et l'insère dans cette table (même transaction)
//   4. Backend envoie email avec lien contenant le token
//   5. User clique sur le lien -> GET /api/auth/activate/{token}
//   6. Token expiré (> 24h) : supprimé, erreur "expired"
//   7. Sinon : users.is_active = true et le token est supprimé
//
// Points d'attention:
//   - Un token ne sert qu'une fois (supprimé après usage)
//   - L'expiration est calculée depuis created_at, pas stockée
//   - ON DELETE CASCADE: si user supprimé, token supprimé aussi
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activation_tokens")]
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
