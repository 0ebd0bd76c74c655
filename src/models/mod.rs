// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - dto : Data Transfer Objects (requêtes et réponses API)
//   - users : Utilisateurs (inactifs jusqu'à l'activation)
//   - activation_tokens : Tokens d'activation de compte (expire 24h)
//   - password_reset_tokens : Tokens de reset password (expire 24h)
//   - categories : Catégories de projets (données de référence)
//   - projects : Projets de financement participatif
//   - project_images : Références des images d'un projet
//   - donations : Donations (ledger, immuables)
//   - ratings : Notes 1-5, une par (projet, user)
//   - comments : Commentaires, avec réponses (parent_comment_id)
//   - reports : Signalements de projets ou de commentaires
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les enfants sont en ON DELETE CASCADE (voir db::create_schema)
//
// ============================================================================

pub mod health;
pub mod dto;
pub mod users;
pub mod activation_tokens;
pub mod password_reset_tokens;
pub mod categories;
pub mod projects;
pub mod project_images;
pub mod donations;
pub mod ratings;
pub mod comments;
pub mod reports;
