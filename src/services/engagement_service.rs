// ============================================================================
// SERVICE : ENGAGEMENT (notes, commentaires, signalements)
// ============================================================================
//
// - Note : 1 à 5, une seule par (projet, user), un second vote remplace le premier
// - Commentaire : contenu non vide après trim. Un parent introuvable dans ce
//   projet n'est pas une erreur, le commentaire est créé au premier niveau
// - Signalement : raison obligatoire, toujours créé non résolu, pas de dédoublonnage
//
// ============================================================================

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::models::reports::ReportKind;
use crate::models::{comments, projects, ratings, reports};
use crate::services::identity_service::IdentityService;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn parse_rating(raw: Option<&str>) -> AppResult<i32> {
    raw.and_then(|r| r.trim().parse::<i32>().ok())
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or_else(|| AppError::validation("Invalid rating value."))
}

async fn active_project<C: ConnectionTrait>(conn: &C, project_id: i32) -> AppResult<projects::Model> {
    projects::Entity::find_by_id(project_id)
        .filter(projects::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found."))
}

pub struct EngagementService;

impl EngagementService {
    /// Upsert sur (project_id, user_id) : INSERT ... ON CONFLICT DO UPDATE
    pub async fn rate(
        db: &DatabaseConnection,
        project_id: i32,
        user_id: i32,
        raw_rating: Option<&str>,
    ) -> AppResult<ratings::Model> {
        let value = parse_rating(raw_rating)?;

        let txn = db.begin().await?;
        let project = active_project(&txn, project_id).await?;

        let rating = ratings::ActiveModel {
            project_id: Set(project.id),
            user_id: Set(user_id),
            rating: Set(value),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        ratings::Entity::insert(rating)
            .on_conflict(
                OnConflict::columns([ratings::Column::ProjectId, ratings::Column::UserId])
                    .update_column(ratings::Column::Rating)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let saved = ratings::Entity::find()
            .filter(ratings::Column::ProjectId.eq(project.id))
            .filter(ratings::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("rating missing after upsert".to_string()))?;

        txn.commit().await?;

        tracing::debug!(project_id, user_id, rating = value, "rating saved");
        Ok(saved)
    }

    pub async fn comment(
        db: &DatabaseConnection,
        project_id: i32,
        user_id: i32,
        content: &str,
        parent_comment: Option<&str>,
    ) -> AppResult<comments::Model> {
        let project = active_project(db, project_id).await?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment cannot be empty."));
        }

        // Parent absent, invalide ou d'un autre projet -> premier niveau
        let parent_id = match parent_comment.and_then(|p| p.trim().parse::<i32>().ok()) {
            Some(id) => comments::Entity::find_by_id(id)
                .filter(comments::Column::ProjectId.eq(project.id))
                .one(db)
                .await?
                .map(|parent| parent.id),
            None => None,
        };

        let comment = comments::ActiveModel {
            project_id: Set(project.id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            parent_comment_id: Set(parent_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(comment)
    }

    /// Suppression par l'auteur uniquement (les réponses suivent en cascade)
    pub async fn delete_comment(db: &DatabaseConnection, comment_id: i32, user_id: i32) -> AppResult<()> {
        let comment = comments::Entity::find_by_id(comment_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found."))?;

        if comment.user_id != user_id {
            return Err(AppError::permission("You can only delete your own comments."));
        }

        comment.delete(db).await?;
        Ok(())
    }

    pub async fn report_project(
        db: &DatabaseConnection,
        project_id: i32,
        reporter_id: i32,
        reason: &str,
    ) -> AppResult<reports::Model> {
        let project = active_project(db, project_id).await?;
        Self::create_report(db, reporter_id, ReportKind::Project, Some(project.id), None, reason).await
    }

    pub async fn report_comment(
        db: &DatabaseConnection,
        comment_id: i32,
        reporter_id: i32,
        reason: &str,
    ) -> AppResult<reports::Model> {
        let comment = comments::Entity::find_by_id(comment_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found."))?;
        Self::create_report(db, reporter_id, ReportKind::Comment, None, Some(comment.id), reason).await
    }

    async fn create_report(
        db: &DatabaseConnection,
        reporter_id: i32,
        kind: ReportKind,
        project_id: Option<i32>,
        comment_id: Option<i32>,
        reason: &str,
    ) -> AppResult<reports::Model> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("Please provide a reason for reporting."));
        }

        let report = reports::ActiveModel {
            reporter_id: Set(reporter_id),
            report_type: Set(kind),
            project_id: Set(project_id),
            comment_id: Set(comment_id),
            reason: Set(reason.to_string()),
            is_resolved: Set(false),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(report_id = report.id, reporter_id, kind = ?kind, "report submitted");
        Ok(report)
    }

    pub async fn list_reports(
        db: &DatabaseConnection,
        actor_id: i32,
        unresolved_only: bool,
    ) -> AppResult<Vec<reports::Model>> {
        IdentityService::require_staff(db, actor_id).await?;

        let mut select = reports::Entity::find();
        if unresolved_only {
            select = select.filter(reports::Column::IsResolved.eq(false));
        }
        Ok(select
            .order_by_desc(reports::Column::CreatedAt)
            .order_by_desc(reports::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn resolve_report(db: &DatabaseConnection, actor_id: i32, report_id: i32) -> AppResult<reports::Model> {
        IdentityService::require_staff(db, actor_id).await?;

        let report = reports::Entity::find_by_id(report_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Report not found."))?;

        let mut active: reports::ActiveModel = report.into();
        active.is_resolved = Set(true);
        Ok(active.update(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, dec};

    #[test]
    fn test_parse_rating_range() {
        assert_eq!(parse_rating(Some("1")).unwrap(), 1);
        assert_eq!(parse_rating(Some(" 5 ")).unwrap(), 5);
        for raw in [Some("0"), Some("6"), Some("four"), Some("4.5"), None] {
            assert!(parse_rating(raw).is_err(), "{:?}", raw);
        }
    }

    #[tokio::test]
    async fn test_rating_upsert_keeps_one_row() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let user = test_support::create_user(&db, "fan@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("100")).await;

        EngagementService::rate(&db, project.id, user.id, Some("3")).await.unwrap();
        let second = EngagementService::rate(&db, project.id, user.id, Some("5")).await.unwrap();
        assert_eq!(second.rating, 5);

        let rows = ratings::Entity::find()
            .filter(ratings::Column::ProjectId.eq(project.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rating, 5);

        let invalid = EngagementService::rate(&db, project.id, user.id, Some("9")).await;
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_comment_rules() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("100")).await;
        let other = test_support::create_project(&db, creator.id, category.id, dec("100")).await;

        let empty = EngagementService::comment(&db, project.id, creator.id, "   ", None).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let top = EngagementService::comment(&db, project.id, creator.id, "  Great idea ", None).await.unwrap();
        assert_eq!(top.content, "Great idea");
        assert_eq!(top.parent_comment_id, None);

        let parent = top.id.to_string();
        let reply = EngagementService::comment(&db, project.id, creator.id, "Thanks", Some(parent.as_str()))
            .await
            .unwrap();
        assert_eq!(reply.parent_comment_id, Some(top.id));

        // Parent inconnu ou d'un autre projet : premier niveau, sans erreur
        let orphan = EngagementService::comment(&db, project.id, creator.id, "Lost", Some("9999")).await.unwrap();
        assert_eq!(orphan.parent_comment_id, None);
        let cross = EngagementService::comment(&db, other.id, creator.id, "Elsewhere", Some(parent.as_str()))
            .await
            .unwrap();
        assert_eq!(cross.parent_comment_id, None);

        // Supprimer le parent supprime la réponse
        let stranger = test_support::create_user(&db, "stranger@example.com", "01112345678").await;
        let refused = EngagementService::delete_comment(&db, top.id, stranger.id).await;
        assert!(matches!(refused, Err(AppError::Permission(_))));

        EngagementService::delete_comment(&db, top.id, creator.id).await.unwrap();
        assert!(comments::Entity::find_by_id(reply.id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reports_are_not_deduplicated() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let reporter = test_support::create_user(&db, "reporter@example.com", "01112345678").await;
        let staff = test_support::create_staff(&db, "admin@example.com", "01212345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("100")).await;

        let missing_reason = EngagementService::report_project(&db, project.id, reporter.id, " ").await;
        assert!(matches!(missing_reason, Err(AppError::Validation(_))));

        let first = EngagementService::report_project(&db, project.id, reporter.id, "Spam").await.unwrap();
        EngagementService::report_project(&db, project.id, reporter.id, "Spam").await.unwrap();
        assert!(!first.is_resolved);
        assert_eq!(first.report_type, ReportKind::Project);

        let comment = EngagementService::comment(&db, project.id, creator.id, "Buy now", None).await.unwrap();
        let on_comment = EngagementService::report_comment(&db, comment.id, reporter.id, "Ad").await.unwrap();
        assert_eq!(on_comment.comment_id, Some(comment.id));
        assert_eq!(on_comment.project_id, None);

        let refused = EngagementService::list_reports(&db, reporter.id, false).await;
        assert!(matches!(refused, Err(AppError::Permission(_))));

        assert_eq!(EngagementService::list_reports(&db, staff.id, true).await.unwrap().len(), 3);
        let resolved = EngagementService::resolve_report(&db, staff.id, first.id).await.unwrap();
        assert!(resolved.is_resolved);
        assert_eq!(EngagementService::list_reports(&db, staff.id, true).await.unwrap().len(), 2);
        assert_eq!(EngagementService::list_reports(&db, staff.id, false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_engagement_requires_active_project() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("100")).await;

        let mut active: projects::ActiveModel = project.clone().into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let rate = EngagementService::rate(&db, project.id, creator.id, Some("4")).await;
        assert!(matches!(rate, Err(AppError::NotFound(_))));
        let comment = EngagementService::comment(&db, project.id, creator.id, "hi", None).await;
        assert!(matches!(comment, Err(AppError::NotFound(_))));
        let report = EngagementService::report_project(&db, project.id, creator.id, "spam").await;
        assert!(matches!(report, Err(AppError::NotFound(_))));
    }
}
