use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::models::dto::ProjectResponse;
use crate::models::projects;

/// Seuil (en %) à partir duquel un projet ne peut plus être annulé
pub const CANCEL_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Active -> Cancelled est la seule transition (Cancelled est terminal).
/// end_date n'entraîne aucune transition automatique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectState {
    Active,
    Cancelled,
}

impl ProjectState {
    pub fn of(project: &projects::Model) -> Self {
        if project.is_active {
            ProjectState::Active
        } else {
            ProjectState::Cancelled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::Active => "active",
            ProjectState::Cancelled => "cancelled",
        }
    }
}

/// min(current / target * 100, 100), 0 si l'objectif est nul
pub fn progress_percent(project: &projects::Model) -> Decimal {
    if project.total_target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let percent = project.current_amount / project.total_target * Decimal::ONE_HUNDRED;
    percent.min(Decimal::ONE_HUNDRED)
}

pub fn can_cancel(project: &projects::Model) -> bool {
    progress_percent(project) < CANCEL_THRESHOLD_PERCENT
}

pub struct LifecycleService;

impl LifecycleService {
    /// Annule un projet (soft delete : is_active = false).
    /// Donations, notes et commentaires restent attachés.
    pub async fn cancel(
        db: &DatabaseConnection,
        project_id: i32,
        requester_id: i32,
    ) -> AppResult<projects::Model> {
        let txn = db.begin().await?;

        let project = projects::Entity::find_by_id(project_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found."))?;

        if project.creator_id != requester_id {
            return Err(AppError::permission(
                "You do not have permission to cancel this project.",
            ));
        }

        if !project.is_active {
            return Err(AppError::permission("Project is already cancelled."));
        }

        if !can_cancel(&project) {
            return Err(AppError::permission(
                "Project cannot be cancelled. It has reached 25% or more of its target.",
            ));
        }

        // Le montant peut avoir bougé depuis la lecture : la condition est
        // re-vérifiée dans le WHERE de l'UPDATE
        let limit = project.total_target * CANCEL_THRESHOLD_PERCENT / Decimal::ONE_HUNDRED;
        let mut update = projects::Entity::update_many()
            .col_expr(projects::Column::IsActive, Expr::value(false))
            .col_expr(projects::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
            .filter(projects::Column::Id.eq(project_id))
            .filter(projects::Column::IsActive.eq(true));
        if project.total_target > Decimal::ZERO {
            update = update.filter(projects::Column::CurrentAmount.lt(limit));
        }
        let result = update.exec(&txn).await?;

        if result.rows_affected == 0 {
            return Err(AppError::permission(
                "Project cannot be cancelled. It has reached 25% or more of its target.",
            ));
        }

        let cancelled = projects::Entity::find_by_id(project_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found."))?;

        txn.commit().await?;

        tracing::info!(project_id, requester_id, "project cancelled");
        Ok(cancelled)
    }
}

impl From<&projects::Model> for ProjectResponse {
    fn from(p: &projects::Model) -> Self {
        ProjectResponse {
            id: p.id,
            creator_id: p.creator_id,
            category_id: p.category_id,
            title: p.title.clone(),
            details: p.details.clone(),
            total_target: p.total_target,
            current_amount: p.current_amount,
            tags: p.tags.clone(),
            start_date: p.start_date,
            end_date: p.end_date,
            is_featured: p.is_featured,
            status: ProjectState::of(p).as_str().to_string(),
            progress_percent: progress_percent(p).round_dp(2),
            can_cancel: p.is_active && can_cancel(p),
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::donation_service::DonationService;
    use crate::test_support::{self, dec, project_with_amounts};

    #[test]
    fn test_progress_is_capped_at_100() {
        let p = project_with_amounts(dec("100"), dec("150"));
        assert_eq!(progress_percent(&p), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_progress_zero_target() {
        let p = project_with_amounts(Decimal::ZERO, dec("50"));
        assert_eq!(progress_percent(&p), Decimal::ZERO);
        assert!(can_cancel(&p));
    }

    #[test]
    fn test_cancel_threshold_boundary() {
        let at_25 = project_with_amounts(dec("100"), dec("25"));
        assert_eq!(progress_percent(&at_25), dec("25"));
        assert!(!can_cancel(&at_25));

        let below = project_with_amounts(dec("100"), dec("24.99"));
        assert_eq!(progress_percent(&below), dec("24.99"));
        assert!(can_cancel(&below));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut previous = Decimal::ZERO;
        for amount in ["0", "10", "10.01", "60", "99.99", "100", "250"] {
            let p = project_with_amounts(dec("100"), dec(amount));
            let current = progress_percent(&p);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_response_exposes_state() {
        let mut p = project_with_amounts(dec("200"), dec("20"));
        let response = ProjectResponse::from(&p);
        assert_eq!(response.status, "active");
        assert_eq!(response.progress_percent, dec("10"));
        assert!(response.can_cancel);

        p.is_active = false;
        let response = ProjectResponse::from(&p);
        assert_eq!(response.status, "cancelled");
        assert!(!response.can_cancel);
    }

    #[tokio::test]
    async fn test_cancel_by_creator_is_soft_delete() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let donor = test_support::create_user(&db, "donor@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("1000")).await;

        DonationService::donate(&db, project.id, donor.id, "100", "").await.unwrap();

        let cancelled = LifecycleService::cancel(&db, project.id, creator.id).await.unwrap();
        assert!(!cancelled.is_active);

        // Toujours en base avec sa donation
        let donations = crate::models::donations::Entity::find()
            .filter(crate::models::donations::Column::ProjectId.eq(project.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(donations, 1);

        // Terminal
        let again = LifecycleService::cancel(&db, project.id, creator.id).await;
        assert!(matches!(again, Err(AppError::Permission(_))));
    }

    #[tokio::test]
    async fn test_cancel_refused_for_other_user() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let other = test_support::create_user(&db, "other@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Education").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("1000")).await;

        let result = LifecycleService::cancel(&db, project.id, other.id).await;
        assert!(matches!(result, Err(AppError::Permission(_))));

        let missing = LifecycleService::cancel(&db, 9999, creator.id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_refused_at_threshold() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let donor = test_support::create_user(&db, "donor@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Healthcare").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("100")).await;

        DonationService::donate(&db, project.id, donor.id, "25", "").await.unwrap();

        let result = LifecycleService::cancel(&db, project.id, creator.id).await;
        assert!(matches!(result, Err(AppError::Permission(_))));

        let still_active = projects::Entity::find_by_id(project.id).one(&db).await.unwrap().unwrap();
        assert!(still_active.is_active);
    }
}
