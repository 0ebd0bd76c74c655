use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::error::{AppError, AppResult};
use crate::models::{donations, projects};
use crate::utils::money;

/// UPDATE projects SET current_amount = current_amount + amount, calculé par la base
/// et limité aux projets actifs
pub fn credit_project(
    project_id: i32,
    amount: Decimal,
    now: NaiveDateTime,
) -> UpdateMany<projects::Entity> {
    projects::Entity::update_many()
        .col_expr(
            projects::Column::CurrentAmount,
            Expr::col(projects::Column::CurrentAmount).add(amount),
        )
        .col_expr(projects::Column::UpdatedAt, Expr::value(now))
        .filter(projects::Column::Id.eq(project_id))
        .filter(projects::Column::IsActive.eq(true))
}

pub struct DonationService;

impl DonationService {
    /// Enregistre une donation et incrémente projects.current_amount.
    ///
    /// Les deux écritures sont dans la même transaction : aucun lecteur ne voit
    /// la donation sans le total à jour (ou l'inverse). L'incrément est fait en SQL
    /// (current_amount = current_amount + montant), jamais à partir d'une valeur
    /// lue avant, pour ne perdre aucune donation concurrente.
    pub async fn donate(
        db: &DatabaseConnection,
        project_id: i32,
        donor_id: i32,
        raw_amount: &str,
        message: &str,
    ) -> AppResult<donations::Model> {
        // 1. Valider le montant (> 0, 2 décimales max)
        let amount = money::parse_amount(raw_amount)
            .map_err(|_| AppError::validation("Invalid donation amount."))?;
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("Invalid donation amount."));
        }

        let txn = db.begin().await?;

        // 2. Le projet doit exister et être actif
        let project = projects::Entity::find_by_id(project_id)
            .filter(projects::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found."))?;

        // 3. Insérer la donation
        let donation = donations::ActiveModel {
            project_id: Set(project.id),
            donor_id: Set(donor_id),
            amount: Set(amount),
            message: Set(message.trim().to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 4. Incrément atomique du total (toujours actif : sinon tout est annulé)
        let updated = credit_project(project.id, amount, Utc::now().naive_utc())
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            return Err(AppError::not_found("Project not found."));
        }

        txn.commit().await?;

        tracing::info!(
            project_id = project.id,
            donor_id,
            amount = %amount,
            "donation recorded"
        );
        Ok(donation)
    }

    /// Donations d'un utilisateur, plus récentes d'abord (page profil)
    pub async fn donations_for_user(
        db: &DatabaseConnection,
        donor_id: i32,
    ) -> Result<Vec<donations::Model>, DbErr> {
        donations::Entity::find()
            .filter(donations::Column::DonorId.eq(donor_id))
            .order_by_desc(donations::Column::CreatedAt)
            .order_by_desc(donations::Column::Id)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, dec};

    /// Somme des donations d'un projet, recalculée depuis le ledger
    async fn ledger_total(db: &DatabaseConnection, project_id: i32) -> Decimal {
        donations::Entity::find()
            .filter(donations::Column::ProjectId.eq(project_id))
            .all(db)
            .await
            .unwrap()
            .iter()
            .map(|d| d.amount)
            .sum()
    }

    #[test]
    fn test_credit_is_computed_in_sql() {
        let sql = credit_project(7, dec("12.50"), Utc::now().naive_utc())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.starts_with("UPDATE \"projects\""), "{}", sql);
        assert!(sql.contains("\"current_amount\" = \"current_amount\" +"), "{}", sql);
        assert!(sql.contains("\"id\" = 7"), "{}", sql);
        assert!(sql.contains("\"is_active\""), "{}", sql);
    }

    #[tokio::test]
    async fn test_credit_ignores_stale_snapshot() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let donor = test_support::create_user(&db, "donor@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("500")).await;

        // Lecture faite avant une donation concurrente
        let snapshot = projects::Entity::find_by_id(project.id).one(&db).await.unwrap().unwrap();
        assert_eq!(snapshot.current_amount, Decimal::ZERO);

        DonationService::donate(&db, project.id, donor.id, "30", "").await.unwrap();

        let updated = credit_project(snapshot.id, dec("20"), Utc::now().naive_utc())
            .exec(&db)
            .await
            .unwrap();
        assert_eq!(updated.rows_affected, 1);

        let reloaded = projects::Entity::find_by_id(project.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.current_amount, dec("50"));
    }

    #[tokio::test]
    async fn test_donate_updates_total() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let donor = test_support::create_user(&db, "donor@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("500")).await;

        let donation = DonationService::donate(&db, project.id, donor.id, "12.50", "Good luck").await.unwrap();
        assert_eq!(donation.amount, dec("12.50"));
        assert_eq!(donation.message, "Good luck");

        DonationService::donate(&db, project.id, donor.id, "7.25", "").await.unwrap();

        let reloaded = projects::Entity::find_by_id(project.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.current_amount, dec("19.75"));
        assert_eq!(
            ledger_total(&db, project.id).await,
            reloaded.current_amount
        );
    }

    #[tokio::test]
    async fn test_many_donations_sum_exactly() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let donor = test_support::create_user(&db, "donor@example.com", "01112345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("1000")).await;

        let amounts = ["10", "20.50", "5.25", "100", "0.25", "64"];
        let futures = amounts
            .iter()
            .map(|a| DonationService::donate(&db, project.id, donor.id, a, ""));
        for result in futures::future::join_all(futures).await {
            result.unwrap();
        }

        let expected: Decimal = amounts.iter().map(|a| dec(a)).sum();
        let reloaded = projects::Entity::find_by_id(project.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.current_amount, expected);
        assert_eq!(ledger_total(&db, project.id).await, expected);
    }

    #[tokio::test]
    async fn test_donate_rejects_invalid_amounts() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("1000")).await;

        for raw in ["0", "-10", "abc", "", "1.001"] {
            let result = DonationService::donate(&db, project.id, creator.id, raw, "").await;
            assert!(matches!(result, Err(AppError::Validation(_))), "amount {:?}", raw);
        }

        let count = donations::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_donate_to_cancelled_project_is_refused() {
        let db = test_support::setup_db().await;
        let creator = test_support::create_user(&db, "owner@example.com", "01012345678").await;
        let category = test_support::create_category(&db, "Technology").await;
        let project = test_support::create_project(&db, creator.id, category.id, dec("1000")).await;

        let mut active: projects::ActiveModel = project.clone().into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let result = DonationService::donate(&db, project.id, creator.id, "10", "").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(donations::Entity::find().count(&db).await.unwrap(), 0);
    }
}
