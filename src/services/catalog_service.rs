// ============================================================================
// SERVICE : CATALOGUE (catégories + projets)
// ============================================================================
//
// Création d'un projet, ordre de validation (la première erreur gagne):
//   1. champs requis
//   2. catégorie existante
//   3. montant cible numérique
//   4. dates au format YYYY-MM-DD
//   5. end_date > start_date
//   6. start_date >= aujourd'hui
//
// Lectures publiques : seuls les projets actifs sont visibles.
//
// ============================================================================

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::*;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::dto::{
    CommentThread, CreateProjectRequest, HomeResponse, ProjectDetail, ProjectListQuery,
    ProjectPage, ProjectResponse,
};
use crate::models::{categories, comments, project_images, projects, ratings};
use crate::services::identity_service::IdentityService;
use crate::utils::money;

pub const PAGE_SIZE: u64 = 12;
const HOME_SECTION_SIZE: usize = 5;
const SIMILAR_PROJECTS: u64 = 4;

pub const DEFAULT_CATEGORIES: [(&str, &str); 7] = [
    ("Technology", "Innovative tech projects and startups"),
    ("Education", "Educational initiatives and learning projects"),
    ("Healthcare", "Medical and health-related projects"),
    ("Environment", "Environmental and sustainability projects"),
    ("Arts & Culture", "Creative and cultural projects"),
    ("Business", "Business and entrepreneurship projects"),
    ("Social Impact", "Projects that create positive social change"),
];

/// Échappe les jokers LIKE (% _ \) d'une saisie utilisateur
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Page demandée -> page servie (1 si absente/invalide, dernière si trop grande)
pub fn resolve_page(raw: Option<&str>, num_pages: u64) -> u64 {
    let requested = raw
        .and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    requested.min(num_pages.max(1))
}

fn parse_day(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Étapes 5 et 6 de la validation (dates déjà parsées, minuit UTC)
pub fn check_project_window(
    start: NaiveDateTime,
    end: NaiveDateTime,
    today: NaiveDate,
) -> AppResult<()> {
    if end <= start {
        return Err(AppError::validation("End date must be after start date."));
    }
    if start.date() < today {
        return Err(AppError::validation("Start date cannot be in the past."));
    }
    Ok(())
}

/// Moyenne des notes arrondie à 1 décimale, None si aucune note
pub fn average_rating(rows: &[ratings::Model]) -> Option<Decimal> {
    if rows.is_empty() {
        return None;
    }
    let sum: Decimal = rows.iter().map(|r| Decimal::from(r.rating)).sum();
    Some((sum / Decimal::from(rows.len() as u64)).round_dp(1))
}

/// Commentaires de premier niveau du plus récent au plus ancien,
/// réponses imbriquées du plus ancien au plus récent
pub fn build_threads(mut rows: Vec<comments::Model>) -> Vec<CommentThread> {
    rows.sort_by_key(|c| (c.created_at, c.id));

    let mut children: HashMap<Option<i32>, Vec<comments::Model>> = HashMap::new();
    for row in rows {
        children.entry(row.parent_comment_id).or_default().push(row);
    }

    fn nest(parent: Option<i32>, children: &mut HashMap<Option<i32>, Vec<comments::Model>>) -> Vec<CommentThread> {
        let Some(rows) = children.remove(&parent) else {
            return Vec::new();
        };
        rows.into_iter()
            .map(|c| CommentThread {
                id: c.id,
                user_id: c.user_id,
                content: c.content,
                created_at: c.created_at,
                replies: nest(Some(c.id), children),
            })
            .collect()
    }

    let mut threads = nest(None, &mut children);
    threads.reverse();
    threads
}

fn contains_ci(column: projects::Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col((projects::Entity, column))))
        .like(LikeExpr::new(pattern).escape('\\'))
}

pub struct CatalogService;

impl CatalogService {
    // ------------------------------------------------------------------------
    // Catégories
    // ------------------------------------------------------------------------

    pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<categories::Model>, DbErr> {
        categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(db)
            .await
    }

    pub async fn create_category(
        db: &DatabaseConnection,
        actor_id: i32,
        name: &str,
        description: &str,
    ) -> AppResult<categories::Model> {
        IdentityService::require_staff(db, actor_id).await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Category name is required."));
        }

        let exists = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            return Err(AppError::validation("Category already exists."));
        }

        let category = categories::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.trim().to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// Crée les catégories par défaut absentes. Retourne le nombre de créations.
    pub async fn seed_default_categories(db: &DatabaseConnection) -> Result<usize, DbErr> {
        let mut created = 0;
        for (name, description) in DEFAULT_CATEGORIES {
            let exists = categories::Entity::find()
                .filter(categories::Column::Name.eq(name))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }

            categories::ActiveModel {
                name: Set(name.to_string()),
                description: Set(description.to_string()),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            created += 1;
        }

        if created > 0 {
            tracing::info!(created, "default categories seeded");
        }
        Ok(created)
    }

    // ------------------------------------------------------------------------
    // Projets
    // ------------------------------------------------------------------------

    /// Crée un projet actif (current_amount = 0) et ses images dans une transaction
    pub async fn create_project(
        db: &DatabaseConnection,
        creator_id: i32,
        request: CreateProjectRequest,
    ) -> AppResult<projects::Model> {
        // 1. Champs requis
        let fields = [
            ("title", &request.title),
            ("details", &request.details),
            ("category", &request.category),
            ("total_target", &request.total_target),
            ("tags", &request.tags),
            ("start_date", &request.start_date),
            ("end_date", &request.end_date),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        let field = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();

        // 2. Catégorie
        let category_id = field(&request.category)
            .parse::<i32>()
            .map_err(|_| AppError::validation("Invalid category."))?;
        let category = categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::validation("Invalid category."))?;

        // 3. Montant cible
        let total_target = money::parse_amount(&field(&request.total_target))
            .map_err(|e| AppError::validation(format!("Invalid target amount: {}", e)))?;

        // 4. Dates
        let (start, end) = match (parse_day(&field(&request.start_date)), parse_day(&field(&request.end_date))) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AppError::validation("Invalid date format. Use YYYY-MM-DD.")),
        };

        // 5 + 6. Fenêtre
        check_project_window(start, end, Utc::now().date_naive())?;

        let txn = db.begin().await?;

        let now = Utc::now().naive_utc();
        let project = projects::ActiveModel {
            creator_id: Set(creator_id),
            category_id: Set(category.id),
            title: Set(field(&request.title)),
            details: Set(field(&request.details)),
            total_target: Set(total_target),
            current_amount: Set(Decimal::ZERO),
            tags: Set(field(&request.tags)),
            start_date: Set(start),
            end_date: Set(end),
            is_featured: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // Images dans l'ordre d'arrivée
        for image in request.images.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
            project_images::ActiveModel {
                project_id: Set(project.id),
                image: Set(image.to_string()),
                uploaded_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(project_id = project.id, creator_id, "project created");
        Ok(project)
    }

    /// Projets actifs, filtrés (recherche OR sur titre/tags/détails, catégorie exacte),
    /// du plus récent au plus ancien, 12 par page
    pub async fn list_projects(db: &DatabaseConnection, query: &ProjectListQuery) -> AppResult<ProjectPage> {
        let mut select = projects::Entity::find().filter(projects::Column::IsActive.eq(true));

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(contains_ci(projects::Column::Title, search))
                    .add(contains_ci(projects::Column::Tags, search))
                    .add(contains_ci(projects::Column::Details, search)),
            );
        }

        if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let category_id = category
                .parse::<i32>()
                .map_err(|_| AppError::validation("Invalid category."))?;
            select = select.filter(projects::Column::CategoryId.eq(category_id));
        }

        let paginator = select
            .order_by_desc(projects::Column::CreatedAt)
            .order_by_desc(projects::Column::Id)
            .paginate(db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        let num_pages = total.div_ceil(PAGE_SIZE).max(1);
        let page = resolve_page(query.page.as_deref(), num_pages);

        let items = paginator
            .fetch_page(page - 1)
            .await?
            .iter()
            .map(ProjectResponse::from)
            .collect();

        Ok(ProjectPage {
            items,
            page,
            num_pages,
            total,
        })
    }

    /// Projet actif (vue publique)
    pub async fn get_project(db: &DatabaseConnection, project_id: i32) -> AppResult<projects::Model> {
        projects::Entity::find_by_id(project_id)
            .filter(projects::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found."))
    }

    pub async fn project_detail(db: &DatabaseConnection, project_id: i32) -> AppResult<ProjectDetail> {
        let project = Self::get_project(db, project_id).await?;

        let images = project_images::Entity::find()
            .filter(project_images::Column::ProjectId.eq(project.id))
            .order_by_asc(project_images::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|i| i.image)
            .collect();

        let rating_rows = project.find_related(ratings::Entity).all(db).await?;
        let avg_rating = average_rating(&rating_rows)
            .and_then(|avg| avg.to_f64())
            .unwrap_or(0.0);

        // Similaires : projets actifs dont les tags contiennent ceux de ce projet
        let similar_projects = projects::Entity::find()
            .filter(projects::Column::IsActive.eq(true))
            .filter(projects::Column::Id.ne(project.id))
            .filter(contains_ci(projects::Column::Tags, &project.tags))
            .order_by_desc(projects::Column::CreatedAt)
            .limit(SIMILAR_PROJECTS)
            .all(db)
            .await?
            .iter()
            .map(ProjectResponse::from)
            .collect();

        let comment_rows = project.find_related(comments::Entity).all(db).await?;

        Ok(ProjectDetail {
            project: ProjectResponse::from(&project),
            images,
            avg_rating,
            similar_projects,
            comments: build_threads(comment_rows),
        })
    }

    /// Sections de la page d'accueil
    pub async fn home(db: &DatabaseConnection) -> AppResult<HomeResponse> {
        // Mieux notés : moyenne calculée ici, projets sans note exclus
        let mut rated: Vec<(Decimal, projects::Model)> = projects::Entity::find()
            .filter(projects::Column::IsActive.eq(true))
            .find_with_related(ratings::Entity)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(project, rows)| average_rating(&rows).map(|avg| (avg, project)))
            .collect();
        rated.sort_by(|(a, pa), (b, pb)| b.cmp(a).then(pb.created_at.cmp(&pa.created_at)));
        let highest_rated = rated
            .iter()
            .take(HOME_SECTION_SIZE)
            .map(|(_, p)| ProjectResponse::from(p))
            .collect();

        let latest = projects::Entity::find()
            .filter(projects::Column::IsActive.eq(true))
            .order_by_desc(projects::Column::CreatedAt)
            .order_by_desc(projects::Column::Id)
            .limit(HOME_SECTION_SIZE as u64)
            .all(db)
            .await?
            .iter()
            .map(ProjectResponse::from)
            .collect();

        let featured = projects::Entity::find()
            .filter(projects::Column::IsActive.eq(true))
            .filter(projects::Column::IsFeatured.eq(true))
            .order_by_desc(projects::Column::CreatedAt)
            .order_by_desc(projects::Column::Id)
            .limit(HOME_SECTION_SIZE as u64)
            .all(db)
            .await?
            .iter()
            .map(ProjectResponse::from)
            .collect();

        Ok(HomeResponse {
            highest_rated,
            latest,
            featured,
            categories: Self::list_categories(db).await?,
        })
    }

    /// Projets actifs d'un créateur (page profil)
    pub async fn projects_for_creator(
        db: &DatabaseConnection,
        creator_id: i32,
    ) -> Result<Vec<projects::Model>, DbErr> {
        projects::Entity::find()
            .filter(projects::Column::CreatorId.eq(creator_id))
            .filter(projects::Column::IsActive.eq(true))
            .order_by_desc(projects::Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn set_featured(
        db: &DatabaseConnection,
        actor_id: i32,
        project_id: i32,
        featured: bool,
    ) -> AppResult<projects::Model> {
        IdentityService::require_staff(db, actor_id).await?;

        let project = projects::Entity::find_by_id(project_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found."))?;

        let mut active: projects::ActiveModel = project.into();
        active.is_featured = Set(featured);
        active.updated_at = Set(Utc::now().naive_utc());
        let project = active.update(db).await?;

        tracing::info!(project_id, featured, "project featured flag changed");
        Ok(project)
    }
}
