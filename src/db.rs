// connexion BD + création du schéma à partir des entités

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::config::Config;
use crate::models::{
    activation_tokens, categories, comments, donations, password_reset_tokens, project_images,
    projects, ratings, reports, users,
};

pub async fn establish_connection(config: &Config) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Crée les tables (si absentes) dans l'ordre des clés étrangères,
/// puis l'index unique (project_id, user_id) des ratings.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, activation_tokens::Entity).await?;
    create_table(db, password_reset_tokens::Entity).await?;
    create_table(db, categories::Entity).await?;
    create_table(db, projects::Entity).await?;
    create_table(db, project_images::Entity).await?;
    create_table(db, donations::Entity).await?;
    create_table(db, ratings::Entity).await?;
    create_table(db, comments::Entity).await?;
    create_table(db, reports::Entity).await?;

    let backend = db.get_database_backend();
    let rating_index = Index::create()
        .name("idx_ratings_project_user")
        .table(ratings::Entity)
        .col(ratings::Column::ProjectId)
        .col(ratings::Column::UserId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&rating_index)).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}
