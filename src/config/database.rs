use crate::domain::{
    activity::entity::{activity, activity_registration},
    notification::entity::user_notification,
    user::entity::user,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
    Statement,
};
use tracing::info;

/// DB 연결 생성 (`sync_schema`가 true면 테이블/인덱스 동기화까지 수행)
pub async fn establish_connection(
    options: ConnectOptions,
    sync_schema: bool,
) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!("Successfully connected to the database.");

    if sync_schema {
        create_tables(&db).await?;
    } else {
        info!("Skipping database schema synchronization (DB_SCHEMA_UPDATE is not true).");
    }

    Ok(db)
}

async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Starting database schema synchronization...");

    // Order matters for foreign keys! (Parent first, then Child)
    create_table_if_not_exists(db, &schema, user::Entity).await?;
    create_table_if_not_exists(db, &schema, activity::Entity).await?;
    create_table_if_not_exists(db, &schema, activity_registration::Entity).await?;
    create_table_if_not_exists(db, &schema, user_notification::Entity).await?;

    // 기존 테이블에 추가된 컬럼 반영
    apply_migrations(db).await?;

    create_index_if_not_exists(db, "idx_activity_status", "activity", &["status"], false).await?;
    create_index_if_not_exists(
        db,
        "idx_activity_registration_activity_created",
        "activity_registration",
        &["activity_id", "created_at"],
        false,
    )
    .await?;
    create_index_if_not_exists(
        db,
        "idx_activity_registration_user_created",
        "activity_registration",
        &["user_id", "created_at"],
        false,
    )
    .await?;
    // active_marker는 confirmed/attended일 때만 값이 있고 cancelled면 NULL.
    // NULL은 유니크 비교에서 제외되므로 (활동, 사용자)당 활성 신청은 최대 1건.
    create_index_if_not_exists(
        db,
        "uq_activity_registration_active",
        "activity_registration",
        &["activity_id", "user_id", "active_marker"],
        true,
    )
    .await?;
    create_index_if_not_exists(
        db,
        "idx_user_notification_user_created",
        "user_notification",
        &["user_id", "created_at"],
        false,
    )
    .await?;

    info!("Database schema synchronization completed.");
    Ok(())
}

/// 신청 기능 이전에 만들어진 activity 테이블 보정
async fn apply_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    add_column_if_not_exists(db, "activity", "notes", "TEXT NULL").await?;
    add_column_if_not_exists(db, "activity", "capacity", "INT NOT NULL DEFAULT 0").await?;
    add_column_if_not_exists(db, "activity", "registration_start", "TIMESTAMP NULL").await?;
    add_column_if_not_exists(db, "activity", "registration_end", "TIMESTAMP NULL").await?;
    add_column_if_not_exists(db, "activity", "activity_end", "TIMESTAMP NULL").await?;

    Ok(())
}

fn is_already_exists_error(e: &DbErr) -> bool {
    let err_str = e.to_string().to_lowercase();
    err_str.contains("duplicate") || err_str.contains("already exists")
}

async fn add_column_if_not_exists(
    db: &DatabaseConnection,
    table_name: &str,
    column_name: &str,
    column_definition: &str,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table_name, column_name, column_definition
    );

    match db.execute(Statement::from_string(backend, sql)).await {
        Ok(_) => {
            info!("Added column '{}' to table '{}'", column_name, table_name);
            Ok(())
        }
        Err(e) if is_already_exists_error(&e) => Ok(()),
        Err(e) => {
            tracing::error!(
                "Failed to add column '{}' to table '{}': {}",
                column_name,
                table_name,
                e
            );
            Err(e)
        }
    }
}

async fn create_index_if_not_exists(
    db: &DatabaseConnection,
    index_name: &str,
    table_name: &str,
    columns: &[&str],
    unique: bool,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let sql = format!(
        "CREATE {}INDEX {} ON {} ({})",
        if unique { "UNIQUE " } else { "" },
        index_name,
        table_name,
        columns.join(", ")
    );

    match db.execute(Statement::from_string(backend, sql)).await {
        Ok(_) => Ok(()),
        Err(e) if is_already_exists_error(&e) => Ok(()),
        Err(e) => {
            tracing::error!("Failed to create index {}: {}", index_name, e);
            Err(e)
        }
    }
}

async fn create_table_if_not_exists<E>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr>
where
    E: sea_orm::EntityTrait,
{
    let backend = db.get_database_backend();
    let create_stmt: Statement =
        backend.build(schema.create_table_from_entity(entity).if_not_exists());

    db.execute(create_stmt).await.map(|_| ()).map_err(|e| {
        tracing::error!("Failed to create table {}: {}", entity.table_name(), e);
        e
    })
}
