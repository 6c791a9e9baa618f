pub use sea_orm_migration::prelude::*;

mod m20240101_000001_kv_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_kv_entries::Migration)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::Database;

    #[tokio::test]
    async fn migrations_apply_and_roll_back_on_sqlite() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());

        let manager = SchemaManager::new(&db);
        assert!(manager.has_table("kv_entries").await.unwrap());

        Migrator::down(&db, Some(1)).await.unwrap();
        assert!(!manager.has_table("kv_entries").await.unwrap());
    }
}
