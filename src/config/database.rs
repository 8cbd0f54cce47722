//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::config::app::AppConfig;
use crate::entities::{HotelBooking, UmrahBooking, VisaBooking};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

/// Default location of the desk database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/travel_desk.sqlite?mode=rwc";

/// Resolves the database URL: `DATABASE_URL`, then config.toml, then the default.
#[must_use]
pub fn get_database_url(config: Option<&AppConfig>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| config.and_then(|c| c.database.url.clone()))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `url`.
pub async fn create_connection(url: &str) -> Result<DatabaseConnection> {
    Database::connect(url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates the booking tables if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());
    create_table(db, &schema, VisaBooking).await?;
    create_table(db, &schema, UmrahBooking).await?;
    create_table(db, &schema, HotelBooking).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HotelBookingModel, UmrahBookingModel, VisaBookingModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<VisaBookingModel> = VisaBooking::find().limit(1).all(&db).await?;
        let _: Vec<UmrahBookingModel> = UmrahBooking::find().limit(1).all(&db).await?;
        let _: Vec<HotelBookingModel> = HotelBooking::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_database_url_prefers_config_over_default() {
        let config = crate::config::app::parse_config(
            "[database]\nurl = \"sqlite::memory:\"\n[agency]\nname = \"Desk\"\n",
        );
        let Ok(config) = config else {
            panic!("config should parse");
        };
        // DATABASE_URL may be set in the environment running the tests.
        let expected = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
        assert_eq!(get_database_url(Some(&config)), expected);
    }
}
