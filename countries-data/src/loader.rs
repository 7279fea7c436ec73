//! Bulk Loader: hydrate an [`EntityStore`] from storage.
//!
//! Entities are loaded first (currencies, languages, timezones, countries),
//! then each relation table is mapped onto the countries. A relation row whose
//! endpoint is missing aborts the load.

use countries_core::{
    Country, CountryProfile, Currency, EntityId, EntityKind, EntityStore, Language, Related,
    StoreError, Stored, TimeZone,
};
use log::info;
use thiserror::Error;

use crate::gateway::{GatewayError, Row, RowError, Statement, StorageGateway};
use crate::persist::{COUNTRY_CURRENCIES, COUNTRY_LANGUAGES, COUNTRY_TIMEZONES, RelationTable};

/// Errors raised while loading the cache.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A query failed.
    #[error("failed to read {table}")]
    Gateway {
        /// Table being read.
        table: &'static str,
        /// Underlying gateway failure.
        #[source]
        source: GatewayError,
    },
    /// A row did not have the expected shape.
    #[error("malformed row in {table}")]
    Row {
        /// Table being read.
        table: &'static str,
        /// Column failure.
        #[source]
        source: RowError,
    },
    /// A relation row references an entity that does not exist.
    #[error("{table} references {kind} {id}, which does not exist")]
    Corrupt {
        /// Relation table holding the dangling row.
        table: &'static str,
        /// Kind of the missing endpoint.
        kind: EntityKind,
        /// Identifier of the missing endpoint.
        id: EntityId,
    },
    /// A loaded entity could not be registered.
    #[error(transparent)]
    Store(#[from] StoreError),
}

const SELECT_CURRENCIES: &str = "SELECT id, name, code, symbol FROM currencies";
const SELECT_LANGUAGES: &str = "SELECT id, name, iso639_1, iso639_2, native_name FROM langs";
const SELECT_TIMEZONES: &str = "SELECT id, name FROM timezones";
const SELECT_COUNTRIES: &str = "SELECT id, name, capital, alpha2, alpha3, numeric_code, calling_code,
    region, flag_url FROM countries";

/// Load every entity and relation into a fresh store.
///
/// # Examples
/// ```
/// use countries_core::{Country, Currency};
/// use countries_data::gateway::{SqliteGateway, Statement, StorageGateway};
/// use countries_data::load_store;
///
/// let mut gateway = SqliteGateway::open_in_memory().expect("open database");
/// for sql in [
///     "INSERT INTO countries (name, alpha2) VALUES ('Nigeria', 'NG')",
///     "INSERT INTO currencies (name, code, symbol) VALUES ('Nigerian naira', 'NGN', '₦')",
///     "INSERT INTO countries_currencies (country, currency) VALUES (1, 1)",
/// ] {
///     gateway.execute(&Statement::new(sql)).expect("seed row");
/// }
///
/// let store = load_store(&gateway).expect("load cache");
/// let nigeria = store.find_by_key::<Country>("Nigeria").expect("country loaded");
/// assert_eq!(nigeria.currencies().len(), 1);
/// assert!(store.find_by_key::<Currency>("NGN").is_some());
/// ```
pub fn load_store<G: StorageGateway + ?Sized>(gateway: &G) -> Result<EntityStore, LoadError> {
    let mut store = EntityStore::new();

    load_entities(gateway, &mut store, "currencies", SELECT_CURRENCIES, currency_from_row)?;
    load_entities(gateway, &mut store, "langs", SELECT_LANGUAGES, language_from_row)?;
    load_entities(gateway, &mut store, "timezones", SELECT_TIMEZONES, timezone_from_row)?;
    load_entities(gateway, &mut store, "countries", SELECT_COUNTRIES, country_from_row)?;

    let links = map_relation::<_, Currency>(gateway, &mut store, COUNTRY_CURRENCIES)?
        + map_relation::<_, TimeZone>(gateway, &mut store, COUNTRY_TIMEZONES)?
        + map_relation::<_, Language>(gateway, &mut store, COUNTRY_LANGUAGES)?;

    info!(
        "loaded {} countries, {} currencies, {} languages, {} timezones and {} relation rows",
        store.all::<Country>().len(),
        store.all::<Currency>().len(),
        store.all::<Language>().len(),
        store.all::<TimeZone>().len(),
        links,
    );
    Ok(store)
}

fn load_entities<G, E>(
    gateway: &G,
    store: &mut EntityStore,
    table: &'static str,
    sql: &'static str,
    from_row: fn(&Row) -> Result<E, RowError>,
) -> Result<(), LoadError>
where
    G: StorageGateway + ?Sized,
    E: Stored,
{
    let rows = gateway
        .query(&Statement::new(sql))
        .map_err(|source| LoadError::Gateway { table, source })?;
    for row in &rows {
        let entity = from_row(row).map_err(|source| LoadError::Row { table, source })?;
        store.insert(entity)?;
    }
    Ok(())
}

fn map_relation<G, E>(
    gateway: &G,
    store: &mut EntityStore,
    relation: RelationTable,
) -> Result<usize, LoadError>
where
    G: StorageGateway + ?Sized,
    E: Related,
{
    let table = relation.table;
    let rows = gateway
        .query(&relation.select_statement())
        .map_err(|source| LoadError::Gateway { table, source })?;
    for row in &rows {
        let read = |column: &'static str| {
            row.id(column)
                .map_err(|source| LoadError::Row { table, source })
        };
        let country_id = read("country")?;
        let related_id = read("related")?;

        store
            .link_country::<E>(country_id, related_id)
            .map_err(|missing| LoadError::Corrupt {
                table,
                kind: missing.kind,
                id: missing.id,
            })?;
    }
    Ok(rows.len())
}

fn currency_from_row(row: &Row) -> Result<Currency, RowError> {
    Ok(
        Currency::new(row.text("code")?, row.text("name")?, row.text("symbol")?)
            .with_id(row.id("id")?),
    )
}

fn language_from_row(row: &Row) -> Result<Language, RowError> {
    Ok(Language::new(
        row.text("iso639_1")?,
        row.text("iso639_2")?,
        row.text("name")?,
        row.text("native_name")?,
    )
    .with_id(row.id("id")?))
}

fn timezone_from_row(row: &Row) -> Result<TimeZone, RowError> {
    Ok(TimeZone::new(row.text("name")?).with_id(row.id("id")?))
}

fn country_from_row(row: &Row) -> Result<Country, RowError> {
    let profile = CountryProfile {
        name: row.text("name")?,
        capital: row.text("capital")?,
        alpha2: row.text("alpha2")?,
        alpha3: row.text("alpha3")?,
        numeric_code: row.text("numeric_code")?,
        calling_code: row.text("calling_code")?,
        flag_url: row.text("flag_url")?,
        region: row.text("region")?,
    };
    Ok(Country::new(profile).with_id(row.id("id")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use countries_core::Entity;
    use crate::gateway::SqliteGateway;
    use rstest::{fixture, rstest};

    fn seed(gateway: &mut SqliteGateway, statements: &[&'static str]) {
        for &sql in statements {
            gateway.execute(&Statement::new(sql)).expect("seed row");
        }
    }

    #[fixture]
    fn gateway() -> SqliteGateway {
        let mut gateway = SqliteGateway::open_in_memory().expect("open gateway");
        seed(
            &mut gateway,
            &[
                "INSERT INTO countries (name, capital, alpha2, alpha3, calling_code, region)
                 VALUES ('Chad', 'N''Djamena', 'TD', 'TCD', '235', 'Africa')",
                "INSERT INTO currencies (name, code, symbol) VALUES ('Central African CFA franc', 'XAF', 'Fr')",
                "INSERT INTO langs (name, iso639_1, iso639_2, native_name) VALUES ('French', 'fr', 'fra', 'français')",
                "INSERT INTO langs (name, iso639_1, iso639_2, native_name) VALUES ('Arabic', 'ar', 'ara', 'العربية')",
                "INSERT INTO timezones (name) VALUES ('UTC+01:00')",
                "INSERT INTO countries_currencies (country, currency) VALUES (1, 1)",
                "INSERT INTO countries_langs (country, lang) VALUES (1, 1)",
                "INSERT INTO countries_langs (country, lang) VALUES (1, 2)",
                "INSERT INTO countries_timezones (country, timezone) VALUES (1, 1)",
            ],
        );
        gateway
    }

    #[rstest]
    fn loads_entities_and_relations(gateway: SqliteGateway) {
        let store = load_store(&gateway).expect("load store");
        let chad = store
            .find::<Country>(EntityId::new(1))
            .expect("chad loaded");
        assert_eq!(chad.profile().capital, "N'Djamena");
        assert_eq!(chad.currencies().len(), 1);
        assert_eq!(chad.languages().len(), 2);
        assert_eq!(chad.timezones().len(), 1);
        assert_eq!(
            store.find_by_key::<Language>("ar").and_then(|lang| lang.id()),
            Some(EntityId::new(2))
        );
        assert!(store.verify_integrity().is_ok());
    }

    #[rstest]
    fn empty_database_loads_empty_store() {
        let gateway = SqliteGateway::open_in_memory().expect("open gateway");
        let store = load_store(&gateway).expect("load store");
        assert!(store.all::<Country>().is_empty());
        assert!(store.all::<Currency>().is_empty());
    }

    #[rstest]
    fn dangling_relation_aborts_load(mut gateway: SqliteGateway) {
        gateway
            .connection()
            .pragma_update(None, "foreign_keys", false)
            .expect("disable foreign keys");
        seed(
            &mut gateway,
            &["INSERT INTO countries_timezones (country, timezone) VALUES (1, 42)"],
        );

        let err = load_store(&gateway).expect_err("dangling timezone should abort");
        match err {
            LoadError::Corrupt { table, kind, id } => {
                assert_eq!(table, "countries_timezones");
                assert_eq!(kind, EntityKind::TimeZone);
                assert_eq!(id, EntityId::new(42));
            }
            other => panic!("expected corruption error, got {other:?}"),
        }
    }

    #[rstest]
    fn missing_country_endpoint_is_reported(mut gateway: SqliteGateway) {
        gateway
            .connection()
            .pragma_update(None, "foreign_keys", false)
            .expect("disable foreign keys");
        seed(
            &mut gateway,
            &["INSERT INTO countries_currencies (country, currency) VALUES (9, 1)"],
        );

        let err = load_store(&gateway).expect_err("dangling country should abort");
        assert!(matches!(
            err,
            LoadError::Corrupt {
                table: "countries_currencies",
                kind: EntityKind::Country,
                ..
            }
        ));
    }
}
