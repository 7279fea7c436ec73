//! Reconciler: merge upstream country records into the cache.
//!
//! Each record is deduplicated by country name against the [`EntityStore`].
//! New countries are persisted first, then their currencies, languages and
//! timezones are deduplicated by natural key, created when absent, and linked
//! through the relation tables. Children are registered in the store as soon
//! as they are persisted, so later records in the same batch reuse them.
//!
//! A storage failure aborts the batch. Rows already written stay written.

use countries_core::{Country, Entity, EntityKind, EntityStore, LinkError, StoreError, TimeZone};
use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::gateway::{GatewayError, StorageGateway};
use crate::persist::{
    COUNTRY_CURRENCIES, COUNTRY_LANGUAGES, COUNTRY_TIMEZONES, Persist, RelationTable,
};
use crate::record::CountryRecord;

/// Counts describing one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Countries inserted.
    pub countries_created: usize,
    /// Currencies inserted.
    pub currencies_created: usize,
    /// Languages inserted.
    pub languages_created: usize,
    /// Timezones inserted.
    pub timezones_created: usize,
    /// Relation rows written.
    pub relations_written: usize,
    /// Records skipped because the country already existed.
    pub countries_skipped: usize,
    /// Currency sub-records dropped for lacking a usable code.
    pub currencies_discarded: usize,
}

impl ReconcileReport {
    /// Whether the run wrote nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.countries_created == 0
            && self.currencies_created == 0
            && self.languages_created == 0
            && self.timezones_created == 0
            && self.relations_written == 0
    }
}

/// Errors that abort a reconciliation batch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A write failed while reconciling `country`.
    #[error("failed to {operation} while reconciling {country:?}")]
    Storage {
        /// Write being attempted.
        operation: &'static str,
        /// Name of the country being reconciled.
        country: String,
        /// Underlying gateway failure.
        #[source]
        source: GatewayError,
    },
    /// A persisted entity could not be registered.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A relation targeted an entity without an identifier.
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Applies upstream records to a store and its backing storage.
///
/// # Examples
/// ```
/// use countries_core::{Country, EntityStore};
/// use countries_data::gateway::SqliteGateway;
/// use countries_data::{CountryRecord, Reconciler};
///
/// let mut gateway = SqliteGateway::open_in_memory().expect("open database");
/// let mut store = EntityStore::new();
/// let records = vec![CountryRecord {
///     name: "Chad".into(),
///     timezones: vec!["UTC+01:00".into()],
///     ..CountryRecord::default()
/// }];
///
/// let report = Reconciler::new(&mut gateway, &mut store)
///     .reconcile(&records)
///     .expect("reconcile");
/// assert_eq!(report.countries_created, 1);
/// assert_eq!(report.relations_written, 1);
/// assert!(store.find_by_key::<Country>("Chad").is_some());
/// ```
#[derive(Debug)]
pub struct Reconciler<'a, G: ?Sized> {
    gateway: &'a mut G,
    store: &'a mut EntityStore,
}

impl<'a, G: StorageGateway + ?Sized> Reconciler<'a, G> {
    /// Bind a gateway and the store it mirrors.
    pub const fn new(gateway: &'a mut G, store: &'a mut EntityStore) -> Self {
        Self { gateway, store }
    }

    /// Reconcile `records` in order.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Storage`] on the first failed write.
    pub fn reconcile(
        &mut self,
        records: &[CountryRecord],
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();
        for record in records {
            self.reconcile_record(record, &mut report)?;
        }
        info!(
            "reconciled {} records: {} countries created, {} skipped, {} relation rows written",
            records.len(),
            report.countries_created,
            report.countries_skipped,
            report.relations_written,
        );
        Ok(report)
    }

    fn reconcile_record(
        &mut self,
        record: &CountryRecord,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        let name = record.name.as_str();
        if self.store.find_by_key::<Country>(name).is_some() {
            debug!("skipping {name:?}: already cached");
            report.countries_skipped += 1;
            return Ok(());
        }

        let mut country = Country::new(record.profile());
        self.persist(&mut country, name)?;
        report.countries_created += 1;
        let country_id = country.id();

        for entry in &record.currencies {
            let Some(candidate) = entry.to_currency() else {
                warn!("discarding currency {:?} of {name:?}: no usable code", entry.code);
                report.currencies_discarded += 1;
                continue;
            };
            let currency = self.ensure(candidate, name, &mut report.currencies_created)?;
            report.relations_written += self.relate(COUNTRY_CURRENCIES, &country, &currency)?;
            country.link_currency(&currency)?;
        }

        for entry in &record.languages {
            let language = self.ensure(entry.to_language(), name, &mut report.languages_created)?;
            report.relations_written += self.relate(COUNTRY_LANGUAGES, &country, &language)?;
            country.link_language(&language)?;
        }

        for label in &record.timezones {
            let timezone = self.ensure(
                TimeZone::new(label.as_str()),
                name,
                &mut report.timezones_created,
            )?;
            report.relations_written += self.relate(COUNTRY_TIMEZONES, &country, &timezone)?;
            country.link_timezone(&timezone)?;
        }

        debug!("cached {name:?} as country {country_id:?}");
        self.store.add_country(country)?;
        Ok(())
    }

    /// Return the cached entity sharing `candidate`'s natural key, or persist
    /// and register `candidate`.
    fn ensure<E: Persist>(
        &mut self,
        mut candidate: E,
        country: &str,
        created: &mut usize,
    ) -> Result<E, ReconcileError> {
        if let Some(existing) = self.store.find_by_key::<E>(candidate.natural_key()) {
            return Ok(existing.clone());
        }
        self.persist(&mut candidate, country)?;
        debug!("created {} {:?}", E::KIND, candidate.natural_key());
        self.store.insert(candidate.clone())?;
        *created += 1;
        Ok(candidate)
    }

    fn persist<E: Persist>(
        &mut self,
        entity: &mut E,
        country: &str,
    ) -> Result<(), ReconcileError> {
        self.gateway
            .execute(&entity.insert_statement())
            .map_err(|source| storage_error(insert_operation::<E>(), country, source))?;
        entity.assign_id(self.gateway.last_insert_id());
        Ok(())
    }

    fn relate<E: Entity>(
        &mut self,
        relation: RelationTable,
        country: &Country,
        related: &E,
    ) -> Result<usize, ReconcileError> {
        let (Some(country_id), Some(related_id)) = (country.id(), related.id()) else {
            let (kind, key) = if country.is_persisted() {
                (E::KIND, related.natural_key())
            } else {
                (Country::KIND, country.natural_key())
            };
            return Err(LinkError::Unpersisted {
                kind,
                key: key.to_owned(),
            }
            .into());
        };
        self.gateway
            .execute(&relation.insert_statement(country_id, related_id))
            .map_err(|source| storage_error("insert relation", country.name(), source))
    }
}

const fn insert_operation<E: Entity>() -> &'static str {
    match E::KIND {
        EntityKind::Country => "insert country",
        EntityKind::Currency => "insert currency",
        EntityKind::Language => "insert language",
        EntityKind::TimeZone => "insert timezone",
    }
}

fn storage_error(operation: &'static str, country: &str, source: GatewayError) -> ReconcileError {
    ReconcileError::Storage {
        operation,
        country: country.to_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;
    use crate::loader::load_store;
    use crate::record::{CurrencyRecord, LanguageRecord};
    use crate::test_support::{CountingGateway, nigeria};
    use countries_core::{Currency, EntityId, Language, snapshot};
    use rstest::{fixture, rstest};

    #[fixture]
    fn gateway() -> SqliteGateway {
        SqliteGateway::open_in_memory().expect("open gateway")
    }

    fn count(gateway: &SqliteGateway, table: &str) -> i64 {
        gateway
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .expect("count rows")
    }

    fn currency(code: Option<&str>) -> CurrencyRecord {
        CurrencyRecord {
            code: code.map(str::to_owned),
            name: "Some currency".into(),
            symbol: String::new(),
        }
    }

    #[rstest]
    fn nigeria_end_to_end(mut gateway: SqliteGateway) {
        let mut store = EntityStore::new();
        let report = Reconciler::new(&mut gateway, &mut store)
            .reconcile(&[nigeria()])
            .expect("reconcile");

        assert_eq!(
            report,
            ReconcileReport {
                countries_created: 1,
                currencies_created: 1,
                languages_created: 1,
                timezones_created: 1,
                relations_written: 3,
                countries_skipped: 0,
                currencies_discarded: 0,
            }
        );
        for table in [
            "countries",
            "currencies",
            "langs",
            "timezones",
            "countries_currencies",
            "countries_langs",
            "countries_timezones",
        ] {
            assert_eq!(count(&gateway, table), 1, "{table}");
        }
        let views = snapshot(&store).expect("project store");
        assert_eq!(views[0].currencies[0].code, "NGN");
        assert_eq!(views[0].id, EntityId::new(1));
    }

    #[rstest]
    fn repeated_record_is_skipped(mut gateway: SqliteGateway) {
        let mut store = EntityStore::new();
        let mut reconciler = Reconciler::new(&mut gateway, &mut store);
        reconciler.reconcile(&[nigeria()]).expect("first pass");
        let second = reconciler.reconcile(&[nigeria()]).expect("second pass");

        assert_eq!(second.countries_skipped, 1);
        assert!(second.is_noop());
        assert_eq!(count(&gateway, "countries"), 1);
    }

    #[rstest]
    fn children_are_shared_across_records(mut gateway: SqliteGateway) {
        let mut store = EntityStore::new();
        let mut niger = nigeria();
        niger.name = "Niger".into();
        niger.currencies = vec![currency(Some("XOF"))];
        niger.languages = vec![LanguageRecord {
            iso639_1: "en".into(),
            iso639_2: "eng".into(),
            name: "English".into(),
            native_name: "English".into(),
        }];

        let report = Reconciler::new(&mut gateway, &mut store)
            .reconcile(&[nigeria(), niger])
            .expect("reconcile");

        assert_eq!(report.countries_created, 2);
        assert_eq!(report.languages_created, 1);
        assert_eq!(report.timezones_created, 1);
        assert_eq!(report.currencies_created, 2);
        assert_eq!(report.relations_written, 6);
        assert_eq!(count(&gateway, "langs"), 1);
        assert!(store.verify_integrity().is_ok());
    }

    #[rstest]
    fn unusable_currencies_are_discarded(mut gateway: SqliteGateway) {
        let mut store = EntityStore::new();
        let mut record = nigeria();
        record.currencies = vec![currency(None), currency(Some("(none)")), currency(Some("NGN"))];

        let report = Reconciler::new(&mut gateway, &mut store)
            .reconcile(&[record])
            .expect("reconcile");

        assert_eq!(report.currencies_discarded, 2);
        assert_eq!(report.currencies_created, 1);
        assert_eq!(count(&gateway, "currencies"), 1);
        let country = store
            .find_by_key::<Country>("Nigeria")
            .expect("country registered");
        assert_eq!(country.currencies().len(), 1);
    }

    #[rstest]
    fn country_with_only_placeholder_currency_has_none(mut gateway: SqliteGateway) {
        let mut store = EntityStore::new();
        let mut record = nigeria();
        record.currencies = vec![currency(Some("(none)"))];

        let report = Reconciler::new(&mut gateway, &mut store)
            .reconcile(&[record])
            .expect("reconcile");

        assert_eq!(report.countries_created, 1);
        assert_eq!(report.currencies_created, 0);
        assert_eq!(report.currencies_discarded, 1);
        assert_eq!(report.relations_written, 2);
        let country = store
            .find_by_key::<Country>("Nigeria")
            .expect("country registered");
        assert!(country.currencies().is_empty());
        assert!(store.all::<Currency>().is_empty());
        assert_eq!(count(&gateway, "currencies"), 0);
        assert_eq!(count(&gateway, "countries_currencies"), 0);
    }

    #[rstest]
    fn duplicate_children_in_one_record_link_once(mut gateway: SqliteGateway) {
        let mut store = EntityStore::new();
        let mut record = nigeria();
        record.timezones = vec!["UTC+01:00".into(), "UTC+01:00".into()];

        let report = Reconciler::new(&mut gateway, &mut store)
            .reconcile(&[record])
            .expect("reconcile");

        assert_eq!(report.timezones_created, 1);
        assert_eq!(count(&gateway, "countries_timezones"), 1);
    }

    #[rstest]
    fn loaded_country_issues_no_writes(mut gateway: SqliteGateway) {
        let mut seed_store = EntityStore::new();
        Reconciler::new(&mut gateway, &mut seed_store)
            .reconcile(&[nigeria()])
            .expect("seed cache");

        let mut store = load_store(&gateway).expect("load cache");
        let mut counting = CountingGateway::new(gateway);
        let report = Reconciler::new(&mut counting, &mut store)
            .reconcile(&[nigeria()])
            .expect("reconcile loaded record");

        assert_eq!(counting.writes(), 0);
        assert_eq!(report.countries_skipped, 1);
    }

    #[rstest]
    fn storage_failure_names_operation_and_country(mut gateway: SqliteGateway) {
        gateway
            .connection()
            .execute_batch("DROP TABLE countries_langs")
            .expect("drop relation table");
        let mut store = EntityStore::new();

        let err = Reconciler::new(&mut gateway, &mut store)
            .reconcile(&[nigeria()])
            .expect_err("missing table should abort");
        match err {
            ReconcileError::Storage {
                operation, country, ..
            } => {
                assert_eq!(operation, "insert relation");
                assert_eq!(country, "Nigeria");
            }
            other => panic!("expected storage error, got {other:?}"),
        }
        assert!(store.find_by_key::<Country>("Nigeria").is_none());
        assert!(store.find_by_key::<Currency>("NGN").is_some());
        assert!(store.find_by_key::<Language>("en").is_some());
    }
}
