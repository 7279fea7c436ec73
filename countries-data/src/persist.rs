//! Insert statements for entities and relation rows.

use countries_core::{Country, Currency, EntityId, Language, Stored, TimeZone};

use crate::gateway::Statement;

/// An entity kind that can be written as one row.
pub(crate) trait Persist: Stored + Clone {
    /// Parameterised `INSERT` for this entity.
    fn insert_statement(&self) -> Statement;
}

impl Persist for Country {
    fn insert_statement(&self) -> Statement {
        let profile = self.profile();
        Statement::new(
            "INSERT INTO countries (
                name, capital, alpha2, alpha3, numeric_code, calling_code, region, flag_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(profile.name.as_str())
        .bind(profile.capital.as_str())
        .bind(profile.alpha2.as_str())
        .bind(profile.alpha3.as_str())
        .bind(profile.numeric_code.as_str())
        .bind(profile.calling_code.as_str())
        .bind(profile.region.as_str())
        .bind(profile.flag_url.as_str())
    }
}

impl Persist for Currency {
    fn insert_statement(&self) -> Statement {
        Statement::new("INSERT INTO currencies (name, code, symbol) VALUES (?1, ?2, ?3)")
            .bind(self.name())
            .bind(self.code())
            .bind(self.symbol())
    }
}

impl Persist for Language {
    fn insert_statement(&self) -> Statement {
        Statement::new(
            "INSERT INTO langs (name, iso639_1, iso639_2, native_name) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(self.name())
        .bind(self.iso639_1())
        .bind(self.iso639_2())
        .bind(self.native_name())
    }
}

impl Persist for TimeZone {
    fn insert_statement(&self) -> Statement {
        Statement::new("INSERT INTO timezones (name) VALUES (?1)").bind(self.name())
    }
}

/// A country-to-child join table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RelationTable {
    /// Table name, used in diagnostics.
    pub(crate) table: &'static str,
    select: &'static str,
    insert: &'static str,
}

impl RelationTable {
    /// All rows as `(country, related)` columns.
    pub(crate) const fn select_statement(self) -> Statement {
        Statement::new(self.select)
    }

    /// Idempotent insert of one relation row.
    pub(crate) fn insert_statement(self, country: EntityId, related: EntityId) -> Statement {
        Statement::new(self.insert).bind(country).bind(related)
    }
}

pub(crate) const COUNTRY_CURRENCIES: RelationTable = RelationTable {
    table: "countries_currencies",
    select: "SELECT country, currency AS related FROM countries_currencies",
    insert: "INSERT OR IGNORE INTO countries_currencies (country, currency) VALUES (?1, ?2)",
};

pub(crate) const COUNTRY_TIMEZONES: RelationTable = RelationTable {
    table: "countries_timezones",
    select: "SELECT country, timezone AS related FROM countries_timezones",
    insert: "INSERT OR IGNORE INTO countries_timezones (country, timezone) VALUES (?1, ?2)",
};

pub(crate) const COUNTRY_LANGUAGES: RelationTable = RelationTable {
    table: "countries_langs",
    select: "SELECT country, lang AS related FROM countries_langs",
    insert: "INSERT OR IGNORE INTO countries_langs (country, lang) VALUES (?1, ?2)",
};
