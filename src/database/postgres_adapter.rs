/*!
 * PostgreSQL dialect.
 *
 * Ids are `BIGSERIAL`/`BIGINT` so that every integer parameter binds as
 * `INT8`. Inserts return the new id with `RETURNING id`.
 */

use crate::app_config::DbDriver;
use crate::model::SearchField;

use super::adapter::QueryAdapter;

/// Adapter for PostgreSQL databases
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdapter;

const UP: &[&str] = &[
    // 1
    r#"
CREATE TABLE domain (
    id BIGSERIAL PRIMARY KEY,
    name varchar NOT NULL UNIQUE
);
CREATE TABLE language (
    id BIGSERIAL PRIMARY KEY,
    name varchar NOT NULL,
    code varchar NOT NULL UNIQUE
);
CREATE TABLE string (
    id BIGSERIAL PRIMARY KEY,
    name varchar NOT NULL,
    domain_id bigint NOT NULL REFERENCES domain(id) ON DELETE CASCADE ON UPDATE CASCADE
);
CREATE INDEX domain_id_idx ON string (domain_id);
CREATE INDEX name_idx ON string (name);
CREATE UNIQUE INDEX name_domain_idx ON string (name, domain_id);
CREATE TABLE translation (
    id BIGSERIAL PRIMARY KEY,
    language_id bigint NOT NULL REFERENCES language(id) ON DELETE CASCADE ON UPDATE CASCADE,
    content TEXT NOT NULL,
    string_id bigint NOT NULL REFERENCES string(id) ON DELETE CASCADE ON UPDATE CASCADE
);
CREATE INDEX language_id_idx ON translation (language_id);
CREATE INDEX string_id_idx ON translation (string_id);
CREATE UNIQUE INDEX string_id_language_id_idx ON translation (language_id, string_id);
INSERT INTO language (name, code) VALUES
    ('German', 'de'),
    ('English', 'en'),
    ('Spanish', 'es'),
    ('French', 'fr'),
    ('Italian', 'it'),
    ('Polish', 'pl'),
    ('German (Austria)', 'de-at'),
    ('German (Switzerland)', 'de-ch'),
    ('German (Germany)', 'de-de'),
    ('English (Australia)', 'en-au'),
    ('English (Canada)', 'en-ca'),
    ('English (UK)', 'en-gb'),
    ('English (Bahrain)', 'en-bh'),
    ('English (US)', 'en-us'),
    ('English (South Africa)', 'en-za'),
    ('French (Canada)', 'fr-ca'),
    ('Portuguese', 'pt'),
    ('English (Ireland)', 'en-ie'),
    ('Czech', 'cs'),
    ('Hungarian', 'hu'),
    ('Spanish (US)', 'es-us');
"#,
    // 2
    r#"
INSERT INTO language (name, code) VALUES
    ('Dutch', 'nl'),
    ('English (NL)', 'en-nl'),
    ('Dutch (BE)', 'nl-be'),
    ('English (CH)', 'en-ch'),
    ('Spanish (AR)', 'es-ar'),
    ('Spanish (CL)', 'es-cl'),
    ('Spanish (MX)', 'es-mx'),
    ('Spanish (PE)', 'es-pe'),
    ('French (CH)', 'fr-ch'),
    ('Spanish (CO)', 'es-co'),
    ('English (BE)', 'en-be'),
    ('English (CZ)', 'en-cz'),
    ('English (HU)', 'en-hu'),
    ('English (PL)', 'en-pl'),
    ('French (BE)', 'fr-be'),
    ('Italian (CH)', 'it-ch'),
    ('English (AT)', 'en-at'),
    ('English (ES)', 'en-es'),
    ('English (FR)', 'en-fr'),
    ('English (IT)', 'en-it'),
    ('German (BE)', 'de-be'),
    ('German (ES)', 'de-es'),
    ('English (AR)', 'en-ar'),
    ('English (CL)', 'en-cl'),
    ('English (CO)', 'en-co'),
    ('English (DE)', 'en-de'),
    ('English (MX)', 'en-mx'),
    ('English (PE)', 'en-pe');
"#,
    // 3
    r#"
CREATE INDEX string_name_pattern_idx ON string (name text_pattern_ops);
CREATE INDEX translation_content_pattern_idx ON translation (content text_pattern_ops);
"#,
];

const DOWN: &[&str] = &[
    // 1
    r#"
DROP TABLE IF EXISTS translation;
DROP TABLE IF EXISTS string;
DROP TABLE IF EXISTS language;
DROP TABLE IF EXISTS domain;
"#,
    // 2
    r#"
DELETE FROM language WHERE code IN (
    'nl', 'en-nl', 'nl-be', 'en-ch', 'es-ar', 'es-cl', 'es-mx', 'es-pe', 'fr-ch', 'es-co',
    'en-be', 'en-cz', 'en-hu', 'en-pl', 'fr-be', 'it-ch', 'en-at', 'en-es', 'en-fr', 'en-it',
    'de-be', 'de-es', 'en-ar', 'en-cl', 'en-co', 'en-de', 'en-mx', 'en-pe'
);
"#,
    // 3
    r#"
DROP INDEX IF EXISTS translation_content_pattern_idx;
DROP INDEX IF EXISTS string_name_pattern_idx;
"#,
];

macro_rules! search_select {
    ($filter:literal) => {
        concat!(
            "SELECT d.name, s.name, l.code, t.content ",
            "FROM translation t ",
            "INNER JOIN string s ON s.id = t.string_id ",
            "INNER JOIN language l ON t.language_id = l.id ",
            "INNER JOIN domain d ON s.domain_id = d.id ",
            $filter,
            " ORDER BY d.name, s.name, l.code LIMIT 100"
        )
    };
}

impl QueryAdapter for PostgresAdapter {
    fn driver(&self) -> DbDriver {
        DbDriver::Postgres
    }

    fn supports_last_insert_id(&self) -> bool {
        false
    }

    fn create_domain_query(&self) -> &'static str {
        "INSERT INTO domain (name) VALUES ($1) RETURNING id"
    }

    fn create_string_query(&self) -> &'static str {
        "INSERT INTO string (name, domain_id) VALUES ($1, $2) RETURNING id"
    }

    fn create_translation_query(&self) -> &'static str {
        "INSERT INTO translation (language_id, content, string_id) VALUES ($1, $2, $3) RETURNING id"
    }

    fn create_language_query(&self) -> &'static str {
        "INSERT INTO language (code, name) VALUES ($1, $2) RETURNING id"
    }

    fn get_all_domains_query(&self) -> &'static str {
        "SELECT name FROM domain ORDER BY name"
    }

    fn get_all_languages_query(&self) -> &'static str {
        "SELECT id, code, name FROM language ORDER BY code"
    }

    fn get_single_domain_query(&self) -> &'static str {
        "SELECT d.id, s.id, s.name, l.id, l.code, t.id, t.content \
         FROM domain d \
         LEFT JOIN string s ON d.id = s.domain_id \
         LEFT JOIN translation t ON s.id = t.string_id \
         LEFT JOIN language l ON t.language_id = l.id \
         WHERE d.name = $1 \
         ORDER BY s.name, l.code"
    }

    fn get_single_domain_id_query(&self) -> &'static str {
        "SELECT id FROM domain WHERE name = $1"
    }

    fn get_single_language_query(&self) -> &'static str {
        "SELECT id, code, name FROM language WHERE code = $1"
    }

    fn get_single_string_id_query(&self) -> &'static str {
        "SELECT id FROM string WHERE name = $1 AND domain_id = $2"
    }

    fn get_single_translation_id_query(&self) -> &'static str {
        "SELECT translation.id FROM string \
         INNER JOIN translation ON string.id = translation.string_id \
         WHERE string.id = $1 AND language_id = $2 AND domain_id = $3"
    }

    fn update_translation_query(&self) -> &'static str {
        "UPDATE translation SET language_id = $1, content = $2, string_id = $3 WHERE id = $4"
    }

    fn delete_string_query(&self) -> &'static str {
        "DELETE FROM string WHERE id = $1"
    }

    fn delete_translation_query(&self) -> &'static str {
        "DELETE FROM translation WHERE id = $1"
    }

    fn search_query(&self, field: SearchField) -> &'static str {
        match field {
            SearchField::Name => search_select!("WHERE s.name LIKE $1 ESCAPE '\\'"),
            SearchField::Content => search_select!("WHERE t.content LIKE $1 ESCAPE '\\'"),
            SearchField::All => search_select!("WHERE s.name LIKE $1 ESCAPE '\\' OR t.content LIKE $2 ESCAPE '\\'"),
        }
    }

    fn create_version_table_query(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS schema_migrations (version bigint PRIMARY KEY NOT NULL)"
    }

    fn count_version_rows_query(&self) -> &'static str {
        "SELECT COUNT(*) FROM schema_migrations"
    }

    fn insert_initial_version_query(&self) -> &'static str {
        "INSERT INTO schema_migrations (version) VALUES (0)"
    }

    fn get_version_query(&self) -> &'static str {
        "SELECT version FROM schema_migrations"
    }

    fn update_version_query(&self) -> &'static str {
        "UPDATE schema_migrations SET version = $1"
    }

    fn up_scripts(&self) -> &'static [&'static str] {
        UP
    }

    fn down_scripts(&self) -> &'static [&'static str] {
        DOWN
    }
}
