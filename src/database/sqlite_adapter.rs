/*!
 * SQLite dialect.
 */

use crate::app_config::DbDriver;
use crate::errors::Result;
use crate::model::SearchField;

use super::adapter::QueryAdapter;
use super::connection::SqlConnection;

/// Adapter for SQLite 3 databases
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAdapter;

const UP: &[&str] = &[
    // 1
    r#"
CREATE TABLE "domain" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL UNIQUE
);
CREATE TABLE "language" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL,
    "code" TEXT NOT NULL
);
CREATE UNIQUE INDEX "code" ON "language" ("code");
CREATE TABLE "string" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL,
    "domain_id" INTEGER NOT NULL REFERENCES "domain"("id") ON UPDATE CASCADE ON DELETE CASCADE
);
CREATE INDEX "domain_id" ON "string" ("domain_id");
CREATE INDEX "name" ON "string" ("name");
CREATE UNIQUE INDEX "name_domain_id" ON "string" ("name", "domain_id");
CREATE TABLE "translation" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "language_id" INTEGER NOT NULL REFERENCES "language"("id") ON UPDATE CASCADE ON DELETE CASCADE,
    "content" TEXT NOT NULL,
    "string_id" INTEGER NOT NULL REFERENCES "string"("id") ON UPDATE CASCADE ON DELETE CASCADE
);
CREATE INDEX "language_id" ON "translation" ("language_id");
CREATE INDEX "string_id" ON "translation" ("string_id");
CREATE UNIQUE INDEX "string_id_language_id" ON "translation" ("language_id", "string_id");
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
    "INSERT INTO language (code, name) VALUES ('nl', 'Dutch');",
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
    "DELETE FROM language WHERE code = 'nl';",
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

impl QueryAdapter for SqliteAdapter {
    fn driver(&self) -> DbDriver {
        DbDriver::Sqlite3
    }

    fn supports_last_insert_id(&self) -> bool {
        true
    }

    fn post_create(&self, conn: &mut dyn SqlConnection) -> Result<()> {
        // Deleting a string cascades to its translations only with foreign keys on
        conn.execute_batch(
            "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;",
        )
    }

    fn create_domain_query(&self) -> &'static str {
        "INSERT INTO domain (name) VALUES (?)"
    }

    fn create_string_query(&self) -> &'static str {
        "INSERT INTO string (name, domain_id) VALUES (?, ?)"
    }

    fn create_translation_query(&self) -> &'static str {
        "INSERT INTO translation (language_id, content, string_id) VALUES (?, ?, ?)"
    }

    fn create_language_query(&self) -> &'static str {
        "INSERT INTO language (code, name) VALUES (?, ?)"
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
         WHERE d.name = ? \
         ORDER BY s.name, l.code"
    }

    fn get_single_domain_id_query(&self) -> &'static str {
        "SELECT id FROM domain WHERE name = ?"
    }

    fn get_single_language_query(&self) -> &'static str {
        "SELECT id, code, name FROM language WHERE code = ?"
    }

    fn get_single_string_id_query(&self) -> &'static str {
        "SELECT id FROM string WHERE name = ? AND domain_id = ?"
    }

    fn get_single_translation_id_query(&self) -> &'static str {
        "SELECT translation.id FROM string \
         INNER JOIN translation ON string.id = translation.string_id \
         WHERE string.id = ? AND language_id = ? AND domain_id = ?"
    }

    fn update_translation_query(&self) -> &'static str {
        "UPDATE translation SET language_id = ?, content = ?, string_id = ? WHERE id = ?"
    }

    fn delete_string_query(&self) -> &'static str {
        "DELETE FROM string WHERE id = ?"
    }

    fn delete_translation_query(&self) -> &'static str {
        "DELETE FROM translation WHERE id = ?"
    }

    fn search_query(&self, field: SearchField) -> &'static str {
        match field {
            SearchField::Name => search_select!("WHERE s.name LIKE ? ESCAPE '\\'"),
            SearchField::Content => search_select!("WHERE t.content LIKE ? ESCAPE '\\'"),
            SearchField::All => search_select!("WHERE s.name LIKE ? ESCAPE '\\' OR t.content LIKE ? ESCAPE '\\'"),
        }
    }

    fn create_version_table_query(&self) -> &'static str {
        r#"CREATE TABLE IF NOT EXISTS "schema_migrations" ("version" INTEGER PRIMARY KEY NOT NULL)"#
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
        "UPDATE schema_migrations SET version = ?"
    }

    fn up_scripts(&self) -> &'static [&'static str] {
        UP
    }

    fn down_scripts(&self) -> &'static [&'static str] {
        DOWN
    }
}
