//! SQL surface scan.
//!
//! A lexical pass over generated SQL that finds the identifiers following
//! `FROM` and `JOIN`, plus the comma-separated continuation of a `FROM` list.
//! It does not parse SQL. Identifiers outside the table universe are dropped,
//! which also discards noise such as `EXTRACT(YEAR FROM date_commande)`.
//!
//! The `ONLY` and `LATERAL` modifiers and an opening parenthesis are skipped
//! before the identifier, and `TABLE <name>` (alone or as a subquery) counts as
//! a table reference.
//!
//! Known gap: quoted (`"clients"`) and schema-qualified (`public.clients`)
//! identifiers are not resolved by this check. The database role is the only
//! backstop for them.

use datagate_core::TableUniverse;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const IDENT: &str = r"[a-z_][a-z0-9_$]*";

/// What may sit between `FROM`/`JOIN`/`,` and the table name.
const PREFIX: &str = r"(?:\(\s*)*(?:(?:only|lateral)\s+)?(?:\(\s*)*";

/// `FROM a [AS] x, ONLY b y, c`: captures the whole list.
static FROM_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    let item = format!(r"{PREFIX}{IDENT}(?:\s*\*)?(?:\s+(?:as\s+)?{IDENT})?");
    Regex::new(&format!(r"(?i)\bfrom\b\s*({item}(?:\s*,\s*{item})*)"))
        .expect("from-list pattern compiles")
});

static JOIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bjoin\b\s*{PREFIX}({IDENT})")).expect("join pattern compiles")
});

/// `TABLE [ONLY] name`, the shorthand for `SELECT * FROM name`.
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\btable\s+(?:only\s+)?({IDENT})")).expect("table pattern compiles")
});

static LEADING_IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\s*{PREFIX}({IDENT})")).expect("ident pattern compiles")
});

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*\n?(.*?)\n?\s*```$").expect("fence pattern compiles")
});

/// Every identifier in `FROM`/`JOIN` position, lower-cased, before any
/// universe filtering.
pub fn referenced_identifiers(sql: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    for caps in FROM_LIST_RE.captures_iter(sql) {
        for item in caps[1].split(',') {
            if let Some(ident) = LEADING_IDENT_RE.captures(item) {
                found.insert(ident[1].to_lowercase());
            }
        }
    }

    for caps in JOIN_RE.captures_iter(sql) {
        found.insert(caps[1].to_lowercase());
    }

    for caps in TABLE_RE.captures_iter(sql) {
        found.insert(caps[1].to_lowercase());
    }

    found
}

/// Tables of the universe referenced by `sql`.
///
/// No `FROM`/`JOIN` clause yields an empty set.
pub fn extract_tables(sql: &str, universe: &TableUniverse) -> BTreeSet<String> {
    referenced_identifiers(sql)
        .into_iter()
        .filter(|ident| universe.contains(ident))
        .collect()
}

/// Clean up a model's raw SQL answer before it is checked.
///
/// Trims whitespace, strips one surrounding Markdown code fence and removes a
/// single trailing `;`. Anything else, including an inner `;`, is left for the
/// post-check to judge.
pub fn normalize_generated_sql(raw: &str) -> String {
    let mut sql = raw.trim();

    if let Some(caps) = CODE_FENCE_RE.captures(sql) {
        sql = caps.get(1).map_or("", |m| m.as_str()).trim();
    }

    if let Some(stripped) = sql.strip_suffix(';') {
        sql = stripped.trim_end();
    }

    sql.to_string()
}
