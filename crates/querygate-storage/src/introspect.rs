// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema introspection from `sqlite_master` and the table pragmas.

use chrono::Utc;
use querygate_core::Schema;
use querygate_core::types::{Column, Relationship, Table};
use rusqlite::{Connection, params};

/// Schema name reported for every table.
pub const MAIN_SCHEMA: &str = "main";

/// Read tables, columns, primary keys and foreign keys. Internal
/// `sqlite_*` tables and views are skipped.
pub fn introspect(conn: &Connection) -> Result<Schema, rusqlite::Error> {
    let names: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        names
    };

    let mut tables = Vec::with_capacity(names.len());
    let mut relationships = Vec::new();

    for name in names {
        tables.push(read_table(conn, &name)?);
        relationships.extend(read_foreign_keys(conn, &name)?);
    }

    // A foreign key without an explicit target column refers to the
    // parent's primary key.
    for rel in &mut relationships {
        if rel.to_column.is_empty()
            && let Some(parent) = tables
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(&rel.to_table))
            && let Some(pk) = parent.primary_keys.first()
        {
            rel.to_column = pk.clone();
        }
    }

    Ok(Schema {
        tables,
        relationships,
        last_updated: Some(Utc::now()),
    })
}

fn read_table(conn: &Connection, name: &str) -> Result<Table, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let rows: Vec<(String, String, bool, i64)> = stmt
        .query_map(params![name], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<Result<_, _>>()?;

    let mut keyed: Vec<(i64, String)> = rows
        .iter()
        .filter(|(_, _, _, pk)| *pk > 0)
        .map(|(col, _, _, pk)| (*pk, col.clone()))
        .collect();
    keyed.sort();
    let primary_keys: Vec<String> = keyed.into_iter().map(|(_, col)| col).collect();

    let columns = rows
        .into_iter()
        .map(|(col, data_type, not_null, pk)| {
            // A lone INTEGER PRIMARY KEY aliases the rowid.
            let identity =
                pk > 0 && primary_keys.len() == 1 && data_type.eq_ignore_ascii_case("INTEGER");
            Column {
                name: col,
                data_type,
                nullable: !not_null && pk == 0,
                identity,
            }
        })
        .collect();

    Ok(Table {
        name: name.to_string(),
        schema: MAIN_SCHEMA.to_string(),
        columns,
        primary_keys,
    })
}

fn read_foreign_keys(conn: &Connection, name: &str) -> Result<Vec<Relationship>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let relationships = stmt
        .query_map(params![name], |row| {
            Ok(Relationship {
                from_table: name.to_string(),
                from_column: row.get(1)?,
                to_table: row.get(0)?,
                to_column: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(relationships)
}
