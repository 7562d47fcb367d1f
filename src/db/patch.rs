use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::models::PatchValue;

/// Run `UPDATE <table> SET updated_at = ?, <column> = ?... WHERE id = ?`
///
/// Column names come from the patch structs and are static; every value is
/// bound. An empty field list touches nothing and reports zero rows.
pub(crate) async fn apply_patch(
    conn: &mut SqliteConnection,
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, PatchValue)>,
    now: i64,
) -> Result<u64, sqlx::Error> {
    if fields.is_empty() {
        return Ok(0);
    }

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE ");
    builder.push(table).push(" SET updated_at = ").push_bind(now);

    for (column, value) in fields {
        builder.push(", ").push(column).push(" = ");
        match value {
            PatchValue::Text(text) => builder.push_bind(text),
            PatchValue::Int(number) => builder.push_bind(number),
            PatchValue::Bool(flag) => builder.push_bind(flag),
        };
    }

    builder.push(" WHERE id = ").push_bind(id);

    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}
