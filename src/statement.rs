//! Parameterized statement model.
//!
//! Every generated record becomes one creation statement carrying an
//! `ON CONFLICT (id) DO NOTHING` guard, paired with a changelog insert. The
//! same model serves both output paths: direct execution binds the parameters
//! (`$N`), while the SQL-file writer substitutes escaped literals and wraps
//! the pair in a data-modifying CTE so the changelog row is only produced
//! when the insert actually inserted.

use uuid::Uuid;

/// A bindable parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// A column value in a creation statement.
#[derive(Debug, Clone)]
pub enum Value {
    Param(SqlParam),
    /// Scalar subquery resolving a reference row by name; `None` renders NULL
    /// (e.g. an unclassified cold-storage temperature).
    LookupByName {
        table: &'static str,
        name: Option<String>,
    },
    /// Verbatim SQL expression (now(), NULL, a numeric literal).
    Raw(&'static str),
}

impl Value {
    pub fn text(v: impl Into<String>) -> Self {
        Value::Param(SqlParam::Text(v.into()))
    }

    pub fn id(v: Uuid) -> Self {
        // Target ids are text columns, so UUIDs travel as their string form.
        Value::Param(SqlParam::Text(v.to_string()))
    }

    pub fn int(v: i64) -> Self {
        Value::Param(SqlParam::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Value::Param(SqlParam::Float(v))
    }

    pub fn bool(v: bool) -> Self {
        Value::Param(SqlParam::Bool(v))
    }
}

/// One executable statement with `$N` placeholders and its bind list.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    pub table: &'static str,
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    /// Build an idempotent INSERT from (column, value) pairs. Placeholders are
    /// numbered in column order; Raw/NULL expressions consume no placeholder.
    pub fn insert(table: &'static str, columns: Vec<(&'static str, Value)>) -> Self {
        let mut names: Vec<&'static str> = Vec::with_capacity(columns.len());
        let mut exprs: Vec<String> = Vec::with_capacity(columns.len());
        let mut params: Vec<SqlParam> = Vec::new();
        let mut next = 1usize;

        for (name, value) in columns {
            names.push(name);
            match value {
                Value::Param(p) => {
                    exprs.push(format!("${next}"));
                    params.push(p);
                    next += 1;
                }
                Value::LookupByName { table, name: Some(lookup) } => {
                    exprs.push(format!("(SELECT id FROM {table} WHERE name = ${next})"));
                    params.push(SqlParam::Text(lookup));
                    next += 1;
                }
                Value::LookupByName { name: None, .. } => exprs.push("NULL".to_string()),
                Value::Raw(raw) => exprs.push(raw.to_string()),
            }
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT (id) DO NOTHING",
            names.join(", "),
            exprs.join(", ")
        );
        Self { table, sql, params }
    }

    /// Render with parameters substituted as escaped SQL literals, for the
    /// generated-file output path.
    pub fn render_literal(&self) -> String {
        substitute_placeholders(&self.sql, &self.params)
    }
}

/// A creation statement paired with the id its changelog entry must carry.
#[derive(Debug, Clone)]
pub struct RecordStatements {
    pub insert: SqlStatement,
    pub record_id: Uuid,
}

impl RecordStatements {
    pub fn new(insert: SqlStatement, record_id: Uuid) -> Self {
        Self { insert, record_id }
    }

    /// The companion changelog insert, for the direct-DB path. Run it only
    /// when the creation statement reported an affected row.
    pub fn changelog(&self) -> SqlStatement {
        SqlStatement {
            table: "changelog",
            sql: "INSERT INTO changelog (table_name, record_id, row_action) VALUES ($1, $2, 'UPSERT')"
                .to_string(),
            params: vec![
                SqlParam::Text(self.insert.table.to_string()),
                SqlParam::Text(self.record_id.to_string()),
            ],
        }
    }

    /// File form: insert and changelog fused into one CTE so the changelog
    /// row appears exactly when the insert was not a conflict no-op.
    pub fn render_cte(&self) -> String {
        format!(
            "WITH ins AS (\n    {} RETURNING id\n)\nINSERT INTO changelog (table_name, record_id, row_action)\nSELECT '{}', id, 'UPSERT' FROM ins;",
            self.insert.render_literal(),
            self.insert.table
        )
    }
}

fn substitute_placeholders(sql: &str, params: &[SqlParam]) -> String {
    let mut out = String::with_capacity(sql.len() + 32);
    let mut chars = sql.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut digits = String::new();
        while let Some((_, d)) = chars.peek() {
            if d.is_ascii_digit() {
                digits.push(*d);
                chars.next();
            } else {
                break;
            }
        }
        let param = digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| params.get(i));
        match param {
            Some(p) => out.push_str(&literal(p)),
            None => {
                // Not a placeholder we know; keep the text untouched.
                out.push('$');
                out.push_str(&digits);
            }
        }
    }
    out
}

fn literal(param: &SqlParam) -> String {
    match param {
        // Double embedded quotes; unescaped input broke the original scripts.
        SqlParam::Text(s) => format!("'{}'", s.replace('\'', "''")),
        SqlParam::Int(i) => i.to_string(),
        SqlParam::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
        SqlParam::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SqlStatement {
        SqlStatement::insert(
            "item",
            vec![
                ("id", Value::text("abc")),
                ("name", Value::text("L'Homme Vax")),
                ("is_vaccine", Value::bool(true)),
                ("vaccine_doses", Value::int(10)),
            ],
        )
    }

    #[test]
    fn insert_carries_conflict_guard() {
        let stmt = sample();
        assert!(stmt.sql.ends_with("ON CONFLICT (id) DO NOTHING"));
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn literal_rendering_escapes_quotes() {
        let rendered = sample().render_literal();
        assert!(rendered.contains("'L''Homme Vax'"));
        assert!(rendered.contains("TRUE"));
        assert!(rendered.contains("10"));
        assert!(!rendered.contains('$'));
    }

    #[test]
    fn lookup_by_name_binds_or_nulls() {
        let with = SqlStatement::insert(
            "item_variant",
            vec![
                ("id", Value::text("v1")),
                (
                    "cold_storage_type_id",
                    Value::LookupByName { table: "cold_storage_type", name: Some("+5".into()) },
                ),
            ],
        );
        assert!(with.sql.contains("(SELECT id FROM cold_storage_type WHERE name = $2)"));
        assert_eq!(with.params.len(), 2);

        let without = SqlStatement::insert(
            "item_variant",
            vec![
                ("id", Value::text("v1")),
                ("cold_storage_type_id", Value::LookupByName { table: "cold_storage_type", name: None }),
            ],
        );
        assert!(without.sql.contains("NULL"));
        assert_eq!(without.params.len(), 1);
    }

    #[test]
    fn placeholder_numbering_past_nine() {
        let columns: Vec<(&'static str, Value)> = vec![
            ("c1", Value::int(1)),
            ("c2", Value::int(2)),
            ("c3", Value::int(3)),
            ("c4", Value::int(4)),
            ("c5", Value::int(5)),
            ("c6", Value::int(6)),
            ("c7", Value::int(7)),
            ("c8", Value::int(8)),
            ("c9", Value::int(9)),
            ("c10", Value::int(10)),
            ("c11", Value::int(11)),
        ];
        let rendered = SqlStatement::insert("t", columns).render_literal();
        assert!(rendered.contains("10, 11"));
        assert!(!rendered.contains('$'));
    }

    #[test]
    fn unknown_placeholders_pass_through_verbatim() {
        // $0 and out-of-range numbers have no bind; the text stays as-is
        // instead of panicking or swallowing characters.
        let stmt = SqlStatement {
            table: "t",
            sql: "INSERT INTO t (a, b, c) VALUES ($0, $1, $9)".to_string(),
            params: vec![SqlParam::Int(7)],
        };
        assert_eq!(
            stmt.render_literal(),
            "INSERT INTO t (a, b, c) VALUES ($0, 7, $9)"
        );
    }

    #[test]
    fn cte_pairs_insert_with_conditional_changelog() {
        let id = Uuid::new_v4();
        let rec = RecordStatements::new(sample(), id);
        let cte = rec.render_cte();
        assert!(cte.starts_with("WITH ins AS ("));
        assert!(cte.contains("ON CONFLICT (id) DO NOTHING RETURNING id"));
        assert!(cte.contains("SELECT 'item', id, 'UPSERT' FROM ins;"));

        let changelog = rec.changelog();
        assert_eq!(changelog.params[0], SqlParam::Text("item".to_string()));
        assert_eq!(changelog.params[1], SqlParam::Text(id.to_string()));
    }
}
