//! SQLite trigger templates.
//!
//! SQLite triggers cannot assign `NEW` columns, loop, or use CTEs, so
//! assignments are follow-up `UPDATE`s keyed on `id` inside `AFTER`
//! triggers, and searches are written as set-based subqueries.

use super::sql_literal;

macro_rules! uid_trigger {
    ($name:literal, $len:literal) => {
        concat!(
            "CREATE TRIGGER <<Table>>_", $name, "_aft_insert AFTER INSERT ON <<Table>> FOR EACH ROW
WHEN coalesce(NEW.uid, '') = ''
BEGIN
    UPDATE <<Table>> SET uid = substr(lower(hex(randomblob(8))), 1, ", $len, ")
    WHERE id = NEW.id;

    UPDATE <<Table>> SET uid = substr(lower(hex(randomblob(8))), 1, ", $len, ")
    WHERE id = NEW.id
      AND EXISTS (SELECT 1 FROM <<Table>> o, <<Table>> n WHERE n.id = NEW.id AND o.id <> n.id AND o.uid = n.uid);

    UPDATE <<Table>> SET uid = substr(lower(hex(randomblob(8))), 1, ", $len, ")
    WHERE id = NEW.id
      AND EXISTS (SELECT 1 FROM <<Table>> o, <<Table>> n WHERE n.id = NEW.id AND o.id <> n.id AND o.uid = n.uid);

    SELECT RAISE(ABORT, 'Could not generate a unique uid')
    WHERE EXISTS (SELECT 1 FROM <<Table>> o, <<Table>> n WHERE n.id = NEW.id AND o.id <> n.id AND o.uid = n.uid);
END"
        )
    };
}

pub(crate) const UID10: [&str; 1] = [uid_trigger!("uid10", "10")];

pub(crate) const UID8: [&str; 1] = [uid_trigger!("uid8", "8")];

pub(crate) const SOFT_DELETE: [&str; 2] = [
    r"CREATE TRIGGER <<Table>>_softdelete_bfr_delete BEFORE DELETE ON <<Table>> FOR EACH ROW
BEGIN
    SELECT RAISE(ABORT, 'Cannot delete records from table. Instead set deleted=1');
END",
    r"CREATE TRIGGER <<Table>>_softdelete_aft_update AFTER UPDATE OF deleted ON <<Table>> FOR EACH ROW
WHEN NEW.deleted IS NOT OLD.deleted
BEGIN
    UPDATE <<Table>> SET deleted_at = CURRENT_TIMESTAMP
    WHERE id = NEW.id AND OLD.deleted = 0 AND NEW.deleted = 1;

    UPDATE <<Table>> SET deleted_at = NULL
    WHERE id = NEW.id AND OLD.deleted = 1 AND NEW.deleted = 0;
END",
];

/// Refreshes `updated_at` on any update that did not set it explicitly.
///
/// The SQLite introspector reports this trigger as the column's
/// `on update CURRENT_TIMESTAMP` modifier.
pub(crate) const TIMED: &str = r"CREATE TRIGGER <<Table>>_timed_aft_update AFTER UPDATE ON <<Table>> FOR EACH ROW
WHEN NEW.updated_at IS OLD.updated_at
BEGIN
    UPDATE <<Table>> SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END";

/// Builds the SEO triggers for a URL source column and prefix.
///
/// The insert trigger finalizes the URL with follow-up updates, which the
/// update trigger records like any other change. It then restores the
/// inserted `url_past`, so a new row starts without history.
pub(crate) fn seo(url_column: &str, url_prefix: &str) -> Vec<String> {
    let prefix = sql_literal(url_prefix);

    vec![
        r"CREATE TRIGGER <<Table>>_seo_bfr_update BEFORE UPDATE OF url ON <<Table>> FOR EACH ROW
WHEN NEW.url = ''
BEGIN
    SELECT RAISE(ABORT, '<<Table>>.url cannot be updated to EMPTY');
END"
        .to_string(),
        r"CREATE TRIGGER <<Table>>_seo_aft_update AFTER UPDATE OF url ON <<Table>> FOR EACH ROW
WHEN NEW.url IS NOT OLD.url
BEGIN
    UPDATE <<Table>> SET url = '/' || url
    WHERE id = NEW.id AND substr(url, 1, 1) <> '/';

    UPDATE <<Table>> SET url_past = json_insert(coalesce(url_past, '[]'), '$[#]', OLD.url)
    WHERE id = NEW.id
      AND coalesce(OLD.url, '') <> ''
      AND url <> OLD.url
      AND NOT EXISTS (SELECT 1 FROM json_each(coalesce(NEW.url_past, '[]')) p WHERE p.value = OLD.url);
END"
        .to_string(),
        format!(
            r"CREATE TRIGGER <<Table>>_seo_aft_insert AFTER INSERT ON <<Table>> FOR EACH ROW
BEGIN
    UPDATE <<Table>>
    SET url = '{prefix}/' || lower(replace(trim(coalesce(NEW.{url_column}, '')), ' ', '-'))
    WHERE id = NEW.id AND coalesce(NEW.url, '') = '';

    UPDATE <<Table>> SET url = '/' || url
    WHERE id = NEW.id AND substr(url, 1, 1) <> '/';

    UPDATE <<Table>>
    SET url = url || (
        SELECT min(c.n) FROM (
            SELECT 1 AS n
            UNION
            SELECT CAST(substr(o.url, length(r.url) + 1) AS INTEGER) + 1
            FROM <<Table>> o, <<Table>> r
            WHERE r.id = NEW.id AND o.id <> r.id
              AND length(o.url) > length(r.url)
              AND substr(o.url, 1, length(r.url)) = r.url
              AND substr(o.url, length(r.url) + 1, 1) BETWEEN '0' AND '9'
        ) c
        WHERE c.n >= 1
          AND NOT EXISTS (
            SELECT 1 FROM <<Table>> y, <<Table>> r2
            WHERE r2.id = NEW.id AND y.url = r2.url || c.n
        )
    )
    WHERE id = NEW.id
      AND EXISTS (
          SELECT 1 FROM <<Table>> x, <<Table>> r3
          WHERE r3.id = NEW.id AND x.id <> r3.id AND x.url = r3.url
      );

    UPDATE <<Table>> SET url_past = NEW.url_past
    WHERE id = NEW.id AND url_past IS NOT NEW.url_past;
END"
        ),
    ]
}
