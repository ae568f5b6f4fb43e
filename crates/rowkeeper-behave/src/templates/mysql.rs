//! MySQL trigger templates.

use super::sql_literal;

macro_rules! uid_trigger {
    ($name:literal, $len:literal) => {
        concat!(
            "CREATE TRIGGER <<Table>>_", $name, "_bfr_insert BEFORE INSERT ON <<Table>> FOR EACH ROW
BEGIN
    DECLARE taken INT DEFAULT 1;
    IF NEW.uid IS NULL OR NEW.uid = '' THEN
        WHILE taken > 0 DO
            SET NEW.uid = LOWER(SUBSTRING(SHA2(CONCAT(RAND(), UUID()), 256), 1, ", $len, "));
            SET taken = (SELECT COUNT(*) FROM <<Table>> WHERE uid = NEW.uid);
        END WHILE;
    END IF;
END"
        )
    };
}

pub(crate) const UID10: [&str; 1] = [uid_trigger!("uid10", "10")];

pub(crate) const UID8: [&str; 1] = [uid_trigger!("uid8", "8")];

pub(crate) const SOFT_DELETE: [&str; 2] = [
    r"CREATE TRIGGER <<Table>>_softdelete_bfr_delete BEFORE DELETE ON <<Table>> FOR EACH ROW
BEGIN
    SIGNAL SQLSTATE '45000'
    SET MESSAGE_TEXT = 'Cannot delete records from table. Instead set deleted=1';
END",
    r"CREATE TRIGGER <<Table>>_softdelete_bfr_update BEFORE UPDATE ON <<Table>> FOR EACH ROW
BEGIN
    IF (OLD.deleted = 0) AND (NEW.deleted = 1) THEN
        SET NEW.deleted_at = NOW();
    END IF;
    IF (OLD.deleted = 1) AND (NEW.deleted = 0) THEN
        SET NEW.deleted_at = NULL;
    END IF;
END",
];

pub(crate) const TIMED: &str = "ALTER TABLE <<Table>> MODIFY COLUMN updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP";

/// Builds the SEO triggers for a URL source column and prefix.
pub(crate) fn seo(url_column: &str, url_prefix: &str) -> Vec<String> {
    let prefix = sql_literal(url_prefix);

    vec![
        r#"CREATE TRIGGER <<Table>>_seo_bfr_update BEFORE UPDATE ON <<Table>> FOR EACH ROW
BEGIN
    IF NEW.url = '' THEN
        SIGNAL SQLSTATE '45000'
        SET MESSAGE_TEXT = '<<Table>>.url cannot be updated to EMPTY';
    END IF;
    IF LEFT(NEW.url, 1) <> '/' THEN
        SET NEW.url = CONCAT('/', NEW.url);
    END IF;
    IF (OLD.url <> '') AND (NEW.url <> OLD.url) THEN
        IF NEW.url_past IS NULL THEN
            SET NEW.url_past = JSON_ARRAY();
        END IF;
        IF JSON_CONTAINS(NEW.url_past, JSON_ARRAY(OLD.url)) = 0 THEN
            SET NEW.url_past = JSON_ARRAY_APPEND(NEW.url_past, '$', OLD.url);
        END IF;
    END IF;
END"#
            .to_string(),
        format!(
            r"CREATE TRIGGER <<Table>>_seo_bfr_insert BEFORE INSERT ON <<Table>> FOR EACH ROW
BEGIN
    DECLARE suffix INT DEFAULT 0;
    DECLARE found INT DEFAULT 0;

    IF NEW.url IS NULL OR NEW.url = '' THEN
        SET NEW.url = CONCAT('{prefix}/', LOWER(REPLACE(TRIM(COALESCE(NEW.{url_column}, '')), ' ', '-')));
    END IF;
    IF LEFT(NEW.url, 1) <> '/' THEN
        SET NEW.url = CONCAT('/', NEW.url);
    END IF;

    SET found = (SELECT COUNT(*) FROM <<Table>> WHERE url = NEW.url);
    WHILE found > 0 DO
        SET suffix = suffix + 1;
        IF NOT EXISTS (SELECT 1 FROM <<Table>> WHERE url = CONCAT(NEW.url, suffix)) THEN
            SET NEW.url = CONCAT(NEW.url, suffix);
            SET found = 0;
        END IF;
    END WHILE;
END"
        ),
    ]
}
