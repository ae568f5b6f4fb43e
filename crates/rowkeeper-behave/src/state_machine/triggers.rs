//! Trigger bodies implementing the stateful behavior.
//!
//! Each dialect provides four coordinated triggers per entity: insert and
//! update validation, and insert and update queueing. Rejection messages
//! must stay in sync with the `MSG_*` constants in the parent module.

/// MySQL: validation and assignment happen in `BEFORE` triggers.
pub(crate) const MYSQL: [&str; 4] = [
    r"CREATE TRIGGER <<Table>>_stateful_bfr_insert BEFORE INSERT ON <<Table>> FOR EACH ROW
BEGIN
    DECLARE deft VARCHAR(128);
    DECLARE entr JSON;
    DECLARE sts  JSON;
    DECLARE fnd  INT DEFAULT 0;

    SELECT COUNT(1) INTO fnd FROM state_machine WHERE entity = '<<Table>>';
    IF fnd > 0 THEN
        SELECT default_state, entry_states, states INTO deft, entr, sts
        FROM state_machine WHERE entity = '<<Table>>' LIMIT 1;
    END IF;

    IF NEW.machine_state IS NOT NULL THEN
        IF fnd = 0 THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'State machine definition is missing';
        ELSEIF entr IS NOT NULL AND JSON_LENGTH(entr) > 0
            AND JSON_CONTAINS(entr, JSON_QUOTE(NEW.machine_state)) = 0 THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'Invalid machine_state, should be one of entry_states';
        ELSEIF sts IS NOT NULL AND JSON_LENGTH(sts) > 0
            AND JSON_CONTAINS(sts, JSON_QUOTE(NEW.machine_state)) = 0 THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'Invalid machine_state, should be one of states';
        END IF;
    ELSEIF fnd > 0 THEN
        SET NEW.machine_state = deft;
    END IF;

    IF NEW.machine_state IS NOT NULL THEN
        SET NEW.stated_at = NOW();
    END IF;
END",
    r"CREATE TRIGGER <<Table>>_stateful_bfr_update BEFORE UPDATE ON <<Table>> FOR EACH ROW
BEGIN
    DECLARE entr JSON;
    DECLARE sts  JSON;
    DECLARE trns JSON;
    DECLARE fnd  INT DEFAULT 0;

    IF NEW.machine_state IS NULL THEN
        IF OLD.machine_state IS NOT NULL THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'UPDATE cannot set machine_state to NULL';
        END IF;
    ELSEIF OLD.machine_state IS NULL OR OLD.machine_state <> NEW.machine_state THEN
        SELECT COUNT(1) INTO fnd FROM state_machine WHERE entity = '<<Table>>';
        IF fnd = 0 THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'State machine definition is missing';
        END IF;

        SELECT entry_states, states, transitions INTO entr, sts, trns
        FROM state_machine WHERE entity = '<<Table>>' LIMIT 1;

        IF sts IS NOT NULL AND JSON_LENGTH(sts) > 0
            AND JSON_CONTAINS(sts, JSON_QUOTE(NEW.machine_state)) = 0 THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'New state is not a valid state definition';
        END IF;

        IF OLD.machine_state IS NULL THEN
            IF entr IS NOT NULL AND JSON_LENGTH(entr) > 0
                AND JSON_CONTAINS(entr, JSON_QUOTE(NEW.machine_state)) = 0 THEN
                SIGNAL SQLSTATE '45000'
                SET MESSAGE_TEXT = 'UPDATE must assign an entry state, as old state is NULL';
            END IF;
        ELSEIF trns IS NOT NULL AND JSON_LENGTH(trns) > 0
            AND JSON_CONTAINS(trns, JSON_OBJECT('from', OLD.machine_state, 'to', NEW.machine_state)) = 0 THEN
            SIGNAL SQLSTATE '45000'
            SET MESSAGE_TEXT = 'No transition available from old state to new one';
        END IF;

        SET NEW.stated_at = NOW();
    END IF;
END",
    r"CREATE TRIGGER <<Table>>_stateful_aft_insert AFTER INSERT ON <<Table>> FOR EACH ROW
BEGIN
    IF NEW.machine_state IS NOT NULL THEN
        INSERT INTO state_machine_queue (entity, entity_id, created_at, updated_at, old_state, new_state)
        VALUES ('<<Table>>', NEW.id, NEW.created_at, NEW.updated_at, '', NEW.machine_state);
    END IF;
END",
    r"CREATE TRIGGER <<Table>>_stateful_aft_update AFTER UPDATE ON <<Table>> FOR EACH ROW
BEGIN
    IF OLD.machine_state IS NULL AND NEW.machine_state IS NOT NULL THEN
        INSERT INTO state_machine_queue (entity, entity_id, created_at, updated_at, old_state, new_state)
        VALUES ('<<Table>>', NEW.id, NEW.created_at, NEW.updated_at, '', NEW.machine_state);
    ELSEIF OLD.machine_state IS NOT NULL AND NEW.machine_state IS NOT NULL
        AND OLD.machine_state <> NEW.machine_state THEN
        INSERT INTO state_machine_queue (entity, entity_id, created_at, updated_at, old_state, new_state)
        VALUES ('<<Table>>', NEW.id, NEW.created_at, NEW.updated_at, OLD.machine_state, NEW.machine_state);
    END IF;
END",
];

/// SQLite: `BEFORE` triggers only validate. The default state and the
/// `stated_at` stamp are written by `AFTER` triggers, and a default is
/// applied as an update so it travels the first-assignment path.
pub(crate) const SQLITE: [&str; 4] = [
    r"CREATE TRIGGER <<Table>>_stateful_bfr_insert BEFORE INSERT ON <<Table>> FOR EACH ROW
WHEN NEW.machine_state IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'State machine definition is missing')
    WHERE NOT EXISTS (SELECT 1 FROM state_machine WHERE entity = '<<Table>>');

    SELECT RAISE(ABORT, 'Invalid machine_state, should be one of entry_states')
    FROM state_machine sm
    WHERE sm.entity = '<<Table>>'
      AND json_array_length(coalesce(sm.entry_states, '[]')) > 0
      AND NOT EXISTS (SELECT 1 FROM json_each(sm.entry_states) e WHERE e.value = NEW.machine_state);

    SELECT RAISE(ABORT, 'Invalid machine_state, should be one of states')
    FROM state_machine sm
    WHERE sm.entity = '<<Table>>'
      AND json_array_length(coalesce(sm.states, '[]')) > 0
      AND NOT EXISTS (SELECT 1 FROM json_each(sm.states) s WHERE s.value = NEW.machine_state);
END",
    r"CREATE TRIGGER <<Table>>_stateful_bfr_update BEFORE UPDATE OF machine_state ON <<Table>> FOR EACH ROW
WHEN NEW.machine_state IS NOT OLD.machine_state
BEGIN
    SELECT RAISE(ABORT, 'UPDATE cannot set machine_state to NULL')
    WHERE NEW.machine_state IS NULL;

    SELECT RAISE(ABORT, 'State machine definition is missing')
    WHERE NOT EXISTS (SELECT 1 FROM state_machine WHERE entity = '<<Table>>');

    SELECT RAISE(ABORT, 'New state is not a valid state definition')
    FROM state_machine sm
    WHERE sm.entity = '<<Table>>'
      AND json_array_length(coalesce(sm.states, '[]')) > 0
      AND NOT EXISTS (SELECT 1 FROM json_each(sm.states) s WHERE s.value = NEW.machine_state);

    SELECT RAISE(ABORT, 'UPDATE must assign an entry state, as old state is NULL')
    FROM state_machine sm
    WHERE sm.entity = '<<Table>>'
      AND OLD.machine_state IS NULL
      AND json_array_length(coalesce(sm.entry_states, '[]')) > 0
      AND NOT EXISTS (SELECT 1 FROM json_each(sm.entry_states) e WHERE e.value = NEW.machine_state);

    SELECT RAISE(ABORT, 'No transition available from old state to new one')
    FROM state_machine sm
    WHERE sm.entity = '<<Table>>'
      AND OLD.machine_state IS NOT NULL
      AND json_array_length(coalesce(sm.transitions, '[]')) > 0
      AND NOT EXISTS (
          SELECT 1 FROM json_each(sm.transitions) t
          WHERE json_extract(t.value, '$.from') = OLD.machine_state
            AND json_extract(t.value, '$.to') = NEW.machine_state
      );
END",
    r"CREATE TRIGGER <<Table>>_stateful_aft_insert AFTER INSERT ON <<Table>> FOR EACH ROW
BEGIN
    INSERT INTO state_machine_queue (entity, entity_id, created_at, updated_at, old_state, new_state)
    SELECT '<<Table>>', NEW.id, NEW.created_at, NEW.updated_at, '', NEW.machine_state
    WHERE NEW.machine_state IS NOT NULL;

    UPDATE <<Table>> SET stated_at = CURRENT_TIMESTAMP
    WHERE id = NEW.id AND NEW.machine_state IS NOT NULL;

    UPDATE <<Table>>
    SET machine_state = (SELECT default_state FROM state_machine WHERE entity = '<<Table>>')
    WHERE id = NEW.id
      AND NEW.machine_state IS NULL
      AND EXISTS (
          SELECT 1 FROM state_machine
          WHERE entity = '<<Table>>' AND default_state IS NOT NULL
      );
END",
    r"CREATE TRIGGER <<Table>>_stateful_aft_update AFTER UPDATE OF machine_state ON <<Table>> FOR EACH ROW
WHEN NEW.machine_state IS NOT NULL AND NEW.machine_state IS NOT OLD.machine_state
BEGIN
    INSERT INTO state_machine_queue (entity, entity_id, created_at, updated_at, old_state, new_state)
    VALUES ('<<Table>>', NEW.id, NEW.created_at, NEW.updated_at, coalesce(OLD.machine_state, ''), NEW.machine_state);

    UPDATE <<Table>> SET stated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END",
];
