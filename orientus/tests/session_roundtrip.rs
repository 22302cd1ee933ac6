//! Integration tests for the immediate-execution session: statement
//! shapes, lazy schema synchronization, identity adoption, and the
//! bounded connection pool.

mod common;

use std::time::Duration;

use common::{config, row, File, MockDriver, Person, Related, Reply};
use orientus::{Database, Error, PoolOptions, Record, Rid, Saved, Value, Version};

fn connect(driver: &MockDriver) -> Database {
    common::init_logging();
    Database::connect(config(), driver.clone()).expect("connect")
}

#[test]
fn save_synchronizes_schema_then_inserts_and_adopts_identity() {
    let driver = MockDriver::new();
    driver.reply_with("INSERT INTO Person", Reply::Rows(vec![row("#9:0", 1, &[])]));
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let person = Person::new("John");
    session.save(&person).unwrap();

    assert_eq!(
        driver.statements(),
        vec![
            "CREATE CLASS Person IF NOT EXISTS EXTENDS V".to_string(),
            "CREATE PROPERTY Person.name STRING (MANDATORY TRUE)".to_string(),
            "INSERT INTO Person SET name = 'John'".to_string(),
        ]
    );
    assert_eq!(person.state().rid(), Some(Rid::new("#9:0")));
    assert_eq!(person.state().version(), Some(Version(1)));
}

#[test]
fn schema_is_synchronized_once_per_session() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    session.save(&Person::new("John")).unwrap();
    session.save(&Person::new("Marie")).unwrap();

    let ddl_count = driver
        .statements()
        .iter()
        .filter(|s| s.starts_with("CREATE CLASS Person"))
        .count();
    assert_eq!(ddl_count, 1);
}

#[test]
fn unique_descriptor_creates_index_after_properties() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    session.save(&File::new("demo.txt", 1500)).unwrap();

    assert_eq!(
        driver.statements(),
        vec![
            "CREATE CLASS File IF NOT EXISTS".to_string(),
            "CREATE PROPERTY File.filename STRING (MANDATORY TRUE)".to_string(),
            "CREATE PROPERTY File.size LONG (MIN 0)".to_string(),
            "CREATE INDEX File.filename UNIQUE".to_string(),
            "INSERT INTO File SET filename = 'demo.txt', size = 1500".to_string(),
        ]
    );
}

#[test]
fn save_edge_resolves_endpoint_identifiers() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let john = Person::new("John");
    john.state().mark_persisted(Rid::new("#83:0"), Version(1));
    let marie = Person::new("Marie");
    marie.state().mark_persisted(Rid::new("#84:0"), Version(1));

    let mut session = db.session().unwrap();
    session.save(&Related::between(&john, &marie)).unwrap();

    let statements = driver.statements();
    assert!(statements.contains(
        &"CREATE EDGE Related FROM #83:0 TO #84:0 SET relation_type = 'love'".to_string()
    ));
    assert!(statements.contains(&"CREATE CLASS Related IF NOT EXISTS EXTENDS E".to_string()));
}

#[test]
fn save_if_not_exists_adopts_existing_identity_without_insert() {
    let driver = MockDriver::new();
    driver.reply_with(
        "SELECT FROM File WHERE filename = 'demo.txt'",
        Reply::Rows(vec![row(
            "#73:0",
            1,
            &[
                ("filename", Value::from("demo.txt")),
                ("size", Value::from(1500)),
            ],
        )]),
    );
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let file = File::new("demo.txt", 1500);
    let outcome = session.save_if_not_exists(&file).unwrap();

    assert_eq!(outcome, Saved::Existing(Rid::new("#73:0")));
    assert_eq!(file.state().rid(), Some(Rid::new("#73:0")));
    assert!(!driver.statements().iter().any(|s| s.starts_with("INSERT")));
}

#[test]
fn save_if_not_exists_inserts_when_absent() {
    let driver = MockDriver::new();
    driver.reply_with("INSERT INTO File", Reply::Rows(vec![row("#73:1", 1, &[])]));
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let file = File::new("new.txt", 10);
    let outcome = session.save_if_not_exists(&file).unwrap();

    assert_eq!(outcome, Saved::Inserted);
    assert_eq!(file.state().rid(), Some(Rid::new("#73:1")));
}

#[test]
fn duplicate_key_race_propagates() {
    let driver = MockDriver::new();
    driver.reply_with(
        "INSERT INTO File",
        Reply::DuplicateKey("File.filename".to_string()),
    );
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let result = session.save_if_not_exists(&File::new("demo.txt", 1500));
    assert!(matches!(result, Err(Error::DuplicateKey(_))));
}

#[test]
fn fetch_materializes_declared_fields_and_drops_the_rest() {
    let driver = MockDriver::new();
    driver.reply_with(
        "WHERE @rid = '#73:0'",
        Reply::Rows(vec![row(
            "#73:0",
            3,
            &[
                ("filename", Value::from("demo.txt")),
                ("size", Value::from(1500)),
                ("undeclared", Value::from("junk")),
            ],
        )]),
    );
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let file: File = session.fetch(&Rid::new("#73:0")).unwrap().unwrap();

    assert_eq!(file.filename, "demo.txt");
    assert_eq!(file.size, 1500);
    assert_eq!(file.state().version(), Some(Version(3)));

    let missing: Option<File> = session.fetch(&Rid::new("#73:99")).unwrap();
    assert!(missing.is_none());
}

#[test]
fn update_and_delete_statement_shapes() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let file = File::new("demo.txt", 2015);
    file.state().mark_persisted(Rid::new("#73:0"), Version(1));
    let person = Person::new("John");
    person.state().mark_persisted(Rid::new("#83:0"), Version(1));

    let mut session = db.session().unwrap();
    session.update(&file).unwrap();
    session
        .update_by_rid("File", &Rid::new("#73:0"), &[("size", Value::from(4096))])
        .unwrap();
    session.delete(&file).unwrap();
    session.delete(&person).unwrap();

    assert_eq!(
        driver.statements(),
        vec![
            "UPDATE File SET filename = 'demo.txt', size = 2015 WHERE @rid = '#73:0'".to_string(),
            "UPDATE File SET size = 4096 WHERE @rid = '#73:0'".to_string(),
            "DELETE FROM File WHERE @rid = #73:0".to_string(),
            "DELETE VERTEX #83:0".to_string(),
        ]
    );
}

#[test]
fn update_of_unpersisted_record_is_rejected() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let result = session.update(&File::new("demo.txt", 1));
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(driver.statements().is_empty());
}

#[test]
fn upsert_statement_shape() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    session.upsert(&File::new("demo.txt", 1500)).unwrap();

    assert!(driver.statements().contains(
        &"UPDATE File SET filename = 'demo.txt', size = 1500 UPSERT \
          WHERE filename = 'demo.txt' AND size = 1500"
            .to_string()
    ));
}

#[test]
fn constraint_violation_fails_before_any_statement() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let result = session.save(&File::new("demo.txt", -1));

    match result {
        Err(Error::Validation { class, field, .. }) => {
            assert_eq!(class, "File");
            assert_eq!(field, "size");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(!driver.statements().iter().any(|s| s.starts_with("INSERT")));
}

#[test]
fn command_failures_propagate_instead_of_emptying_results() {
    let driver = MockDriver::new();
    driver.reply_with(
        "SELECT FROM Person",
        Reply::CommandError("syntax error".to_string()),
    );
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let result = session.query_raw("SELECT FROM Person");
    assert!(matches!(result, Err(Error::Command(_))));
}

#[test]
fn query_appends_limit_only_when_absent() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    let mut session = db.session().unwrap();
    let _: Vec<File> = session.query("SELECT FROM File", Some(5)).unwrap();
    let _: Vec<File> = session.query("SELECT FROM File LIMIT 2", Some(5)).unwrap();

    assert_eq!(
        driver.statements(),
        vec![
            "SELECT FROM File LIMIT 5".to_string(),
            "SELECT FROM File LIMIT 2".to_string(),
        ]
    );
}

#[test]
fn pool_reuses_released_connections() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    {
        let mut session = db.session().unwrap();
        session.query_raw("SELECT FROM Person").unwrap();
    }
    {
        let mut session = db.session().unwrap();
        session.query_raw("SELECT FROM Person").unwrap();
    }

    // The eager connection from connect() served both sessions.
    assert_eq!(driver.opened(), 1);
    assert_eq!(db.idle_connections(), 1);
}

#[test]
fn exhausted_pool_times_out() {
    let driver = MockDriver::new();
    let db = Database::connect_with(
        config(),
        driver.clone(),
        PoolOptions {
            max_connections: 1,
            acquire_timeout: Duration::from_millis(20),
        },
    )
    .unwrap();

    let _held = db.session().unwrap();
    let result = db.session();
    assert!(matches!(result, Err(Error::PoolTimeout(_))));
}

#[test]
fn close_drains_idle_connections() {
    let driver = MockDriver::new();
    let db = connect(&driver);

    db.close().unwrap();
    assert_eq!(db.idle_connections(), 0);
    assert_eq!(*driver.closed.lock(), 1);
}
