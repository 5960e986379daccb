//! End-to-end use of the public API against the in-memory backend

use quarry_orm::{
    AttributeMap, CrudOperations, Database, DatabaseConfig, Environment, FactoryConfig, FactoryRegistry,
    Faker, IsolationLevel, MemoryPool, Model, ModelError, ModelInstance, SeedOptions, SeederRunner,
    CustomSeeder, TransactionConfig,
};
use serde_json::{json, Value as JsonValue};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

struct UserProfile;

impl Model for UserProfile {
    fn hidden() -> &'static [&'static str] {
        &["password_hash"]
    }

    fn computed(attributes: &AttributeMap) -> AttributeMap {
        let mut extra = AttributeMap::new();
        if let (Some(JsonValue::String(first)), Some(JsonValue::String(last))) =
            (attributes.get("first_name"), attributes.get("last_name"))
        {
            extra.insert("full_name".to_string(), json!(format!("{} {}", first, last)));
        }
        extra
    }
}

fn profile_blueprint(faker: &mut Faker, index: usize, data: &JsonValue) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    attributes.insert("first_name".to_string(), json!(faker.first_name()));
    attributes.insert("last_name".to_string(), json!(faker.last_name()));
    attributes.insert("email".to_string(), json!(faker.unique_email(index)));
    attributes.insert("password_hash".to_string(), json!(faker.uuid().to_string()));
    quarry_orm::factory::merge_data(attributes, data)
}

#[tokio::test]
async fn test_profile_round_trip() {
    init_tracing();
    assert_eq!(UserProfile::table_name(), "user_profiles");

    let config = DatabaseConfig::memory();
    let db = Database::connect(&config).await.unwrap();

    let registry = FactoryRegistry::new();
    registry.blueprint("UserProfile", profile_blueprint);
    let mut factory = registry.model_with::<UserProfile>(FactoryConfig::seeded(7)).unwrap();

    let created = factory
        .create(&db, json!({"first_name": "Grace", "last_name": "Hopper"}))
        .await
        .unwrap();
    let id = created.primary_key().cloned().unwrap();

    let mut loaded = UserProfile::find_or_fail(&db, id.clone()).await.unwrap();
    let shown = loaded.to_json();
    assert_eq!(shown["full_name"], json!("Grace Hopper"));
    assert!(shown.get("password_hash").is_none());

    loaded.set("first_name", "Rear Admiral Grace").unwrap();
    assert_eq!(loaded.dirty().len(), 1);
    assert!(loaded.save(&db).await.unwrap());

    let again = UserProfile::find_or_fail(&db, id).await.unwrap();
    assert_eq!(again.get("first_name"), Some(json!("Rear Admiral Grace")));
}

#[tokio::test]
async fn test_transaction_with_isolation_level() {
    init_tracing();
    let pool = MemoryPool::new();
    let db = Database::from_memory(pool.clone());

    let config = TransactionConfig {
        isolation_level: Some(IsolationLevel::Serializable),
        read_only: false,
    };
    let mut tx = db.transaction_with(config).await.unwrap();
    let mut profile = ModelInstance::<UserProfile>::new();
    profile.set("email", "tx@example.com").unwrap();
    profile.save(&mut tx).await.unwrap();
    assert!(pool.rows("user_profiles").is_empty());
    tx.commit().await.unwrap();

    assert_eq!(UserProfile::count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_seed_runner_stops_on_failure() {
    init_tracing();
    let db = Database::memory();

    let runner = SeederRunner::new()
        .add(CustomSeeder::new("Profiles", |db: Database| async move {
            let mut profile = ModelInstance::<UserProfile>::new();
            profile.set("email", "seed@example.com")?;
            profile.save(&db).await?;
            anyhow::Ok(())
        }))
        .add(CustomSeeder::new("Broken", |_db| async { Err(anyhow::anyhow!("boom")) }))
        .add(CustomSeeder::new("NeverReached", |_db| async { anyhow::Ok(()) }));

    let err = runner
        .run(&db, &SeedOptions::new(Environment::Development))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Seeder(ref message) if message.contains("Broken")));
    assert_eq!(UserProfile::count(&db).await.unwrap(), 1);
}
