use std::sync::Arc;

use filament::{key, keys, Blueprint, Context, Extras, Registry};

// --- Test Fixtures ---

struct AppConfig {
  database_url: String,
}

struct DatabaseConnection {
  config: Arc<AppConfig>,
}

// The trait must be Send + Sync for its handles to cross the container.
trait Store: Send + Sync {
  fn kind(&self) -> &'static str;
}

struct SqlStore;

impl Store for SqlStore {
  fn kind(&self) -> &'static str {
    "sql"
  }
}

fn registry() -> Arc<Registry> {
  let registry = Arc::new(Registry::new());
  registry
    .register(Blueprint::for_type::<AppConfig>().constructor(keys![], |_| {
      Ok(AppConfig {
        database_url: "postgres://localhost/app".to_string(),
      })
    }))
    .expect("register AppConfig");
  registry
    .register(
      Blueprint::for_type::<DatabaseConnection>().constructor(keys![AppConfig], |cx| {
        Ok(DatabaseConnection {
          config: cx.demand::<AppConfig>()?,
        })
      }),
    )
    .expect("register DatabaseConnection");
  registry
    .register(
      Blueprint::for_type::<SqlStore>()
        .constructor(keys![], |_| Ok(SqlStore))
        .implements::<dyn Store>(|store| store),
    )
    .expect("register SqlStore");
  registry
}

// --- Lookup ---

#[test]
fn test_get_synthesizes_and_is_idempotent() {
  // Arrange
  let context = Context::new(registry());

  // Act
  let first = context.get::<DatabaseConnection>().expect("synthesized");
  let second = context.get::<DatabaseConnection>().expect("cached");

  // Assert: the second lookup returns the identical instance.
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(first.config.database_url, "postgres://localhost/app");
  // The constructor dependency was memoized along the way.
  assert!(context.contains(key!(AppConfig)));
}

#[test]
fn test_interface_lookup_returns_stored_implementation() {
  // Arrange: synthesize the concrete implementation first.
  let context = Context::new(registry());
  let concrete = context.get::<SqlStore>().expect("synthesized");
  let entries_before = context.len();

  // Act
  let via_interface = context.get::<dyn Store>().expect("assignable match");

  // Assert: same underlying object, no extra entry stored.
  assert_eq!(via_interface.kind(), "sql");
  assert!(std::ptr::eq(
    Arc::as_ptr(&via_interface) as *const u8,
    Arc::as_ptr(&concrete) as *const u8,
  ));
  assert_eq!(context.len(), entries_before);
}

#[test]
fn test_interface_lookup_synthesizes_single_implementer() {
  // Arrange: nothing stored yet.
  let context = Context::new(registry());

  // Act
  let store = context.get::<dyn Store>().expect("implementer synthesized");

  // Assert: the concrete type was built and cached under its own key,
  // never under the interface key.
  assert_eq!(store.kind(), "sql");
  assert!(context.contains(key!(SqlStore)));
  assert!(!context.contains(key!(trait Store)));
}

#[test]
fn test_unregistered_type_resolves_to_none() {
  struct Unregistered;

  let context = Context::new(registry());

  // Absence is an expected outcome, not a panic.
  assert!(context.get::<Unregistered>().is_none());
}

// --- Fresh instances ---

#[test]
fn test_get_new_bypasses_the_cache() {
  let context = Context::new(registry());
  let cached = context.get::<AppConfig>().expect("cached");

  let fresh = context.get_new::<AppConfig>().expect("fresh");

  assert!(!Arc::ptr_eq(&cached, &fresh));
  // The cache still serves the original.
  let again = context.get::<AppConfig>().expect("cached again");
  assert!(Arc::ptr_eq(&cached, &again));
}

// --- Scoped overrides ---

#[test]
fn test_scoped_override_does_not_mutate_parent() {
  let context = Context::new(registry());
  let custom = Arc::new(AppConfig {
    database_url: "postgres://replica/app".to_string(),
  });

  let connection = context
    .get_scoped::<DatabaseConnection>(Extras::new().with(custom.clone()))
    .expect("scoped resolution");

  // The scoped resolution saw the override...
  assert_eq!(connection.config.database_url, "postgres://replica/app");
  assert!(Arc::ptr_eq(&connection.config, &custom));
  // ...and the parent context never saw anything at all.
  assert!(!context.contains(key!(AppConfig)));
  assert!(!context.contains(key!(DatabaseConnection)));
}

#[test]
fn test_scoped_override_shadows_inherited_instance() {
  let context = Context::new(registry());
  let original = context.get::<AppConfig>().expect("original");

  let custom = Arc::new(AppConfig {
    database_url: "postgres://replica/app".to_string(),
  });
  let connection = context
    .get_scoped::<DatabaseConnection>(Extras::new().with(custom))
    .expect("scoped resolution");

  assert_eq!(connection.config.database_url, "postgres://replica/app");
  // The parent still holds the original instance.
  let after = context.get::<AppConfig>().expect("unchanged");
  assert!(Arc::ptr_eq(&original, &after));
}

// --- Direct writes and merging ---

#[test]
fn test_put_replaces_existing_entry() {
  let context = Context::new(registry());
  context.put(AppConfig {
    database_url: "first".to_string(),
  });
  context.put(AppConfig {
    database_url: "second".to_string(),
  });

  let config = context.get::<AppConfig>().expect("stored");
  assert_eq!(config.database_url, "second");
  assert_eq!(context.len(), 1);
}

#[test]
fn test_merge_copies_instances_with_later_writes_winning() {
  let registry = registry();
  let target = Context::new(registry.clone());
  let source = Context::new(registry);

  target.put(AppConfig {
    database_url: "target".to_string(),
  });
  source.put(AppConfig {
    database_url: "source".to_string(),
  });
  source.put(SqlStore);

  target.merge(&source);

  assert_eq!(
    target.get::<AppConfig>().expect("merged").database_url,
    "source"
  );
  assert!(target.contains_all(keys![AppConfig, SqlStore]));
}

#[test]
fn test_fork_is_independent_of_the_original() {
  let context = Context::new(registry());
  context.put(AppConfig {
    database_url: "shared".to_string(),
  });

  let copy = context.fork();
  copy.put(SqlStore);

  assert!(copy.contains(key!(AppConfig)));
  assert!(copy.contains(key!(SqlStore)));
  assert!(!context.contains(key!(SqlStore)));
}
