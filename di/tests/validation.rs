use std::sync::Arc;

use once_cell::sync::OnceCell;
use pretty_assertions::assert_eq;

use filament::{key, keys, Blueprint, Context, Error, GraphValidator, Indexer, Registry};

// --- Cycle soundness ---

#[test]
fn test_constructor_cycle_is_reported() {
  struct A {
    _b: Arc<B>,
  }
  struct B {
    _a: Arc<A>,
  }

  let registry = Arc::new(Registry::new());
  registry
    .register(Blueprint::for_type::<A>().constructor(keys![B], |cx| {
      Ok(A {
        _b: cx.demand::<B>()?,
      })
    }))
    .expect("register A");
  registry
    .register(Blueprint::for_type::<B>().constructor(keys![A], |cx| {
      Ok(B {
        _a: cx.demand::<A>()?,
      })
    }))
    .expect("register B");

  let context = Context::new(registry);
  let indexer = Indexer::index(context.registry(), keys![A]);

  let validation = context.validate(&indexer);

  assert!(!validation.ok);
  assert_eq!(validation.cycles.len(), 1);
  let cycle = &validation.cycles[0];
  assert_eq!(cycle.len(), 2);
  assert!(cycle.contains(&key!(A)));
  assert!(cycle.contains(&key!(B)));
  assert!(validation.report.contains("constructor cycles:"));
}

#[test]
fn test_field_cycle_is_not_fatal() {
  // The same mutual dependency, wired through fields only: the
  // constructor graph has no cycle and validation passes.
  struct A {
    b: OnceCell<Arc<B>>,
  }
  struct B {
    a: OnceCell<Arc<A>>,
  }

  let registry = Arc::new(Registry::new());
  registry
    .register(
      Blueprint::for_type::<A>()
        .constructor(keys![], |_| Ok(A { b: OnceCell::new() }))
        .field::<B>("b", |a, b| {
          let _ = a.b.set(b);
        }),
    )
    .expect("register A");
  registry
    .register(
      Blueprint::for_type::<B>()
        .constructor(keys![], |_| Ok(B { a: OnceCell::new() }))
        .field::<A>("a", |b, a| {
          let _ = b.a.set(a);
        }),
    )
    .expect("register B");

  let context = Context::new(registry);
  let indexer = Indexer::index(context.registry(), keys![A]);

  let validation = context.validate(&indexer);

  assert!(validation.ok);
  assert!(validation.cycles.is_empty());
  assert!(validation.missing.is_empty());
}

// --- Missing-binding precision ---

trait Persistence: Send + Sync {}

struct SqlPersistence;

impl Persistence for SqlPersistence {}

struct Exporter {
  sink: OnceCell<Arc<dyn Persistence>>,
}

fn exporter_blueprint() -> filament::BlueprintBuilder<Exporter> {
  Blueprint::for_type::<Exporter>()
    .constructor(keys![], |_| {
      Ok(Exporter {
        sink: OnceCell::new(),
      })
    })
    .field_with::<dyn Persistence>(key!(trait Persistence), "sink", false, |exporter, sink| {
      let _ = exporter.sink.set(sink);
    })
}

#[test]
fn test_unbound_interface_is_reported_exactly_once() {
  let registry = Arc::new(Registry::new());
  registry.register(exporter_blueprint()).expect("register Exporter");

  let context = Context::new(registry);
  let indexer = Indexer::index(context.registry(), keys![Exporter]);

  let validation = context.validate(&indexer);

  assert!(!validation.ok);
  assert_eq!(validation.missing.len(), 1);
  assert_eq!(validation.missing[0].dependent, key!(Exporter));
  assert_eq!(validation.missing[0].dependency, key!(trait Persistence));
  assert!(validation
    .report
    .contains("no implementation found for"));
}

#[test]
fn test_interface_with_implementer_in_closure_is_not_reported() {
  let registry = Arc::new(Registry::new());
  registry.register(exporter_blueprint()).expect("register Exporter");
  registry
    .register(
      Blueprint::for_type::<SqlPersistence>()
        .constructor(keys![], |_| Ok(SqlPersistence))
        .implements::<dyn Persistence>(|p| p),
    )
    .expect("register SqlPersistence");

  let context = Context::new(registry);
  // The implementation is seeded explicitly; interface edges do not pull
  // implementations into the closure by themselves.
  let indexer = Indexer::index(context.registry(), keys![Exporter, SqlPersistence]);

  let validation = context.validate(&indexer);

  assert!(validation.ok);
  assert!(validation.missing.is_empty());
}

#[test]
fn test_preexisting_instance_satisfies_interface_binding() {
  let registry = Arc::new(Registry::new());
  registry.register(exporter_blueprint()).expect("register Exporter");

  let context = Context::new(registry);
  context.put_arc::<dyn Persistence>(Arc::new(SqlPersistence));
  let indexer = Indexer::index(context.registry(), keys![Exporter]);

  let validation = context.validate(&indexer);

  assert!(validation.ok);
  assert!(validation.missing.is_empty());
}

#[test]
fn test_concrete_unbound_dependency_is_never_reported() {
  // A required dependency on a concrete type with no blueprint: assumed
  // synthesizable, flagged [external] in the report but not missing.
  struct External;
  struct Consumer {
    _external: Arc<External>,
  }

  let registry = Arc::new(Registry::new());
  registry
    .register(
      Blueprint::for_type::<Consumer>().constructor(keys![External], |cx| {
        Ok(Consumer {
          _external: cx.demand::<External>()?,
        })
      }),
    )
    .expect("register Consumer");

  let context = Context::new(registry);
  let indexer = Indexer::index(context.registry(), keys![Consumer]);

  let validation = context.validate(&indexer);

  assert!(validation.ok);
  assert!(validation.missing.is_empty());
  assert!(validation.report.contains("[external]"));
}

// --- Structural rejection ---

#[test]
fn test_duplicate_constructor_is_rejected_at_registration() {
  struct Ambiguous;

  let registry = Registry::new();
  let result = registry.register(
    Blueprint::for_type::<Ambiguous>()
      .constructor(keys![], |_| Ok(Ambiguous))
      .constructor(keys![], |_| Ok(Ambiguous)),
  );

  assert!(matches!(result, Err(Error::MultipleConstructors(_))));
  // Nothing was registered.
  assert!(registry.is_empty());
}

// --- Report rendering ---

#[test]
fn test_report_is_deterministic() {
  // Two cycles and a missing binding in one graph; repeated validation
  // must render the identical report.
  struct A {
    _b: Arc<B>,
  }
  struct B {
    _a: Arc<A>,
    sink: OnceCell<Arc<dyn Persistence>>,
  }

  let registry = Arc::new(Registry::new());
  registry
    .register(Blueprint::for_type::<A>().constructor(keys![B], |cx| {
      Ok(A {
        _b: cx.demand::<B>()?,
      })
    }))
    .expect("register A");
  registry
    .register(
      Blueprint::for_type::<B>()
        .constructor(keys![A], |cx| {
          Ok(B {
            _a: cx.demand::<A>()?,
            sink: OnceCell::new(),
          })
        })
        .field_with::<dyn Persistence>(key!(trait Persistence), "sink", false, |b, sink| {
          let _ = b.sink.set(sink);
        }),
    )
    .expect("register B");

  let context = Context::new(registry);
  let indexer = Indexer::index(context.registry(), keys![A]);

  let first = context.validate(&indexer);
  let second = context.validate(&indexer);

  assert!(!first.ok);
  assert_eq!(first.report, second.report);
  assert_eq!(first.cycles, second.cycles);
}

#[test]
fn test_report_marks_existing_instances() {
  struct Config;
  struct Service {
    _config: Arc<Config>,
  }

  let registry = Arc::new(Registry::new());
  registry
    .register(Blueprint::for_type::<Config>().constructor(keys![], |_| Ok(Config)))
    .expect("register Config");
  registry
    .register(Blueprint::for_type::<Service>().constructor(keys![Config], |cx| {
      Ok(Service {
        _config: cx.demand::<Config>()?,
      })
    }))
    .expect("register Service");

  let context = Context::new(registry);
  context.put(Config);
  let indexer = Indexer::index(context.registry(), keys![Service]);

  let validation = context.validate(&indexer);

  assert!(validation.ok);
  assert!(validation.report.contains("[instance]"));
  assert!(validation.report.contains("wiring ok"));
}

// --- Graph projections ---

#[test]
fn test_full_graph_topological_order_puts_dependencies_first() {
  struct Config;
  struct Database {
    _config: Arc<Config>,
  }
  struct App {
    _database: Arc<Database>,
  }

  let registry = Arc::new(Registry::new());
  registry
    .register(Blueprint::for_type::<Config>().constructor(keys![], |_| Ok(Config)))
    .expect("register Config");
  registry
    .register(
      Blueprint::for_type::<Database>().constructor(keys![Config], |cx| {
        Ok(Database {
          _config: cx.demand::<Config>()?,
        })
      }),
    )
    .expect("register Database");
  registry
    .register(Blueprint::for_type::<App>().constructor(keys![Database], |cx| {
      Ok(App {
        _database: cx.demand::<Database>()?,
      })
    }))
    .expect("register App");

  let context = Context::new(registry);
  let indexer = Indexer::index(context.registry(), keys![App]);

  let graph = GraphValidator::new(context.registry()).full_graph(&indexer);
  let order = graph.topological_order();

  let position = |key: filament::TypeKey| {
    order
      .iter()
      .position(|node| *node == key)
      .unwrap_or_else(|| panic!("{key} missing from the ordering"))
  };
  assert!(position(key!(Config)) < position(key!(Database)));
  assert!(position(key!(Database)) < position(key!(App)));
}
