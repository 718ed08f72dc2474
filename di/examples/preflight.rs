use std::sync::Arc;

use filament::{bootstrap, keys, Blueprint, Context, Error, Registry};

// A wiring mistake on purpose: two constructors that need each other.
// The pre-flight validation catches it and bootstrap refuses to run.

struct Scheduler {
  _executor: Arc<Executor>,
}

struct Executor {
  _scheduler: Arc<Scheduler>,
}

fn main() {
  let registry = Arc::new(Registry::new());

  registry
    .register(
      Blueprint::for_type::<Scheduler>().constructor(keys![Executor], |cx| {
        Ok(Scheduler {
          _executor: cx.demand::<Executor>()?,
        })
      }),
    )
    .expect("register Scheduler");
  registry
    .register(
      Blueprint::for_type::<Executor>().constructor(keys![Scheduler], |cx| {
        Ok(Executor {
          _scheduler: cx.demand::<Scheduler>()?,
        })
      }),
    )
    .expect("register Executor");

  let context = Context::new(registry);
  match bootstrap(&context, keys![Scheduler]) {
    Ok(_) => unreachable!("the cycle must fail validation"),
    Err(Error::Validation(validation)) => {
      println!("bootstrap aborted, one aggregated report:\n");
      println!("{}", validation.report);
      println!("\n{} cycle(s) to fix before the app can start", validation.cycles.len());
    }
    Err(other) => panic!("unexpected failure: {other}"),
  }
}
