use std::sync::Arc;

use once_cell::sync::OnceCell;

use filament::{bootstrap, keys, Blueprint, Context, Registry};

// A miniature application graph: a config object, a frame source built
// from it, and a tracker/overlay pair that need each other — but only
// through fields, which the two-phase bootstrap handles.

struct Config {
  video_path: String,
}

struct FrameSource {
  config: Arc<Config>,
}

struct Tracker {
  source: Arc<FrameSource>,
  overlay: OnceCell<Arc<Overlay>>,
}

struct Overlay {
  tracker: OnceCell<Arc<Tracker>>,
}

fn main() -> filament::Result<()> {
  let registry = Arc::new(Registry::new());

  registry.register(Blueprint::for_type::<Config>().constructor(keys![], |_| {
    Ok(Config {
      video_path: "session/recording.avi".to_string(),
    })
  }))?;
  registry.register(
    Blueprint::for_type::<FrameSource>().constructor(keys![Config], |cx| {
      Ok(FrameSource {
        config: cx.demand::<Config>()?,
      })
    }),
  )?;
  registry.register(
    Blueprint::for_type::<Tracker>()
      .constructor(keys![FrameSource], |cx| {
        Ok(Tracker {
          source: cx.demand::<FrameSource>()?,
          overlay: OnceCell::new(),
        })
      })
      .field::<Overlay>("overlay", |tracker, overlay| {
        let _ = tracker.overlay.set(overlay);
      }),
  )?;
  registry.register(
    Blueprint::for_type::<Overlay>()
      .constructor(keys![], |_| {
        Ok(Overlay {
          tracker: OnceCell::new(),
        })
      })
      .field::<Tracker>("tracker", |overlay, tracker| {
        let _ = overlay.tracker.set(tracker);
      }),
  )?;

  let context = Context::new(registry);
  let validation = bootstrap(&context, keys![Tracker])?;
  println!("{}\n", validation.report);

  let tracker = context.get::<Tracker>().expect("tracker wired");
  println!("tracking frames from {}", tracker.source.config.video_path);

  let overlay = tracker.overlay.get().expect("overlay injected");
  assert!(overlay.tracker.get().is_some());
  println!("tracker and overlay reference each other; the field cycle resolved");

  Ok(())
}
