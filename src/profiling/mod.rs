/// Chrome Trace (flame-style) execution profiler.
///
/// Feature-gated: with `--features profiling` the runtime records spans
/// around scene ticks, individual jobs and join iterations, and writes a
/// Chrome Trace Event JSON file that opens in `chrome://tracing` or
/// <https://ui.perfetto.dev>.
///
/// Without the feature every call is a no-op and the guard is a unit struct.
///
/// ## Usage
///
/// ```no_run
/// use scene_runtime::profiling;
///
/// profiling::init("profile/trace.json");
/// {
///     let _g = profiling::span("frame");
///     // scene.tick(16.0);
/// }
/// profiling::shutdown();
/// ```

pub mod profiler;

pub use profiler::{init, shutdown, span, Arg, SpanGuard, SpanName};
