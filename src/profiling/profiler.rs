//! Chrome Trace span recorder.
//!
//! Spans are RAII guards. Each one becomes a complete (`"ph":"X"`) event
//! when dropped; [`shutdown`] serializes every recorded event with
//! `serde_json`.

use std::borrow::Cow;
use std::path::Path;

#[cfg(feature = "profiling")]
mod enabled {
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Mutex, OnceLock, PoisonError};
    use std::time::Instant;

    use log::warn;
    use serde_json::{json, Map, Value};

    use super::*;


    struct ProfilerState {
        start: Instant,
        out_path: PathBuf,
        is_on: AtomicBool,
        events: Mutex<Vec<Value>>,
    }

    static STATE: OnceLock<ProfilerState> = OnceLock::new();
    static NEXT_TID: AtomicU64 = AtomicU64::new(1);

    thread_local! {
        static TID: u64 = NEXT_TID.fetch_add(1, Ordering::Relaxed);
    }

    impl Arg {
        fn into_json(self) -> Value {
            match self {
                Arg::Str(s) => Value::String(s),
                Arg::U64(v) => json!(v),
                Arg::I64(v) => json!(v),
                Arg::F64(v) if v.is_finite() => json!(v),
                Arg::F64(v) => Value::String(v.to_string()),
                Arg::Bool(v) => Value::Bool(v),
            }
        }
    }

    /// Starts recording; spans created before this call are dropped silently.
    pub fn init<P: AsRef<Path>>(path: P) {
        let _ = STATE.set(ProfilerState {
            start: Instant::now(),
            out_path: path.as_ref().to_path_buf(),
            is_on: AtomicBool::new(true),
            events: Mutex::new(Vec::new()),
        });
    }

    /// Stops recording and writes the trace file.
    pub fn shutdown() {
        if let Some(state) = STATE.get() {
            state.is_on.store(false, Ordering::Release);
            if let Err(e) = write_trace_file(state) {
                warn!("failed to write trace to {}: {e}", state.out_path.display());
            }
        }
    }

    fn write_trace_file(state: &ProfilerState) -> std::io::Result<()> {
        let events = std::mem::take(&mut *state.events.lock().unwrap_or_else(PoisonError::into_inner));

        if let Some(parent) = state.out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut w = BufWriter::new(File::create(&state.out_path)?);
        serde_json::to_writer(&mut w, &json!({ "traceEvents": events }))?;
        w.flush()
    }

    fn now_us(state: &ProfilerState) -> u64 {
        state.start.elapsed().as_micros() as u64
    }

    /// Opens a span that closes when the returned guard drops.
    pub fn span(name: impl Into<SpanName>) -> SpanGuard {
        match STATE.get() {
            Some(state) if state.is_on.load(Ordering::Acquire) => SpanGuard {
                name: name.into().0,
                ts0: now_us(state),
                tid: TID.with(|t| *t),
                args: Map::new(),
                active: true,
            },
            _ => SpanGuard::disabled(),
        }
    }

    /// Records a complete event on drop.
    pub struct SpanGuard {
        name: Cow<'static, str>,
        ts0: u64,
        tid: u64,
        args: Map<String, Value>,
        active: bool,
    }

    impl SpanGuard {
        fn disabled() -> Self {
            Self { name: Cow::Borrowed(""), ts0: 0, tid: 0, args: Map::new(), active: false }
        }

        /// Attaches an argument to this span (builder-style).
        #[inline]
        pub fn arg(mut self, key: impl Into<String>, value: Arg) -> Self {
            if self.active {
                self.args.insert(key.into(), value.into_json());
            }
            self
        }
    }

    impl Drop for SpanGuard {
        fn drop(&mut self) {
            if !self.active {
                return;
            }
            let Some(state) = STATE.get() else { return };
            if !state.is_on.load(Ordering::Acquire) {
                return;
            }
            let mut event = json!({
                "name": std::mem::take(&mut self.name),
                "cat": "scene",
                "ph": "X",
                "ts": self.ts0,
                "dur": now_us(state).saturating_sub(self.ts0),
                "pid": 1,
                "tid": self.tid,
            });
            if !self.args.is_empty() {
                event["args"] = Value::Object(std::mem::take(&mut self.args));
            }
            state.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
        }
    }
}

#[cfg(not(feature = "profiling"))]
mod disabled {
    use super::*;

    /// Initialize profiler (no-op when profiling is disabled).
    #[inline]
    pub fn init<P: AsRef<Path>>(_path: P) {}

    /// Shut down profiler (no-op).
    #[inline]
    pub fn shutdown() {}

    /// Create profiling span (no-op).
    #[inline]
    pub fn span(_name: impl Into<SpanName>) -> SpanGuard {
        SpanGuard
    }

    /// No-op span guard.
    pub struct SpanGuard;

    impl SpanGuard {
        /// Attach an argument to this span (builder-style; no-op).
        #[inline]
        pub fn arg(self, _key: impl Into<String>, _value: Arg) -> Self {
            self
        }
    }
}

/// A span name; accepts `&'static str`, `String`, or `Cow<'static, str>`.
pub struct SpanName(pub Cow<'static, str>);

impl From<&'static str> for SpanName {
    fn from(s: &'static str) -> Self {
        SpanName(Cow::Borrowed(s))
    }
}
impl From<String> for SpanName {
    fn from(s: String) -> Self {
        SpanName(Cow::Owned(s))
    }
}
impl From<Cow<'static, str>> for SpanName {
    fn from(s: Cow<'static, str>) -> Self {
        SpanName(s)
    }
}

/// Argument value for profiling spans.
pub enum Arg {
    /// UTF-8 string value.
    Str(String),

    /// Unsigned 64-bit integer value.
    U64(u64),

    /// Signed 64-bit integer value.
    I64(i64),

    /// 64-bit floating-point value.
    F64(f64),

    /// Boolean value.
    Bool(bool),
}

#[cfg(feature = "profiling")]
pub use enabled::{init, shutdown, span, SpanGuard};

#[cfg(not(feature = "profiling"))]
pub use disabled::{init, shutdown, span, SpanGuard};
