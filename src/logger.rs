//! The logger hierarchy and the record pipeline.
//!
//! Loggers form a parent/child tree. A child holds an owning handle to its
//! parent (parents never reference children, so there is no cycle) and
//! inherits writers, interceptors, context and the level gate by walking its
//! ancestry at dispatch time. Nothing is cached on the child, so
//! reconfiguring a parent is immediately visible below it.
//!
//! Dispatch for one call: level gate, collect effective interceptors and
//! writers root-first, capture a caller token only if some participant needs
//! it, merge contexts into the record, run interceptors (each may replace or
//! drop), then fan out to writers in order. Writer failures are routed to
//! that writer's error handler and never reach the application.

use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::caller::CallerToken;
use crate::clock::{Clock, SystemClock};
use crate::format::simple::SimpleConsoleFormatter;
use crate::intercept::Interceptor;
use crate::level::LogLevel;
use crate::record::{Data, FormatOption, InstanceMarker, LogRecord, Message};
use crate::term::TerminalCapabilities;
use crate::writer::{ConsoleWriter, Writer};

/// Per-call extras for [`Logger::log`].
#[derive(Default)]
pub struct LogOptions {
    pub data: Option<Data>,
    pub error: Option<String>,
    pub stack_trace: Option<String>,
    pub format_options: Vec<FormatOption>,
}

impl LogOptions {
    pub fn new() -> Self {
        LogOptions::default()
    }

    /// Adds one structured field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data
            .get_or_insert_with(Data::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn data(mut self, data: Data) -> Self {
        self.data = Some(data);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    pub fn format_option(mut self, option: FormatOption) -> Self {
        self.format_options.push(option);
        self
    }
}

/// Configuration for [`Logger::child`].
#[derive(Default)]
pub struct ChildOptions {
    pub name: Option<String>,
    pub instance: Option<InstanceMarker>,
    pub context: Option<Data>,
    pub min_level: Option<LogLevel>,
}

impl ChildOptions {
    pub fn new() -> Self {
        ChildOptions::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn instance<T: ?Sized>(mut self, instance: &T) -> Self {
        self.instance = Some(InstanceMarker::of(instance));
        self
    }

    pub fn context(mut self, context: Data) -> Self {
        self.context = Some(context);
        self
    }

    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }
}

struct LoggerShared {
    name: Option<String>,
    instance: Option<InstanceMarker>,
    min_level: RwLock<Option<LogLevel>>,
    context: RwLock<Data>,
    parent: RwLock<Option<Logger>>,
    writers: RwLock<Vec<Arc<dyn Writer>>>,
    interceptors: RwLock<Vec<Arc<dyn Interceptor>>>,
    clock: RwLock<Option<Arc<dyn Clock>>>,
}

static SYSTEM_CLOCK: Lazy<Arc<dyn Clock>> = Lazy::new(|| Arc::new(SystemClock));

/// A handle to one node of the logger tree. Cheap to clone; clones share
/// configuration.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<LoggerShared>,
}

impl Logger {
    /// An unnamed logger with no writers, no parent and no own level gate.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// A named root-less logger.
    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()), None)
    }

    fn build(name: Option<String>, instance: Option<InstanceMarker>) -> Self {
        Logger {
            shared: Arc::new(LoggerShared {
                name,
                instance,
                min_level: RwLock::new(None),
                context: RwLock::new(Data::new()),
                parent: RwLock::new(None),
                writers: RwLock::new(Vec::new()),
                interceptors: RwLock::new(Vec::new()),
                clock: RwLock::new(None),
            }),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.shared.name.clone()
    }

    /// Creates a child of this logger. The child inherits writers,
    /// interceptors and the level gate from its ancestry and merges its own
    /// context onto records it emits.
    pub fn child(&self, options: ChildOptions) -> Logger {
        Logger {
            shared: Arc::new(LoggerShared {
                name: options.name,
                instance: options.instance,
                min_level: RwLock::new(options.min_level),
                context: RwLock::new(options.context.unwrap_or_default()),
                parent: RwLock::new(Some(self.clone())),
                writers: RwLock::new(Vec::new()),
                interceptors: RwLock::new(Vec::new()),
                clock: RwLock::new(None),
            }),
        }
    }

    /// A child carrying `instance`'s marker, so records show `Type@hash`.
    pub fn for_instance<T: ?Sized>(&self, instance: &T) -> Logger {
        self.child(ChildOptions::new().instance(instance))
    }

    /// Rewires `library`'s parent to `self` without touching its own level
    /// gate. Records from the library then fan out through this logger's
    /// writers while the library's filter still applies.
    pub fn adopt(&self, library: &Logger) -> Logger {
        *library.shared.parent.write() = Some(self.clone());
        self.clone()
    }

    /// Appends a writer. Registration order is delivery order.
    pub fn add_writer(&self, writer: impl Writer + 'static) -> Logger {
        self.shared.writers.write().push(Arc::new(writer));
        self.clone()
    }

    /// Appends an interceptor. Registration order is execution order.
    pub fn add_interceptor(&self, interceptor: impl Interceptor + 'static) -> Logger {
        self.shared.interceptors.write().push(Arc::new(interceptor));
        self.clone()
    }

    /// Replaces this logger's own level gate; ancestors are untouched.
    pub fn set_min_level(&self, level: LogLevel) {
        *self.shared.min_level.write() = Some(level);
    }

    /// Injects a clock for this subtree; descendants inherit it.
    pub fn set_clock(&self, clock: impl Clock + 'static) {
        *self.shared.clock.write() = Some(Arc::new(clock));
    }

    /// Adds one context field. Mutations affect only subsequent records.
    pub fn add_context(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.shared.context.write().insert(key.into(), value.into());
    }

    /// Snapshot of this logger's own context map.
    pub fn context(&self) -> Data {
        self.shared.context.read().clone()
    }

    /// True iff `level` passes the effective gate: this logger's own
    /// `min_level`, else the nearest ancestor's, else `info`.
    pub fn is_enabled(&self, level: &LogLevel) -> bool {
        level.severity() >= self.effective_min_level().severity()
    }

    fn effective_min_level(&self) -> LogLevel {
        for logger in self.ancestry() {
            if let Some(level) = logger.shared.min_level.read().clone() {
                return level;
            }
        }
        LogLevel::INFO
    }

    /// Self-first chain up to the root.
    fn ancestry(&self) -> Vec<Logger> {
        let mut chain = vec![self.clone()];
        loop {
            let parent = chain
                .last()
                .expect("chain is never empty")
                .shared
                .parent
                .read()
                .clone();
            match parent {
                Some(parent) => chain.push(parent),
                None => return chain,
            }
        }
    }

    fn effective_clock(&self) -> Arc<dyn Clock> {
        for logger in self.ancestry() {
            let clock = logger.shared.clock.read().clone();
            if let Some(clock) = clock {
                return clock;
            }
        }
        Arc::clone(&SYSTEM_CLOCK)
    }

    /// The single logging primitive. Never panics and never returns an
    /// error; all convenience methods delegate here.
    pub fn log(&self, level: LogLevel, message: impl Into<Message>, options: LogOptions) {
        if !self.is_enabled(&level) {
            return;
        }

        // One ancestry walk serves interceptor order, writer order, context
        // merging and name/instance resolution.
        let chain = self.ancestry();

        let mut interceptors: Vec<Arc<dyn Interceptor>> = Vec::new();
        let mut writers: Vec<Arc<dyn Writer>> = Vec::new();
        for logger in chain.iter().rev() {
            interceptors.extend(logger.shared.interceptors.read().iter().cloned());
            writers.extend(logger.shared.writers.read().iter().cloned());
        }
        if writers.is_empty() {
            return;
        }

        // A backtrace is captured at the call site, before any hop, and only
        // when some participant will actually use it.
        let needs_caller = writers.iter().any(|w| w.requires_caller_info())
            || interceptors.iter().any(|i| i.requires_caller_info());
        let caller = needs_caller.then(CallerToken::capture);

        let mut data = Data::new();
        for logger in chain.iter().rev() {
            for (key, value) in logger.shared.context.read().iter() {
                data.insert(key.clone(), value.clone());
            }
        }
        if let Some(call_data) = options.data {
            for (key, value) in call_data {
                data.insert(key, value);
            }
        }

        let logger_name = chain.iter().find_map(|logger| logger.shared.name.clone());
        let instance = chain.iter().find_map(|logger| logger.shared.instance);

        let mut record = LogRecord {
            timestamp: self.effective_clock().now(),
            level,
            message: Some(message.into()),
            data,
            error: options.error,
            stack_trace: options.stack_trace,
            logger_name,
            instance,
            caller,
            format_options: options.format_options,
        };

        for interceptor in &interceptors {
            match interceptor.intercept(record) {
                Ok(Some(replacement)) => record = replacement,
                Ok(None) => return,
                Err(err) => {
                    eprintln!("treelog: {err}");
                    return;
                }
            }
        }

        for writer in &writers {
            if let Err(err) = writer.write(&record) {
                writer.handle_error(&err);
            }
        }
    }
}

macro_rules! level_methods {
    ($($name:ident / $with_options:ident => $level:expr;)*) => {
        impl Logger {
            $(
                pub fn $name(&self, message: impl Into<Message>) {
                    self.log($level, message, LogOptions::default());
                }

                pub fn $with_options(&self, message: impl Into<Message>, options: LogOptions) {
                    self.log($level, message, options);
                }
            )*
        }

        $(
            /// Logs through the process-wide root logger.
            pub fn $name(message: impl Into<Message>) {
                root().$name(message);
            }
        )*
    };
}

level_methods! {
    trace / trace_options => LogLevel::TRACE;
    debug / debug_options => LogLevel::DEBUG;
    info / info_options => LogLevel::INFO;
    notice / notice_options => LogLevel::NOTICE;
    success / success_options => LogLevel::SUCCESS;
    warning / warning_options => LogLevel::WARNING;
    error / error_options => LogLevel::ERROR;
    critical / critical_options => LogLevel::CRITICAL;
    wtf / wtf_options => LogLevel::WTF;
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new()
    }
}

static ROOT: Lazy<ArcSwap<LoggerShared>> = Lazy::new(|| {
    let root = Logger::new()
        .add_writer(ConsoleWriter::new(SimpleConsoleFormatter::new(
            TerminalCapabilities::detect_stdout(),
        )));
    ArcSwap::new(Arc::clone(&root.shared))
});

/// The process-wide root logger. By default it prints through a simple
/// console writer on stdout.
pub fn root() -> Logger {
    Logger {
        shared: ROOT.load_full(),
    }
}

/// Replaces the process-wide root. Supported before concurrent logging
/// begins; replacement during load is not guaranteed race-free.
pub fn set_root(logger: Logger) {
    ROOT.store(logger.shared);
}

/// Logs through the process-wide root with per-call extras.
pub fn log(level: LogLevel, message: impl Into<Message>, options: LogOptions) {
    root().log(level, message, options);
}
