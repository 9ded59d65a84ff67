//! Call-site facade macros.
//!
//! Each macro short-circuits on the process-wide gate before a record is
//! constructed, so a filtered call costs one relaxed atomic load. The
//! source coordinates (file, enclosing function, line) are wired from
//! call-site metadata.

/// Captures the path of the enclosing function as a `&'static str`.
#[doc(hidden)]
#[macro_export]
macro_rules! __function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            core::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // The name ends in "::f"; keep the enclosing path.
        &name[..name.len() - 3]
    }};
}

/// Logs typed arguments at an explicit [`Level`](crate::Level).
///
/// Arguments are anything implementing [`Loggable`](crate::Loggable) and
/// are concatenated without separators:
///
/// ```no_run
/// flashlog::log!(flashlog::Level::Info, "connections=", 42u32);
/// ```
#[macro_export]
macro_rules! log {
    ($level:expr $(, $arg:expr)* $(,)?) => {{
        let level = $level;
        if $crate::is_logged(level) {
            let mut record = $crate::Record::new(level, file!(), $crate::__function!(), line!());
            $( $crate::Loggable::append_to(&$arg, &mut record); )*
            $crate::submit(record);
        }
    }};
}

/// Logs at INFO severity.
#[macro_export]
macro_rules! info {
    ($($arg:expr),* $(,)?) => {
        $crate::log!($crate::Level::Info $(, $arg)*)
    };
}

/// Logs at WARN severity.
#[macro_export]
macro_rules! warn {
    ($($arg:expr),* $(,)?) => {
        $crate::log!($crate::Level::Warn $(, $arg)*)
    };
}

/// Logs at CRIT severity; the sink flushes the record through to the
/// operating system as soon as it is written.
#[macro_export]
macro_rules! crit {
    ($($arg:expr),* $(,)?) => {
        $crate::log!($crate::Level::Crit $(, $arg)*)
    };
}
