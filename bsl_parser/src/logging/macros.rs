//! Logging macros taking a [`Code`](crate::logging::Code) plus `"key" => value`
//! context pairs; values may be any `Display` type.

/// Formats `"key" => value` pairs and hands them to a `*_with_context` function
#[doc(hidden)]
#[macro_export]
macro_rules! __with_context_pairs {
    ($func:path, ($($arg:expr),*), $($key:expr => $value:expr),+) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $func($($arg),*, context_refs)
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_error_with_context($code, $message, None, vec![])
    };

    ($code:expr, $message:expr, span = $span:expr) => {
        $crate::logging::log_error_with_context($code, $message, Some($span), vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_context_pairs!(
            $crate::logging::log_error_with_context, ($code, $message, None),
            $($key => $value),+
        )
    };

    ($code:expr, $message:expr, span = $span:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_context_pairs!(
            $crate::logging::log_error_with_context, ($code, $message, Some($span)),
            $($key => $value),+
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_success_with_context($code, $message, vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_context_pairs!(
            $crate::logging::log_success_with_context, ($code, $message),
            $($key => $value),+
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_info_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_context_pairs!(
            $crate::logging::log_info_with_context, ($message),
            $($key => $value),+
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_warning_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        $crate::__with_context_pairs!(
            $crate::logging::log_warning_with_context, ($message),
            $($key => $value),+
        )
    };
}

/// Context values are only formatted when debug output is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::log_debug_with_context($message, vec![])
        }
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::__with_context_pairs!(
                $crate::logging::log_debug_with_context, ($message),
                $($key => $value),+
            )
        }
    };
}

/// Error event annotated with the registry's severity and recoverability
#[macro_export]
macro_rules! log_classified_error {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log_error!($code, $message,
            "severity" => $crate::logging::codes::get_severity($code.as_str()).as_str(),
            "recoverable" => $crate::logging::codes::is_recoverable($code.as_str())
            $(, $key => $value)*
        )
    };
}

/// Success event with elapsed time, skipped when performance events are disabled
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::config::log_performance_events() {
            $crate::log_success!($code, $message,
                "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
                $(, $key => $value)*
            );
        }
    };
}
