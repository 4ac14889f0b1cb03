/// Print to stderr before the tracing subscriber exists.
#[macro_export]
macro_rules! bootstrap {
    ($x:expr $( , $xs:expr )* $(,)?) => {
        eprintln!(concat!("[loralink] ", $x) $( , $xs )*)
    };
}

/// Log the error of a `Result` that is otherwise dropped.
#[macro_export]
macro_rules! trace_catch {
    (warn: $val:expr, $($rest:tt)*) => {
        if let Err(ref e) = $val {
            ::tracing::warn!(error = %e, $($rest)*);
        }
    };

    ($val:expr, $($rest:tt)*) => {
        if let Err(ref e) = $val {
            ::tracing::error!(error = %e, $($rest)*);
        }
    };
}
