//! Canonical logging macros
//!
//! Every tracked operation logs a `start` event and exactly one of `end` or
//! `end_error`, all carrying `component` and `op`.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use reltrack_core::log_op_start;
/// log_op_start!("capture_shadow");
/// log_op_start!("capture_shadow", class = "Post");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::reltrack_core_types::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::reltrack_core_types::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use reltrack_core::log_op_end;
/// log_op_end!("capture_shadow", duration_ms = 3);
/// log_op_end!("compute_change_set", duration_ms = 1, changed_len = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::reltrack_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::reltrack_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// The error is converted into the canonical [`RtError`](crate::errors::RtError)
/// so the event always carries a stable `err.code`.
///
/// # Example
///
/// ```
/// # use reltrack_core::log_op_error;
/// # use reltrack_core::errors::RelTrackError;
/// let err = RelTrackError::ShadowNotCaptured { class_name: "Post".to_string() };
/// log_op_error!("compute_change_set", err, duration_ms = 0);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let rt_err: $crate::errors::RtError = ::std::convert::Into::into($err);
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::reltrack_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?rt_err.kind(),
            err.code = rt_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let rt_err: $crate::errors::RtError = ::std::convert::Into::into($err);
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::reltrack_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?rt_err.kind(),
            err.code = rt_err.code(),
            $($field)*
        );
    }};
}
