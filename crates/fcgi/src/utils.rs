//! Utility macros shared by the codec and connection layers.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Behaves like `assert!` but yields an error value instead of panicking, which
/// keeps malformed peer input on the recoverable error path.
///
/// # Example
///
/// ```ignore
/// ensure!(header[0] == FCGI_VERSION, ParseError::InvalidVersion(header[0]));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
