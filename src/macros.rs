/// Turns a native status into a [crate::Result].
///
/// `try_execute!(status)` yields `Result<()>`. `try_execute!(status, kind)` yields `Result<bool>`: success is `true`
/// and the given [crate::ErrorKind] is the designed `false` outcome instead of an error.
macro_rules! try_execute {
    ($x:expr) => {{
        let code = $crate::platform::status_code($x);
        if code == 0 {
            Ok(())
        } else {
            Err($crate::Error::Scard($crate::ScardError::new(code)))
        }
    }};
    ($x:expr, $false_value:expr) => {{
        let code = $crate::platform::status_code($x);
        if code == 0 {
            Ok(true)
        } else if code == u64::from(u32::from($false_value)) {
            Ok(false)
        } else {
            Err($crate::Error::Scard($crate::ScardError::new(code)))
        }
    }};
}
