//! Argument and stream-content verification used at decoder entry points.

pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Verifies a caller-supplied argument, failing with `InvalidArgument`.
/// `$name` labels the offending argument and the failed condition becomes
/// the message.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let satisfied = $expr;
        $crate::result::verify_arg(satisfied, stringify!($name), stringify!($expr))?;
    }};
}

/// Verifies a property of decoded stream content, failing with
/// `InvalidFormat`.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let satisfied = $expr;
        $crate::result::verify_data(satisfied, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(satisfied: bool, name: &str, condition: &str) -> Result<()> {
    if satisfied {
        Ok(())
    } else {
        Err(arg_error(name, condition))
    }
}

#[inline]
pub fn verify_data(satisfied: bool, element: &str, condition: &str) -> Result<()> {
    if satisfied {
        Ok(())
    } else {
        Err(data_error(element, condition))
    }
}

#[cold]
fn arg_error(name: &str, condition: &str) -> crate::error::Error {
    crate::error::Error::invalid_arg(name, condition)
}

#[cold]
fn data_error(element: &str, condition: &str) -> crate::error::Error {
    crate::error::Error::invalid_format(element, condition)
}
