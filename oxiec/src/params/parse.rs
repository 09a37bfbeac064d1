use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Parses a 32-bit integer parameter value.
///
/// A value beginning with `x` or `X` is read as hexadecimal. Otherwise
/// it is read as decimal, and failing that as a floating-point literal
/// that must hold an exact integer value (`"4.0"` is 4, `"4.5"` is an
/// error). On failure the decimal parse error is returned.
///
/// # Examples
/// ```
/// use oxiec::params::parse_int;
///
/// assert_eq!(parse_int("x1A"), Ok(26));
/// assert_eq!(parse_int("X1a"), Ok(26));
/// assert_eq!(parse_int("-12"), Ok(-12));
/// assert_eq!(parse_int("4.0"), Ok(4));
/// assert!(parse_int("4.5").is_err());
/// ```
pub fn parse_int(text: &str) -> Result<i32, ParseIntError> {
    parse_integer(text, i32::from_str_radix)
}

/// Parses a 64-bit integer parameter value, with the same
/// rules as [`parse_int`].
pub fn parse_long(text: &str) -> Result<i64, ParseIntError> {
    parse_integer(text, i64::from_str_radix)
}

fn parse_integer<T>(
    text: &str,
    from_radix: fn(&str, u32) -> Result<T, ParseIntError>,
) -> Result<T, ParseIntError>
where
    T: FromStr<Err = ParseIntError> + TryFrom<i64>,
{
    if let Some(hex) = text.strip_prefix(&['x', 'X'][..]) {
        return from_radix(hex, 16);
    }
    text.parse::<T>().or_else(|decimal_error| {
        text.parse::<f64>()
            .ok()
            .filter(|d| d.fract() == 0.0 && (*d as i64) as f64 == *d)
            .and_then(|d| T::try_from(d as i64).ok())
            .ok_or(decimal_error)
    })
}

/// Numeric types readable from a parameter store.
pub trait ParamNumber: Copy + PartialOrd + fmt::Display {
    /// Name used in format errors.
    const KIND: &'static str;

    fn parse_param(text: &str) -> Option<Self>;

    /// The sentinel returned by bounded accessors: `min - 1`.
    fn below(min: Self) -> Self;
}

impl ParamNumber for i32 {
    const KIND: &'static str = "integer";

    fn parse_param(text: &str) -> Option<i32> {
        parse_int(text).ok()
    }

    fn below(min: i32) -> i32 {
        min.wrapping_sub(1)
    }
}

impl ParamNumber for i64 {
    const KIND: &'static str = "long";

    fn parse_param(text: &str) -> Option<i64> {
        parse_long(text).ok()
    }

    fn below(min: i64) -> i64 {
        min.wrapping_sub(1)
    }
}

impl ParamNumber for f64 {
    const KIND: &'static str = "double";

    fn parse_param(text: &str) -> Option<f64> {
        text.parse().ok()
    }

    fn below(min: f64) -> f64 {
        min - 1.0
    }
}

impl ParamNumber for f32 {
    const KIND: &'static str = "float";

    fn parse_param(text: &str) -> Option<f32> {
        text.parse().ok()
    }

    fn below(min: f32) -> f32 {
        min - 1.0
    }
}
