//! String-to-value conversion for typed reads.
//!
//! The store keeps values as native kinds but hands readers a raw string (see
//! [`crate::domain::value::NativeValue::render`]).  A typed read asks this
//! module to turn that string into a `T`.
//!
//! # Strategies
//!
//! A type opts into conversion by implementing [`FromSettingsString`].  Asking
//! for a type with no implementation is a compile error, so "no strategy for
//! this type" can never reach a running program.  What *can* happen at run
//! time is input the strategy cannot parse; [`ConvertMode`] decides whether
//! that is an error or simply "no value".
//!
//! | Type                    | Accepted input                                        |
//! |-------------------------|-------------------------------------------------------|
//! | `bool`                  | `true` / `false`, any case                            |
//! | integers                | decimal with optional sign; hex after `0x`, `&h`, `#` |
//! | `f32`, `f64`            | decimal or exponent notation                          |
//! | `char`                  | exactly one character                                 |
//! | [`uuid::Uuid`]          | hyphenated, simple, braced, or URN form               |
//! | [`std::time::Duration`] | time-span notation, see [`timespan`]                  |
//!
//! Hex digits and negative decimals read into an unsigned type are taken as
//! a bit pattern of that width, matching how `DWord`/`QWord` render.
//! Surrounding whitespace is ignored everywhere.  Other `FromStr` types can be
//! added with [`settings_string_via_from_str!`](crate::settings_string_via_from_str).

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

pub mod timespan;

/// What [`convert`] does with input the strategy cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvertMode {
    /// Unparsable input yields `Ok(None)`.
    #[default]
    Lenient,
    /// Unparsable input yields `Err(ConversionError)`.
    Strict,
}

/// The raw string could not be converted to the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{input}' to {type_name}: {reason}")]
pub struct ConversionError {
    pub type_name: &'static str,
    pub input: String,
    pub reason: String,
}

/// A string-to-`Self` conversion strategy.
pub trait FromSettingsString: Sized {
    /// Type name reported in diagnostics and errors.
    const TYPE_NAME: &'static str;

    /// Parses a non-empty raw string.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `raw` is not a valid `Self`.
    fn from_settings_str(raw: &str) -> Result<Self, String>;
}

/// Converts a raw stored string into a `T`.
///
/// Empty or absent input yields `Ok(None)` regardless of `mode`.
///
/// # Errors
///
/// Returns [`ConversionError`] only in [`ConvertMode::Strict`] when the input
/// cannot be parsed.
pub fn convert<T: FromSettingsString>(
    raw: Option<&str>,
    mode: ConvertMode,
) -> Result<Option<T>, ConversionError> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    match T::from_settings_str(raw) {
        Ok(value) => Ok(Some(value)),
        Err(reason) => match mode {
            ConvertMode::Lenient => Ok(None),
            ConvertMode::Strict => Err(ConversionError {
                type_name: T::TYPE_NAME,
                input: raw.to_string(),
                reason,
            }),
        },
    }
}

/// Implements [`FromSettingsString`] for types that already implement
/// [`std::str::FromStr`].
///
/// The input is trimmed before `FromStr` sees it.
///
/// ```
/// use std::str::FromStr;
/// use regkv_core::convert::{convert, ConvertMode};
///
/// #[derive(Debug, PartialEq)]
/// enum Theme { Light, Dark }
///
/// impl FromStr for Theme {
///     type Err = String;
///     fn from_str(s: &str) -> Result<Self, String> {
///         match s.to_ascii_lowercase().as_str() {
///             "light" => Ok(Theme::Light),
///             "dark" => Ok(Theme::Dark),
///             other => Err(format!("unknown theme {other}")),
///         }
///     }
/// }
///
/// regkv_core::settings_string_via_from_str!(Theme);
///
/// let theme = convert::<Theme>(Some("Dark"), ConvertMode::Lenient).unwrap();
/// assert_eq!(theme, Some(Theme::Dark));
/// ```
#[macro_export]
macro_rules! settings_string_via_from_str {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::convert::FromSettingsString for $t {
                const TYPE_NAME: &'static str = stringify!($t);

                fn from_settings_str(raw: &str) -> ::std::result::Result<Self, ::std::string::String> {
                    <$t as ::std::str::FromStr>::from_str(raw.trim()).map_err(|e| e.to_string())
                }
            }
        )+
    };
}

// ── Built-in strategies ───────────────────────────────────────────────────────

impl FromSettingsString for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_settings_str(raw: &str) -> Result<Self, String> {
        let text = raw.trim();
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err("expected 'true' or 'false'".to_string())
        }
    }
}

/// Splits off a hexadecimal prefix (`0x`, `&h`, `#`), returning the digits.
fn hex_digits(text: &str) -> Option<&str> {
    if let Some(digits) = text.strip_prefix('#') {
        return Some(digits);
    }
    let prefix = text.get(..2)?;
    if prefix.eq_ignore_ascii_case("0x") || prefix.eq_ignore_ascii_case("&h") {
        return Some(&text[2..]);
    }
    None
}

macro_rules! integer_from_settings_string {
    ($($t:ty => $bits:ty, $signed:ty);* $(;)?) => {
        $(
            impl FromSettingsString for $t {
                const TYPE_NAME: &'static str = stringify!($t);

                fn from_settings_str(raw: &str) -> Result<Self, String> {
                    let text = raw.trim();
                    match hex_digits(text) {
                        Some(digits) if digits.starts_with(&['+', '-'][..]) => {
                            Err("sign after hexadecimal prefix".to_string())
                        }
                        // Hex digits are the bit pattern, so 0xFF as i8 is -1.
                        Some(digits) => <$bits>::from_str_radix(digits, 16)
                            .map(|bits| bits as $t)
                            .map_err(|e| format!("invalid hexadecimal: {e}")),
                        // A negative decimal is the bit pattern of the same
                        // width, so a DWord rendered as -1 reads back as u32::MAX.
                        None => text.parse::<$t>().or_else(|e| {
                            text.parse::<$signed>()
                                .map(|value| value as $t)
                                .map_err(|_| e.to_string())
                        }),
                    }
                }
            }
        )*
    };
}

integer_from_settings_string!(
    i8 => u8, i8;
    i16 => u16, i16;
    i32 => u32, i32;
    i64 => u64, i64;
    i128 => u128, i128;
    isize => usize, isize;
    u8 => u8, i8;
    u16 => u16, i16;
    u32 => u32, i32;
    u64 => u64, i64;
    u128 => u128, i128;
    usize => usize, isize;
);

macro_rules! float_from_settings_string {
    ($($t:ty),*) => {
        $(
            impl FromSettingsString for $t {
                const TYPE_NAME: &'static str = stringify!($t);

                fn from_settings_str(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$t>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

float_from_settings_string!(f32, f64);

impl FromSettingsString for char {
    const TYPE_NAME: &'static str = "char";

    fn from_settings_str(raw: &str) -> Result<Self, String> {
        let single = |s: &str| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        };
        single(raw)
            .or_else(|| single(raw.trim()))
            .ok_or_else(|| "expected exactly one character".to_string())
    }
}

impl FromSettingsString for Uuid {
    const TYPE_NAME: &'static str = "Uuid";

    fn from_settings_str(raw: &str) -> Result<Self, String> {
        Uuid::parse_str(raw.trim()).map_err(|e| e.to_string())
    }
}

impl FromSettingsString for Duration {
    const TYPE_NAME: &'static str = "Duration";

    fn from_settings_str(raw: &str) -> Result<Self, String> {
        timespan::parse(raw)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient<T: FromSettingsString>(raw: &str) -> Option<T> {
        convert::<T>(Some(raw), ConvertMode::Lenient).expect("lenient never errors")
    }

    // ── Policy ────────────────────────────────────────────────────────────────

    #[test]
    fn test_absent_input_yields_none_in_both_modes() {
        assert_eq!(convert::<i32>(None, ConvertMode::Lenient), Ok(None));
        assert_eq!(convert::<i32>(None, ConvertMode::Strict), Ok(None));
    }

    #[test]
    fn test_empty_input_yields_none_even_when_strict() {
        assert_eq!(convert::<i32>(Some(""), ConvertMode::Strict), Ok(None));
    }

    #[test]
    fn test_unparsable_input_is_none_when_lenient() {
        assert_eq!(lenient::<i32>("thirty"), None);
    }

    #[test]
    fn test_unparsable_input_is_error_when_strict() {
        // Act
        let err = convert::<i32>(Some("thirty"), ConvertMode::Strict).unwrap_err();

        // Assert
        assert_eq!(err.type_name, "i32");
        assert_eq!(err.input, "thirty");
        assert!(err.to_string().contains("cannot convert 'thirty' to i32"));
    }

    #[test]
    fn test_default_mode_is_lenient() {
        assert_eq!(ConvertMode::default(), ConvertMode::Lenient);
    }

    // ── Strategies ────────────────────────────────────────────────────────────

    #[test]
    fn test_integer_decimal_with_whitespace_and_sign() {
        assert_eq!(lenient::<i32>(" 30 "), Some(30));
        assert_eq!(lenient::<i32>("-7"), Some(-7));
        assert_eq!(lenient::<i32>("+7"), Some(7));
        assert_eq!(lenient::<u8>("256"), None);
        assert_eq!(lenient::<i8>("-129"), None);
    }

    #[test]
    fn test_unsigned_accepts_negative_decimal_as_bit_pattern() {
        assert_eq!(lenient::<u32>("-1"), Some(u32::MAX));
        assert_eq!(lenient::<u32>("-1294967296"), Some(3_000_000_000));
        assert_eq!(lenient::<u64>("-1"), Some(u64::MAX));
        assert_eq!(lenient::<u8>("-129"), None);
    }

    #[test]
    fn test_integer_hex_prefixes() {
        assert_eq!(lenient::<u32>("0x1E"), Some(30));
        assert_eq!(lenient::<u32>("&h1e"), Some(30));
        assert_eq!(lenient::<u32>("#1E"), Some(30));
        assert_eq!(lenient::<u16>("0X10000"), None);
    }

    #[test]
    fn test_sign_after_hex_prefix_is_rejected() {
        assert_eq!(lenient::<i32>("0x+1F"), None);
        assert_eq!(lenient::<u32>("&h+1f"), None);
        assert_eq!(lenient::<i64>("#-1"), None);
        assert!(convert::<u32>(Some("0x+1F"), ConvertMode::Strict).is_err());
    }

    #[test]
    fn test_signed_hex_is_bit_pattern() {
        assert_eq!(lenient::<i32>("0xFFFFFFFF"), Some(-1));
        assert_eq!(lenient::<i8>("0x80"), Some(i8::MIN));
    }

    #[test]
    fn test_bool_is_case_insensitive() {
        assert_eq!(lenient::<bool>("True"), Some(true));
        assert_eq!(lenient::<bool>(" FALSE "), Some(false));
        assert_eq!(lenient::<bool>("1"), None);
    }

    #[test]
    fn test_floats() {
        assert_eq!(lenient::<f64>("2.5"), Some(2.5));
        assert_eq!(lenient::<f64>("1e3"), Some(1000.0));
        assert_eq!(lenient::<f32>("abc"), None);
    }

    #[test]
    fn test_char_requires_single_character() {
        assert_eq!(lenient::<char>("x"), Some('x'));
        assert_eq!(lenient::<char>(" "), Some(' '));
        assert_eq!(lenient::<char>(" y "), Some('y'));
        assert_eq!(lenient::<char>("xy"), None);
    }

    #[test]
    fn test_uuid_forms() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(lenient::<Uuid>("67e55044-10b1-426f-9247-bb680e5fe0c8"), Some(id));
        assert_eq!(lenient::<Uuid>("{67e55044-10b1-426f-9247-bb680e5fe0c8}"), Some(id));
        assert_eq!(lenient::<Uuid>("67e5504410b1426f9247bb680e5fe0c8"), Some(id));
        assert_eq!(lenient::<Uuid>("not-a-uuid"), None);
    }

    #[test]
    fn test_duration_uses_time_span_notation() {
        assert_eq!(lenient::<Duration>("00:00:30"), Some(Duration::from_secs(30)));
        assert_eq!(lenient::<Duration>("30"), Some(Duration::from_secs(30 * 86_400)));
    }

    #[derive(Debug, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl std::str::FromStr for Level {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "low" => Ok(Level::Low),
                "high" => Ok(Level::High),
                other => Err(format!("unknown level '{other}'")),
            }
        }
    }

    crate::settings_string_via_from_str!(Level);

    #[test]
    fn test_from_str_macro_trims_and_reports_type_name() {
        assert_eq!(lenient::<Level>(" high "), Some(Level::High));
        let err = convert::<Level>(Some("mid"), ConvertMode::Strict).unwrap_err();
        assert_eq!(err.type_name, "Level");
        assert_eq!(err.reason, "unknown level 'mid'");
    }
}
