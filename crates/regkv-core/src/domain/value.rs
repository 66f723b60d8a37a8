//! Value kinds, native values, and write-side coercion.
//!
//! # Read path
//!
//! Every stored value is a [`NativeValue`]: a payload tagged with its
//! [`ValueKind`].  Reads hand callers the *raw string* of a value, produced by
//! [`NativeValue::render`]; typed reads then run that string through the
//! converter in [`crate::convert`].
//!
//! # Write path
//!
//! Callers hand the store anything implementing [`ToSettingsValue`].  That
//! yields a kind-agnostic [`SettingsValue`], which is coerced to the kind the
//! caller asked for with [`SettingsValue::into_native`].  The kind must match
//! how the value is read back later: an integer stored as `DWord` renders as
//! `"30"`, the same integer stored as `Binary` is a kind mismatch.

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::convert::timespan;

/// Native type tag attached to a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    /// Plain string (`REG_SZ`).
    #[default]
    String,
    /// String with `%VAR%` references expanded on read (`REG_EXPAND_SZ`).
    ExpandString,
    /// 32-bit integer (`REG_DWORD`).
    DWord,
    /// 64-bit integer (`REG_QWORD`).
    QWord,
    /// Opaque bytes (`REG_BINARY`).
    Binary,
    /// List of strings (`REG_MULTI_SZ`).
    MultiString,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 6] = [
        ValueKind::String,
        ValueKind::ExpandString,
        ValueKind::DWord,
        ValueKind::QWord,
        ValueKind::Binary,
        ValueKind::MultiString,
    ];

    /// Short lowercase name, matching the `kind` tag of a serialized [`NativeValue`].
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::ExpandString => "expand_string",
            ValueKind::DWord => "dword",
            ValueKind::QWord => "qword",
            ValueKind::Binary => "binary",
            ValueKind::MultiString => "multi_string",
        }
    }

    /// Name of the kind in the Windows registry API.
    pub fn native_name(self) -> &'static str {
        match self {
            ValueKind::String => "REG_SZ",
            ValueKind::ExpandString => "REG_EXPAND_SZ",
            ValueKind::DWord => "REG_DWORD",
            ValueKind::QWord => "REG_QWORD",
            ValueKind::Binary => "REG_BINARY",
            ValueKind::MultiString => "REG_MULTI_SZ",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string did not name a [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ValueKind {
    type Err = UnknownKind;

    /// Accepts the short name, the registry name, and the aliases `expand`
    /// and `multi`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("expand") {
            return Ok(ValueKind::ExpandString);
        }
        if wanted.eq_ignore_ascii_case("multi") {
            return Ok(ValueKind::MultiString);
        }
        ValueKind::ALL
            .into_iter()
            .find(|kind| {
                wanted.eq_ignore_ascii_case(kind.as_str())
                    || wanted.eq_ignore_ascii_case(kind.native_name())
            })
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

// ── Stored representation ─────────────────────────────────────────────────────

/// A value as the native store holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum NativeValue {
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "expand_string")]
    ExpandString(String),
    #[serde(rename = "dword")]
    DWord(u32),
    #[serde(rename = "qword")]
    QWord(u64),
    #[serde(rename = "binary")]
    Binary(Vec<u8>),
    #[serde(rename = "multi_string")]
    MultiString(Vec<String>),
}

impl NativeValue {
    /// The kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            NativeValue::String(_) => ValueKind::String,
            NativeValue::ExpandString(_) => ValueKind::ExpandString,
            NativeValue::DWord(_) => ValueKind::DWord,
            NativeValue::QWord(_) => ValueKind::QWord,
            NativeValue::Binary(_) => ValueKind::Binary,
            NativeValue::MultiString(_) => ValueKind::MultiString,
        }
    }

    /// Produces the raw string handed to readers.
    ///
    /// | Kind           | Rendering                                     |
    /// |----------------|-----------------------------------------------|
    /// | `String`       | as stored                                     |
    /// | `ExpandString` | `%VAR%` expanded from the process environment |
    /// | `DWord`        | signed 32-bit decimal                         |
    /// | `QWord`        | signed 64-bit decimal                         |
    /// | `Binary`       | lowercase hex, two digits per byte            |
    /// | `MultiString`  | entries joined with `\n`                      |
    pub fn render(&self) -> String {
        match self {
            NativeValue::String(s) => s.clone(),
            NativeValue::ExpandString(s) => expand_environment(s),
            NativeValue::DWord(bits) => (*bits as i32).to_string(),
            NativeValue::QWord(bits) => (*bits as i64).to_string(),
            NativeValue::Binary(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for byte in bytes {
                    // Writing to a String cannot fail.
                    let _ = write!(out, "{byte:02x}");
                }
                out
            }
            NativeValue::MultiString(lines) => lines.join("\n"),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Expands `%NAME%` references from the process environment.
///
/// References to unset variables are left verbatim, as is a lone `%`.
pub fn expand_environment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match std::env::var(name).ok().filter(|_| !name.is_empty()) {
            Some(value) => {
                out.push_str(&value);
                rest = &after[end + 1..];
            }
            None => {
                // The closing '%' may open the next reference.
                out.push('%');
                out.push_str(name);
                rest = &after[end..];
            }
        }
    }

    out.push_str(rest);
    out
}

// ── Write-side coercion ───────────────────────────────────────────────────────

/// A caller-supplied value before it is coerced to a [`ValueKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsValue {
    Text(String),
    Bool(bool),
    Int(i128),
    Float(f64),
    Bytes(Vec<u8>),
    Lines(Vec<String>),
}

/// A value cannot be represented in the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{found} value cannot be stored as {kind}: {reason}")]
pub struct KindMismatch {
    pub kind: ValueKind,
    pub found: &'static str,
    pub reason: String,
}

impl SettingsValue {
    fn describe(&self) -> &'static str {
        match self {
            SettingsValue::Text(_) => "text",
            SettingsValue::Bool(_) => "boolean",
            SettingsValue::Int(_) => "integer",
            SettingsValue::Float(_) => "floating-point",
            SettingsValue::Bytes(_) => "binary",
            SettingsValue::Lines(_) => "multi-line",
        }
    }

    fn mismatch(&self, kind: ValueKind, reason: impl Into<String>) -> KindMismatch {
        KindMismatch {
            kind,
            found: self.describe(),
            reason: reason.into(),
        }
    }

    /// Coerces this value to `kind`.
    ///
    /// - `String` / `ExpandString` take any scalar (booleans as `True`/`False`).
    /// - `DWord` takes integers in `-2^31 ..= 2^32 - 1`, `QWord` integers in
    ///   `-2^63 ..= 2^64 - 1`; integral floats, booleans, and decimal text
    ///   count as integers.  Negative numbers are stored as their
    ///   two's-complement bit pattern, and both kinds render as signed
    ///   decimal, so `3_000_000_000` written as a `DWord` reads back as
    ///   `-1294967296` and converts to `u32` through that bit pattern.
    /// - `Binary` takes bytes only, `MultiString` lines only.
    ///
    /// # Errors
    ///
    /// Returns [`KindMismatch`] when the value has no representation in `kind`.
    pub fn into_native(self, kind: ValueKind) -> Result<NativeValue, KindMismatch> {
        match kind {
            ValueKind::String | ValueKind::ExpandString => {
                let text = match self {
                    SettingsValue::Text(s) => s,
                    SettingsValue::Bool(b) => (if b { "True" } else { "False" }).to_string(),
                    SettingsValue::Int(i) => i.to_string(),
                    SettingsValue::Float(f) => f.to_string(),
                    other => {
                        return Err(other.mismatch(kind, "only scalar values have a string form"))
                    }
                };
                Ok(if kind == ValueKind::String {
                    NativeValue::String(text)
                } else {
                    NativeValue::ExpandString(text)
                })
            }
            ValueKind::DWord => {
                let value = self.integer(kind)?;
                if (i128::from(i32::MIN)..=i128::from(u32::MAX)).contains(&value) {
                    Ok(NativeValue::DWord(value as u32))
                } else {
                    Err(self.mismatch(kind, format!("{value} is outside the 32-bit range")))
                }
            }
            ValueKind::QWord => {
                let value = self.integer(kind)?;
                if (i128::from(i64::MIN)..=i128::from(u64::MAX)).contains(&value) {
                    Ok(NativeValue::QWord(value as u64))
                } else {
                    Err(self.mismatch(kind, format!("{value} is outside the 64-bit range")))
                }
            }
            ValueKind::Binary => match self {
                SettingsValue::Bytes(bytes) => Ok(NativeValue::Binary(bytes)),
                other => Err(other.mismatch(kind, "binary values must be given as bytes")),
            },
            ValueKind::MultiString => match self {
                SettingsValue::Lines(lines) => Ok(NativeValue::MultiString(lines)),
                other => Err(other.mismatch(kind, "multi-string values must be given as lines")),
            },
        }
    }

    fn integer(&self, kind: ValueKind) -> Result<i128, KindMismatch> {
        match self {
            SettingsValue::Int(i) => Ok(*i),
            SettingsValue::Bool(b) => Ok(i128::from(*b)),
            SettingsValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(*f as i128),
            SettingsValue::Float(f) => Err(self.mismatch(kind, format!("{f} is not integral"))),
            SettingsValue::Text(s) => s
                .trim()
                .parse::<i128>()
                .map_err(|e| self.mismatch(kind, format!("'{s}' is not an integer: {e}"))),
            _ => Err(self.mismatch(kind, "not a number")),
        }
    }
}

/// Types the store can write.
///
/// The write-side counterpart of [`crate::convert::FromSettingsString`].
pub trait ToSettingsValue {
    fn to_settings_value(&self) -> SettingsValue;

    /// Value written when the caller passes no value at all.
    ///
    /// Value-like types write their zero value; everything else writes the
    /// empty string.
    fn absent_value() -> SettingsValue {
        SettingsValue::Text(String::new())
    }
}

impl<T: ToSettingsValue + ?Sized> ToSettingsValue for &T {
    fn to_settings_value(&self) -> SettingsValue {
        (**self).to_settings_value()
    }

    fn absent_value() -> SettingsValue {
        T::absent_value()
    }
}

impl ToSettingsValue for SettingsValue {
    fn to_settings_value(&self) -> SettingsValue {
        self.clone()
    }
}

impl ToSettingsValue for str {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Text(self.to_string())
    }
}

impl ToSettingsValue for String {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Text(self.clone())
    }
}

impl ToSettingsValue for char {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Text(self.to_string())
    }
}

impl ToSettingsValue for bool {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Bool(*self)
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Bool(false)
    }
}

macro_rules! integer_to_settings_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl ToSettingsValue for $t {
                fn to_settings_value(&self) -> SettingsValue {
                    SettingsValue::Int(i128::from(*self))
                }

                fn absent_value() -> SettingsValue {
                    SettingsValue::Int(0)
                }
            }
        )*
    };
}

integer_to_settings_value!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl ToSettingsValue for isize {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Int(*self as i128)
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Int(0)
    }
}

impl ToSettingsValue for usize {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Int(*self as i128)
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Int(0)
    }
}

impl ToSettingsValue for u128 {
    fn to_settings_value(&self) -> SettingsValue {
        // Values past i128::MAX keep their text form; integer kinds reject them.
        i128::try_from(*self)
            .map(SettingsValue::Int)
            .unwrap_or_else(|_| SettingsValue::Text(self.to_string()))
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Int(0)
    }
}

impl ToSettingsValue for f64 {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Float(*self)
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Float(0.0)
    }
}

impl ToSettingsValue for f32 {
    fn to_settings_value(&self) -> SettingsValue {
        // Widening to f64 would render 0.1f32 as 0.10000000149011612.
        SettingsValue::Text(self.to_string())
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Float(0.0)
    }
}

impl ToSettingsValue for [u8] {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Bytes(self.to_vec())
    }
}

impl ToSettingsValue for Vec<u8> {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Bytes(self.clone())
    }
}

impl ToSettingsValue for [String] {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Lines(self.to_vec())
    }
}

impl ToSettingsValue for Vec<String> {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Lines(self.clone())
    }
}

impl<'a> ToSettingsValue for [&'a str] {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Lines(self.iter().map(|s| s.to_string()).collect())
    }
}

impl<'a> ToSettingsValue for Vec<&'a str> {
    fn to_settings_value(&self) -> SettingsValue {
        self.as_slice().to_settings_value()
    }
}

impl ToSettingsValue for Uuid {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Text(self.hyphenated().to_string())
    }
}

impl ToSettingsValue for Duration {
    fn to_settings_value(&self) -> SettingsValue {
        SettingsValue::Text(timespan::format(*self))
    }

    fn absent_value() -> SettingsValue {
        SettingsValue::Text(timespan::format(Duration::ZERO))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
