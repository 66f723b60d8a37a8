//! Integration tests for the read/write value contract.
//!
//! A value written through `ToSettingsValue` + `into_native` and read back
//! through `render` + `convert` must come back as the same typed value for
//! every kind that can represent it.

use std::time::Duration;

use regkv_core::convert::{convert, ConvertMode};
use regkv_core::domain::value::{ToSettingsValue, ValueKind};
use regkv_core::FromSettingsString;
use uuid::Uuid;

/// Writes `value` as `kind`, renders it, and converts it back strictly.
fn store_and_read<T, W>(value: &W, kind: ValueKind) -> Option<T>
where
    T: FromSettingsString,
    W: ToSettingsValue + ?Sized,
{
    let native = value
        .to_settings_value()
        .into_native(kind)
        .expect("value must fit the kind");
    let raw = native.render();
    convert::<T>(Some(&raw), ConvertMode::Strict).expect("rendered value must convert")
}

#[test]
fn test_integer_survives_string_dword_and_qword_kinds() {
    for kind in [ValueKind::String, ValueKind::DWord, ValueKind::QWord] {
        assert_eq!(store_and_read::<i32, _>(&30i32, kind), Some(30), "kind {kind}");
    }
}

#[test]
fn test_negative_integer_survives_dword() {
    assert_eq!(store_and_read::<i32, _>(&-5i32, ValueKind::DWord), Some(-5));
    assert_eq!(store_and_read::<i64, _>(&i64::MIN, ValueKind::QWord), Some(i64::MIN));
}

#[test]
fn test_bool_survives_string_kind() {
    assert_eq!(store_and_read::<bool, _>(&true, ValueKind::String), Some(true));
}

#[test]
fn test_uuid_survives_string_kind() {
    let id = Uuid::new_v4();
    assert_eq!(store_and_read::<Uuid, _>(&id, ValueKind::String), Some(id));
}

#[test]
fn test_duration_survives_string_kind() {
    let span = Duration::new(93_784, 500_000_000);
    assert_eq!(store_and_read::<Duration, _>(&span, ValueKind::String), Some(span));
}

#[test]
fn test_float_survives_string_kind() {
    assert_eq!(store_and_read::<f64, _>(&2.5f64, ValueKind::String), Some(2.5));
    assert_eq!(store_and_read::<f32, _>(&0.1f32, ValueKind::String), Some(0.1));
}

#[test]
fn test_text_number_written_as_dword_reads_as_integer() {
    assert_eq!(store_and_read::<u16, str>("8080", ValueKind::DWord), Some(8080));
}

#[test]
fn test_absent_integer_writes_zero() {
    let native = <i32 as ToSettingsValue>::absent_value()
        .into_native(ValueKind::DWord)
        .expect("zero fits a dword");
    assert_eq!(native.render(), "0");
}

#[test]
fn test_absent_string_writes_empty_text_that_converts_to_none() {
    let native = <str as ToSettingsValue>::absent_value()
        .into_native(ValueKind::String)
        .expect("empty text fits a string");
    assert_eq!(convert::<i32>(Some(&native.render()), ConvertMode::Strict), Ok(None));
}
