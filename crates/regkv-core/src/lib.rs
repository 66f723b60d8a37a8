//! # regkv-core
//!
//! Shared foundation for the regkv settings store: the vocabulary of stored
//! values, the naming rules of the native hierarchical store, string-to-value
//! conversion, and the diagnostics line-writer abstraction.
//!
//! This crate has zero dependencies on OS APIs.  The store itself and the
//! platform adapters live in the `regkv` crate.
//!
//! # Architecture overview
//!
//! A native hierarchical store (the Windows registry is the canonical example)
//! is a tree of *containers* ("keys").  Each container holds named values, and
//! every value carries a *kind* tag: string, expandable string, 32/64-bit
//! integer, binary blob, or list of strings.  regkv binds one container per
//! application (`Software\<application>`) and reads and writes values in named
//! child containers beneath it (`Settings` by default).
//!
//! - **`domain`** – value kinds, native values, write-side coercion, and the
//!   rules a container or value name must satisfy.
//! - **`convert`** – turns the raw string read from the store into a typed
//!   value (`i32`, `bool`, `Uuid`, `Duration`, ...).
//! - **`diagnostics`** – the [`TraceSink`] trait every store operation writes
//!   its start/end lines through, plus ready-made sinks.

pub mod convert;
pub mod diagnostics;
pub mod domain;

pub use convert::{convert, ConversionError, ConvertMode, FromSettingsString};
pub use diagnostics::{ConsoleSink, LineType, NullSink, RecordingSink, TraceSink, TracingSink};
pub use domain::names::{NameError, DEFAULT_SUBCONTAINER, PLATFORM_LOCATION};
pub use domain::value::{
    KindMismatch, NativeValue, SettingsValue, ToSettingsValue, UnknownKind, ValueKind,
};
