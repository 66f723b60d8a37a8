//! Domain vocabulary for the settings store.
//!
//! Pure types and rules with no infrastructure dependencies.  Code in the
//! outer layers (the store, the hive adapters, the CLI) depends on these, but
//! nothing here depends on them, so every rule can be tested on any platform.

/// Container and value naming rules plus the fixed layout constants.
pub mod names;

/// Value kinds, native values, and write-side coercion.
///
/// See [`value::NativeValue`] for the stored representation.
pub mod value;
