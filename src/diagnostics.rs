//! Error taxonomy for the typed-value and marshalling core
//!
//! Every failure the core can produce is a variant of [`CoreError`], grouped
//! into the families callers reason about: configuration, range, type,
//! shape, not-implemented, and usage. All of them are programmer-visible and
//! non-retryable; they are raised at the point of detection and propagate
//! unhandled, because an ill-shaped value that reaches the native call
//! boundary is a memory-safety bug, not a recoverable condition.

use miette::Diagnostic;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core diagnostic
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CoreError {
    // === Configuration Errors ===
    #[error("{type_name} was declared without a fixed width or native kind")]
    #[diagnostic(
        code(types::undeclared),
        help("concrete value types fix their width, sign, and native kind at declaration")
    )]
    UndeclaredType { type_name: String },

    #[error("malformed target configuration: {detail}")]
    #[diagnostic(code(target::config_parse))]
    ConfigParse { detail: String },

    #[error("`{triple}` is not a recognized target triple: {detail}")]
    #[diagnostic(code(target::invalid_triple))]
    InvalidTriple { triple: String, detail: String },

    // === Range Errors ===
    #[error("value {value} is out of range for {type_name} ({min}..={max})")]
    #[diagnostic(code(types::out_of_range))]
    OutOfRange {
        value: i128,
        type_name: String,
        min: i128,
        max: i128,
    },

    #[error("division by zero while folding a literal expression")]
    #[diagnostic(code(types::division_by_zero))]
    DivisionByZero,

    #[error("shift amount {amount} is out of range for a literal shift")]
    #[diagnostic(code(types::shift_out_of_range))]
    ShiftOutOfRange { amount: i64 },

    // === Type Errors ===
    #[error("{value} cannot be cast as {target}")]
    #[diagnostic(code(types::invalid_cast))]
    InvalidCast { value: String, target: String },

    #[error("cannot wrap a width-{found} value into {type_name} (width {expected})")]
    #[diagnostic(code(types::width_mismatch))]
    WidthMismatch {
        type_name: String,
        expected: u32,
        found: u32,
    },

    #[error("{type_name} can only wrap a signless integer value, got a {found} one")]
    #[diagnostic(code(types::not_signless))]
    NotSignless { type_name: String, found: String },

    #[error("cannot cast {from_type} into narrower {to_type}; integer casts must widen")]
    #[diagnostic(code(types::narrowing_cast))]
    NarrowingCast { from_type: String, to_type: String },

    #[error("cannot cast {from_type} into {to_type}: integer casts cannot change sign")]
    #[diagnostic(code(types::sign_changing_cast))]
    SignChangingCast { from_type: String, to_type: String },

    #[error("unsupported operand for {op}: {operand}")]
    #[diagnostic(code(types::unsupported_operand))]
    UnsupportedOperand { op: &'static str, operand: String },

    #[error("{type_name} has no native ABI scalar")]
    #[diagnostic(code(abi::unmappable))]
    NoAbiMapping { type_name: String },

    #[error("expected a {expected} field at {path}, found {found}")]
    #[diagnostic(code(abi::field_type_mismatch))]
    FieldTypeMismatch {
        expected: String,
        found: String,
        path: String,
    },

    // === Shape Errors ===
    #[error("type tree and value tree disagree in nesting depth at {path}")]
    #[diagnostic(code(abi::shape_mismatch))]
    ShapeMismatch { path: String },

    #[error("type tree and value tree disagree in length at {path}: expected {expected}, found {found}")]
    #[diagnostic(code(abi::length_mismatch))]
    LengthMismatch {
        path: String,
        expected: usize,
        found: usize,
    },

    // === Not-Implemented Errors ===
    #[error("{what} is not implemented")]
    #[diagnostic(code(types::unimplemented))]
    Unimplemented { what: &'static str },

    // === Usage Errors ===
    #[error("`{name}` is called before it is compiled")]
    #[diagnostic(code(target::not_compiled))]
    NotCompiled { name: String },

    #[error("`{name}` takes {expected} positional arguments but {found} were given")]
    #[diagnostic(code(target::arity_mismatch))]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("`{name}` cannot be called under the plain convention: it has a composite return type")]
    #[diagnostic(code(target::composite_return_unsupported))]
    CompositeReturnUnsupported { name: String },

    #[error("symbol `{symbol}` was not found in the compiled library: {detail}")]
    #[diagnostic(code(target::missing_symbol))]
    MissingSymbol { symbol: String, detail: String },

    #[error("failed to load compiled library `{path}`: {detail}")]
    #[diagnostic(code(target::library_load))]
    LibraryLoad { path: String, detail: String },

    #[error("`{name}` is not a declared kernel")]
    #[diagnostic(code(target::unknown_kernel))]
    UnknownKernel { name: String },
}
