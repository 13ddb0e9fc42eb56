//! Exception type descriptors and the `Exception` trait
//!
//! Rule entries name exception types as strings. Those strings resolve
//! (through [`ExceptionRegistry`](crate::registry::ExceptionRegistry)) to
//! statically declared [`ExceptionType`] descriptors. A descriptor may have
//! several parents, so "is an instance of" is a walk over the parent graph.
//!
//! # Declaring application types
//!
//! ```
//! use faultline_core::exception::{Exception, Fault, VALUE_ERROR};
//! use faultline_core::exception_type;
//!
//! exception_type!(pub static QUOTA_ERROR = "QuotaError" in "billing", extends [VALUE_ERROR]);
//!
//! let fault = Fault::new(&QUOTA_ERROR, "over quota");
//! assert!(fault.is_instance_of(&VALUE_ERROR));
//! ```

use std::error::Error as StdError;
use std::fmt;

/// Module name carried by the built-in descriptors
pub const BUILTIN_MODULE: &str = "builtins";

/// Statically declared exception type
///
/// Identity is the `(module, name)` pair.
#[derive(Debug)]
pub struct ExceptionType {
    pub name: &'static str,
    pub module: &'static str,
    pub parents: &'static [&'static ExceptionType],
}

impl ExceptionType {
    /// Simple name, as used for behavior keys
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn is_builtin(&self) -> bool {
        self.module == BUILTIN_MODULE
    }

    /// `module::Name` for application types, the bare name for built-ins
    pub fn qualified_name(&self) -> String {
        if self.is_builtin() {
            self.name.to_string()
        } else {
            format!("{}::{}", self.module, self.name)
        }
    }

    /// Reflexive, transitive subtype check over all parents
    pub fn is_subtype_of(&self, other: &ExceptionType) -> bool {
        self == other || self.parents.iter().any(|p| p.is_subtype_of(other))
    }

    /// Whether this descriptor derives from the root [`ERROR`] type
    pub fn is_exception(&self) -> bool {
        self.is_subtype_of(&ERROR)
    }
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || (self.name == other.name && self.module == other.module)
    }
}

impl Eq for ExceptionType {}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Declare a static [`ExceptionType`]
///
/// Without `extends`, the type derives directly from [`ERROR`].
#[macro_export]
macro_rules! exception_type {
    ($(#[$meta:meta])* $vis:vis static $ident:ident = $name:literal in $module:expr, extends [$($parent:expr),+ $(,)?]) => {
        $(#[$meta])*
        $vis static $ident: $crate::exception::ExceptionType = $crate::exception::ExceptionType {
            name: $name,
            module: $module,
            parents: &[$(&$parent),+],
        };
    };
    ($(#[$meta:meta])* $vis:vis static $ident:ident = $name:literal in $module:expr) => {
        $crate::exception_type!(
            $(#[$meta])* $vis static $ident = $name in $module, extends [$crate::exception::ERROR]
        );
    };
}

/// Root of the exception hierarchy
pub static ERROR: ExceptionType = ExceptionType {
    name: "Error",
    module: BUILTIN_MODULE,
    parents: &[],
};

exception_type!(pub static VALUE_ERROR = "ValueError" in BUILTIN_MODULE);
exception_type!(pub static TYPE_ERROR = "TypeError" in BUILTIN_MODULE);
exception_type!(pub static LOOKUP_ERROR = "LookupError" in BUILTIN_MODULE);
exception_type!(pub static KEY_ERROR = "KeyError" in BUILTIN_MODULE, extends [LOOKUP_ERROR]);
exception_type!(pub static INDEX_ERROR = "IndexError" in BUILTIN_MODULE, extends [LOOKUP_ERROR]);
exception_type!(pub static ARITHMETIC_ERROR = "ArithmeticError" in BUILTIN_MODULE);
exception_type!(
    pub static ZERO_DIVISION_ERROR = "ZeroDivisionError" in BUILTIN_MODULE, extends [ARITHMETIC_ERROR]
);
exception_type!(
    pub static OVERFLOW_ERROR = "OverflowError" in BUILTIN_MODULE, extends [ARITHMETIC_ERROR]
);
exception_type!(pub static IO_ERROR = "IoError" in BUILTIN_MODULE);
exception_type!(pub static NOT_FOUND_ERROR = "NotFoundError" in BUILTIN_MODULE, extends [IO_ERROR]);
exception_type!(pub static PERMISSION_ERROR = "PermissionError" in BUILTIN_MODULE, extends [IO_ERROR]);
exception_type!(pub static TIMEOUT_ERROR = "TimeoutError" in BUILTIN_MODULE, extends [IO_ERROR]);
exception_type!(pub static PARSE_ERROR = "ParseError" in BUILTIN_MODULE, extends [VALUE_ERROR]);
exception_type!(pub static UNICODE_ERROR = "UnicodeError" in BUILTIN_MODULE, extends [VALUE_ERROR]);
exception_type!(pub static RUNTIME_ERROR = "RuntimeError" in BUILTIN_MODULE);
exception_type!(
    pub static NOT_IMPLEMENTED_ERROR = "NotImplementedError" in BUILTIN_MODULE, extends [RUNTIME_ERROR]
);

/// Every built-in descriptor, root first
pub static BUILTINS: &[&ExceptionType] = &[
    &ERROR,
    &VALUE_ERROR,
    &TYPE_ERROR,
    &LOOKUP_ERROR,
    &KEY_ERROR,
    &INDEX_ERROR,
    &ARITHMETIC_ERROR,
    &ZERO_DIVISION_ERROR,
    &OVERFLOW_ERROR,
    &IO_ERROR,
    &NOT_FOUND_ERROR,
    &PERMISSION_ERROR,
    &TIMEOUT_ERROR,
    &PARSE_ERROR,
    &UNICODE_ERROR,
    &RUNTIME_ERROR,
    &NOT_IMPLEMENTED_ERROR,
];

/// An error value that knows its exception type
pub trait Exception: StdError + Send + Sync {
    fn exception_type(&self) -> &'static ExceptionType;

    /// `isinstance` over the descriptor graph
    fn is_instance_of(&self, ty: &ExceptionType) -> bool {
        self.exception_type().is_subtype_of(ty)
    }
}

/// Boxed exception, the error type of wrapped callables
pub type BoxedException = Box<dyn Exception + 'static>;

impl<E: Exception + 'static> From<E> for BoxedException {
    fn from(err: E) -> Self {
        Box::new(err)
    }
}

/// General-purpose exception value
#[derive(Debug)]
pub struct Fault {
    kind: &'static ExceptionType,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Fault {
    pub fn new(kind: &'static ExceptionType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause, rendered in the traceback
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &'static ExceptionType {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn StdError + 'static))
    }
}

impl Exception for Fault {
    fn exception_type(&self) -> &'static ExceptionType {
        self.kind
    }
}

impl Exception for std::io::Error {
    fn exception_type(&self) -> &'static ExceptionType {
        use std::io::ErrorKind;
        match self.kind() {
            ErrorKind::NotFound => &NOT_FOUND_ERROR,
            ErrorKind::PermissionDenied => &PERMISSION_ERROR,
            ErrorKind::TimedOut => &TIMEOUT_ERROR,
            ErrorKind::InvalidInput | ErrorKind::InvalidData => &VALUE_ERROR,
            ErrorKind::Unsupported => &NOT_IMPLEMENTED_ERROR,
            _ => &IO_ERROR,
        }
    }
}

impl Exception for std::num::ParseIntError {
    fn exception_type(&self) -> &'static ExceptionType {
        &PARSE_ERROR
    }
}

impl Exception for std::num::ParseFloatError {
    fn exception_type(&self) -> &'static ExceptionType {
        &PARSE_ERROR
    }
}

impl Exception for std::str::Utf8Error {
    fn exception_type(&self) -> &'static ExceptionType {
        &UNICODE_ERROR
    }
}

impl Exception for std::string::FromUtf8Error {
    fn exception_type(&self) -> &'static ExceptionType {
        &UNICODE_ERROR
    }
}
