pub mod document;
pub mod element;
pub mod error;
pub mod recommendation;

pub use document::{Document, HeadingLevel, HeadingNode};
pub use element::{ElementKind, PreservationReport, Span, ValuableElement};
pub use error::{Result, ResultExt, ReweaveError, ValidationError, ValidationErrorKind};
pub use recommendation::{Action, Recommendation};
