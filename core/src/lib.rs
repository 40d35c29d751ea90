//! Type-directed binding of CLI tokens to typed parameter trees.
//!
//! This crate turns a flat list of already shell-split tokens into typed,
//! nested values by walking a declared parameter shape:
//!
//! - [`SchemaNode`] / [`SchemaKind`]: the shape of one parameter (scalar,
//!   literal set, sequence, mapping, record, tuple, or sum).
//! - [`CommandSignature`]: the ordered parameters of one command.
//! - [`TokenStream`]: single-consumption token cursor produced by
//!   [`tokenize`].
//! - [`CoercerRegistry`]: string → [`Value`] conversion per [`ScalarKind`],
//!   extensible with user kinds.
//! - [`Binder`]: the recursive binder producing a [`BoundResult`].
//! - [`SoftDefaults`]: overlay-supplied values consulted when no token
//!   supplies a slot.
//!
//! Validation ([`validate_signature`]) catches structural problems such as
//! duplicate names and unregistered kinds at registration time.
//!
//! # Example
//!
//! ```
//! use argbind_core::*;
//!
//! let signature = CommandSignature::new("add")
//!     .with_parameter(SchemaNode::record("user", vec![
//!         SchemaNode::scalar("name", ScalarKind::Str),
//!         SchemaNode::scalar("id", ScalarKind::Int),
//!         SchemaNode::scalar("admin", ScalarKind::Bool).with_default(false),
//!     ]))
//!     .with_parameter(SchemaNode::flag("verbose").with_alias("-v"));
//!
//! let registry = CoercerRegistry::default();
//! assert!(validate_signature(&signature, &registry).is_empty());
//!
//! let result = Binder::new(&registry).bind(&signature, ["Alice", "7", "-v", "--user.admin"]);
//! assert!(result.is_ok());
//! let user = result.get("user").unwrap();
//! assert_eq!(user.get("name"), Some(&Value::Str("Alice".into())));
//! assert_eq!(user.get("admin"), Some(&Value::Bool(true)));
//! assert_eq!(result.get("verbose"), Some(&Value::Bool(true)));
//! ```

mod binder;
mod coerce;
mod defaults;
mod error;
mod signature;
mod token;
mod types;
mod validate;
mod value;

pub use binder::{
    Binder, BoundResult, SlotInfo, SlotMatch, bind, enumerate_slots, from_structured, resolve_slot,
};
pub use coerce::{Coercer, CoercerRegistry, FnCoercer};
pub use defaults::{SoftDefault, SoftDefaults};
pub use error::{BindError, VariantFailure};
pub use signature::{CommandSignature, ParameterInfo, SIGNATURE_CONTRACT_VERSION};
pub use token::{END_OF_OPTIONS, Mark, Token, TokenKind, TokenStream, is_option_like, tokenize};
pub use types::*;
pub use validate::{SchemaError, validate_signature};
pub use value::Value;
