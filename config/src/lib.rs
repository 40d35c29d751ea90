//! Configuration overlays for argbind signatures.
//!
//! An [`Overlay`] supplies soft defaults: values the binder uses for a slot
//! only when no CLI token supplies it. Overlays run in order through
//! [`apply_overlays`]; the first overlay to supply a slot owns it.
//!
//! - [`FileConfig`] reads TOML, YAML or JSON files, optionally scoped under
//!   root keys (e.g. `[tool.myapp]`) and searched for in parent directories.
//! - [`Env`] reads `PREFIX_COMMAND_FIELD` environment variables.
//!
//! # Example
//!
//! ```
//! use argbind_config::{apply_overlays, Env, FileConfig, Overlay};
//! use argbind_core::*;
//!
//! let signature = CommandSignature::new("serve")
//!     .with_parameter(SchemaNode::scalar("host", ScalarKind::Str).with_default("localhost"))
//!     .with_parameter(SchemaNode::scalar("port", ScalarKind::Int).with_default(80i64));
//!
//! let env = Env::new("APP_").with_vars([("APP_PORT", "8080")]);
//! let file = FileConfig::toml("does-not-exist.toml");
//! let defaults = apply_overlays(&[&env as &dyn Overlay, &file], &signature, &[]).unwrap();
//!
//! let registry = CoercerRegistry::default();
//! let result = bind(&signature, ["--host", "example.org"], &registry, &defaults);
//! assert_eq!(result.get("host"), Some(&Value::Str("example.org".into())));
//! assert_eq!(result.get("port"), Some(&Value::Int(8080)));
//! ```

mod env;
mod error;
mod file;
mod overlay;

pub use env::{ENV_SOURCE, Env};
pub use error::{ConfigError, Result};
pub use file::{ConfigMap, FileConfig, Format};
pub use overlay::{Overlay, apply_overlays};
