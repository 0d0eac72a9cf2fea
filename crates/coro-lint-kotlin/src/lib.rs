//! # coro-lint-kotlin
//!
//! Tree-sitter based Kotlin frontend for coro-lint.
//!
//! This crate turns Kotlin source into the host-agnostic syntax model of
//! `coro-lint-core` and answers name and type queries about it:
//!
//! - [`KotlinFrontend`] parses `.kt`/`.kts` files and lowers them
//! - [`KotlinResolver`] resolves names through imports and local declarations
//! - [`known_symbols`] lists the library declarations known without a classpath
//! - [`discover_gradle_dependencies`] reads declared libraries from Gradle files

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod facts;
pub mod gradle;
pub mod known;
pub mod kotlin;
pub mod resolver;

pub use facts::FileFacts;
pub use gradle::{discover_gradle_dependencies, GradleError};
pub use known::{known_symbols, KnownSymbol};
pub use kotlin::KotlinFrontend;
pub use resolver::KotlinResolver;
