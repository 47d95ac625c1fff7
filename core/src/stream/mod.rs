//! stream: sequential block pipeline for whole files.
//!
//! Layering (leaves first): `alignment` and `io` shape the streams, `validator`
//! keeps block accounting honest, `engine` runs the per-block AEAD loop,
//! `pipeline` wires key, header and engine together, and `core` is the public
//! entry point.

pub mod alignment;
pub mod core;
pub mod engine;
pub mod io;
pub mod pipeline;
pub mod validator;

pub use self::alignment::{AlignedPolicy, AlignmentMode, AlignmentPolicy, OpenMode, UnalignedPolicy};
pub use self::core::FileCryptor;
pub use self::pipeline::TransferInstruction;
pub use self::validator::ConsistencyError;
