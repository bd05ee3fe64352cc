//! Core types and procedures for provisioning the read-only console user.
//!
//! This crate is free of database and CLI dependencies. The directory that
//! owns subjects, roles and principals is reached only through the
//! [`directory::SubjectDirectory`] trait, passed explicitly to the procedures
//! in [`provision`].

pub mod configuration;
pub mod criteria;
pub mod directory;
pub mod error;
pub mod profile;
pub mod provision;
pub mod role;
pub mod subject;
pub mod visibility;

pub use error::{Error, Result};
