//! # rill-auth
//!
//! Bearer-token collaborator interface for the rill client runtime.
//!
//! The REST pipeline attaches a bearer credential to every outbound request
//! but never acquires or refreshes tokens itself — that is the job of a
//! [`TokenProvider`] implementation supplied by the embedding application.
//! This crate defines the token model, the provider trait, and a static
//! provider for fixed tokens and tests.

#![deny(unsafe_code)]

pub mod errors;
pub mod token;

pub use errors::AuthError;
pub use token::{OAuthToken, StaticTokenProvider, TokenProvider};
