//! PKCE login library
//!
//! Core library for the OAuth 2.0 authorization code + PKCE sign-in flow.

pub mod auth;
pub mod config;
pub mod error;
