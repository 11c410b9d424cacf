//! claims-portal web server.
//!
//! Logs users in through an OpenID Connect provider and shows the identity
//! claims it returns. Pages are Leptos components rendered on the server.

#![allow(non_snake_case)]

pub mod app;
pub mod auth;
pub mod config;
pub mod pages;
