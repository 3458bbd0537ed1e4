//! SplitQR front-of-house dashboard.
//!
//! The [`gateway`] talks to the SplitQR backend, the [`dashboard`] module holds the
//! view router, its polling loop and the presentation components, and [`sandbox`]
//! serves an in-memory backend for local development.

pub mod dashboard;
pub mod gateway;
pub mod model;
pub mod sandbox;
pub mod util;
