//! Telco churn pipeline
//!
//! Derives the customer feature mart from a raw export, trains a churn
//! classifier on it, and writes run metadata and per-customer scores back to
//! the feature store.

pub mod commands;
