//! A declarative resource provider for the KMI key management API.
//!
//! The [`provider`] maps host lifecycle calls onto typed resources and
//! data sources, which in turn use the [`kmi`] client to talk to the
//! server. The [`cli`] module drives the provider from the command line.

pub mod cli;
pub mod commons;
pub mod config;
pub mod constants;
pub mod kmi;
pub mod provider;
