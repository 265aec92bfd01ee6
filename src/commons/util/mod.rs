//! General utility modules for use all over the code base
pub mod httpclient;
pub mod xml;
