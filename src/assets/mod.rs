//! Layer image files on disk.
//!
//! Manifests reference layer pixels by relative path. Everything here resolves those paths
//! under one root directory and converts between encoded files and [`crate::PixelBuffer`].

pub(crate) mod decode;
pub(crate) mod store;
