//! Core logic: configuration, granule selection and id surgery, product
//! naming, and the `processing` stages (RGB stretch, merge, run pipeline).
pub mod config;
pub mod granule_id;
pub mod naming;
pub mod processing;
pub mod selector;
