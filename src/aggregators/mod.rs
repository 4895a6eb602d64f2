//! Combination of partial results.
//!
//! The two topologies use different combination rules and must not be mixed: [`files`] treats
//! independent jobs as repeated experiments, [`reduction`] treats ranks as shares of a single
//! experiment.
pub mod files;
pub mod reduction;
