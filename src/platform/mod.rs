//! Windows platform plumbing outside the reconciliation core

pub mod startup;
