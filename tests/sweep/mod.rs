//! Shared fixtures, step definitions and scenarios for retention sweeps.

mod bdd_steps;
mod scenarios;
mod test_helpers;
