//! Shared fixtures, step definitions and scenarios for reconciliation.

mod bdd_steps;
mod scenarios;
mod test_helpers;
