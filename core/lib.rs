/*!
This crate runs the whole tuning comparison: it loads a csv dataset, holds out a test set, trains a decision tree with default hyperparameters, tunes the hyperparameters with randomized search and with grid search, and reports the test accuracy and training time of all three.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod config;
mod cv;
mod progress;
mod train;

pub mod report;
pub mod space;
pub mod trainer;
pub mod tune;

#[cfg(test)]
mod testing;

pub use self::{progress::Progress, train::run};
