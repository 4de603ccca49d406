/*!
Small utilities shared by the other cartune crates.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod progress_counter;
pub mod table;
