// src/roundtable/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod room;
pub mod scheduler;
pub mod store;
pub mod turn_executor;
pub mod turn_order;

// Let's explicitly export DiscussionScheduler so we don't have to access it via
// roundtable::scheduler::DiscussionScheduler and instead as roundtable::DiscussionScheduler
pub use scheduler::DiscussionScheduler;
