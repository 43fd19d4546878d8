#[path = "e2e/posterior_updates.rs"]
mod posterior_updates;

#[path = "e2e/shuffle_semantics.rs"]
mod shuffle_semantics;

#[path = "e2e/shuffler_retention.rs"]
mod shuffler_retention;

#[path = "e2e/scripted_flow.rs"]
mod scripted_flow;
