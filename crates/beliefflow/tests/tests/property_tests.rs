#[path = "property/hypothesis_counts.rs"]
mod hypothesis_counts;

#[path = "property/mass_conservation.rs"]
mod mass_conservation;
