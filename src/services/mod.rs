pub mod candidate_selector;
pub mod climate;
pub mod enrichment;
pub mod generation;
pub mod node_scorer;
pub mod persona_context;
pub mod slot_placer;
