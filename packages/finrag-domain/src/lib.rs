pub mod catalog;
pub mod evidence;
pub mod grounding;
pub mod period;
pub mod plan;
pub mod statement;
