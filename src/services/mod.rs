pub mod collector;
pub mod supervisor;

pub use collector::TokenCollector;
pub use supervisor::CollectorSupervisor;
