pub mod assistant;
pub mod notifier;
pub mod reconcile;
pub mod scheduler;
