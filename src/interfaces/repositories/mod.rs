pub mod notifier;
pub mod store;
