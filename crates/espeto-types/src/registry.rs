//! Registry trait for self-registering implementations.
//!
//! Pluggable seams (store backends, chat transports) each provide a Registry
//! struct implementing this trait, tying the configuration name to the
//! factory function that builds the implementation.

/// Base trait for implementation registries.
///
/// Each implementation module must declare the name it is referenced by in
/// configuration files and hand out its factory function.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "memory" for `store.implementations.memory`
	/// - "webhook" for `chat.outbound.implementations.webhook`
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	///
	/// Each seam defines its own factory type, for example `StoreFactory`
	/// for store backends or `OutboundFactory` for chat sinks.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
