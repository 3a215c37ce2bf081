//! Service registry, state store and command dispatch for the Traeger
//! integration

mod dispatcher;
mod registry;
mod state_store;

pub use dispatcher::{command_channel, CommandDispatcher, CommandSender, Dispatch};
pub use registry::{
    ServiceCaller, ServiceDescription, ServiceError, ServiceFuture, ServiceHandler,
    ServiceRegistry, ServiceResult, SharedServiceRegistry,
};
pub use state_store::{SharedStateStore, StateChanged, StateStore};
