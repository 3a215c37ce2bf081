//! Fire-and-forget dispatch of grill commands
//!
//! Evaluation pushes commands onto an unbounded queue through a
//! [`CommandSender`] and returns immediately. The [`CommandDispatcher`] task
//! drains the queue, lowers each command to a service call and spawns it;
//! failures are logged and dropped.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use traeger_core::{Context, GrillCommand};

use crate::registry::ServiceCaller;

/// A queued command and the context of the evaluation that produced it
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub command: GrillCommand,
    pub context: Context,
}

/// Cloneable handle used by the evaluation path
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Dispatch>,
}

impl CommandSender {
    /// Queue one command; returns false when the dispatcher is gone
    pub fn send(&self, command: GrillCommand, context: Context) -> bool {
        debug!(%command, "Queueing command");
        match self.tx.send(Dispatch { command, context }) {
            Ok(()) => true,
            Err(err) => {
                warn!(command = %err.0.command, "Dispatcher stopped, dropping command");
                false
            }
        }
    }

    /// Queue several commands sharing one context
    pub fn send_all(&self, commands: Vec<GrillCommand>, context: &Context) -> usize {
        commands
            .into_iter()
            .filter(|command| self.send(command.clone(), context.child()))
            .count()
    }
}

/// Drains the command queue
pub struct CommandDispatcher {
    rx: mpsc::UnboundedReceiver<Dispatch>,
    caller: Arc<dyn ServiceCaller>,
    enabled: bool,
}

/// Create a connected sender/dispatcher pair
///
/// With `enabled == false` commands are logged and discarded, which is how
/// the replay binary runs a cook without touching a grill.
pub fn command_channel(
    caller: Arc<dyn ServiceCaller>,
    enabled: bool,
) -> (CommandSender, CommandDispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        CommandSender { tx },
        CommandDispatcher {
            rx,
            caller,
            enabled,
        },
    )
}

impl CommandDispatcher {
    /// Run until every sender is dropped
    pub async fn run(mut self) {
        info!(enabled = self.enabled, "Command dispatcher started");
        while let Some(dispatch) = self.rx.recv().await {
            if !self.enabled {
                info!(command = %dispatch.command, "Dispatch disabled, skipping command");
                continue;
            }
            let call = dispatch.command.to_service_call(dispatch.context);
            let caller = self.caller.clone();
            tokio::spawn(async move {
                let service = call.service_id();
                debug!(%service, "Dispatching command");
                if let Err(err) = caller.call_service(call).await {
                    warn!(%service, error = %err, "Command failed");
                }
            });
        }
        debug!("Command dispatcher stopped");
    }

    /// Spawn [`run`](Self::run) onto the runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ServiceError, ServiceResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;
    use traeger_core::{HvacMode, ServiceCall};

    struct Recorder {
        tx: mpsc::UnboundedSender<ServiceCall>,
    }

    #[async_trait]
    impl ServiceCaller for Recorder {
        async fn call_service(&self, call: ServiceCall) -> ServiceResult {
            let failing = call.service == "set_hvac_mode";
            let _ = self.tx.send(call);
            if failing {
                Err(ServiceError::CallFailed("grill offline".to_string()))
            } else {
                Ok(None)
            }
        }
    }

    fn recorder() -> (Arc<dyn ServiceCaller>, mpsc::UnboundedReceiver<ServiceCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Recorder { tx }), rx)
    }

    fn climate(temperature: i64) -> GrillCommand {
        GrillCommand::SetTemperature {
            entity_id: "climate.abc_climate".parse().unwrap(),
            temperature,
        }
    }

    #[tokio::test]
    async fn test_dispatches_lowered_calls() {
        let (caller, mut calls) = recorder();
        let (sender, dispatcher) = command_channel(caller, true);
        let handle = dispatcher.spawn();

        let context = Context::new();
        assert_eq!(sender.send_all(vec![climate(225)], &context), 1);

        let call = timeout(Duration::from_secs(1), calls.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(call.service_id(), "climate.set_temperature");
        assert_eq!(call.service_data["temperature"], json!(225));
        assert_eq!(call.context.parent_id.as_deref(), Some(context.id.as_str()));

        drop(sender);
        tokio_test::assert_ok!(timeout(Duration::from_secs(1), handle).await);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_dispatcher() {
        let (caller, mut calls) = recorder();
        let (sender, dispatcher) = command_channel(caller, true);
        dispatcher.spawn();

        sender.send(
            GrillCommand::SetHvacMode {
                entity_id: "climate.abc_climate".parse().unwrap(),
                hvac_mode: HvacMode::Cool,
            },
            Context::new(),
        );
        sender.send(climate(180), Context::new());

        let mut services = Vec::new();
        for _ in 0..2 {
            let call = timeout(Duration::from_secs(1), calls.recv())
                .await
                .unwrap()
                .unwrap();
            services.push(call.service_id());
        }
        services.sort();
        assert_eq!(
            services,
            vec!["climate.set_hvac_mode", "climate.set_temperature"]
        );
    }

    #[tokio::test]
    async fn test_disabled_dispatch_discards() {
        let (caller, mut calls) = recorder();
        let (sender, dispatcher) = command_channel(caller, false);
        let handle = dispatcher.spawn();

        assert!(sender.send(climate(225), Context::new()));
        drop(sender);
        handle.await.unwrap();
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_after_dispatcher_dropped() {
        let (caller, _calls) = recorder();
        let (sender, dispatcher) = command_channel(caller, true);
        drop(dispatcher);
        assert!(!sender.send(climate(225), Context::new()));
    }
}
