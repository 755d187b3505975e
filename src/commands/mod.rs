use std::sync::Arc;

use async_trait::async_trait;

use crate::{db::DbPool, errors::ServiceError, events::EventSender};

/// Command trait for implementing the Command Pattern.
///
/// Encapsulates one business operation into an object that can be validated,
/// executed and produce events. Commands are thin: they validate input and
/// delegate to the services, which own transactions and event publishing.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod orders;
