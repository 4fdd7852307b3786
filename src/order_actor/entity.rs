//! Entity trait implementation for the Order domain type.
//!
//! This module contains the [`ActorEntity`] trait implementation that lets
//! [`Order`] be kept by the generic [`crate::framework::ResourceActor`].

use super::actions::OrderAction;
use super::error::OrderError;
use super::pipeline::PreparationPipeline;
use crate::framework::ActorEntity;
use crate::model::{CheckResult, Order, OrderCreate, OrderId};
use async_trait::async_trait;

/// Settings injected into the order actor at `run()` time.
#[derive(Debug, Clone, Default)]
pub struct OrderContext {
    pub pipeline: PreparationPipeline,
}

impl OrderContext {
    pub fn new(pipeline: PreparationPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Action = OrderAction;
    type ActionResult = CheckResult;
    type Context = OrderContext;
    type Error = OrderError;

    /// Creates a new Order from creation parameters.
    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, Self::Error> {
        Ok(Order::new(id, params.product, params.size))
    }

    /// Rejects orders without a product or size.
    async fn on_create(&mut self, _ctx: &OrderContext) -> Result<(), Self::Error> {
        if self.product.trim().is_empty() {
            return Err(OrderError::ValidationError("product is required".into()));
        }
        if self.size.trim().is_empty() {
            return Err(OrderError::ValidationError("size is required".into()));
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        ctx: &OrderContext,
    ) -> Result<CheckResult, Self::Error> {
        match action {
            OrderAction::CheckUpdate { last_seen } => Ok(ctx
                .pipeline
                .snapshot(self.accepted_at.elapsed(), last_seen.as_ref())),
        }
    }
}
