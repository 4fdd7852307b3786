//! The order book: accepted orders kept on a [`ResourceActor`], plus the
//! simulated preparation pipeline that reports their status.

mod actions;
pub mod entity;
pub mod error;
pub mod pipeline;

pub use actions::*;
pub use entity::OrderContext;
pub use error::*;
pub use pipeline::*;

use crate::clients::OrderClient;
use crate::framework::ResourceActor;
use crate::model::{Order, OrderId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Creates a new Order actor and its client. Ids start at 1.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, OrderClient) {
    let order_id_counter = Arc::new(AtomicU64::new(1));
    let next_order_id = move || OrderId(order_id_counter.fetch_add(1, Ordering::SeqCst));

    let (actor, generic_client) = ResourceActor::new(buffer_size, next_order_id);
    let client = OrderClient::new(generic_client);

    (actor, client)
}
