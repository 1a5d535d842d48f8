//! Ports: the cache's inbound API and its outbound dependencies.

pub mod inbound;
pub mod outbound;

pub use inbound::MapCacheApi;
pub use outbound::{
    CreateItemInput, CreatedItem, DeleteItemInput, MoveItemRequest, MoveOutcome, MutationAck,
    MutationGateway, RemoteTile, TileQuerySource, TimeSource, UpdateItemInput,
};
