mod container;
pub mod traits;

pub use container::{
    ActionResult, ContainerRecord, ContainerState, LifecycleAction, ParseActionError,
    SHORT_ID_LEN, Snapshot, canonical_name, is_allowed,
};
pub use traits::{ContainerGateway, GatewayError, Notifier};
