pub mod domain;
pub mod ports;

pub use domain::{
    BatchResult, ImageRef, ItemToBuy, OrderHistoryResult, OwnedItem, StyleRecommendation,
    StyleRequest, UploadAck, UserIdentity, UserStatusRecord, DEFAULT_USER_ID,
};
pub use ports::{ImageSource, KeyValueStore, PortError, PortResult, RemoteService};
