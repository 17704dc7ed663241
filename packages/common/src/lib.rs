pub mod protocol;
pub mod stream;

pub use protocol::{
    AddResponseMessage, CarImportStats, DagImportMessage, PinInfo, PinLsResponse, PinRmResponse,
    RootMeta,
};
pub use stream::{DecodeError, JsonStream};
