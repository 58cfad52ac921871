pub mod domain;
pub mod ports;

pub use domain::{
    AuthSession, CardioRecord, Document, MeasurementUpdate, NewCardioRecord, NewUserAccount,
    UserCredentials,
};
pub use ports::{AccountStore, AssetUrlBuilder, PortError, PortResult, RecordStore, SessionStore};
