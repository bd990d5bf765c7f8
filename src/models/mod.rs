pub mod district;
pub mod snapshot;

pub use district::{DistrictField, DistrictRecord};
pub use snapshot::DatasetSnapshot;
