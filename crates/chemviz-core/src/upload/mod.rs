//! Upload domain module.
//!
//! Types describing one ingested CSV as the server reports it: the
//! normalized rows and the aggregate summary computed over them.

mod model;

pub use model::{
    EQUIPMENT_NAME_FIELD, FLOWRATE_FIELD, PRESSURE_FIELD, RowRecord, Summary, TEMPERATURE_FIELD,
    TYPE_FIELD, TypeDistribution, UploadId, UploadRecord,
};
