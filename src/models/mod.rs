pub mod access;
pub mod visit;

pub use access::{normalize_tenant_name, AccessEvent, TenantActivity};
pub use visit::{DistanceEstimates, DwellTimeVisits, VisitRecord, VisitRecordBuilder, WeekdayVisits};
