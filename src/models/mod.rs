pub mod record;
pub mod review_status;

pub use record::Record;
pub use review_status::ReviewStatus;
