pub mod access_reader;
pub mod fields;
pub mod visit_reader;

pub use access_reader::AccessReader;
pub use fields::{parse_date, parse_float, parse_int, FieldSource, HeaderIndex};
pub use visit_reader::{ColumnLayout, VisitDataset, VisitReader};
