pub mod block;
pub mod customer;
pub mod engine;
pub mod export;
pub mod io;
pub mod paths;
pub mod prompt;
pub mod report;
pub mod source;
pub mod tagmap;

pub mod prelude {
    pub use crate::block::{BlockParser, ParseStats};
    pub use crate::customer::{Customer, CustomerTable};
    pub use crate::report::ReportParameters;
    pub use crate::tagmap::TagMapping;
}
