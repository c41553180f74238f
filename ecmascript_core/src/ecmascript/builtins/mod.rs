pub mod promise;
pub mod regexp;
