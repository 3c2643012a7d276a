pub mod local;
pub mod postgres;

pub use local::FileResultRepository;
pub use postgres::PgResultRepository;
