pub mod balldontlie_api;
pub mod fetch;
pub mod odds_api;
pub mod rapid_api;
pub mod supabase_api;

pub use balldontlie_api::BallDontLieClient;
pub use fetch::{FetchRequest, Fetcher, RetryPolicy, Transport};
pub use odds_api::OddsApiClient;
pub use rapid_api::RapidApiClient;
pub use supabase_api::{ReportFilter, SupabaseClient};
