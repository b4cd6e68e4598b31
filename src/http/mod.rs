//! HTTP client layer — `MyFundHttp` and the `PortfolioSource` seam.

pub mod client;

pub use client::{parse_portfolio_body, MyFundHttp, MyFundHttpBuilder, PortfolioSource};
