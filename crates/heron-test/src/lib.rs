//! # Heron Test
//!
//! Test utilities for Heron applications. Requests are built as API
//! Gateway proxy events and handed straight to the engine, so tests run
//! without a network or a Lambda runtime.
//!
//! ## Key Features
//!
//! - **In-Memory Testing**: events go directly to [`LambdaEngine::handle`](heron_server::LambdaEngine::handle)
//! - **Request Builder**: headers, query strings, credentials and bodies
//! - **Response Assertions**: status, header, body and JSON path checks
//!
//! ## Example
//!
//! ```ignore
//! use heron_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_order() {
//!     let client = TestClient::engine(engine);
//!
//!     client
//!         .post("/orders")
//!         .basic_auth("alice", "pw")
//!         .json(&json!({ "sku": "A1" }))
//!         .send()
//!         .await
//!         .assert_status(200)
//!         .assert_json_field("sku", &json!("A1"));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/heron-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestClientRequest, TestHandler};
pub use error::TestError;
pub use response::TestResponse;
