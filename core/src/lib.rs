//! Client core for the courier administration backend.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host executes the actual
//! HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - One adapter per backend collaborator: `BranchDirectoryClient`,
//!   `PricingClient`, `ParcelSubmissionClient`, `SessionVerifier`. Each is
//!   constructed from an explicit `ClientConfig`.
//! - `validate` holds the pure field rules shared by every form.
//! - `QuoteWorkflow` sequences validation, pricing and submission for one
//!   parcel and hands its remote calls to the host as `Outbound` values.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod branches;
pub mod config;
pub mod error;
pub mod http;
pub mod parcels;
pub mod pricing;
pub mod session;
pub mod types;
pub mod validate;
pub mod workflow;

pub use branches::BranchDirectoryClient;
pub use config::ClientConfig;
pub use error::{ApiError, NetworkError, ServiceError};
pub use http::{Credentials, HttpMethod, HttpRequest, HttpResponse, TransportError};
pub use parcels::ParcelSubmissionClient;
pub use pricing::PricingClient;
pub use session::{Role, Session, SessionCheck, SessionVerifier};
pub use types::{
    Branch, ContactInfo, ItemSize, LodgedParcel, ParcelRecord, Quote, QuoteRequest, ShippingMethod,
    SubmissionReceipt,
};
pub use validate::{validate_field, BranchForm, FieldErrors};
pub use workflow::{CallId, FormEdit, Outbound, ParcelForm, QuoteWorkflow, WorkflowError, WorkflowState};
