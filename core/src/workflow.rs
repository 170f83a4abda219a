//! Quote-and-submit workflow for lodging one parcel.
//!
//! # Design
//! `QuoteWorkflow` is a sans-IO state machine. Every remote call leaves it as
//! an `Outbound` tagged with a `CallId`; the host executes the request and
//! hands the outcome back through `on_response`. A response whose call is no
//! longer pending (after `cancel` or `reset`) is dropped silently.
//!
//! Quotes are last-write-wins: each pending quote remembers the request it
//! was issued for, and a result is only applied while that request still
//! matches the form. Submission is guarded by the `Submitting` state and is
//! never resent without an explicit `confirm` or `retry_submission`.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::branches::BranchDirectoryClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, TransportError};
use crate::parcels::ParcelSubmissionClient;
use crate::pricing::PricingClient;
use crate::types::{
    Branch, ContactInfo, ItemSize, ParcelRecord, Quote, QuoteRequest, ShippingMethod,
    SubmissionReceipt,
};
use crate::validate::{validate_field, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

/// A request the host must execute and report back on.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub call: CallId,
    pub request: HttpRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Editing,
    Quoting,
    QuoteReady,
    Submitting,
    Submitted,
}

/// One user change to the lodging form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    SenderName(String),
    SenderContact(String),
    ReceiverName(String),
    ReceiverContact(String),
    ItemSize(Option<ItemSize>),
    Origin(Option<String>),
    Destination(Option<String>),
    ShippingMethod(Option<ShippingMethod>),
}

impl FormEdit {
    pub fn field(&self) -> &'static str {
        match self {
            FormEdit::SenderName(_) => "senderName",
            FormEdit::SenderContact(_) => "senderContact",
            FormEdit::ReceiverName(_) => "receiverName",
            FormEdit::ReceiverContact(_) => "receiverContact",
            FormEdit::ItemSize(_) => "itemSize",
            FormEdit::Origin(_) => "originBranchId",
            FormEdit::Destination(_) => "destinationBranchId",
            FormEdit::ShippingMethod(_) => "shippingMethod",
        }
    }

    fn is_quote_input(&self) -> bool {
        matches!(
            self,
            FormEdit::ItemSize(_)
                | FormEdit::Origin(_)
                | FormEdit::Destination(_)
                | FormEdit::ShippingMethod(_)
        )
    }
}

const QUOTE_FIELDS: [&str; 4] = ["itemSize", "originBranchId", "destinationBranchId", "shippingMethod"];

/// Current values of the lodging form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelForm {
    pub sender: ContactInfo,
    pub receiver: ContactInfo,
    pub item_size: Option<ItemSize>,
    pub origin_branch_id: Option<String>,
    pub destination_branch_id: Option<String>,
    pub shipping_method: Option<ShippingMethod>,
}

impl ParcelForm {
    /// The request the form currently describes, once size and method are
    /// chosen. Branch ids are carried through as-is.
    pub fn quote_request(&self) -> Option<QuoteRequest> {
        Some(QuoteRequest {
            item_size: self.item_size?,
            origin_branch_id: self.origin_branch_id.clone(),
            destination_branch_id: self.destination_branch_id.clone(),
            shipping_method: self.shipping_method?,
        })
    }
}

/// The last remote failure, kept for display until replaced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    #[error("could not load branches: {0}")]
    Branches(ApiError),
    #[error("could not get a quote: {0}")]
    Quote(ApiError),
    #[error("parcel submission failed: {0}")]
    Submission(ApiError),
}

impl WorkflowError {
    pub fn api_error(&self) -> &ApiError {
        match self {
            WorkflowError::Branches(e) | WorkflowError::Quote(e) | WorkflowError::Submission(e) => e,
        }
    }

    /// The service's own message where there is one.
    pub fn message(&self) -> String {
        self.api_error().user_message()
    }
}

#[derive(Debug, Clone)]
enum PendingCall {
    Branches,
    Quote(QuoteRequest),
    Submit,
}

#[derive(Debug)]
pub struct QuoteWorkflow {
    directory: BranchDirectoryClient,
    pricing: PricingClient,
    parcels: ParcelSubmissionClient,
    state: WorkflowState,
    form: ParcelForm,
    field_errors: FieldErrors,
    branches: Vec<Branch>,
    branches_loaded: bool,
    quote: Option<Quote>,
    record: Option<ParcelRecord>,
    receipt: Option<SubmissionReceipt>,
    last_error: Option<WorkflowError>,
    pending: HashMap<CallId, PendingCall>,
    next_call: u64,
    cancelled: bool,
}

impl QuoteWorkflow {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            directory: BranchDirectoryClient::new(config),
            pricing: PricingClient::new(config),
            parcels: ParcelSubmissionClient::new(config),
            state: WorkflowState::Editing,
            form: ParcelForm::default(),
            field_errors: FieldErrors::new(),
            branches: Vec::new(),
            branches_loaded: false,
            quote: None,
            record: None,
            receipt: None,
            last_error: None,
            pending: HashMap::new(),
            next_call: 0,
            cancelled: false,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn form(&self) -> &ParcelForm {
        &self.form
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    /// The record built by the last confirmation, kept for retry or, once
    /// submitted, as the lodged payload.
    pub fn record(&self) -> Option<&ParcelRecord> {
        self.record.as_ref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    pub fn current_request(&self) -> Option<QuoteRequest> {
        self.form.quote_request()
    }

    pub fn has_pending_calls(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn load_branches(&mut self) -> Outbound {
        let request = self.directory.build_list_branches();
        self.dispatch(PendingCall::Branches, request)
    }

    /// Apply one form change. Returns a quote request when the change
    /// completes (or alters) a valid set of quote inputs.
    pub fn edit(&mut self, edit: FormEdit) -> Option<Outbound> {
        if self.cancelled || matches!(self.state, WorkflowState::Submitting | WorkflowState::Submitted) {
            debug!(field = edit.field(), state = ?self.state, "ignoring form edit");
            return None;
        }
        let field = edit.field();
        let quote_input = edit.is_quote_input();
        let outcome = self.apply(edit);
        self.field_errors.record(field, outcome);
        if self.record.take().is_some() {
            debug!("form edited, dropping kept parcel record");
        }
        if quote_input {
            self.refresh_quote()
        } else {
            None
        }
    }

    /// Feed back the outcome of an `Outbound`. May return a follow-up quote
    /// request when a branch list arrives for an already-filled form.
    pub fn on_response(
        &mut self,
        call: CallId,
        result: Result<HttpResponse, TransportError>,
    ) -> Option<Outbound> {
        let Some(pending) = self.pending.remove(&call) else {
            debug!(?call, "dropping response for released call");
            return None;
        };
        match pending {
            PendingCall::Branches => self.finish_branches(result),
            PendingCall::Quote(basis) => {
                self.finish_quote(basis, result);
                None
            }
            PendingCall::Submit => {
                self.finish_submission(result);
                None
            }
        }
    }

    /// Lodge the parcel for the displayed quote. A second call while the
    /// first is in flight is a no-op.
    pub fn confirm(&mut self) -> Option<Outbound> {
        if self.state == WorkflowState::Submitting {
            debug!("submission already in flight");
            return None;
        }
        if self.cancelled || self.state != WorkflowState::QuoteReady {
            debug!(state = ?self.state, "nothing to confirm");
            return None;
        }
        let record = match self.record.clone() {
            Some(kept) => kept,
            None => self.build_record()?,
        };
        self.submit(record)
    }

    /// Resend the record kept from a failed submission.
    pub fn retry_submission(&mut self) -> Option<Outbound> {
        if self.record.is_none() {
            return None;
        }
        self.confirm()
    }

    /// Start a new parcel. The branch list is kept; every pending call is
    /// released.
    pub fn reset(&mut self) {
        self.release_pending();
        self.state = WorkflowState::Editing;
        self.form = ParcelForm::default();
        self.field_errors.clear();
        self.quote = None;
        self.record = None;
        self.receipt = None;
        self.last_error = None;
        self.cancelled = false;
    }

    /// Abandon the workflow; late responses are dropped without error.
    pub fn cancel(&mut self) {
        self.release_pending();
        self.cancelled = true;
    }

    fn release_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "releasing pending calls");
        }
        self.pending.clear();
    }

    fn dispatch(&mut self, pending: PendingCall, request: HttpRequest) -> Outbound {
        let call = CallId(self.next_call);
        self.next_call += 1;
        debug!(?call, method = ?request.method, path = %request.path, "dispatching request");
        self.pending.insert(call, pending);
        Outbound { call, request }
    }

    fn apply(&mut self, edit: FormEdit) -> Option<String> {
        match edit {
            FormEdit::SenderName(name) => {
                self.form.sender.name = name;
                None
            }
            FormEdit::SenderContact(contact) => {
                let outcome = validate_field("contact", &contact);
                self.form.sender.contact = contact;
                outcome
            }
            FormEdit::ReceiverName(name) => {
                self.form.receiver.name = name;
                None
            }
            FormEdit::ReceiverContact(contact) => {
                let outcome = validate_field("contact", &contact);
                self.form.receiver.contact = contact;
                outcome
            }
            FormEdit::ItemSize(size) => {
                self.form.item_size = size;
                size.is_none().then(|| "Item size is required".to_string())
            }
            FormEdit::ShippingMethod(method) => {
                self.form.shipping_method = method;
                method.is_none().then(|| "Shipping method is required".to_string())
            }
            FormEdit::Origin(id) => {
                let id = id.map(|id| id.trim().to_string());
                let outcome = self.validate_branch(id.as_deref());
                self.form.origin_branch_id = id;
                outcome
            }
            FormEdit::Destination(id) => {
                let id = id.map(|id| id.trim().to_string());
                let outcome = self.validate_branch(id.as_deref());
                self.form.destination_branch_id = id;
                outcome
            }
        }
    }

    fn validate_branch(&self, id: Option<&str>) -> Option<String> {
        match id.map(str::trim) {
            None | Some("") => Some("Branch is required".to_string()),
            Some(id) if self.branches_loaded && !self.branches.iter().any(|b| b.id == id) => {
                Some("Select a branch from the list".to_string())
            }
            Some(_) => None,
        }
    }

    /// The current request, if all four quote inputs are present and valid.
    fn ready_quote_request(&self) -> Option<QuoteRequest> {
        if QUOTE_FIELDS.iter().any(|f| self.field_errors.contains(f)) {
            return None;
        }
        self.form.quote_request().filter(QuoteRequest::is_routable)
    }

    fn refresh_quote(&mut self) -> Option<Outbound> {
        let request = self.ready_quote_request();
        if self
            .quote
            .as_ref()
            .is_some_and(|q| Some(&q.basis) != request.as_ref())
        {
            debug!("quote inputs changed, discarding quote");
            self.quote = None;
        }
        let Some(request) = request else {
            self.state = WorkflowState::Editing;
            return None;
        };
        if self.quote.is_some() {
            self.state = WorkflowState::QuoteReady;
            return None;
        }
        self.state = WorkflowState::Quoting;
        let in_flight = self
            .pending
            .values()
            .any(|p| matches!(p, PendingCall::Quote(basis) if *basis == request));
        if in_flight {
            debug!("identical quote already in flight");
            return None;
        }
        match self.pricing.build_get_quote(&request) {
            Ok(http) => Some(self.dispatch(PendingCall::Quote(request), http)),
            Err(err) => {
                warn!(error = %err, "could not build quote request");
                self.last_error = Some(WorkflowError::Quote(err));
                self.state = WorkflowState::Editing;
                None
            }
        }
    }

    fn finish_branches(&mut self, result: Result<HttpResponse, TransportError>) -> Option<Outbound> {
        let outcome = result
            .map_err(ApiError::from)
            .and_then(|response| self.directory.parse_list_branches(response));
        match outcome {
            Ok(branches) => {
                info!(count = branches.len(), "branches loaded");
                self.branches = branches;
                self.branches_loaded = true;
                if matches!(self.last_error, Some(WorkflowError::Branches(_))) {
                    self.last_error = None;
                }
                self.revalidate_branch_selection()
            }
            Err(err) => {
                // A failed reload keeps whatever list was loaded before.
                warn!(error = %err, kept = self.branches.len(), "branch list unavailable");
                self.last_error = Some(WorkflowError::Branches(err));
                None
            }
        }
    }

    fn revalidate_branch_selection(&mut self) -> Option<Outbound> {
        if self.cancelled || !matches!(self.state, WorkflowState::Editing | WorkflowState::Quoting) {
            return None;
        }
        let origin = self.form.origin_branch_id.clone();
        let destination = self.form.destination_branch_id.clone();
        if origin.is_none() && destination.is_none() {
            return None;
        }
        if let Some(id) = origin.as_deref() {
            let outcome = self.validate_branch(Some(id));
            self.field_errors.record("originBranchId", outcome);
        }
        if let Some(id) = destination.as_deref() {
            let outcome = self.validate_branch(Some(id));
            self.field_errors.record("destinationBranchId", outcome);
        }
        self.refresh_quote()
    }

    fn finish_quote(&mut self, basis: QuoteRequest, result: Result<HttpResponse, TransportError>) {
        let current = self.ready_quote_request();
        if current.as_ref() != Some(&basis) || self.state != WorkflowState::Quoting {
            debug!(?basis, "discarding stale quote result");
            return;
        }
        let outcome = result
            .map_err(ApiError::from)
            .and_then(|response| self.pricing.parse_get_quote(basis, response));
        match outcome {
            Ok(quote) => {
                info!(amount = quote.amount, currency = %quote.currency, "quote ready");
                self.quote = Some(quote);
                self.state = WorkflowState::QuoteReady;
                if matches!(self.last_error, Some(WorkflowError::Quote(_))) {
                    self.last_error = None;
                }
            }
            Err(err) => {
                warn!(error = %err, "quote failed");
                self.last_error = Some(WorkflowError::Quote(err));
                self.state = WorkflowState::Editing;
            }
        }
    }

    fn build_record(&mut self) -> Option<ParcelRecord> {
        let sender = validate_field("contact", &self.form.sender.contact);
        let receiver = validate_field("contact", &self.form.receiver.contact);
        self.field_errors.record("senderContact", sender);
        self.field_errors.record("receiverContact", receiver);
        if !self.field_errors.is_empty() {
            debug!(errors = self.field_errors.len(), "form has field errors, not submitting");
            return None;
        }
        let quote = self.quote.as_ref()?;
        Some(ParcelRecord {
            sender_info: self.form.sender.clone(),
            receiver_info: self.form.receiver.clone(),
            item_size: quote.basis.item_size,
            origin_branch_id: quote.basis.origin_branch_id.clone()?,
            destination_branch_id: quote.basis.destination_branch_id.clone()?,
            shipping_method: quote.basis.shipping_method,
            quoted_amount: quote.amount,
        })
    }

    fn submit(&mut self, record: ParcelRecord) -> Option<Outbound> {
        let built = self.parcels.build_submit_parcel(&record);
        self.record = Some(record);
        match built {
            Ok(http) => {
                info!("submitting parcel");
                self.state = WorkflowState::Submitting;
                Some(self.dispatch(PendingCall::Submit, http))
            }
            Err(err) => {
                warn!(error = %err, "could not build submission");
                self.last_error = Some(WorkflowError::Submission(err));
                None
            }
        }
    }

    fn finish_submission(&mut self, result: Result<HttpResponse, TransportError>) {
        let outcome = result
            .map_err(ApiError::from)
            .and_then(|response| self.parcels.parse_submit_parcel(response));
        match outcome {
            Ok(receipt) => {
                info!(tracking = ?receipt.tracking_number(), "parcel lodged");
                self.receipt = Some(receipt);
                self.state = WorkflowState::Submitted;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "parcel submission failed");
                self.last_error = Some(WorkflowError::Submission(err));
                self.state = WorkflowState::QuoteReady;
            }
        }
    }
}
