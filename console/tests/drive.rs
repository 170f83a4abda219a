//! Drive the quote workflow through a transport, scripted and live.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use courier_console::{drive, drive_opt, logging, Transport, UreqTransport};
use courier_core::{
    ApiError, ClientConfig, FormEdit, HttpMethod, HttpRequest, HttpResponse, ItemSize,
    NetworkError, QuoteWorkflow, ShippingMethod, TransportError, WorkflowError, WorkflowState,
};

/// Replays canned results in order and records every request it sees.
#[derive(Default)]
struct Scripted {
    replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    seen: RefCell<Vec<HttpRequest>>,
}

impl Scripted {
    fn reply(self, status: u16, body: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
        self
    }

    fn fail(self, err: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(err));
        self
    }

    fn posts(&self) -> usize {
        self.seen
            .borrow()
            .iter()
            .filter(|r| r.method == HttpMethod::Post)
            .count()
    }
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .expect("unexpected request")
    }
}

const BRANCHES: &str = r#"{"data":{"branches":[{"_id":"B1","location":"Colombo Central"},{"_id":"B2","location":"Kandy"}]}}"#;
const PRICE: &str = r#"{"data":{"price":450,"currency":"LKR"}}"#;

fn edits() -> Vec<FormEdit> {
    vec![
        FormEdit::SenderName("Amal Perera".to_string()),
        FormEdit::SenderContact("0771234567".to_string()),
        FormEdit::ReceiverName("Nimali Silva".to_string()),
        FormEdit::ReceiverContact("+94712345678".to_string()),
        FormEdit::ItemSize(Some(ItemSize::Small)),
        FormEdit::ShippingMethod(Some(ShippingMethod::Standard)),
        FormEdit::Origin(Some("B1".to_string())),
        FormEdit::Destination(Some("B2".to_string())),
    ]
}

fn prepare(transport: &impl Transport, config: &ClientConfig) -> QuoteWorkflow {
    logging::initialize_reentrant("courier_core=debug");
    let mut workflow = QuoteWorkflow::new(config);
    let load = workflow.load_branches();
    drive(transport, &mut workflow, load);
    for edit in edits() {
        let next = workflow.edit(edit);
        drive_opt(transport, &mut workflow, next);
    }
    workflow
}

#[test]
fn rejected_submission_needs_explicit_retry() {
    let transport = Scripted::default()
        .reply(200, BRANCHES)
        .reply(200, PRICE)
        .reply(409, r#"{"error":"duplicate tracking code"}"#)
        .reply(201, r#"{"message":"Parcel added","data":{"parcel":{"trackingNo":"CX-0042"}}}"#);
    let config = ClientConfig::new("http://backend.test");
    let mut workflow = prepare(&transport, &config);
    assert_eq!(workflow.state(), WorkflowState::QuoteReady);

    let submit = workflow.confirm();
    let duplicate = workflow.confirm();
    assert!(duplicate.is_none());
    drive_opt(&transport, &mut workflow, submit);

    assert_eq!(transport.posts(), 1);
    assert_eq!(workflow.state(), WorkflowState::QuoteReady);
    assert_eq!(workflow.last_error().unwrap().message(), "duplicate tracking code");

    let retry = workflow.retry_submission();
    drive_opt(&transport, &mut workflow, retry);
    assert_eq!(transport.posts(), 2);
    assert_eq!(workflow.state(), WorkflowState::Submitted);
    assert_eq!(workflow.receipt().unwrap().tracking_number(), Some("CX-0042"));

    let seen = transport.seen.borrow();
    let bodies: Vec<_> = seen
        .iter()
        .filter(|r| r.method == HttpMethod::Post)
        .map(|r| r.body.clone())
        .collect();
    assert_eq!(bodies[0], bodies[1]);
}

#[test]
fn quote_timeout_leaves_form_editable() {
    let transport = Scripted::default()
        .reply(200, BRANCHES)
        .fail(TransportError::Timeout);
    let config = ClientConfig::new("http://backend.test").with_timeout(Duration::from_secs(2));
    let workflow = prepare(&transport, &config);

    assert_eq!(workflow.state(), WorkflowState::Editing);
    let err = workflow.last_error().unwrap();
    assert!(matches!(
        err,
        WorkflowError::Quote(ApiError::Network(NetworkError::Timeout))
    ));
    assert_eq!(workflow.form().destination_branch_id.as_deref(), Some("B2"));
    assert!(transport
        .seen
        .borrow()
        .iter()
        .all(|r| r.timeout == Duration::from_secs(2)));
}

#[test]
fn unreachable_backend_is_network_error() {
    let config = ClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
    let transport = UreqTransport::new(&config, None);
    let mut workflow = QuoteWorkflow::new(&config);
    let load = workflow.load_branches();
    drive(&transport, &mut workflow, load);

    assert!(workflow.branches().is_empty());
    assert!(matches!(
        workflow.last_error(),
        Some(WorkflowError::Branches(ApiError::Network(_)))
    ));
}

fn start_server() -> ClientConfig {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    ClientConfig::new(&format!("http://{addr}"))
}

#[test]
fn lodges_parcel_against_live_backend() {
    let config = start_server();
    let transport = UreqTransport::new(&config, Some("token=staff-token".to_string()));
    let mut workflow = prepare(&transport, &config);

    assert_eq!(workflow.branches().len(), 3);
    assert_eq!(workflow.state(), WorkflowState::QuoteReady);
    assert_eq!(workflow.quote().unwrap().amount, 450.0);

    let submit = workflow.confirm();
    drive_opt(&transport, &mut workflow, submit);
    assert_eq!(workflow.state(), WorkflowState::Submitted);
    assert_eq!(workflow.receipt().unwrap().tracking_number(), Some("CX-0001"));
}

#[test]
fn live_backend_without_session_rejects_verbatim() {
    let config = start_server();
    let transport = UreqTransport::new(&config, None);
    let mut workflow = prepare(&transport, &config);

    let submit = workflow.confirm();
    drive_opt(&transport, &mut workflow, submit);
    assert_eq!(workflow.state(), WorkflowState::QuoteReady);
    assert_eq!(workflow.last_error().unwrap().message(), "Unauthorized");
    assert!(workflow.record().is_some());
}
