//! `courier` command line: branch listing, quoting and parcel lodging.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use courier_core::{
    validate_field, ApiError, BranchDirectoryClient, ClientConfig, FormEdit, ItemSize,
    ParcelSubmissionClient, PricingClient, QuoteRequest, QuoteWorkflow, Role, SessionCheck,
    SessionVerifier, ShippingMethod, WorkflowError, WorkflowState,
};
use courier_console::{drive, drive_opt, logging, Transport, UreqTransport};

#[derive(Parser)]
#[command(name = "courier", about = "Courier branch and parcel console")]
struct Cli {
    #[arg(long, env = "COURIER_API_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Cookie header sent with credentialed calls, e.g. `token=...`.
    #[arg(long, env = "COURIER_SESSION")]
    session_cookie: Option<String>,

    #[arg(long, env = "COURIER_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[arg(long, env = "LOG_FILTER", default_value = "info")]
    log_filter: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Route {
    #[arg(long, value_parser = parse_size)]
    size: ItemSize,
    #[arg(long, value_parser = parse_method)]
    method: ShippingMethod,
    #[arg(long)]
    from: Option<String>,
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List branches.
    Branches,
    /// Check one form field locally.
    Validate { field: String, value: String },
    /// Price a parcel between two branches.
    Quote(Route),
    /// Quote and lodge a parcel.
    Ship {
        #[command(flatten)]
        route: Route,
        #[arg(long)]
        sender_name: String,
        #[arg(long)]
        sender_contact: String,
        #[arg(long)]
        receiver_name: String,
        #[arg(long)]
        receiver_contact: String,
        /// Lodge without stopping at the quote.
        #[arg(long)]
        yes: bool,
    },
    /// List lodged parcels.
    Parcels,
    /// Check the session cookie for a role.
    Verify { role: RoleArg },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Staff,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Staff => Role::Staff,
            RoleArg::Admin => Role::Admin,
        }
    }
}

fn parse_size(s: &str) -> Result<ItemSize, String> {
    ItemSize::parse(s).ok_or_else(|| format!("unknown item size `{s}`"))
}

fn parse_method(s: &str) -> Result<ShippingMethod, String> {
    ShippingMethod::parse(s).ok_or_else(|| format!("unknown shipping method `{s}`"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(&cli.log_filter);

    let config = ClientConfig::new(&cli.base_url).with_timeout(Duration::from_secs(cli.timeout_secs));
    let transport = UreqTransport::new(&config, cli.session_cookie.clone());

    match cli.command {
        Command::Branches => list_branches(&config, &transport),
        Command::Validate { field, value } => {
            match validate_field(&field, &value) {
                Some(msg) => bail!("{field}: {msg}"),
                None => println!("{field}: ok"),
            }
            Ok(())
        }
        Command::Quote(route) => quote(&config, &transport, route),
        Command::Ship {
            route,
            sender_name,
            sender_contact,
            receiver_name,
            receiver_contact,
            yes,
        } => {
            let edits = vec![
                FormEdit::SenderName(sender_name),
                FormEdit::SenderContact(sender_contact),
                FormEdit::ReceiverName(receiver_name),
                FormEdit::ReceiverContact(receiver_contact),
                FormEdit::ItemSize(Some(route.size)),
                FormEdit::ShippingMethod(Some(route.method)),
                FormEdit::Origin(route.from),
                FormEdit::Destination(route.to),
            ];
            ship(&config, &transport, edits, yes)
        }
        Command::Parcels => list_parcels(&config, &transport),
        Command::Verify { role } => verify(&config, &transport, role.into()),
    }
}

fn service_error(err: ApiError) -> anyhow::Error {
    match err.service_error() {
        Some(service) => anyhow!("{} (HTTP {}: {})", err.user_message(), service.status, service.body),
        None => anyhow!(err),
    }
}

fn workflow_error(err: &WorkflowError) -> anyhow::Error {
    service_error(err.api_error().clone()).context(err.to_string())
}

fn list_branches(config: &ClientConfig, transport: &impl Transport) -> anyhow::Result<()> {
    let client = BranchDirectoryClient::new(config);
    let response = transport
        .execute(&client.build_list_branches())
        .map_err(ApiError::from)
        .map_err(service_error)?;
    let branches = client.parse_list_branches(response).map_err(service_error)?;
    for branch in branches {
        println!("{}\t{}", branch.id, branch.location);
    }
    Ok(())
}

fn quote(config: &ClientConfig, transport: &impl Transport, route: Route) -> anyhow::Result<()> {
    let client = PricingClient::new(config);
    let request = QuoteRequest {
        item_size: route.size,
        origin_branch_id: route.from,
        destination_branch_id: route.to,
        shipping_method: route.method,
    };
    let http = client.build_get_quote(&request).map_err(service_error)?;
    let response = transport.execute(&http).map_err(ApiError::from).map_err(service_error)?;
    let quote = client.parse_get_quote(request, response).map_err(service_error)?;
    println!("{:.2} {}", quote.amount, quote.currency);
    Ok(())
}

fn ship(
    config: &ClientConfig,
    transport: &impl Transport,
    edits: Vec<FormEdit>,
    confirm: bool,
) -> anyhow::Result<()> {
    let mut workflow = QuoteWorkflow::new(config);
    let load = workflow.load_branches();
    drive(transport, &mut workflow, load);
    if let Some(err) = workflow.last_error() {
        return Err(workflow_error(err));
    }

    for edit in edits {
        let next = workflow.edit(edit);
        drive_opt(transport, &mut workflow, next);
    }
    if !workflow.field_errors().is_empty() {
        for (field, msg) in workflow.field_errors().iter() {
            eprintln!("{field}: {msg}");
        }
        bail!("form has invalid fields");
    }
    if let Some(err) = workflow.last_error() {
        return Err(workflow_error(err));
    }
    let quote = workflow
        .quote()
        .context("no quote for the selected route")?;
    println!("quote: {:.2} {}", quote.amount, quote.currency);

    if !confirm {
        println!("re-run with --yes to lodge this parcel");
        return Ok(());
    }

    let submit = workflow.confirm();
    drive_opt(transport, &mut workflow, submit);
    match workflow.state() {
        WorkflowState::Submitted => {
            let receipt = workflow.receipt().context("submitted without receipt")?;
            match receipt.tracking_number() {
                Some(tracking) => println!("lodged: {tracking}"),
                None => println!("lodged"),
            }
            Ok(())
        }
        _ => match workflow.last_error() {
            Some(err) => Err(workflow_error(err)),
            None => bail!("parcel was not submitted"),
        },
    }
}

fn list_parcels(config: &ClientConfig, transport: &impl Transport) -> anyhow::Result<()> {
    let client = ParcelSubmissionClient::new(config);
    let response = transport
        .execute(&client.build_list_parcels())
        .map_err(ApiError::from)
        .map_err(service_error)?;
    let parcels = client.parse_list_parcels(response).map_err(service_error)?;
    for parcel in parcels {
        println!(
            "{}\t{}\t{} -> {}\t{:.2}",
            parcel.tracking_no.as_deref().unwrap_or("-"),
            parcel.record.item_size,
            parcel.record.origin_branch_id,
            parcel.record.destination_branch_id,
            parcel.record.quoted_amount,
        );
    }
    Ok(())
}

fn verify(config: &ClientConfig, transport: &impl Transport, role: Role) -> anyhow::Result<()> {
    let verifier = SessionVerifier::new(config, role);
    let response = transport
        .execute(&verifier.build_verify())
        .map_err(ApiError::from)
        .map_err(service_error)?;
    match verifier.parse_verify(response).map_err(service_error)? {
        SessionCheck::Verified(session) => {
            println!("{} session ok ({})", session.role, session.username.as_deref().unwrap_or("unknown"));
            Ok(())
        }
        SessionCheck::Denied => bail!("{role} session denied"),
    }
}
